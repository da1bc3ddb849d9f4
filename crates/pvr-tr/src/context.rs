//! Input and output contexts for a conversion.

use bitfield::bitfield;

use pvr_core::tex::PaletteFmt;
use pvr_core::types::{ISP_TSP, TA_NUM_LISTS, TA_NUM_VERTS, TCW, TSP};

pub const TR_MAX_SURFS: usize = 0x4000;
pub const TR_MAX_VERTS: usize = 0x10000;
pub const TR_MAX_INDICES: usize = 0x30000;
pub const TR_MAX_PARAMS: usize = 0x10000;

/// Room for three background vertices at their largest encoding.
pub const TA_BG_VERTEX_BYTES: usize = 0x100;

/// A captured TA context, immutable input to a conversion.
pub struct TaContext {
    /// The raw parameter stream.
    pub params: Vec<u8>,

    /// Background plane state from ISP_BACKGND_T.
    pub bg_isp: ISP_TSP,
    pub bg_tsp: TSP,
    pub bg_tcw: TCW,
    pub bg_vertices: [u8; TA_BG_VERTEX_BYTES],
    /// ISP_BACKGND_D. Carried for completeness; the parsed vertex depths
    /// are used as-is.
    pub bg_depth: f32,

    /// PAL_RAM_CTRL entry format.
    pub palette_fmt: PaletteFmt,
    /// TEXT_CONTROL stride, in 32-pixel units.
    pub stride: u32,
    /// PT_ALPHA_REF.
    pub alpha_ref: u8,
    /// Sort translucent and punch-through triangles back to front.
    pub autosort: bool,

    pub video_width: u32,
    pub video_height: u32,
}

impl Default for TaContext {
    fn default() -> Self {
        Self {
            params: Vec::new(),
            bg_isp: ISP_TSP(0),
            bg_tsp: TSP(0),
            bg_tcw: TCW(0),
            bg_vertices: [0; TA_BG_VERTEX_BYTES],
            bg_depth: 0.0,
            palette_fmt: PaletteFmt::Argb1555,
            stride: 0,
            alpha_ref: 0,
            autosort: false,
            video_width: 640,
            video_height: 480,
        }
    }
}

bitfield! {
    /// Packed per-surface draw state. Two surfaces are batched into one
    /// draw call iff their `full()` words are identical.
    #[derive(Copy, Clone, Default, PartialEq, Eq)]
    pub struct SurfaceParams(u64);
    impl Debug;

    pub depth_write, set_depth_write: 0;
    pub u32, depth_func, set_depth_func: 3, 1;
    pub u32, cull, set_cull: 5, 4;
    pub u32, src_blend, set_src_blend: 9, 6;
    pub u32, dst_blend, set_dst_blend: 13, 10;
    pub u32, shade, set_shade: 15, 14;
    pub ignore_alpha, set_ignore_alpha: 16;
    pub ignore_texture_alpha, set_ignore_texture_alpha: 17;
    pub offset_color, set_offset_color: 18;
    pub alpha_test, set_alpha_test: 19;
    pub u8, alpha_ref, set_alpha_ref: 27, 20;
    pub u32, texture, set_texture: 63, 32;
}

impl SurfaceParams {
    #[inline]
    pub const fn full(&self) -> u64 {
        self.0
    }

    #[inline]
    pub fn set_full(&mut self, val: u64) {
        self.0 = val;
    }
}

/// A drawable batch of vertices sharing draw state.
///
/// While parsing, `first_vert`/`num_verts` address the vertex pool. After
/// index generation they address the index pool instead, with `num_verts`
/// holding the triangle-index count.
#[derive(Copy, Clone, Default, Debug)]
pub struct TaSurface {
    pub params: SurfaceParams,
    pub first_vert: u32,
    pub num_verts: u32,
    /// Position of this surface's first triangle within its source strip,
    /// for winding parity.
    pub strip_offset: u32,
}

#[derive(Copy, Clone, Default, Debug)]
pub struct TaVertex {
    pub xyz: [f32; 3],
    pub uv: [f32; 2],
    /// Bytes r, g, b, a from the lowest address.
    pub color: u32,
    pub offset_color: u32,
}

/// Per-list draw order: indices into the surface pool, parse order until
/// sorted.
pub struct TrList {
    pub surfs: Box<[u32]>,
    pub num_surfs: usize,
    /// Strips committed to this list, before splitting and merging.
    pub num_orig_surfs: usize,
}

impl TrList {
    fn new() -> Self {
        Self {
            surfs: vec![0; TR_MAX_SURFS].into_boxed_slice(),
            num_surfs: 0,
            num_orig_surfs: 0,
        }
    }
}

/// Per-command parse trace, for tracer debugging.
#[derive(Copy, Clone, Debug)]
pub struct TrParam {
    /// Byte offset of the command in the input stream.
    pub offset: u32,
    pub list_type: u32,
    pub vert_type: u32,
    /// Index of the most recently reserved surface, -1 before the first.
    pub last_surf: i32,
    pub last_vert: i32,
}

impl Default for TrParam {
    fn default() -> Self {
        Self {
            offset: 0,
            list_type: TA_NUM_LISTS,
            vert_type: TA_NUM_VERTS,
            last_surf: -1,
            last_vert: -1,
        }
    }
}

/// The renderer-ready output of a conversion. All storage is pre-sized;
/// reset and reused between frames.
pub struct TrContext {
    pub width: u32,
    pub height: u32,

    pub surfs: Box<[TaSurface]>,
    pub num_surfs: usize,

    pub verts: Box<[TaVertex]>,
    pub num_verts: usize,

    pub indices: Box<[u32]>,
    pub num_indices: usize,

    pub lists: [TrList; TA_NUM_LISTS as usize],

    pub params: Box<[TrParam]>,
    pub num_params: usize,

    // sort scratch, kept here so conversions on distinct contexts never
    // share mutable state
    pub(crate) sort_minz: Box<[f32]>,
    pub(crate) sort_tmp: Box<[u32]>,
}

impl TrContext {
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            surfs: vec![TaSurface::default(); TR_MAX_SURFS].into_boxed_slice(),
            num_surfs: 0,
            verts: vec![TaVertex::default(); TR_MAX_VERTS].into_boxed_slice(),
            num_verts: 0,
            indices: vec![0; TR_MAX_INDICES].into_boxed_slice(),
            num_indices: 0,
            lists: [
                TrList::new(),
                TrList::new(),
                TrList::new(),
                TrList::new(),
                TrList::new(),
            ],
            params: vec![TrParam::default(); TR_MAX_PARAMS].into_boxed_slice(),
            num_params: 0,
            sort_minz: vec![0.0; TR_MAX_SURFS].into_boxed_slice(),
            sort_tmp: vec![0; TR_MAX_SURFS].into_boxed_slice(),
        }
    }

    /// Drop all committed state. Called at the start of every conversion.
    pub fn reset(&mut self) {
        self.num_params = 0;
        self.num_surfs = 0;
        self.num_verts = 0;
        self.num_indices = 0;
        for list in &mut self.lists {
            list.num_surfs = 0;
            list.num_orig_surfs = 0;
        }
    }
}

impl Default for TrContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_params_pack() {
        let mut p = SurfaceParams::default();
        p.set_depth_write(true);
        p.set_depth_func(6);
        p.set_cull(2);
        p.set_src_blend(8);
        p.set_dst_blend(1);
        p.set_shade(3);
        p.set_alpha_test(true);
        p.set_alpha_ref(0xA5);
        p.set_texture(0xDEAD_BEEF);

        assert!(p.depth_write());
        assert_eq!(p.depth_func(), 6);
        assert_eq!(p.cull(), 2);
        assert_eq!(p.src_blend(), 8);
        assert_eq!(p.dst_blend(), 1);
        assert_eq!(p.shade(), 3);
        assert!(p.alpha_test());
        assert_eq!(p.alpha_ref(), 0xA5);
        assert_eq!(p.texture(), 0xDEAD_BEEF);

        // the packed word is the merge key
        let q = p;
        assert_eq!(p.full(), q.full());
        let mut r = p;
        r.set_ignore_alpha(true);
        assert_ne!(p.full(), r.full());
    }

    #[test]
    fn reset_clears_counters() {
        let mut rc = TrContext::new();
        rc.num_surfs = 3;
        rc.num_verts = 12;
        rc.num_indices = 9;
        rc.num_params = 4;
        rc.lists[0].num_surfs = 3;
        rc.lists[0].num_orig_surfs = 2;

        rc.reset();

        assert_eq!(rc.num_surfs, 0);
        assert_eq!(rc.num_verts, 0);
        assert_eq!(rc.num_indices, 0);
        assert_eq!(rc.num_params, 0);
        assert_eq!(rc.lists[0].num_surfs, 0);
        assert_eq!(rc.lists[0].num_orig_surfs, 0);
    }
}
