//! Helpers for building raw TA parameter streams and recording the
//! translator's output.

#![allow(dead_code)]

use pvr_core::tex::{PaletteFmt, PixelFmt, PvrTexDecode, TextureFmt};
use pvr_core::types::*;
use pvr_tr::backend::{
    RenderBackend, TextureCache, TextureHandle, TextureLookup, TextureParams,
};
use pvr_tr::context::{TaContext, TaSurface, TaVertex, TrContext};
use pvr_tr::convert::Translator;

/// Incremental raw parameter stream.
#[derive(Default)]
pub struct Stream {
    bytes: Vec<u8>,
}

impl Stream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn words(&mut self, words: &[u32]) -> &mut Self {
        for word in words {
            self.bytes.extend_from_slice(&word.to_le_bytes());
        }
        self
    }

    /// A global polygon parameter, short form.
    pub fn poly(&mut self, list_type: u32, obj_ctrl: u32, isp: u32, tsp: u32) -> &mut Self {
        let pcw = (PARAM_POLY_OR_VOL << 29) | (list_type << 24) | obj_ctrl;
        self.words(&[pcw, isp, tsp, 0, 0, 0, 0, 0])
    }

    /// A type 1 global parameter carrying a face color (intensity mode).
    pub fn poly_face_color(
        &mut self,
        list_type: u32,
        isp: u32,
        tsp: u32,
        argb: [f32; 4],
    ) -> &mut Self {
        let pcw = (PARAM_POLY_OR_VOL << 29) | (list_type << 24) | (2 << 4);
        self.words(&[
            pcw,
            isp,
            tsp,
            0,
            argb[0].to_bits(),
            argb[1].to_bits(),
            argb[2].to_bits(),
            argb[3].to_bits(),
        ])
    }

    /// A sprite global parameter with packed base and offset colors.
    pub fn sprite_poly(&mut self, list_type: u32, isp: u32, tsp: u32, base: u32) -> &mut Self {
        let pcw = (PARAM_SPRITE << 29) | (list_type << 24);
        self.words(&[pcw, isp, tsp, 0, base, 0, 0, 0])
    }

    /// A type 0 vertex: packed color, untextured.
    pub fn vert_packed(&mut self, xyz: [f32; 3], argb: u32, eos: bool) -> &mut Self {
        let pcw = (PARAM_VERTEX << 29) | ((eos as u32) << 28);
        self.words(&[
            pcw,
            xyz[0].to_bits(),
            xyz[1].to_bits(),
            xyz[2].to_bits(),
            0,
            0,
            argb,
            0,
        ])
    }

    /// A type 1 vertex: float color, untextured.
    pub fn vert_float(&mut self, xyz: [f32; 3], argb: [f32; 4], eos: bool) -> &mut Self {
        let pcw = (PARAM_VERTEX << 29) | ((eos as u32) << 28);
        self.words(&[
            pcw,
            xyz[0].to_bits(),
            xyz[1].to_bits(),
            xyz[2].to_bits(),
            argb[0].to_bits(),
            argb[1].to_bits(),
            argb[2].to_bits(),
            argb[3].to_bits(),
        ])
    }

    /// A type 2 vertex: intensity against the latched face color.
    pub fn vert_intensity(&mut self, xyz: [f32; 3], intensity: f32, eos: bool) -> &mut Self {
        let pcw = (PARAM_VERTEX << 29) | ((eos as u32) << 28);
        self.words(&[
            pcw,
            xyz[0].to_bits(),
            xyz[1].to_bits(),
            xyz[2].to_bits(),
            0,
            0,
            intensity.to_bits(),
            0,
        ])
    }

    /// A sprite vertex quad; a, b, c complete, d as x/y only.
    pub fn sprite_vert(
        &mut self,
        a: [f32; 3],
        b: [f32; 3],
        c: [f32; 3],
        d_xy: [f32; 2],
        eos: bool,
    ) -> &mut Self {
        let pcw = (PARAM_VERTEX << 29) | ((eos as u32) << 28);
        self.words(&[
            pcw,
            a[0].to_bits(),
            a[1].to_bits(),
            a[2].to_bits(),
            b[0].to_bits(),
            b[1].to_bits(),
            b[2].to_bits(),
            c[0].to_bits(),
            c[1].to_bits(),
            c[2].to_bits(),
            d_xy[0].to_bits(),
            d_xy[1].to_bits(),
            0,
            0,
            0,
            0,
        ])
    }

    pub fn eol(&mut self) -> &mut Self {
        self.words(&[PARAM_END_OF_LIST << 29, 0, 0, 0, 0, 0, 0, 0])
    }

    pub fn build(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

pub fn isp(depth_mode: u32, cull_mode: u32, z_write_dis: bool) -> u32 {
    (depth_mode << 29) | (cull_mode << 27) | ((z_write_dis as u32) << 26)
}

pub fn tsp(src_instr: u32, dst_instr: u32, use_alpha: bool) -> u32 {
    (src_instr << 29) | (dst_instr << 26) | ((use_alpha as u32) << 20)
}

/// A capture around the given parameter stream, with an untextured
/// background plane at depth 0.1.
pub fn ta_context(params: Vec<u8>, autosort: bool) -> TaContext {
    let mut ctx = TaContext::default();
    ctx.params = params;
    ctx.autosort = autosort;

    let mut offset = 0;
    for (x, y) in [(0.0f32, 0.0f32), (0.0, 480.0), (640.0, 0.0)] {
        for word in [x.to_bits(), y.to_bits(), 0.1f32.to_bits(), 0xFF20_4060] {
            ctx.bg_vertices[offset..offset + 4].copy_from_slice(&word.to_le_bytes());
            offset += 4;
        }
    }

    ctx
}

/// Backend that records every call it sees.
#[derive(Default)]
pub struct RecordingBackend {
    pub begins: Vec<(u32, u32, usize, usize)>,
    pub draws: Vec<TaSurface>,
    pub ends: usize,
    pub created: u32,
    pub destroyed: Vec<TextureHandle>,
}

impl RenderBackend for RecordingBackend {
    fn create_texture(&mut self, _params: &TextureParams, _pixels: &[u8]) -> TextureHandle {
        self.created += 1;
        self.created
    }

    fn destroy_texture(&mut self, handle: TextureHandle) {
        self.destroyed.push(handle);
    }

    fn begin_ta_surfaces(&mut self, width: u32, height: u32, verts: &[TaVertex], indices: &[u32]) {
        self.begins.push((width, height, verts.len(), indices.len()));
    }

    fn draw_ta_surface(&mut self, surf: &TaSurface) {
        self.draws.push(*surf);
    }

    fn end_ta_surfaces(&mut self) {
        self.ends += 1;
    }
}

/// Cache for streams that never reference a texture.
pub struct NoTextures;

impl TextureCache for NoTextures {
    fn find_texture(&mut self, _tsp: TSP, _tcw: TCW) -> Option<TextureLookup<'_>> {
        None
    }
}

pub struct NoDecode;

impl PvrTexDecode for NoDecode {
    #[allow(clippy::too_many_arguments)]
    fn decode(
        &mut self,
        _src: &[u8],
        _width: u32,
        _height: u32,
        _stride: u32,
        _texture_fmt: TextureFmt,
        _pixel_fmt: PixelFmt,
        _palette: &[u8],
        _palette_fmt: PaletteFmt,
        _out: &mut [u8],
    ) {
    }
}

/// Run a full conversion of `ctx` with a recording backend.
pub fn convert(ctx: &TaContext) -> (TrContext, RecordingBackend) {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut rc = TrContext::new();
    let mut backend = RecordingBackend::default();
    let mut translator = Translator::new();
    translator.convert_context(&mut backend, &mut NoTextures, &mut NoDecode, ctx, &mut rc);

    (rc, backend)
}
