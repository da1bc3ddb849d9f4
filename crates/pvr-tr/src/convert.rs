//! The per-command state machine that turns a TA parameter stream into
//! surfaces and vertices.

use pvr_core::params::{self, ParamWords, PolyData, SpriteParam, VertexData};
use pvr_core::tex::PvrTexDecode;
use pvr_core::types::*;

use crate::backend::{BlendFunc, DepthFunc, RenderBackend, TextureCache};
use crate::context::{
    TaContext, TaSurface, TaVertex, TrContext, TR_MAX_PARAMS, TR_MAX_SURFS, TR_MAX_VERTS,
};
use crate::index::generate_indices;
use crate::sort::sort_surfaces;
use crate::texture::{convert_texture, DECODE_SCRATCH_BYTES};
use crate::translate::*;

/// Reusable conversion driver. Owns the texture decode scratch so repeated
/// conversions do not reallocate it.
pub struct Translator {
    scratch: Box<[u8]>,
}

impl Translator {
    pub fn new() -> Self {
        Self {
            scratch: vec![0; DECODE_SCRATCH_BYTES].into_boxed_slice(),
        }
    }

    /// Convert a captured TA context into a draw context. `rc` is fully
    /// reset first; on return it holds the sorted, indexed draw lists.
    pub fn convert_context(
        &mut self,
        r: &mut dyn RenderBackend,
        cache: &mut dyn TextureCache,
        decoder: &mut dyn PvrTexDecode,
        ctx: &TaContext,
        rc: &mut TrContext,
    ) {
        params::init_tables();

        let mut tr = Tr {
            r,
            cache,
            decoder,
            scratch: &mut self.scratch,
            last_vertex: None,
            list_type: TA_NUM_LISTS,
            vert_type: TA_NUM_VERTS,
            face_color: [0; 4],
            face_offset_color: [0; 4],
            sprite_color: [0; 4],
            sprite_offset_color: [0; 4],
        };

        rc.reset();
        rc.width = ctx.video_width;
        rc.height = ctx.video_height;

        tr.parse_bg(ctx, rc);

        let mut data = 0;
        let end = ctx.params.len();
        while data < end {
            assert!(end - data >= 4, "truncated parameter at offset {data}");
            let pcw = PCW(u32::from_le_bytes([
                ctx.params[data],
                ctx.params[data + 1],
                ctx.params[data + 2],
                ctx.params[data + 3],
            ]));

            if params::pcw_list_type_valid(pcw, tr.list_type) {
                tr.list_type = pcw.list_type();
            }

            let size = params::param_size(pcw, tr.vert_type);
            assert!(end - data >= size, "truncated parameter at offset {data}");
            let words = ParamWords::from_bytes(&ctx.params[data..data + size]);

            match pcw.para_type() {
                PARAM_END_OF_LIST => tr.parse_eol(),
                PARAM_USER_TILE_CLIP => {}
                PARAM_OBJ_LIST_SET => panic!("OBJ_LIST_SET parameters are not supported"),
                PARAM_POLY_OR_VOL | PARAM_SPRITE => tr.parse_poly_param(ctx, rc, &words),
                PARAM_VERTEX => tr.parse_vert_param(rc, &words),
                _ => {}
            }

            // parse trace for the debugger
            assert!(rc.num_params < TR_MAX_PARAMS, "parameter trace overflow");
            let rp = &mut rc.params[rc.num_params];
            rp.offset = data as u32;
            rp.list_type = tr.list_type;
            rp.vert_type = tr.vert_type;
            rp.last_surf = rc.num_surfs as i32 - 1;
            rp.last_vert = rc.num_verts as i32 - 1;
            rc.num_params += 1;

            data += size;
        }

        if ctx.autosort {
            sort_surfaces(rc, LIST_TRANSLUCENT);
            sort_surfaces(rc, LIST_PUNCH_THROUGH);
        }

        for list_type in 0..TA_NUM_LISTS {
            generate_indices(rc, list_type as usize);
        }
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new()
    }
}

/// Transient per-conversion state.
struct Tr<'a> {
    r: &'a mut dyn RenderBackend,
    cache: &'a mut dyn TextureCache,
    decoder: &'a mut dyn PvrTexDecode,
    scratch: &'a mut [u8],

    /// PCW of the previous vertex parameter, for strip-boundary detection.
    last_vertex: Option<PCW>,
    list_type: u32,
    vert_type: u32,

    // poly params
    face_color: [u8; 4],
    face_offset_color: [u8; 4],
    // sprite params
    sprite_color: [u8; 4],
    sprite_offset_color: [u8; 4],
}

/// Reserve the next surface without committing it. The reserved surface
/// lives at `rc.surfs[rc.num_surfs]` until committed or overwritten.
fn reserve_surf(rc: &mut TrContext, copy_from_prev: bool) -> usize {
    let surf_index = rc.num_surfs;
    assert!(surf_index < TR_MAX_SURFS, "surface buffer overflow");

    let template = if copy_from_prev {
        assert!(rc.num_surfs > 0);
        rc.surfs[rc.num_surfs - 1]
    } else {
        TaSurface::default()
    };

    rc.surfs[surf_index] = TaSurface {
        first_vert: rc.num_verts as u32,
        num_verts: 0,
        ..template
    };

    surf_index
}

/// Reserve the next vertex of the currently reserved surface.
fn reserve_vert(rc: &mut TrContext) -> usize {
    let curr_surf = rc.num_surfs;
    let vert_index = rc.num_verts + rc.surfs[curr_surf].num_verts as usize;
    assert!(vert_index < TR_MAX_VERTS, "vertex buffer overflow");

    rc.verts[vert_index] = TaVertex::default();
    rc.surfs[curr_surf].num_verts += 1;

    vert_index
}

/// Parse one background vertex, returning the offset of the next one. The
/// background encoding carries uv and offset-color fields only when the
/// background plane is textured / offset-shaded.
fn parse_bg_vert(ctx: &TaContext, rc: &mut TrContext, mut offset: usize, v: usize) -> usize {
    let word = |o: usize| {
        u32::from_le_bytes([
            ctx.bg_vertices[o],
            ctx.bg_vertices[o + 1],
            ctx.bg_vertices[o + 2],
            ctx.bg_vertices[o + 3],
        ])
    };

    let vert = &mut rc.verts[v];
    vert.xyz = [
        f32::from_bits(word(offset)),
        f32::from_bits(word(offset + 4)),
        f32::from_bits(word(offset + 8)),
    ];
    offset += 12;

    if ctx.bg_isp.texture() {
        vert.uv = [
            f32::from_bits(word(offset)),
            f32::from_bits(word(offset + 4)),
        ];
        offset += 8;
    }

    vert.color = color_word(packed_color(word(offset)));
    offset += 4;

    if ctx.bg_isp.offset() {
        vert.offset_color = color_word(packed_color(word(offset)));
        offset += 4;
    }

    offset
}

#[inline]
fn vec3_sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
fn vec3_cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
fn vec3_dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Normalize in place, returning the original length.
#[inline]
fn vec3_normalize(v: &mut [f32; 3]) -> f32 {
    let len = vec3_dot(*v, *v).sqrt();
    if len != 0.0 {
        v[0] /= len;
        v[1] /= len;
        v[2] /= len;
    }
    len
}

impl<'a> Tr<'a> {
    /// Commit the reserved surface to the current list.
    ///
    /// Translucent and punch-through strips are split into one surface per
    /// triangle so they can be depth sorted; the three vertex slots shared
    /// by adjacent triangles are kept addressable by advancing the vertex
    /// counter one slot per extra triangle and two at the end.
    fn commit_surf(&mut self, rc: &mut TrContext) {
        let list_type = self.list_type as usize;
        rc.lists[list_type].num_orig_surfs += 1;

        if self.list_type == LIST_TRANSLUCENT || self.list_type == LIST_PUNCH_THROUGH {
            let num_verts = rc.surfs[rc.num_surfs].num_verts as i64;

            for i in 0..(num_verts - 2).max(0) {
                let surf = if i == 0 {
                    rc.num_surfs
                } else {
                    reserve_surf(rc, true)
                };

                let s = &mut rc.surfs[surf];
                s.strip_offset = i as u32;
                s.first_vert = rc.num_verts as u32;
                s.num_verts = 3;

                let list = &mut rc.lists[list_type];
                list.surfs[list.num_surfs] = rc.num_surfs as u32;
                list.num_surfs += 1;

                rc.num_verts += 1;
                rc.num_surfs += 1;
            }

            // the last two verts close out the final triangle
            rc.num_verts += 2;
        } else {
            let list = &mut rc.lists[list_type];
            list.surfs[list.num_surfs] = rc.num_surfs as u32;
            list.num_surfs += 1;

            rc.num_verts += rc.surfs[rc.num_surfs].num_verts as usize;
            rc.num_surfs += 1;
        }
    }

    /// Synthesize the framebuffer-clearing background quad from the three
    /// vertices referenced by ISP_BACKGND_T.
    fn parse_bg(&mut self, ctx: &TaContext, rc: &mut TrContext) {
        self.list_type = LIST_OPAQUE;

        let surf = reserve_surf(rc, false);
        let texture = if ctx.bg_isp.texture() {
            convert_texture(
                self.r,
                self.cache,
                self.decoder,
                self.scratch,
                ctx,
                ctx.bg_tsp,
                ctx.bg_tcw,
            )
        } else {
            0
        };

        {
            let p = &mut rc.surfs[surf].params;
            p.set_texture(texture);
            p.set_depth_write(!ctx.bg_isp.z_write_dis());
            p.set_depth_func(translate_depth_func(ctx.bg_isp.depth_mode()) as u32);
            p.set_cull(translate_cull(ctx.bg_isp.cull_mode()) as u32);
            p.set_src_blend(BlendFunc::None as u32);
            p.set_dst_blend(BlendFunc::None as u32);
        }

        let va = reserve_vert(rc);
        let vb = reserve_vert(rc);
        let vc = reserve_vert(rc);
        let vd = reserve_vert(rc);

        let mut offset = 0;
        offset = parse_bg_vert(ctx, rc, offset, va);
        offset = parse_bg_vert(ctx, rc, offset, vb);
        parse_bg_vert(ctx, rc, offset, vc);

        // TODO honour ISP_BACKGND_D: the plane depth should replace the
        // parsed z values, but no known capture exercises it with texturing
        // to confirm how the uvs behave

        // the fourth corner is not supplied; extend the parallelogram
        let (a, b, c) = (rc.verts[va], rc.verts[vb], rc.verts[vc]);
        let d = &mut rc.verts[vd];
        for i in 0..3 {
            d.xyz[i] = b.xyz[i] + (b.xyz[i] - a.xyz[i]) + (c.xyz[i] - a.xyz[i]);
        }
        for i in 0..2 {
            d.uv[i] = b.uv[i] + (b.uv[i] - a.uv[i]) + (c.uv[i] - a.uv[i]);
        }
        d.color = a.color;
        d.offset_color = a.offset_color;

        self.commit_surf(rc);

        self.list_type = TA_NUM_LISTS;
    }

    fn parse_eol(&mut self) {
        log::trace!("end of list {}", self.list_type);
        self.last_vertex = None;
        self.list_type = TA_NUM_LISTS;
        self.vert_type = TA_NUM_VERTS;
    }

    fn parse_poly_param(&mut self, ctx: &TaContext, rc: &mut TrContext, words: &ParamWords) {
        let pcw = words.pcw();

        // reset state
        self.last_vertex = None;
        self.vert_type = params::vert_type(pcw);

        let param = params::decode_poly(words)
            .unwrap_or_else(|| panic!("unsupported poly type {}", params::poly_type(pcw)));

        match param.data {
            PolyData::Plain => {}
            PolyData::FaceColor(base) => {
                self.face_color = float_color(base);
            }
            PolyData::FaceColors { base, offset } => {
                self.face_color = float_color(base);
                self.face_offset_color = float_color(offset);
            }
            PolyData::SpriteColors { base, offset } => {
                self.sprite_color = packed_color(base);
                self.sprite_offset_color = packed_color(offset);
            }
            PolyData::ModifierVolume => {
                // TODO render modifier volumes instead of dropping them
                log::trace!("skipping modifier volume global parameter");
                return;
            }
        }

        // bits 0-3 of the pcw override the matching isp/tsp bits, so the
        // pcw is authoritative for uv_16bit/gouraud/offset/texture
        let surf = reserve_surf(rc, false);
        let texture = if pcw.texture() {
            convert_texture(
                self.r,
                self.cache,
                self.decoder,
                self.scratch,
                ctx,
                param.tsp,
                param.tcw,
            )
        } else {
            0
        };

        let p = &mut rc.surfs[surf].params;
        p.set_depth_write(!param.isp.z_write_dis());
        p.set_depth_func(translate_depth_func(param.isp.depth_mode()) as u32);
        p.set_cull(translate_cull(param.isp.cull_mode()) as u32);
        p.set_src_blend(translate_src_blend_func(param.tsp.src_instr()) as u32);
        p.set_dst_blend(translate_dst_blend_func(param.tsp.dst_instr()) as u32);
        p.set_shade(translate_shade_mode(param.tsp.shad_instr()) as u32);
        p.set_ignore_alpha(!param.tsp.use_alpha());
        p.set_ignore_texture_alpha(param.tsp.ignore_tex_a());
        p.set_offset_color(pcw.offset());
        p.set_alpha_test(self.list_type == LIST_PUNCH_THROUGH);
        p.set_alpha_ref(ctx.alpha_ref);

        // per-list overrides: only translucent geometry blends, autosorted
        // translucency draws ties, punch-through draws front to back
        if self.list_type != LIST_TRANSLUCENT && self.list_type != LIST_TRANSLUCENT_MODVOL {
            p.set_src_blend(BlendFunc::None as u32);
            p.set_dst_blend(BlendFunc::None as u32);
        } else if ctx.autosort {
            p.set_depth_func(DepthFunc::Lequal as u32);
        }
        if self.list_type == LIST_PUNCH_THROUGH {
            p.set_depth_func(DepthFunc::Gequal as u32);
        }

        p.set_texture(texture);
    }

    fn parse_vert_param(&mut self, rc: &mut TrContext, words: &ParamWords) {
        let pcw = words.pcw();

        if self.vert_type == VERT_MODVOL {
            log::trace!("skipping modifier volume vertex");
            return;
        }

        // a vertex for the next polygon may follow an end-of-strip vertex
        // directly, without the global parameters being reissued
        if matches!(self.last_vertex, Some(last) if last.end_of_strip()) {
            reserve_surf(rc, true);
        }
        self.last_vertex = Some(pcw);

        let data = params::decode_vertex(words, self.vert_type)
            .unwrap_or_else(|| panic!("unsupported vertex type {}", self.vert_type));

        match data {
            VertexData::Packed { xyz, base_color } => {
                let v = reserve_vert(rc);
                let vert = &mut rc.verts[v];
                vert.xyz = xyz;
                vert.color = color_word(packed_color(base_color));
            }

            VertexData::FloatColor { xyz, base_color } => {
                let v = reserve_vert(rc);
                let vert = &mut rc.verts[v];
                vert.xyz = xyz;
                vert.color = color_word(float_color(base_color));
            }

            VertexData::Intensity {
                xyz,
                base_intensity,
            } => {
                let v = reserve_vert(rc);
                let vert = &mut rc.verts[v];
                vert.xyz = xyz;
                vert.color = color_word(intensity_color(self.face_color, base_intensity));
            }

            VertexData::TexturedPacked {
                xyz,
                uv,
                base_color,
                offset_color,
            } => {
                let v = reserve_vert(rc);
                let vert = &mut rc.verts[v];
                vert.xyz = xyz;
                vert.uv = uv;
                vert.color = color_word(packed_color(base_color));
                vert.offset_color = color_word(packed_color(offset_color));
            }

            VertexData::TexturedFloat {
                xyz,
                uv,
                base_color,
                offset_color,
            } => {
                let v = reserve_vert(rc);
                let vert = &mut rc.verts[v];
                vert.xyz = xyz;
                vert.uv = uv;
                vert.color = color_word(float_color(base_color));
                vert.offset_color = color_word(float_color(offset_color));
            }

            VertexData::TexturedIntensity {
                xyz,
                uv,
                base_intensity,
                offset_intensity,
            } => {
                let v = reserve_vert(rc);
                let vert = &mut rc.verts[v];
                vert.xyz = xyz;
                vert.uv = uv;
                vert.color = color_word(intensity_color(self.face_color, base_intensity));
                vert.offset_color =
                    color_word(intensity_color(self.face_offset_color, offset_intensity));
            }

            VertexData::Sprite(sprite) => {
                if !self.parse_sprite(rc, pcw, &sprite) {
                    // degenerate quad; the reserved surface is abandoned
                    return;
                }
            }

            VertexData::ModifierVolume => return,
        }

        // a polygon's final vertex must carry end of strip; that is what
        // commits the surface
        if pcw.end_of_strip() {
            self.commit_surf(rc);
        }
    }

    /// Expand a sprite quad into strip order and solve the unsupplied
    /// fourth corner. Returns false when the quad is degenerate or edge-on
    /// and should be dropped.
    fn parse_sprite(&mut self, rc: &mut TrContext, pcw: PCW, sprite: &SpriteParam) -> bool {
        assert!(pcw.end_of_strip(), "sprite quad without end of strip");

        // sprites arrive a, b, c, d clockwise around the quad, with z and
        // uv missing from d:
        //
        //   b (x,y,z,u,v) ---> c (x,y,z,u,v)
        //         ^                  |
        //         |                  v
        //   a (x,y,z,u,v) <--- d (x,y)
        //
        // emitted a, b, d, c so the quad is a strip like everything else
        let color = color_word(self.sprite_color);
        let offset_color = color_word(self.sprite_offset_color);

        let va = reserve_vert(rc);
        let vb = reserve_vert(rc);
        let vd = reserve_vert(rc);
        let vc = reserve_vert(rc);

        for (v, i) in [(va, 0), (vb, 1), (vc, 2)] {
            let vert = &mut rc.verts[v];
            vert.xyz = sprite.xyz[i];
            vert.uv = sprite.uv[i];
            vert.color = color;
            vert.offset_color = offset_color;
        }

        {
            let vert = &mut rc.verts[vd];
            vert.xyz = [sprite.d_xy[0], sprite.d_xy[1], 0.0];
            vert.color = color;
            vert.offset_color = offset_color;
        }

        // the quad's plane from the three complete corners
        let a = rc.verts[va].xyz;
        let b = rc.verts[vb].xyz;
        let c = rc.verts[vc].xyz;
        let mut n = vec3_cross(vec3_sub(a, b), vec3_sub(c, b));
        let len = vec3_normalize(&mut n);
        let d_plane = vec3_dot(n, b);

        if len == 0.0 || n[2] == 0.0 {
            log::debug!("dropping degenerate or edge-on sprite quad");
            return false;
        }

        // dot(n, p) = d for every point on the plane; solve for d's z
        let d = &mut rc.verts[vd];
        d.xyz[2] = (d_plane - n[0] * d.xyz[0] - n[1] * d.xyz[1]) / n[2];

        // complete the uv parallelogram
        let (ua, ub, uc) = (rc.verts[va].uv, rc.verts[vb].uv, rc.verts[vc].uv);
        let d = &mut rc.verts[vd];
        for i in 0..2 {
            d.uv[i] = ub[i] + (ua[i] - ub[i]) + (uc[i] - ub[i]);
        }

        true
    }
}
