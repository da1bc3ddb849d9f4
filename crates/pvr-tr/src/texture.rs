//! On-demand texture binding through the cache and the external decoder.

use pvr_core::tex::{self, PixelFmt, PvrTexDecode};
use pvr_core::types::{TCW, TSP};

use crate::backend::{FilterMode, RenderBackend, TextureCache, TextureHandle, TextureParams, WrapMode};
use crate::context::TaContext;

/// Decode scratch, large enough for a 1024x1024 RGBA texture.
pub(crate) const DECODE_SCRATCH_BYTES: usize = 1024 * 1024 * 4;

/// Map a (tsp, tcw) pair to a backend texture, decoding and uploading on a
/// miss or a dirty entry.
pub(crate) fn convert_texture(
    r: &mut dyn RenderBackend,
    cache: &mut dyn TextureCache,
    decoder: &mut dyn PvrTexDecode,
    scratch: &mut [u8],
    ctx: &TaContext,
    tsp: TSP,
    tcw: TCW,
) -> TextureHandle {
    // TODO entries are keyed purely on (tsp, tcw) even though TEXT_CONTROL
    // and PAL_RAM_CTRL feed the decode; matching words with different
    // palette state will incorrectly hit
    let lookup = cache
        .find_texture(tsp, tcw)
        .unwrap_or_else(|| panic!("no cache entry for texture {:08x}/{:08x}", tsp.full(), tcw.full()));
    let entry = lookup.entry;

    if entry.handle != 0 && !entry.dirty {
        return entry.handle;
    }

    // a dirty handle is stale; release it before uploading the replacement
    if entry.handle != 0 && entry.dirty {
        r.destroy_texture(entry.handle);
        entry.handle = 0;
    }

    let texture_fmt = tex::texture_format(tcw);
    let mipmaps = tex::texture_mipmaps(tcw);
    let width = tex::texture_width(tsp);
    let height = tex::texture_height(tsp);
    let stride = tex::texture_stride(tcw, ctx.stride);

    decoder.decode(
        lookup.texture,
        width,
        height,
        stride,
        texture_fmt,
        PixelFmt::from_u32(tcw.pixel_fmt()),
        lookup.palette,
        ctx.palette_fmt,
        scratch,
    );

    // trilinear modes collapse to bilinear
    let filter = if tsp.filter_mode() == 0 {
        FilterMode::Nearest
    } else {
        FilterMode::Bilinear
    };
    let wrap_u = if tsp.clamp_u() {
        WrapMode::ClampToEdge
    } else if tsp.flip_u() {
        WrapMode::MirroredRepeat
    } else {
        WrapMode::Repeat
    };
    let wrap_v = if tsp.clamp_v() {
        WrapMode::ClampToEdge
    } else if tsp.flip_v() {
        WrapMode::MirroredRepeat
    } else {
        WrapMode::Repeat
    };

    let params = TextureParams {
        filter,
        wrap_u,
        wrap_v,
        mipmaps,
        width,
        height,
    };
    entry.handle = r.create_texture(&params, scratch);
    entry.filter = filter;
    entry.wrap_u = wrap_u;
    entry.wrap_v = wrap_v;
    entry.format = texture_fmt;
    entry.width = width;
    entry.height = height;
    entry.dirty = false;

    log::debug!(
        "uploaded {}x{} {:?} texture as handle {}",
        width,
        height,
        texture_fmt,
        entry.handle
    );

    entry.handle
}
