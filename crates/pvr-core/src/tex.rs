//! Texture word helpers and the external decoder interface.

use crate::types::{TCW, TSP};

/// Pixel formats in TCW bits 29:27.
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PixelFmt {
    Argb1555 = 0,
    Rgb565 = 1,
    Argb4444 = 2,
    Yuv422 = 3,
    Bumpmap = 4,
    Pal4 = 5,
    Pal8 = 6,
    Reserved = 7,
}

impl PixelFmt {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => PixelFmt::Argb1555,
            1 => PixelFmt::Rgb565,
            2 => PixelFmt::Argb4444,
            3 => PixelFmt::Yuv422,
            4 => PixelFmt::Bumpmap,
            5 => PixelFmt::Pal4,
            6 => PixelFmt::Pal8,
            _ => PixelFmt::Reserved,
        }
    }
}

/// Palette entry formats from PAL_RAM_CTRL.
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PaletteFmt {
    Argb1555 = 0,
    Rgb565 = 1,
    Argb4444 = 2,
    Argb8888 = 3,
}

impl PaletteFmt {
    pub fn from_u32(value: u32) -> Self {
        match value & 3 {
            0 => PaletteFmt::Argb1555,
            1 => PaletteFmt::Rgb565,
            2 => PaletteFmt::Argb4444,
            _ => PaletteFmt::Argb8888,
        }
    }
}

/// Storage layout of a texture in texture memory.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TextureFmt {
    Twiddled,
    TwiddledMipmaps,
    Vq,
    VqMipmaps,
    Palette4Bpp,
    Palette4BppMipmaps,
    Palette8Bpp,
    Palette8BppMipmaps,
    Bitmap,
}

/// Texture dimensions come from the TSP size fields, 8..=1024 in powers of
/// two.
#[inline]
pub fn texture_width(tsp: TSP) -> u32 {
    8 << tsp.tex_u()
}

#[inline]
pub fn texture_height(tsp: TSP) -> u32 {
    8 << tsp.tex_v()
}

#[inline]
pub fn texture_mipmaps(tcw: TCW) -> bool {
    tcw.mip_mapped()
}

/// Row stride in pixels for stride textures, 0 when the texture is not
/// stride-addressed. `stride_reg` is the TEXT_CONTROL stride field, in
/// 32-pixel units.
#[inline]
pub fn texture_stride(tcw: TCW, stride_reg: u32) -> u32 {
    if tcw.stride_sel() && tcw.scan_order() {
        (stride_reg & 0x1F) << 5
    } else {
        0
    }
}

fn twiddled(tcw: TCW) -> bool {
    let fmt = PixelFmt::from_u32(tcw.pixel_fmt());
    !tcw.scan_order() || fmt == PixelFmt::Pal4 || fmt == PixelFmt::Pal8
}

/// Classify the storage layout from the TCW. Paletted formats are always
/// twiddled; VQ wins over plain twiddling; anything left is a raster
/// bitmap.
pub fn texture_format(tcw: TCW) -> TextureFmt {
    let mipmaps = tcw.mip_mapped();

    match PixelFmt::from_u32(tcw.pixel_fmt()) {
        PixelFmt::Pal4 => {
            if mipmaps {
                TextureFmt::Palette4BppMipmaps
            } else {
                TextureFmt::Palette4Bpp
            }
        }
        PixelFmt::Pal8 => {
            if mipmaps {
                TextureFmt::Palette8BppMipmaps
            } else {
                TextureFmt::Palette8Bpp
            }
        }
        _ => match (tcw.vq_comp(), twiddled(tcw), mipmaps) {
            (true, _, true) => TextureFmt::VqMipmaps,
            (true, _, false) => TextureFmt::Vq,
            (false, true, true) => TextureFmt::TwiddledMipmaps,
            (false, true, false) => TextureFmt::Twiddled,
            (false, false, _) => TextureFmt::Bitmap,
        },
    }
}

/// External PVR texture decoder. Implementations expand twiddled, VQ
/// compressed and paletted texture memory into RGBA8888 in `out`.
pub trait PvrTexDecode {
    #[allow(clippy::too_many_arguments)]
    fn decode(
        &mut self,
        src: &[u8],
        width: u32,
        height: u32,
        stride: u32,
        texture_fmt: TextureFmt,
        pixel_fmt: PixelFmt,
        palette: &[u8],
        palette_fmt: PaletteFmt,
        out: &mut [u8],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions() {
        let mut tsp = TSP(0);
        tsp.set_tex_u(3);
        tsp.set_tex_v(0);
        assert_eq!(texture_width(tsp), 64);
        assert_eq!(texture_height(tsp), 8);

        tsp.set_tex_u(7);
        tsp.set_tex_v(7);
        assert_eq!(texture_width(tsp), 1024);
        assert_eq!(texture_height(tsp), 1024);
    }

    #[test]
    fn stride_requires_raster_order() {
        let mut tcw = TCW(0);
        tcw.set_stride_sel(true);
        assert_eq!(texture_stride(tcw, 20), 0);

        tcw.set_scan_order(true);
        assert_eq!(texture_stride(tcw, 20), 640);
    }

    #[test]
    fn format_classification() {
        // twiddled 565
        let mut tcw = TCW(0);
        tcw.set_pixel_fmt(1);
        assert_eq!(texture_format(tcw), TextureFmt::Twiddled);

        tcw.set_mip_mapped(true);
        assert_eq!(texture_format(tcw), TextureFmt::TwiddledMipmaps);

        tcw.set_mip_mapped(false);
        tcw.set_vq_comp(true);
        assert_eq!(texture_format(tcw), TextureFmt::Vq);

        tcw.set_vq_comp(false);
        tcw.set_scan_order(true);
        assert_eq!(texture_format(tcw), TextureFmt::Bitmap);

        // paletted formats twiddle regardless of scan order
        tcw.set_pixel_fmt(5);
        assert_eq!(texture_format(tcw), TextureFmt::Palette4Bpp);
        tcw.set_pixel_fmt(6);
        tcw.set_mip_mapped(true);
        assert_eq!(texture_format(tcw), TextureFmt::Palette8BppMipmaps);
    }
}
