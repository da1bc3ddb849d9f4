//! Interfaces to the render backend and the texture cache.

use pvr_core::tex::TextureFmt;
use pvr_core::types::{TCW, TSP};

use crate::context::{TaSurface, TaVertex};

/// Backend texture handle; 0 means no texture.
pub type TextureHandle = u32;

#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DepthFunc {
    Never = 0,
    Greater,
    Equal,
    Gequal,
    Less,
    Nequal,
    Lequal,
    Always,
}

impl DepthFunc {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => DepthFunc::Never,
            1 => DepthFunc::Greater,
            2 => DepthFunc::Equal,
            3 => DepthFunc::Gequal,
            4 => DepthFunc::Less,
            5 => DepthFunc::Nequal,
            6 => DepthFunc::Lequal,
            _ => DepthFunc::Always,
        }
    }
}

#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CullFace {
    None = 0,
    Back,
    Front,
}

impl CullFace {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => CullFace::None,
            1 => CullFace::Back,
            _ => CullFace::Front,
        }
    }
}

#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlendFunc {
    None = 0,
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
}

impl BlendFunc {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => BlendFunc::None,
            1 => BlendFunc::Zero,
            2 => BlendFunc::One,
            3 => BlendFunc::SrcColor,
            4 => BlendFunc::OneMinusSrcColor,
            5 => BlendFunc::DstColor,
            6 => BlendFunc::OneMinusDstColor,
            7 => BlendFunc::SrcAlpha,
            8 => BlendFunc::OneMinusSrcAlpha,
            9 => BlendFunc::DstAlpha,
            _ => BlendFunc::OneMinusDstAlpha,
        }
    }
}

#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShadeMode {
    Decal = 0,
    Modulate,
    DecalAlpha,
    ModulateAlpha,
}

impl ShadeMode {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => ShadeMode::Decal,
            1 => ShadeMode::Modulate,
            2 => ShadeMode::DecalAlpha,
            _ => ShadeMode::ModulateAlpha,
        }
    }
}

#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FilterMode {
    Nearest = 0,
    Bilinear,
}

#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WrapMode {
    Repeat = 0,
    ClampToEdge,
    MirroredRepeat,
}

/// Sampling state for a backend texture upload.
#[derive(Copy, Clone, Debug)]
pub struct TextureParams {
    pub filter: FilterMode,
    pub wrap_u: WrapMode,
    pub wrap_v: WrapMode,
    pub mipmaps: bool,
    pub width: u32,
    pub height: u32,
}

/// The render backend that consumes a converted context. Uploaded pixels
/// are RGBA8888.
pub trait RenderBackend {
    fn create_texture(&mut self, params: &TextureParams, pixels: &[u8]) -> TextureHandle;
    fn destroy_texture(&mut self, handle: TextureHandle);

    fn begin_ta_surfaces(&mut self, width: u32, height: u32, verts: &[TaVertex], indices: &[u32]);
    fn draw_ta_surface(&mut self, surf: &TaSurface);
    fn end_ta_surfaces(&mut self);
}

/// A texture cache entry. The translator creates and destroys the backend
/// handle and writes back what it uploaded.
#[derive(Copy, Clone, Debug)]
pub struct TrTexture {
    pub handle: TextureHandle,
    pub dirty: bool,

    // written back on conversion
    pub filter: FilterMode,
    pub wrap_u: WrapMode,
    pub wrap_v: WrapMode,
    pub format: TextureFmt,
    pub width: u32,
    pub height: u32,
}

impl Default for TrTexture {
    fn default() -> Self {
        Self {
            handle: 0,
            dirty: false,
            filter: FilterMode::Nearest,
            wrap_u: WrapMode::Repeat,
            wrap_v: WrapMode::Repeat,
            format: TextureFmt::Twiddled,
            width: 0,
            height: 0,
        }
    }
}

/// A successful cache lookup: the mutable entry plus the raw texture and
/// palette bytes to decode from.
pub struct TextureLookup<'a> {
    pub entry: &'a mut TrTexture,
    pub texture: &'a [u8],
    pub palette: &'a [u8],
}

/// The external texture cache. Entries are keyed on the raw (tsp, tcw)
/// pair; a miss is fatal to the conversion.
pub trait TextureCache {
    fn find_texture(&mut self, tsp: TSP, tcw: TCW) -> Option<TextureLookup<'_>>;
}
