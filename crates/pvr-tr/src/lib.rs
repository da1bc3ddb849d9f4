//! PowerVR2 TA display-list translation.
//!
//! Parses a captured TA parameter stream into a renderer-ready draw context:
//! surfaces carrying packed draw state, a shared vertex pool, and CCW
//! triangle indices. Translucent and punch-through geometry is split per
//! triangle so it can be depth sorted; adjacent surfaces with identical
//! draw state are merged into single draw calls.

pub mod backend;
pub mod context;
pub mod convert;
pub mod render;
pub mod translate;

mod index;
mod sort;
mod texture;

pub use backend::{RenderBackend, TextureCache, TextureHandle};
pub use context::{TaContext, TrContext};
pub use convert::Translator;
pub use render::{render_context, render_context_until};
