//! PowerVR2 Tile Accelerator parameter format library.
//!
//! Everything needed to make sense of a raw TA parameter stream: the
//! hardware instruction words, parameter classification and sizing, typed
//! parameter decoding, and the texture-word helpers consumed by the
//! translator and the texture decoder.

pub mod params;
pub mod tex;
pub mod types;
