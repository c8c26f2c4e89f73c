//! Color model used for clear colors and diagnostics.
//!
//! Colors are straight-alpha RGBA with `f32` channels in `[0, 1]`, the same
//! representation the graphics context stores for its clear value.

pub mod color;

pub use color::{channel_to_hex, Color};
