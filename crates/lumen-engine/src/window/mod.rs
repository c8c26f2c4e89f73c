//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and windows, and wires them to the GPU layer.

mod frames;
mod runtime;

pub use frames::FrameRequests;
pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
