//! lumen engine crate.
//!
//! Shader programs, GPU geometry and an interval-throttled animation loop on
//! top of a [`gfx::GraphicsContext`], with a wgpu backend bound to a winit
//! window and a headless recording backend.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod paint;
pub mod gfx;
pub mod program;
pub mod geometry;
