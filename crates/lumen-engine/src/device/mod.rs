//! wgpu backend.
//!
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating and configuring the window surface
//! - implementing [`GraphicsContext`](crate::gfx::GraphicsContext) on top of them

mod context;
mod error;
mod gpu;
mod init;
mod pipeline;
mod surface;

pub use error::SurfaceErrorAction;
pub use gpu::Gpu;
pub use init::GpuInit;
