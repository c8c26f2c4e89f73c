//! Contracts between the window runtime and the application layer.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{AppCtx, FrameCtx, WindowCtx};
