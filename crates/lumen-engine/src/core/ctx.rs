use winit::window::Window;

use crate::device::Gpu;
use crate::time::{FrameTime, FrameToken};
use crate::window::{FrameRequests, RuntimeCtx};

/// Per-window handles.
pub struct WindowCtx<'a> {
    pub window: &'a Window,
}

impl WindowCtx<'_> {
    pub fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }
}

/// Context for callbacks outside a frame.
pub struct AppCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub frames: &'a mut FrameRequests,
    pub runtime: &'a mut RuntimeCtx,
}

/// Context passed to `App::on_frame`.
///
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub time: FrameTime,
    /// Requests this frame answers, in request order.
    pub due: &'a [FrameToken],
    pub frames: &'a mut FrameRequests,
    pub runtime: &'a mut RuntimeCtx,
}
