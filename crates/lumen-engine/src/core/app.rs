use crate::device::Gpu;
use crate::input::KeyEvent;

use super::ctx::{AppCtx, FrameCtx};

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
///
/// Frames are delivered only after a request through
/// [`FrameCtx::frames`]/[`AppCtx::frames`], or when the platform asks for a
/// repaint (in which case [`FrameCtx::due`] is empty).
pub trait App {
    /// Called once per window, after its GPU context is ready.
    fn on_start(&mut self, ctx: &mut AppCtx<'_, '_>) -> AppControl {
        let _ = ctx;
        AppControl::Continue
    }

    /// Called for every key press and release.
    fn on_key(&mut self, ctx: &mut AppCtx<'_, '_>, event: &KeyEvent) -> AppControl {
        let _ = (ctx, event);
        AppControl::Continue
    }

    /// Called after the surface has been reconfigured for a new physical size.
    fn on_resize(&mut self, ctx: &mut AppCtx<'_, '_>, width: u32, height: u32) -> AppControl {
        let _ = (ctx, width, height);
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Called once per window before its GPU context is dropped.
    fn on_exit(&mut self, gpu: &mut Gpu<'_>) {
        let _ = gpu;
    }
}
