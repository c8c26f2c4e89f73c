//! The windowed viewer: drives [`Application`] from the runtime callbacks.

use lumen_engine::core::{App, AppControl, AppCtx, FrameCtx};
use lumen_engine::device::Gpu;
use lumen_engine::gfx::GfxError;
use lumen_engine::input::{Key, KeyEvent};
use lumen_engine::time::{FrameHost, Tick};
use lumen_engine::window::RuntimeCtx;

use crate::application::{AppSettings, Application};
use crate::shaders::ShaderSources;

pub struct ViewerApp {
    app: Application,
    sources: ShaderSources,
    /// A key changed what is on screen since the last frame.
    dirty: bool,
}

impl ViewerApp {
    pub fn new(sources: ShaderSources, settings: AppSettings) -> Self {
        Self {
            app: Application::new(settings),
            sources,
            dirty: false,
        }
    }

    fn title(&self) -> String {
        format!("lumen viewer: {}", self.app.render_mode())
    }
}

fn key_identifier(event: &KeyEvent) -> Option<char> {
    match event.key {
        Key::Tab => Some('\t'),
        _ => event.identifier(),
    }
}

/// A lost surface ends the run; other frame errors are logged.
fn on_gfx_error(runtime: &mut RuntimeCtx, e: GfxError) -> AppControl {
    match e {
        GfxError::SurfaceLost => {
            runtime.fail(anyhow::Error::new(e).context("rendering stopped"));
            AppControl::Exit
        }
        e => {
            log::error!("frame failed: {e}");
            AppControl::Continue
        }
    }
}

impl App for ViewerApp {
    fn on_start(&mut self, ctx: &mut AppCtx<'_, '_>) -> AppControl {
        if let Err(e) = self.app.initialize(&mut *ctx.gpu, &self.sources) {
            ctx.runtime
                .fail(anyhow::Error::new(e).context("viewer initialization failed"));
            return AppControl::Exit;
        }
        ctx.window.set_title(&self.title());
        self.app.run(&mut *ctx.frames);
        AppControl::Continue
    }

    fn on_key(&mut self, ctx: &mut AppCtx<'_, '_>, key: &KeyEvent) -> AppControl {
        if !key.is_press() {
            return AppControl::Continue;
        }

        if key.key == Key::Escape {
            self.app.teardown(&mut *ctx.gpu, &mut *ctx.frames);
            return AppControl::Exit;
        }

        if let Some(c) = key_identifier(key) {
            if self.app.handle_key(&mut *ctx.gpu, c) {
                self.dirty = true;
                ctx.window.set_title(&self.title());
                ctx.frames.request_frame();
            }
        }
        AppControl::Continue
    }

    fn on_resize(&mut self, ctx: &mut AppCtx<'_, '_>, width: u32, height: u32) -> AppControl {
        match self.app.resize(&mut *ctx.gpu, width, height) {
            Ok(()) => AppControl::Continue,
            Err(e) => on_gfx_error(ctx.runtime, e),
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let now = ctx.time.elapsed;
        let mut rendered = false;

        for &token in ctx.due {
            match self.app.on_tick(&mut *ctx.gpu, &mut *ctx.frames, token, now) {
                Ok(Tick::Fired) => rendered = true,
                Ok(_) => {}
                Err(e) => return on_gfx_error(ctx.runtime, e),
            }
        }

        // Key changes and platform repaints are not throttled.
        if !rendered && (self.dirty || ctx.due.is_empty()) {
            if let Err(e) = self.app.render(&mut *ctx.gpu) {
                return on_gfx_error(ctx.runtime, e);
            }
        }
        self.dirty = false;
        AppControl::Continue
    }

    fn on_exit(&mut self, gpu: &mut Gpu<'_>) {
        self.app.release(gpu);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_engine::input::KeyState;

    fn press(key: Key, text: Option<&str>) -> KeyEvent {
        KeyEvent {
            key,
            state: KeyState::Pressed,
            code: 0,
            repeat: false,
            text: text.map(str::to_owned),
        }
    }

    #[test]
    fn tab_is_reported_as_tab_character() {
        assert_eq!(key_identifier(&press(Key::Tab, None)), Some('\t'));
    }

    #[test]
    fn printable_keys_use_their_text() {
        assert_eq!(key_identifier(&press(Key::Char('8'), Some("*"))), Some('*'));
        assert_eq!(key_identifier(&press(Key::Enter, None)), None);
    }

    #[test]
    fn title_names_the_active_mode() {
        let viewer = ViewerApp::new(ShaderSources::builtin(), AppSettings::default());
        assert_eq!(viewer.title(), "lumen viewer: Triangles");
    }
}
