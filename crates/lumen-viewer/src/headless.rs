//! Windowless run against the recording backend.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};

use lumen_engine::gfx::{GraphicsContext, RecordingContext};
use lumen_engine::window::FrameRequests;

use crate::application::{AppSettings, Application};
use crate::shaders::ShaderSources;

/// Simulated host frame period.
pub const HOST_FRAME: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct HeadlessReport {
    pub host_frames: u32,
    pub frames_presented: u64,
    pub draws: usize,
    pub rejected_draws: usize,
    /// Backend objects still alive after teardown.
    pub leaked: usize,
}

impl fmt::Display for HeadlessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} host frames, {} presented, {} draws ({} rejected), {} leaked resources",
            self.host_frames, self.frames_presented, self.draws, self.rejected_draws, self.leaked
        )
    }
}

/// Delivers `host_frames` frames [`HOST_FRAME`] apart to a running application.
pub fn run(sources: &ShaderSources, settings: AppSettings, host_frames: u32) -> Result<HeadlessReport> {
    let mut ctx = RecordingContext::new();
    let mut host = FrameRequests::default();
    let mut app = Application::new(settings);

    app.initialize(&mut ctx, sources)
        .context("viewer initialization failed")?;
    app.run(&mut host);

    let mut now = Duration::ZERO;
    for _ in 0..host_frames {
        let due = host.take_due(now);
        for &token in &due {
            app.on_tick(&mut ctx, &mut host, token, now)
                .context("headless frame failed")?;
        }
        host.recycle(due);
        now += HOST_FRAME;
    }

    let frames_presented = ctx.frames_presented();
    let draws = ctx.draws().count();
    app.teardown(&mut ctx, &mut host);

    Ok(HeadlessReport {
        host_frames,
        frames_presented,
        draws,
        rejected_draws: ctx.rejected_draws(),
        leaked: ctx.live_resources(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttles_to_the_interval_and_leaks_nothing() {
        // 0 .. 144 ms at 16 ms; 60 ms interval fires at 0, 64 and 128.
        let report = run(&ShaderSources::builtin(), AppSettings::default(), 10).unwrap();
        assert_eq!(report.frames_presented, 3);
        assert_eq!(report.draws, 3);
        assert_eq!(report.rejected_draws, 0);
        assert_eq!(report.leaked, 0);
    }

    #[test]
    fn zero_interval_renders_every_frame() {
        let settings = AppSettings {
            interval: Duration::ZERO,
            ..AppSettings::default()
        };
        let report = run(&ShaderSources::builtin(), settings, 5).unwrap();
        assert_eq!(report.frames_presented, 5);
    }

    #[test]
    fn broken_sources_fail_the_run() {
        let sources = ShaderSources {
            vertex: "@vertex fn vs_main( -> {".into(),
            ..ShaderSources::builtin()
        };
        let err = run(&sources, AppSettings::default(), 3).unwrap_err();
        assert!(format!("{err:#}").contains("viewer initialization failed"));
    }
}
