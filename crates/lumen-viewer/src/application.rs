//! The rendering-modes application: one shader program, one trapezoid and a
//! switchable render mode, redrawn by an interval-throttled scheduler.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use thiserror::Error;

use lumen_engine::geometry::{GeometryError, GeometryResource};
use lumen_engine::gfx::{GfxError, GraphicsContext};
use lumen_engine::paint::Color;
use lumen_engine::program::{build_program, AttributeLocationTable, LinkedProgram, ProgramError};
use lumen_engine::time::{AnimationScheduler, FrameHost, FrameToken, Tick};

use crate::keys::{action_for, KeyAction};
use crate::render_mode::{RenderMode, RenderModeRegistry};
use crate::shaders::ShaderSources;

/// Attribute the vertex stage must declare.
pub const POSITION_ATTRIBUTE: &str = "vertexPosition";

/// Five `vec3` positions outlining a trapezoid.
pub const TRAPEZOID: [f32; 15] = [
    -0.5, -0.5, 0.0, //
    -0.25, 0.5, 0.0, //
    0.0, -0.5, 0.0, //
    0.25, 0.5, 0.0, //
    0.5, -0.5, 0.0,
];

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppState {
    Uninitialized,
    Initializing,
    Ready,
    /// The scheduler is running.
    Rendering,
    /// The scheduler is suspended after having run.
    Idle,
    Failed,
}

impl AppState {
    pub fn can_render(self) -> bool {
        matches!(self, AppState::Ready | AppState::Rendering | AppState::Idle)
    }
}

#[derive(Debug, Error)]
pub enum InitError {
    #[error("initialize requires an uninitialized application (state is {0:?})")]
    InvalidState(AppState),

    #[error(transparent)]
    Program(#[from] ProgramError),

    #[error("geometry: {0}")]
    Geometry(#[from] GeometryError),
}

/// Startup settings.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub interval: Duration,
    pub mode: RenderMode,
    pub clear_color: Color,
    /// Seed for the `*` random clear color.
    pub seed: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(60),
            mode: RenderMode::default(),
            clear_color: Color::BLACK,
            seed: 0,
        }
    }
}

pub struct Application {
    state: AppState,
    program: Option<LinkedProgram>,
    attributes: AttributeLocationTable,
    geometry: Vec<GeometryResource>,
    modes: Option<RenderModeRegistry>,
    mode: RenderMode,
    clear_color: Color,
    scheduler: AnimationScheduler,
    rng: StdRng,
}

impl Application {
    pub fn new(settings: AppSettings) -> Self {
        Self {
            state: AppState::Uninitialized,
            program: None,
            attributes: AttributeLocationTable::default(),
            geometry: Vec::new(),
            modes: None,
            mode: settings.mode,
            clear_color: settings.clear_color,
            scheduler: AnimationScheduler::new(settings.interval),
            rng: StdRng::seed_from_u64(settings.seed),
        }
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn render_mode(&self) -> RenderMode {
        self.mode
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn attributes(&self) -> &AttributeLocationTable {
        &self.attributes
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Builds the program, resolves attributes and uploads the geometry.
    ///
    /// On failure the application is `Failed` and nothing it allocated is left
    /// alive in `ctx`; a `Failed` application may be initialized again.
    pub fn initialize<C: GraphicsContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        sources: &ShaderSources,
    ) -> Result<(), InitError> {
        if !matches!(self.state, AppState::Uninitialized | AppState::Failed) {
            return Err(InitError::InvalidState(self.state));
        }
        self.state = AppState::Initializing;

        match self.build(ctx, sources) {
            Ok(()) => {
                self.state = AppState::Ready;
                let (w, h) = ctx.drawable_size();
                ctx.set_viewport(w, h);
                log::info!("application ready, render mode {}", self.mode);
                Ok(())
            }
            Err(e) => {
                self.state = AppState::Failed;
                log::error!("initialization failed: {e}");
                Err(e)
            }
        }
    }

    fn build<C: GraphicsContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        sources: &ShaderSources,
    ) -> Result<(), InitError> {
        let program = build_program(ctx, &sources.vertex, &sources.fragment)?;
        program.activate(ctx);

        match upload(ctx, &program) {
            Ok((attributes, modes, trapezoid)) => {
                self.program = Some(program);
                self.attributes = attributes;
                self.modes = Some(modes);
                self.geometry.push(trapezoid);
                Ok(())
            }
            Err(e) => {
                ctx.use_program(None);
                program.destroy(ctx);
                Err(e)
            }
        }
    }

    /// Draws one frame: clear, then one draw per geometry with the active mode.
    ///
    /// Does nothing unless the application is initialized.
    pub fn render<C: GraphicsContext + ?Sized>(&mut self, ctx: &mut C) -> Result<(), GfxError> {
        let (Some(program), Some(modes)) = (&self.program, &self.modes) else {
            log::debug!("render skipped in state {:?}", self.state);
            return Ok(());
        };
        if !self.state.can_render() {
            return Ok(());
        }

        let (w, h) = ctx.drawable_size();
        ctx.set_viewport(w, h);
        ctx.set_clear_color(self.clear_color);
        ctx.clear();

        program.activate(ctx);
        let range = modes.get(self.mode);
        for geometry in &self.geometry {
            let mut bound = geometry.bind(ctx)?;
            bound.draw(range.topology, range.first, range.count);
        }

        ctx.present()
    }

    /// Selects a render mode by name. Unknown names are logged and ignored.
    pub fn set_render_mode(&mut self, name: &str) -> bool {
        match name.parse::<RenderMode>() {
            Ok(mode) => {
                self.select_mode(mode);
                true
            }
            Err(e) => {
                log::warn!("{e}; keeping {}", self.mode);
                false
            }
        }
    }

    pub fn select_mode(&mut self, mode: RenderMode) {
        if mode != self.mode {
            log::info!("render mode: {mode}");
        }
        self.mode = mode;
    }

    /// Applies the action bound to `key`. Returns whether the frame changed.
    ///
    /// Clear color changes reach `ctx` right away; `?` reports what `ctx` holds.
    pub fn handle_key<C: GraphicsContext + ?Sized>(&mut self, ctx: &mut C, key: char) -> bool {
        let Some(action) = action_for(key) else {
            return false;
        };

        match action {
            KeyAction::SetClearColor(color) => self.set_clear_color(ctx, color),
            KeyAction::RandomClearColor => {
                let color = Color::rgb(
                    self.rng.random_range(0.0..1.0f32),
                    self.rng.random_range(0.0..1.0f32),
                    self.rng.random_range(0.0..1.0f32),
                );
                self.set_clear_color(ctx, color);
            }
            KeyAction::QueryClearColor => {
                log::info!("clear color: {}", ctx.clear_color().to_rgb_hex());
                return false;
            }
            KeyAction::SelectMode(mode) => self.select_mode(mode),
            KeyAction::NextMode => self.select_mode(self.mode.next()),
        }
        true
    }

    fn set_clear_color<C: GraphicsContext + ?Sized>(&mut self, ctx: &mut C, color: Color) {
        log::info!("clear color set to {}", color.to_rgb_hex());
        self.clear_color = color;
        ctx.set_clear_color(color);
    }

    /// Starts the animation loop.
    pub fn run<H: FrameHost + ?Sized>(&mut self, host: &mut H) {
        if !self.state.can_render() {
            log::warn!("cannot run in state {:?}", self.state);
            return;
        }
        self.scheduler.resume(host);
        self.state = AppState::Rendering;
    }

    /// Stops the animation loop. No frame is rendered by the scheduler afterwards.
    pub fn pause<H: FrameHost + ?Sized>(&mut self, host: &mut H) {
        self.scheduler.suspend(host);
        if self.state == AppState::Rendering {
            self.state = AppState::Idle;
        }
    }

    /// Handles a delivered frame; renders when the interval has elapsed.
    pub fn on_tick<C, H>(
        &mut self,
        ctx: &mut C,
        host: &mut H,
        token: FrameToken,
        now: Duration,
    ) -> Result<Tick, GfxError>
    where
        C: GraphicsContext + ?Sized,
        H: FrameHost + ?Sized,
    {
        let tick = self.scheduler.on_tick(host, token, now, || {});
        if tick == Tick::Fired {
            self.render(ctx)?;
        }
        Ok(tick)
    }

    /// Resets the viewport to the new drawable size and redraws.
    pub fn resize<C: GraphicsContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        width: u32,
        height: u32,
    ) -> Result<(), GfxError> {
        ctx.set_viewport(width, height);
        self.render(ctx)
    }

    /// Stops the scheduler and releases every resource. Safe to call twice.
    pub fn teardown<C, H>(&mut self, ctx: &mut C, host: &mut H)
    where
        C: GraphicsContext + ?Sized,
        H: FrameHost + ?Sized,
    {
        self.scheduler.suspend(host);
        self.release(ctx);
    }

    /// Releases the geometry and the program.
    ///
    /// Used directly when the frame host is already gone.
    pub fn release<C: GraphicsContext + ?Sized>(&mut self, ctx: &mut C) {
        for geometry in self.geometry.drain(..) {
            geometry.destroy(ctx);
        }
        if let Some(program) = self.program.take() {
            ctx.use_program(None);
            program.destroy(ctx);
        }
        self.modes = None;
        self.attributes = AttributeLocationTable::default();
        if self.state != AppState::Failed {
            self.state = AppState::Uninitialized;
        }
        log::debug!("application resources released");
    }
}

/// Resolves the position attribute and uploads the trapezoid with every mode's
/// indices.
fn upload<C: GraphicsContext + ?Sized>(
    ctx: &mut C,
    program: &LinkedProgram,
) -> Result<(AttributeLocationTable, RenderModeRegistry, GeometryResource), InitError> {
    let attributes = AttributeLocationTable::resolve(&*ctx, program, &[POSITION_ATTRIBUTE])?;
    let slot = attributes
        .get(POSITION_ATTRIBUTE)
        .ok_or_else(|| ProgramError::AttributeResolution(POSITION_ATTRIBUTE.into()))?;

    let (modes, indices) = RenderModeRegistry::pack(|t| ctx.supports_topology(t));
    let trapezoid = GeometryResource::build(ctx, &TRAPEZOID, Some(&indices), slot)?;
    Ok((attributes, modes, trapezoid))
}
