use crate::paint::Color;

use super::wgsl::{self, ProgramInterface, StageInterface};
use super::{
    BufferId, BufferTarget, GfxError, GraphicsContext, ProgramId, Slots, StageId, StageKind,
    Topology, VertexAttribute, VertexLayoutId,
};

/// A draw issued against a [`RecordingContext`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DrawCall {
    pub topology: Topology,
    pub first_index: u32,
    pub index_count: u32,
    pub program: ProgramId,
    pub layout: VertexLayoutId,
}

/// Frame-level commands in issue order.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Viewport { width: u32, height: u32 },
    Clear(Color),
    UseProgram(Option<ProgramId>),
    BindLayout(Option<VertexLayoutId>),
    Draw(DrawCall),
    Present,
}

#[derive(Debug)]
struct Stage {
    interface: Option<StageInterface>,
    log: String,
}

#[derive(Debug, Default)]
struct Program {
    attached: Vec<StageId>,
    interface: Option<ProgramInterface>,
    log: String,
}

#[derive(Debug)]
struct Buffer {
    target: BufferTarget,
    len: usize,
}

#[derive(Debug, Default)]
struct Layout {
    attributes: Vec<(u32, BufferId, VertexAttribute)>,
    index_buffer: Option<BufferId>,
}

/// In-memory [`GraphicsContext`] that records every frame command.
///
/// Stages go through the real WGSL front-end, so compile and link diagnostics
/// and attribute locations are the ones a GPU backend would report. Nothing is
/// rendered; draws are validated against the bound state and appended to
/// [`commands`](Self::commands).
///
/// Allocation failures can be injected with
/// [`fail_allocations_after`](Self::fail_allocations_after) to exercise
/// rollback paths.
#[derive(Debug)]
pub struct RecordingContext {
    stages: Slots<Stage>,
    programs: Slots<Program>,
    buffers: Slots<Buffer>,
    layouts: Slots<Layout>,

    current_program: Option<ProgramId>,
    bound_layout: Option<VertexLayoutId>,

    size: (u32, u32),
    viewport: (u32, u32),
    clear_color: Color,
    native: Vec<Topology>,

    allocations_left: Option<usize>,
    rejected_draws: usize,
    frames: u64,
    commands: Vec<Command>,
}

impl RecordingContext {
    /// A 640x480 context that draws every topology natively.
    pub fn new() -> Self {
        Self::with_size(640, 480)
    }

    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            stages: Slots::new(),
            programs: Slots::new(),
            buffers: Slots::new(),
            layouts: Slots::new(),
            current_program: None,
            bound_layout: None,
            size: (width, height),
            viewport: (width, height),
            clear_color: Color::new(0.0, 0.0, 0.0, 0.0),
            native: Topology::ALL.to_vec(),
            allocations_left: None,
            rejected_draws: 0,
            frames: 0,
            commands: Vec::new(),
        }
    }

    /// Restricts native topologies, mimicking backends without loop/fan support.
    pub fn with_native_topologies(mut self, topologies: &[Topology]) -> Self {
        self.native = topologies.to_vec();
        self
    }

    /// Lets the next `n` allocations succeed, then fails every one after.
    pub fn fail_allocations_after(&mut self, n: usize) {
        self.allocations_left = Some(n);
    }

    /// Removes any injected allocation failure.
    pub fn heal(&mut self) {
        self.allocations_left = None;
    }

    /// Simulates the drawable being resized by the host.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn draws(&self) -> impl Iterator<Item = &DrawCall> {
        self.commands.iter().filter_map(|c| match c {
            Command::Draw(d) => Some(d),
            _ => None,
        })
    }

    /// Draws dropped because the bound state could not satisfy them.
    pub fn rejected_draws(&self) -> usize {
        self.rejected_draws
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn current_program(&self) -> Option<ProgramId> {
        self.current_program
    }

    pub fn bound_layout(&self) -> Option<VertexLayoutId> {
        self.bound_layout
    }

    pub fn buffer_len(&self, buffer: BufferId) -> Option<usize> {
        self.buffers.get(buffer.0).map(|b| b.len)
    }

    pub fn layout_index_buffer(&self, layout: VertexLayoutId) -> Option<BufferId> {
        self.layouts.get(layout.0).and_then(|l| l.index_buffer)
    }

    pub fn layout_attributes(&self, layout: VertexLayoutId) -> Vec<(u32, BufferId, VertexAttribute)> {
        self.layouts
            .get(layout.0)
            .map(|l| l.attributes.clone())
            .unwrap_or_default()
    }

    pub fn attached_stages(&self, program: ProgramId) -> &[StageId] {
        self.programs
            .get(program.0)
            .map(|p| p.attached.as_slice())
            .unwrap_or(&[])
    }

    fn allocate(&mut self, kind: &'static str) -> Result<(), GfxError> {
        match self.allocations_left.as_mut() {
            Some(0) => Err(GfxError::OutOfMemory(kind)),
            Some(n) => {
                *n -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn bound_layout_mut(&mut self) -> Result<&mut Layout, GfxError> {
        let id = self.bound_layout.ok_or(GfxError::NoLayoutBound)?;
        self.layouts.get_mut(id.0).ok_or(GfxError::UnknownLayout(id))
    }

    fn index_capacity(&self, layout: &Layout) -> Option<u32> {
        let buffer = self.buffers.get(layout.index_buffer?.0)?;
        Some((buffer.len / std::mem::size_of::<u16>()) as u32)
    }
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsContext for RecordingContext {
    fn create_stage(&mut self, kind: StageKind, source: &str) -> Result<StageId, GfxError> {
        self.allocate("stage")?;
        let stage = match wgsl::compile(kind, source) {
            Ok(interface) => Stage {
                interface: Some(interface),
                log: String::new(),
            },
            Err(log) => Stage {
                interface: None,
                log,
            },
        };
        Ok(StageId(self.stages.insert(stage)))
    }

    fn stage_compiled(&self, stage: StageId) -> bool {
        self.stages
            .get(stage.0)
            .is_some_and(|s| s.interface.is_some())
    }

    fn stage_log(&self, stage: StageId) -> String {
        self.stages
            .get(stage.0)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn delete_stage(&mut self, stage: StageId) {
        self.stages.remove(stage.0);
    }

    fn create_program(&mut self) -> Result<ProgramId, GfxError> {
        self.allocate("program")?;
        Ok(ProgramId(self.programs.insert(Program::default())))
    }

    fn attach_stage(&mut self, program: ProgramId, stage: StageId) {
        if !self.stages.contains(stage.0) {
            return;
        }
        if let Some(p) = self.programs.get_mut(program.0) {
            if !p.attached.contains(&stage) {
                p.attached.push(stage);
            }
        }
    }

    fn detach_stage(&mut self, program: ProgramId, stage: StageId) {
        if let Some(p) = self.programs.get_mut(program.0) {
            p.attached.retain(|s| *s != stage);
        }
    }

    fn link_program(&mut self, program: ProgramId) -> bool {
        let Some(p) = self.programs.get(program.0) else {
            return false;
        };

        let mut vertex = None;
        let mut fragment = None;
        let mut log = String::new();
        for id in &p.attached {
            match self.stages.get(id.0).and_then(|s| s.interface.as_ref()) {
                Some(i) if i.kind == StageKind::Vertex => vertex = Some(i),
                Some(i) => fragment = Some(i),
                None => log = format!("error: {id} was not compiled successfully"),
            }
        }

        let result = match (vertex, fragment) {
            _ if !log.is_empty() => Err(log),
            (Some(v), Some(f)) => wgsl::link(v, f),
            (None, _) => Err("error: no vertex stage attached".to_string()),
            (_, None) => Err("error: no fragment stage attached".to_string()),
        };

        let Some(p) = self.programs.get_mut(program.0) else {
            return false;
        };
        match result {
            Ok(interface) => {
                p.interface = Some(interface);
                p.log.clear();
                true
            }
            Err(log) => {
                p.interface = None;
                p.log = log;
                false
            }
        }
    }

    fn program_log(&self, program: ProgramId) -> String {
        self.programs
            .get(program.0)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        self.programs
            .get(program.0)?
            .interface
            .as_ref()?
            .attribute_location(name)
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.current_program = program;
        self.commands.push(Command::UseProgram(program));
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(program.0);
        if self.current_program == Some(program) {
            self.current_program = None;
        }
    }

    fn create_vertex_layout(&mut self) -> Result<VertexLayoutId, GfxError> {
        self.allocate("vertex layout")?;
        Ok(VertexLayoutId(self.layouts.insert(Layout::default())))
    }

    fn bind_vertex_layout(&mut self, layout: Option<VertexLayoutId>) -> Result<(), GfxError> {
        if let Some(id) = layout {
            if !self.layouts.contains(id.0) {
                return Err(GfxError::UnknownLayout(id));
            }
        }
        self.bound_layout = layout;
        self.commands.push(Command::BindLayout(layout));
        Ok(())
    }

    fn delete_vertex_layout(&mut self, layout: VertexLayoutId) {
        self.layouts.remove(layout.0);
        if self.bound_layout == Some(layout) {
            self.bound_layout = None;
        }
    }

    fn create_buffer(&mut self, target: BufferTarget, data: &[u8]) -> Result<BufferId, GfxError> {
        self.allocate("buffer")?;
        Ok(BufferId(self.buffers.insert(Buffer {
            target,
            len: data.len(),
        })))
    }

    fn set_vertex_attribute(
        &mut self,
        slot: u32,
        buffer: BufferId,
        attribute: VertexAttribute,
    ) -> Result<(), GfxError> {
        attribute.validate()?;
        match self.buffers.get(buffer.0) {
            Some(b) if b.target == BufferTarget::Vertex => {}
            Some(_) => {
                return Err(GfxError::InvalidAttribute(format!(
                    "{buffer} is not a vertex buffer"
                )));
            }
            None => return Err(GfxError::UnknownBuffer(buffer)),
        }
        let layout = self.bound_layout_mut()?;
        layout.attributes.retain(|(s, _, _)| *s != slot);
        layout.attributes.push((slot, buffer, attribute));
        Ok(())
    }

    fn set_index_buffer(&mut self, buffer: BufferId) -> Result<(), GfxError> {
        match self.buffers.get(buffer.0) {
            Some(b) if b.target == BufferTarget::Index => {}
            Some(_) => return Err(GfxError::NotAnIndexBuffer(buffer)),
            None => return Err(GfxError::UnknownBuffer(buffer)),
        }
        self.bound_layout_mut()?.index_buffer = Some(buffer);
        Ok(())
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(buffer.0);
    }

    fn drawable_size(&self) -> (u32, u32) {
        self.size
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
        self.commands.push(Command::Viewport { width, height });
    }

    fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    fn clear_color(&self) -> Color {
        self.clear_color
    }

    fn clear(&mut self) {
        self.commands.push(Command::Clear(self.clear_color));
    }

    fn supports_topology(&self, topology: Topology) -> bool {
        self.native.contains(&topology)
    }

    fn draw_indexed(&mut self, topology: Topology, first_index: u32, index_count: u32) {
        let (Some(program), Some(layout)) = (self.current_program, self.bound_layout) else {
            self.rejected_draws += 1;
            return;
        };
        let capacity = self
            .layouts
            .get(layout.0)
            .and_then(|l| self.index_capacity(l));
        let in_bounds = capacity.is_some_and(|cap| first_index.saturating_add(index_count) <= cap);
        if !in_bounds || !self.native.contains(&topology) {
            self.rejected_draws += 1;
            return;
        }
        self.commands.push(Command::Draw(DrawCall {
            topology,
            first_index,
            index_count,
            program,
            layout,
        }));
    }

    fn present(&mut self) -> Result<(), GfxError> {
        self.frames += 1;
        self.commands.push(Command::Present);
        Ok(())
    }

    fn live_resources(&self) -> usize {
        self.stages.len() + self.programs.len() + self.buffers.len() + self.layouts.len()
    }
}
