//! Graphics context abstraction.
//!
//! Everything above this module (program compilation, geometry, render loops)
//! talks to the GPU through [`GraphicsContext`]. Two backends implement it:
//! - [`crate::device::Gpu`], the wgpu-backed window context
//! - [`RecordingContext`], an in-memory context that records every command
//!
//! Both backends compile WGSL through the same front-end ([`wgsl`]), so stage
//! diagnostics and attribute locations agree between them.
//!
//! The API is handle based. A handle is only meaningful for the context that
//! created it; using a released handle is a caller bug and is ignored.

mod error;
mod handles;
mod recording;
mod scope;
mod slots;
mod topology;
pub mod wgsl;

pub use error::GfxError;
pub use handles::{BufferId, ProgramId, Resource, StageId, VertexLayoutId};
pub use recording::{Command, DrawCall, RecordingContext};
pub use scope::ResourceScope;
pub use slots::Slots;
pub use topology::Topology;

use crate::paint::Color;

/// Pipeline stage a shader source is compiled for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl StageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::Vertex => "vertex",
            StageKind::Fragment => "fragment",
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a buffer is bound as.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferTarget {
    /// Per-vertex attribute data.
    Vertex,
    /// `u16` element indices.
    Index,
}

/// Describes how one attribute slot reads `f32` components out of a buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexAttribute {
    /// Number of `f32` components per vertex (1..=4).
    pub components: u32,
    /// Byte distance between consecutive vertices. `0` means tightly packed.
    pub stride: u32,
    /// Byte offset of the first component.
    pub offset: u32,
}

impl VertexAttribute {
    /// Tightly packed `f32` attribute with `components` components.
    pub const fn packed(components: u32) -> Self {
        Self { components, stride: 0, offset: 0 }
    }

    /// Effective stride in bytes.
    #[inline]
    pub fn byte_stride(&self) -> u32 {
        if self.stride == 0 {
            self.components * std::mem::size_of::<f32>() as u32
        } else {
            self.stride
        }
    }

    pub(crate) fn validate(&self) -> Result<(), GfxError> {
        if !(1..=4).contains(&self.components) {
            return Err(GfxError::InvalidAttribute(format!(
                "component count {} is outside 1..=4",
                self.components
            )));
        }
        if self.offset % 4 != 0 || self.byte_stride() % 4 != 0 {
            return Err(GfxError::InvalidAttribute(format!(
                "offset {} and stride {} must be multiples of 4",
                self.offset,
                self.byte_stride()
            )));
        }
        Ok(())
    }
}

/// Operations a rendering backend must provide.
///
/// The shape follows the classic bind-to-edit model:
/// - stages are compiled, attached to a program, and released after linking
/// - a vertex layout is bound, configured with attribute buffers, then unbound
/// - draws read the currently used program and bound vertex layout
pub trait GraphicsContext {
    // ── stages ────────────────────────────────────────────────────────────

    /// Allocates a stage object and compiles `source` into it.
    ///
    /// Compilation failure is reported through [`stage_compiled`] and
    /// [`stage_log`], not through the returned `Result`; `Err` means the stage
    /// object itself could not be allocated.
    ///
    /// [`stage_compiled`]: GraphicsContext::stage_compiled
    /// [`stage_log`]: GraphicsContext::stage_log
    fn create_stage(&mut self, kind: StageKind, source: &str) -> Result<StageId, GfxError>;

    fn stage_compiled(&self, stage: StageId) -> bool;

    /// Compiler output for the stage. Empty when there is nothing to report.
    fn stage_log(&self, stage: StageId) -> String;

    fn delete_stage(&mut self, stage: StageId);

    // ── programs ──────────────────────────────────────────────────────────

    fn create_program(&mut self) -> Result<ProgramId, GfxError>;

    fn attach_stage(&mut self, program: ProgramId, stage: StageId);

    fn detach_stage(&mut self, program: ProgramId, stage: StageId);

    /// Links the attached stages. Returns the link status.
    fn link_program(&mut self, program: ProgramId) -> bool;

    fn program_log(&self, program: ProgramId) -> String;

    /// Binding slot of a vertex input, or `None` if the program has no such input.
    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<u32>;

    fn use_program(&mut self, program: Option<ProgramId>);

    fn delete_program(&mut self, program: ProgramId);

    // ── geometry ──────────────────────────────────────────────────────────

    fn create_vertex_layout(&mut self) -> Result<VertexLayoutId, GfxError>;

    /// Makes `layout` the active vertex layout, or deactivates the current one.
    ///
    /// Deactivating a layout whose configuration changed finalizes it against
    /// the program in use; backends report problems found at that point.
    fn bind_vertex_layout(&mut self, layout: Option<VertexLayoutId>) -> Result<(), GfxError>;

    fn delete_vertex_layout(&mut self, layout: VertexLayoutId);

    /// Allocates a buffer and uploads `data` into it.
    fn create_buffer(&mut self, target: BufferTarget, data: &[u8]) -> Result<BufferId, GfxError>;

    /// Points `slot` of the bound vertex layout at `buffer`.
    fn set_vertex_attribute(
        &mut self,
        slot: u32,
        buffer: BufferId,
        attribute: VertexAttribute,
    ) -> Result<(), GfxError>;

    /// Associates an index buffer with the bound vertex layout.
    fn set_index_buffer(&mut self, buffer: BufferId) -> Result<(), GfxError>;

    fn delete_buffer(&mut self, buffer: BufferId);

    // ── frame ─────────────────────────────────────────────────────────────

    /// Current drawable size in physical pixels.
    fn drawable_size(&self) -> (u32, u32);

    fn set_viewport(&mut self, width: u32, height: u32);

    fn set_clear_color(&mut self, color: Color);

    /// The clear value last set with [`set_clear_color`](GraphicsContext::set_clear_color).
    fn clear_color(&self) -> Color;

    /// Clears the color target with the current clear value.
    fn clear(&mut self);

    /// Whether `topology` can be drawn without rewriting the index sequence.
    fn supports_topology(&self, topology: Topology) -> bool;

    /// Draws `index_count` indices of the bound layout's index buffer, starting
    /// at `first_index`, with the program in use.
    fn draw_indexed(&mut self, topology: Topology, first_index: u32, index_count: u32);

    /// Submits everything recorded since the previous present.
    fn present(&mut self) -> Result<(), GfxError>;

    // ── accounting ────────────────────────────────────────────────────────

    /// Number of stages, programs, buffers and vertex layouts currently alive.
    fn live_resources(&self) -> usize;

    /// Releases any resource kind through its matching delete call.
    fn release(&mut self, resource: Resource) {
        match resource {
            Resource::Stage(id) => self.delete_stage(id),
            Resource::Program(id) => self.delete_program(id),
            Resource::Buffer(id) => self.delete_buffer(id),
            Resource::VertexLayout(id) => self.delete_vertex_layout(id),
        }
    }
}
