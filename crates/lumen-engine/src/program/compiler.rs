use crate::gfx::{GraphicsContext, ResourceScope, StageId, StageKind};

use super::ProgramError;

/// Shader text for one pipeline stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct StageSource<'a> {
    pub kind: StageKind,
    pub text: &'a str,
}

impl<'a> StageSource<'a> {
    pub const fn vertex(text: &'a str) -> Self {
        Self { kind: StageKind::Vertex, text }
    }

    pub const fn fragment(text: &'a str) -> Self {
        Self { kind: StageKind::Fragment, text }
    }
}

/// A successfully compiled stage object.
///
/// Not `Clone`: the stage is consumed by [`link_program`](super::link_program),
/// which releases it, or handed back with [`release`](Self::release).
#[must_use = "a compiled stage must be linked or released"]
#[derive(Debug, Eq, PartialEq)]
pub struct CompiledStage {
    pub(super) id: StageId,
    pub(super) kind: StageKind,
}

impl CompiledStage {
    pub fn kind(&self) -> StageKind {
        self.kind
    }

    /// Releases the stage without linking it.
    pub fn release<C: GraphicsContext + ?Sized>(self, ctx: &mut C) {
        ctx.delete_stage(self.id);
    }
}

/// Compiles one stage.
///
/// On failure the stage object is released and the compiler log is returned
/// inside [`ProgramError::Compilation`].
pub fn compile_stage<C: GraphicsContext + ?Sized>(
    ctx: &mut C,
    source: &StageSource<'_>,
) -> Result<CompiledStage, ProgramError> {
    let kind = source.kind;
    if source.text.trim().is_empty() {
        return Err(ProgramError::EmptySource(kind));
    }

    let mut scope = ResourceScope::new(ctx);
    let id = scope.create_stage(kind, source.text)?;
    scope.track(id);

    if !scope.stage_compiled(id) {
        let log = scope.stage_log(id);
        log::error!("{kind} shader info log: {}", log.trim_end());
        return Err(ProgramError::Compilation { stage: kind, log });
    }

    scope.keep(id);
    log::debug!("compiled {kind} shader as {id}");
    Ok(CompiledStage { id, kind })
}
