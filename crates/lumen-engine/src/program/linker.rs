use crate::gfx::{GraphicsContext, ProgramId, ResourceScope, StageKind};

use super::{compile_stage, CompiledStage, LinkDiagnostics, ProgramError, StageSource};

/// A linked program object. Owns no stages.
#[derive(Debug, Eq, PartialEq)]
pub struct LinkedProgram {
    id: ProgramId,
}

impl LinkedProgram {
    pub fn id(&self) -> ProgramId {
        self.id
    }

    /// Makes this the program used by subsequent draws.
    pub fn activate<C: GraphicsContext + ?Sized>(&self, ctx: &mut C) {
        ctx.use_program(Some(self.id));
    }

    pub fn destroy<C: GraphicsContext + ?Sized>(self, ctx: &mut C) {
        ctx.delete_program(self.id);
    }
}

/// Links a vertex and a fragment stage into a new program.
///
/// Both stages are detached and released before returning, on success and on
/// failure. On failure the program object is released as well and the program,
/// vertex and fragment logs are returned in [`ProgramError::Link`].
///
/// The returned program is not activated.
pub fn link_program<C: GraphicsContext + ?Sized>(
    ctx: &mut C,
    vertex: CompiledStage,
    fragment: CompiledStage,
) -> Result<LinkedProgram, ProgramError> {
    let mut scope = ResourceScope::new(ctx);
    let vs = scope.track(vertex.id);
    let fs = scope.track(fragment.id);

    if vertex.kind != StageKind::Vertex || fragment.kind != StageKind::Fragment {
        return Err(ProgramError::Link(LinkDiagnostics {
            program: Some(format!(
                "expected vertex + fragment stages, got {} + {}",
                vertex.kind, fragment.kind
            )),
            ..Default::default()
        }));
    }

    let program = scope.create_program()?;
    scope.track(program);

    scope.attach_stage(program, vs);
    scope.attach_stage(program, fs);
    let linked = scope.link_program(program);

    let failure = (!linked).then(|| {
        LinkDiagnostics::from_logs(
            scope.program_log(program),
            scope.stage_log(vs),
            scope.stage_log(fs),
        )
    });

    scope.detach_stage(program, vs);
    scope.detach_stage(program, fs);

    if let Some(diagnostics) = failure {
        for (label, log) in diagnostics.iter() {
            log::error!("{label} info log: {}", log.trim_end());
        }
        return Err(ProgramError::Link(diagnostics));
    }

    scope.keep(program);
    log::debug!("linked {program}");
    Ok(LinkedProgram { id: program })
}

/// Compiles both sources and links them.
///
/// If the fragment stage fails to compile, the already compiled vertex stage
/// is released before the error is returned.
pub fn build_program<C: GraphicsContext + ?Sized>(
    ctx: &mut C,
    vertex_source: &str,
    fragment_source: &str,
) -> Result<LinkedProgram, ProgramError> {
    let vertex = compile_stage(ctx, &StageSource::vertex(vertex_source))?;
    let fragment = match compile_stage(ctx, &StageSource::fragment(fragment_source)) {
        Ok(stage) => stage,
        Err(e) => {
            vertex.release(ctx);
            return Err(e);
        }
    };
    link_program(ctx, vertex, fragment)
}
