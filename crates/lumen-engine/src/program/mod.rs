//! Shader program construction.
//!
//! Flow:
//! - [`compile_stage`] turns one [`StageSource`] into a [`CompiledStage`]
//! - [`link_program`] consumes a vertex and a fragment stage and produces a
//!   [`LinkedProgram`]; both stages are released whatever the outcome
//! - [`AttributeLocationTable::resolve`] maps the attribute names a caller
//!   needs onto binding slots of the linked program
//!
//! [`build_program`] runs compile + link for a source pair.

mod attributes;
mod compiler;
mod error;
mod linker;

pub use attributes::AttributeLocationTable;
pub use compiler::{compile_stage, CompiledStage, StageSource};
pub use error::{LinkDiagnostics, ProgramError};
pub use linker::{build_program, link_program, LinkedProgram};

#[cfg(test)]
pub(crate) mod test_sources {
    pub const VERTEX: &str = r#"
@vertex
fn vs_main(@location(0) vertexPosition: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(vertexPosition, 1.0);
}
"#;

    pub const FRAGMENT: &str = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(0.5, 0.5, 0.5, 1.0);
}
"#;

    pub const BROKEN: &str = "@vertex fn vs_main( -> vec4<f32> {";

    /// Reads a varying the vertex stage above never writes.
    pub const FRAGMENT_NEEDS_VARYING: &str = r#"
@fragment
fn fs_main(@location(1) tint: vec4<f32>) -> @location(0) vec4<f32> {
    return tint;
}
"#;
}
