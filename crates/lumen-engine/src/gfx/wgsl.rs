//! WGSL front-end shared by every backend.
//!
//! Compiling a stage parses and validates the source with naga and reflects the
//! `@location` interface of its entry point. Linking checks that the fragment
//! stage only reads locations the vertex stage writes.

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{Binding, Handle, Module, ShaderStage, Type, TypeInner};

use super::StageKind;

/// One `@location` input or output of an entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceVar {
    /// Argument or struct member name, when the shader gives one.
    pub name: Option<String>,
    pub location: u32,
    /// Scalar/vector component count; `0` for other types.
    pub components: u32,
}

/// Reflected interface of a compiled stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageInterface {
    pub kind: StageKind,
    pub entry_point: String,
    pub inputs: Vec<InterfaceVar>,
    pub outputs: Vec<InterfaceVar>,
}

/// Reflected interface of a linked vertex + fragment pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramInterface {
    pub vertex_entry: String,
    pub fragment_entry: String,
    /// Vertex inputs, in declaration order.
    pub attributes: Vec<InterfaceVar>,
}

impl ProgramInterface {
    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.attributes
            .iter()
            .find(|a| a.name.as_deref() == Some(name))
            .map(|a| a.location)
    }

    pub fn attribute_at(&self, location: u32) -> Option<&InterfaceVar> {
        self.attributes.iter().find(|a| a.location == location)
    }
}

/// Parses, validates and reflects one stage.
///
/// The error string is the rendered compiler diagnostic.
pub fn compile(kind: StageKind, source: &str) -> Result<StageInterface, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| e.emit_to_string(source))?;

    let wanted = match kind {
        StageKind::Vertex => ShaderStage::Vertex,
        StageKind::Fragment => ShaderStage::Fragment,
    };

    let mut entries = module.entry_points.iter().filter(|ep| ep.stage == wanted);
    let Some(entry) = entries.next() else {
        return Err(format!("error: no @{kind} entry point found"));
    };
    if let Some(extra) = entries.next() {
        return Err(format!(
            "error: multiple @{kind} entry points (`{}` and `{}`)",
            entry.name, extra.name
        ));
    }

    let mut inputs = Vec::new();
    for arg in &entry.function.arguments {
        collect(&module, arg.name.as_deref(), arg.ty, arg.binding.as_ref(), &mut inputs);
    }

    let mut outputs = Vec::new();
    if let Some(result) = &entry.function.result {
        collect(&module, None, result.ty, result.binding.as_ref(), &mut outputs);
    }

    Ok(StageInterface {
        kind,
        entry_point: entry.name.clone(),
        inputs,
        outputs,
    })
}

/// Checks interface compatibility of a vertex and a fragment stage.
///
/// The error string is the program log.
pub fn link(vertex: &StageInterface, fragment: &StageInterface) -> Result<ProgramInterface, String> {
    if vertex.kind != StageKind::Vertex {
        return Err("error: no vertex stage attached".to_string());
    }
    if fragment.kind != StageKind::Fragment {
        return Err("error: no fragment stage attached".to_string());
    }

    let mut problems = Vec::new();
    for input in &fragment.inputs {
        let Some(output) = vertex.outputs.iter().find(|o| o.location == input.location) else {
            problems.push(format!(
                "error: fragment input {} at @location({}) is not written by the vertex stage",
                describe(input),
                input.location
            ));
            continue;
        };
        if input.components != output.components {
            problems.push(format!(
                "error: @location({}) has {} components in the vertex stage but {} in the fragment stage",
                input.location, output.components, input.components
            ));
        }
    }

    if !problems.is_empty() {
        return Err(problems.join("\n"));
    }

    Ok(ProgramInterface {
        vertex_entry: vertex.entry_point.clone(),
        fragment_entry: fragment.entry_point.clone(),
        attributes: vertex.inputs.clone(),
    })
}

fn describe(var: &InterfaceVar) -> String {
    match &var.name {
        Some(name) => format!("`{name}`"),
        None => "<unnamed>".to_string(),
    }
}

fn collect(
    module: &Module,
    name: Option<&str>,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    out: &mut Vec<InterfaceVar>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => out.push(InterfaceVar {
            name: name.map(str::to_owned),
            location: *location,
            components: components(module, ty),
        }),
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect(module, member.name.as_deref(), member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

fn components(module: &Module, ty: Handle<Type>) -> u32 {
    match &module.types[ty].inner {
        TypeInner::Scalar(_) => 1,
        TypeInner::Vector { size, .. } => *size as u32,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = r#"
struct VsOut {
    @builtin(position) position: vec4<f32>,
    @location(0) shade: f32,
};

@vertex
fn vs_main(@location(0) vertexPosition: vec3<f32>) -> VsOut {
    var out: VsOut;
    out.position = vec4<f32>(vertexPosition, 1.0);
    out.shade = 1.0;
    return out;
}
"#;

    const FRAGMENT: &str = r#"
@fragment
fn fs_main(@location(0) shade: f32) -> @location(0) vec4<f32> {
    return vec4<f32>(shade, shade, shade, 1.0);
}
"#;

    // ── compile ───────────────────────────────────────────────────────────

    #[test]
    fn reflects_vertex_inputs_and_outputs() {
        let vs = compile(StageKind::Vertex, VERTEX).unwrap();
        assert_eq!(vs.entry_point, "vs_main");
        assert_eq!(
            vs.inputs,
            vec![InterfaceVar {
                name: Some("vertexPosition".into()),
                location: 0,
                components: 3,
            }]
        );
        assert_eq!(vs.outputs.len(), 1);
        assert_eq!(vs.outputs[0].name.as_deref(), Some("shade"));
        assert_eq!(vs.outputs[0].components, 1);
    }

    #[test]
    fn syntax_error_is_reported_as_text() {
        let err = compile(StageKind::Vertex, "@vertex fn vs_main( -> {").unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn missing_entry_point_fails() {
        let err = compile(StageKind::Vertex, FRAGMENT).unwrap_err();
        assert!(err.contains("no @vertex entry point"), "{err}");
    }

    // ── link ──────────────────────────────────────────────────────────────

    #[test]
    fn matching_stages_link() {
        let vs = compile(StageKind::Vertex, VERTEX).unwrap();
        let fs = compile(StageKind::Fragment, FRAGMENT).unwrap();
        let program = link(&vs, &fs).unwrap();
        assert_eq!(program.attribute_location("vertexPosition"), Some(0));
        assert_eq!(program.attribute_location("vertexColor"), None);
        assert_eq!(program.fragment_entry, "fs_main");
    }

    #[test]
    fn unwritten_fragment_input_fails_link() {
        let fs = r#"
@fragment
fn fs_main(@location(3) tint: vec4<f32>) -> @location(0) vec4<f32> {
    return tint;
}
"#;
        let vs = compile(StageKind::Vertex, VERTEX).unwrap();
        let fs = compile(StageKind::Fragment, fs).unwrap();
        let err = link(&vs, &fs).unwrap_err();
        assert!(err.contains("@location(3)"), "{err}");
        assert!(err.contains("`tint`"), "{err}");
    }

    #[test]
    fn swapped_stages_fail_link() {
        let vs = compile(StageKind::Vertex, VERTEX).unwrap();
        let fs = compile(StageKind::Fragment, FRAGMENT).unwrap();
        assert!(link(&fs, &vs).is_err());
    }
}
