use crate::gfx::wgsl::ProgramInterface;
use crate::gfx::{GfxError, ProgramId, Topology, VertexAttribute};

/// Native wgpu primitive state for `topology`, or `None` for loops and fans.
pub(super) fn primitive_state(topology: Topology) -> Option<wgpu::PrimitiveState> {
    let topology_wgpu = match topology {
        Topology::Points => wgpu::PrimitiveTopology::PointList,
        Topology::Lines => wgpu::PrimitiveTopology::LineList,
        Topology::LineStrip => wgpu::PrimitiveTopology::LineStrip,
        Topology::Triangles => wgpu::PrimitiveTopology::TriangleList,
        Topology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        Topology::LineLoop | Topology::TriangleFan => return None,
    };

    Some(wgpu::PrimitiveState {
        topology: topology_wgpu,
        strip_index_format: topology.is_strip().then_some(wgpu::IndexFormat::Uint16),
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: None,
        polygon_mode: wgpu::PolygonMode::Fill,
        unclipped_depth: false,
        conservative: false,
    })
}

/// Native topologies with no pipeline for `program` among `built`.
pub(super) fn missing_topologies(
    built: impl IntoIterator<Item = (ProgramId, Topology)> + Clone,
    program: ProgramId,
) -> Vec<Topology> {
    Topology::ALL
        .into_iter()
        .filter(|&t| primitive_state(t).is_some())
        .filter(|&t| !built.clone().into_iter().any(|entry| entry == (program, t)))
        .collect()
}

pub(super) fn vertex_format(components: u32) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

/// Checks that every vertex input of `interface` is fed by one of `attributes`
/// (`(slot, attribute)` pairs) with matching component count.
pub(super) fn check_layout(
    interface: &ProgramInterface,
    attributes: &[(u32, VertexAttribute)],
) -> Result<(), GfxError> {
    for input in &interface.attributes {
        let name = input.name.as_deref().unwrap_or("<unnamed>");
        let Some((_, attr)) = attributes.iter().find(|(slot, _)| *slot == input.location) else {
            return Err(GfxError::LayoutMismatch(format!(
                "vertex input `{name}` at location {} has no attribute",
                input.location
            )));
        };
        if attr.components != input.components {
            return Err(GfxError::LayoutMismatch(format!(
                "vertex input `{name}` expects {} components, attribute supplies {}",
                input.components, attr.components
            )));
        }
        if attr.offset + attr.components * 4 > attr.byte_stride() {
            return Err(GfxError::LayoutMismatch(format!(
                "attribute at location {} overruns its stride",
                input.location
            )));
        }
    }
    Ok(())
}

/// Shader modules and layout a linked program renders with.
pub(super) struct PipelineSource<'a> {
    pub vertex: &'a wgpu::ShaderModule,
    pub fragment: &'a wgpu::ShaderModule,
    pub interface: &'a ProgramInterface,
    pub layout: &'a wgpu::PipelineLayout,
}

/// Builds the render pipeline drawing `topology` from `attributes`.
///
/// Each attribute reads from its own vertex buffer, in the given order.
pub(super) fn build_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    source: &PipelineSource<'_>,
    attributes: &[(u32, VertexAttribute)],
    topology: Topology,
) -> Result<wgpu::RenderPipeline, GfxError> {
    let primitive = primitive_state(topology).ok_or_else(|| {
        GfxError::LayoutMismatch(format!("{topology} has no native pipeline"))
    })?;
    check_layout(source.interface, attributes)?;

    let vertex_attributes: Vec<[wgpu::VertexAttribute; 1]> = attributes
        .iter()
        .map(|(slot, attr)| {
            [wgpu::VertexAttribute {
                format: vertex_format(attr.components),
                offset: attr.offset as u64,
                shader_location: *slot,
            }]
        })
        .collect();

    let buffers: Vec<wgpu::VertexBufferLayout<'_>> = attributes
        .iter()
        .zip(&vertex_attributes)
        .map(|((_, attr), va)| wgpu::VertexBufferLayout {
            array_stride: attr.byte_stride() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: va,
        })
        .collect();

    let label = format!("lumen {topology} pipeline");
    Ok(device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&label),
        layout: Some(source.layout),

        vertex: wgpu::VertexState {
            module: source.vertex,
            entry_point: Some(&source.interface.vertex_entry),
            compilation_options: Default::default(),
            buffers: &buffers,
        },

        fragment: Some(wgpu::FragmentState {
            module: source.fragment,
            entry_point: Some(&source.interface.fragment_entry),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive,
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::wgsl::InterfaceVar;

    fn interface(components: u32) -> ProgramInterface {
        ProgramInterface {
            vertex_entry: "vs_main".into(),
            fragment_entry: "fs_main".into(),
            attributes: vec![InterfaceVar {
                name: Some("vertexPosition".into()),
                location: 0,
                components,
            }],
        }
    }

    #[test]
    fn loops_and_fans_have_no_native_state() {
        assert!(primitive_state(Topology::LineLoop).is_none());
        assert!(primitive_state(Topology::TriangleFan).is_none());
        for t in [Topology::Points, Topology::Lines, Topology::Triangles] {
            assert_eq!(primitive_state(t).unwrap().strip_index_format, None);
        }
        let strip = primitive_state(Topology::TriangleStrip).unwrap();
        assert_eq!(strip.strip_index_format, Some(wgpu::IndexFormat::Uint16));
    }

    #[test]
    fn only_unbuilt_native_topologies_are_missing() {
        let program = ProgramId(1);
        let other = ProgramId(2);
        let none: [(ProgramId, Topology); 0] = [];
        assert_eq!(
            missing_topologies(none, program),
            vec![
                Topology::Points,
                Topology::Lines,
                Topology::LineStrip,
                Topology::Triangles,
                Topology::TriangleStrip
            ]
        );

        let built = [
            (program, Topology::Points),
            (program, Topology::Triangles),
            (other, Topology::Lines),
        ];
        assert_eq!(
            missing_topologies(built, program),
            vec![Topology::Lines, Topology::LineStrip, Topology::TriangleStrip]
        );
    }

    #[test]
    fn cached_program_has_nothing_missing() {
        let program = ProgramId(0);
        let built: Vec<_> = Topology::ALL
            .into_iter()
            .filter(|&t| primitive_state(t).is_some())
            .map(|t| (program, t))
            .collect();
        assert!(missing_topologies(built.iter().copied(), program).is_empty());
    }

    #[test]
    fn layout_must_feed_every_input() {
        let iface = interface(3);
        assert!(check_layout(&iface, &[(0, VertexAttribute::packed(3))]).is_ok());
        assert!(matches!(
            check_layout(&iface, &[(1, VertexAttribute::packed(3))]),
            Err(GfxError::LayoutMismatch(_))
        ));
        assert!(matches!(
            check_layout(&iface, &[(0, VertexAttribute::packed(2))]),
            Err(GfxError::LayoutMismatch(_))
        ));
    }

    #[test]
    fn attribute_overrunning_stride_is_rejected() {
        let attr = VertexAttribute {
            components: 3,
            stride: 12,
            offset: 4,
        };
        assert!(check_layout(&interface(3), &[(0, attr)]).is_err());
    }
}
