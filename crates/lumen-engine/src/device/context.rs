use wgpu::util::DeviceExt;

use crate::gfx::wgsl::{self, ProgramInterface, StageInterface};
use crate::gfx::{
    BufferId, BufferTarget, GfxError, GraphicsContext, ProgramId, StageId, StageKind, Topology,
    VertexAttribute, VertexLayoutId,
};
use crate::paint::Color;

use super::gpu::{Gpu, PendingDraw};
use super::pipeline::{build_pipeline, missing_topologies, primitive_state, PipelineSource};
use super::SurfaceErrorAction;

pub(super) struct GpuStage {
    kind: StageKind,
    compiled: Option<(StageInterface, wgpu::ShaderModule)>,
    log: String,
}

/// Modules are cloned out of the stages at link time so the stages can be
/// released right after linking.
struct Linked {
    interface: ProgramInterface,
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
}

#[derive(Default)]
pub(super) struct GpuProgram {
    attached: Vec<StageId>,
    linked: Option<Linked>,
    log: String,
}

pub(super) struct GpuBuffer {
    target: BufferTarget,
    buffer: wgpu::Buffer,
    len: u64,
}

#[derive(Default)]
pub(super) struct GpuLayout {
    attributes: Vec<(u32, BufferId, VertexAttribute)>,
    index_buffer: Option<BufferId>,
    pipelines: Vec<(ProgramId, Topology, wgpu::RenderPipeline)>,
}

impl GpuLayout {
    fn pipeline(&self, program: ProgramId, topology: Topology) -> Option<&wgpu::RenderPipeline> {
        self.pipelines
            .iter()
            .find(|(p, t, _)| *p == program && *t == topology)
            .map(|(_, _, pipeline)| pipeline)
    }

    fn slot_attributes(&self) -> Vec<(u32, VertexAttribute)> {
        self.attributes.iter().map(|(slot, _, a)| (*slot, *a)).collect()
    }
}

impl Gpu<'_> {
    /// Builds any missing pipeline of `layout` for `program`, for every native topology.
    fn ensure_pipelines(&mut self, layout_id: VertexLayoutId, program_id: ProgramId) -> Result<(), GfxError> {
        let Some(Linked {
            interface,
            vertex,
            fragment,
            layout: pipeline_layout,
        }) = self.programs.get(program_id.0).and_then(|p| p.linked.as_ref())
        else {
            return Err(GfxError::NoProgramInUse);
        };
        let layout = self
            .layouts
            .get_mut(layout_id.0)
            .ok_or(GfxError::UnknownLayout(layout_id))?;

        let missing = missing_topologies(layout.pipelines.iter().map(|(p, t, _)| (*p, *t)), program_id);
        if missing.is_empty() {
            return Ok(());
        }

        let source = PipelineSource {
            vertex,
            fragment,
            interface,
            layout: pipeline_layout,
        };
        let attributes = layout.slot_attributes();
        for topology in missing {
            let pipeline = build_pipeline(&self.device, self.config.format, &source, &attributes, topology)?;
            layout.pipelines.push((program_id, topology, pipeline));
        }
        log::debug!("pipelines ready for {layout_id} with {program_id}");
        Ok(())
    }

    fn has_pipeline(&self, layout_id: VertexLayoutId, program_id: ProgramId, topology: Topology) -> bool {
        self.layouts
            .get(layout_id.0)
            .is_some_and(|layout| layout.pipeline(program_id, topology).is_some())
    }

    fn bound_layout_mut(&mut self) -> Result<&mut GpuLayout, GfxError> {
        let id = self.bound_layout.ok_or(GfxError::NoLayoutBound)?;
        self.layouts.get_mut(id.0).ok_or(GfxError::UnknownLayout(id))
    }

    fn check_draw(&self, draw: &PendingDraw) -> Result<(), String> {
        let layout = self
            .layouts
            .get(draw.layout.0)
            .ok_or_else(|| format!("{} no longer exists", draw.layout))?;
        let index = layout
            .index_buffer
            .and_then(|id| self.buffers.get(id.0))
            .ok_or_else(|| format!("{} has no index buffer", draw.layout))?;
        let capacity = index.len / std::mem::size_of::<u16>() as u64;
        if draw.first_index as u64 + draw.index_count as u64 > capacity {
            return Err(format!(
                "range {}..{} exceeds {capacity} indices",
                draw.first_index,
                draw.first_index as u64 + draw.index_count as u64
            ));
        }
        for (_, buffer, _) in &layout.attributes {
            if !self.buffers.contains(buffer.0) {
                return Err(format!("{buffer} no longer exists"));
            }
        }
        Ok(())
    }

    fn encode(&self, view: &wgpu::TextureView) -> wgpu::CommandBuffer {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lumen frame encoder"),
            });

        {
            let load = if self.clear_requested {
                wgpu::LoadOp::Clear(self.clear_color.into())
            } else {
                wgpu::LoadOp::Load
            };

            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("lumen frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            // wgpu rejects viewports larger than the render target.
            let w = self.viewport.0.min(self.config.width);
            let h = self.viewport.1.min(self.config.height);
            if w > 0 && h > 0 {
                rpass.set_viewport(0.0, 0.0, w as f32, h as f32, 0.0, 1.0);
            }

            for draw in &self.draws {
                if let Err(reason) = self.check_draw(draw) {
                    log::debug!("dropping {} draw: {reason}", draw.topology);
                    continue;
                }
                let Some(layout) = self.layouts.get(draw.layout.0) else { continue };
                let Some(pipeline) = layout.pipeline(draw.program, draw.topology) else { continue };
                let Some(index) = layout.index_buffer.and_then(|id| self.buffers.get(id.0)) else {
                    continue;
                };

                rpass.set_pipeline(pipeline);
                for (i, (_, buffer, _)) in layout.attributes.iter().enumerate() {
                    if let Some(b) = self.buffers.get(buffer.0) {
                        rpass.set_vertex_buffer(i as u32, b.buffer.slice(..));
                    }
                }
                rpass.set_index_buffer(index.buffer.slice(..), wgpu::IndexFormat::Uint16);
                rpass.draw_indexed(draw.first_index..draw.first_index + draw.index_count, 0, 0..1);
            }
        }

        encoder.finish()
    }
}

impl GraphicsContext for Gpu<'_> {
    fn create_stage(&mut self, kind: StageKind, source: &str) -> Result<StageId, GfxError> {
        let stage = match wgsl::compile(kind, source) {
            Ok(interface) => {
                let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(kind.as_str()),
                    source: wgpu::ShaderSource::Wgsl(source.into()),
                });
                GpuStage {
                    kind,
                    compiled: Some((interface, module)),
                    log: String::new(),
                }
            }
            Err(log) => GpuStage {
                kind,
                compiled: None,
                log,
            },
        };
        Ok(StageId(self.stages.insert(stage)))
    }

    fn stage_compiled(&self, stage: StageId) -> bool {
        self.stages
            .get(stage.0)
            .is_some_and(|s| s.compiled.is_some())
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
        Ok(ProgramId(self.programs.insert(GpuProgram::default())))
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
        let mut failed = None;
        for id in &p.attached {
            match self.stages.get(id.0) {
                Some(GpuStage {
                    kind: StageKind::Vertex,
                    compiled: Some(c),
                    ..
                }) => vertex = Some(c),
                Some(GpuStage {
                    kind: StageKind::Fragment,
                    compiled: Some(c),
                    ..
                }) => fragment = Some(c),
                _ => failed = Some(*id),
            }
        }

        let result = match (failed, vertex, fragment) {
            (Some(id), _, _) => Err(format!("error: {id} was not compiled successfully")),
            (None, Some((vi, vm)), Some((fi, fm))) => wgsl::link(vi, fi).map(|interface| {
                let layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("lumen program layout"),
                    bind_group_layouts: &[],
                    immediate_size: 0,
                });
                Linked {
                    interface,
                    vertex: vm.clone(),
                    fragment: fm.clone(),
                    layout,
                }
            }),
            (None, None, _) => Err("error: no vertex stage attached".to_string()),
            (None, _, None) => Err("error: no fragment stage attached".to_string()),
        };

        // Relinking invalidates pipelines built from the previous link.
        for layout in self.layouts.values_mut() {
            layout.pipelines.retain(|(p, _, _)| *p != program);
        }

        let Some(p) = self.programs.get_mut(program.0) else {
            return false;
        };
        match result {
            Ok(linked) => {
                p.linked = Some(linked);
                p.log.clear();
                true
            }
            Err(log) => {
                p.linked = None;
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
            .linked
            .as_ref()?
            .interface
            .attribute_location(name)
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.current_program = program.filter(|p| self.programs.contains(p.0));
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(program.0);
        for layout in self.layouts.values_mut() {
            layout.pipelines.retain(|(p, _, _)| *p != program);
        }
        if self.current_program == Some(program) {
            self.current_program = None;
        }
    }

    fn create_vertex_layout(&mut self) -> Result<VertexLayoutId, GfxError> {
        Ok(VertexLayoutId(self.layouts.insert(GpuLayout::default())))
    }

    fn bind_vertex_layout(&mut self, layout: Option<VertexLayoutId>) -> Result<(), GfxError> {
        if let Some(id) = layout {
            if !self.layouts.contains(id.0) {
                return Err(GfxError::UnknownLayout(id));
            }
        }

        // Unbinding finalizes the layout being edited.
        if layout.is_none() {
            if let (Some(bound), Some(program)) = (self.bound_layout, self.current_program) {
                if let Err(e) = self.ensure_pipelines(bound, program) {
                    self.bound_layout = None;
                    return Err(e);
                }
            }
        }

        self.bound_layout = layout;
        Ok(())
    }

    fn delete_vertex_layout(&mut self, layout: VertexLayoutId) {
        self.layouts.remove(layout.0);
        if self.bound_layout == Some(layout) {
            self.bound_layout = None;
        }
    }

    fn create_buffer(&mut self, target: BufferTarget, data: &[u8]) -> Result<BufferId, GfxError> {
        let usage = match target {
            BufferTarget::Vertex => wgpu::BufferUsages::VERTEX,
            BufferTarget::Index => wgpu::BufferUsages::INDEX,
        };
        // Buffer sizes must be a multiple of COPY_BUFFER_ALIGNMENT.
        let align = wgpu::COPY_BUFFER_ALIGNMENT as usize;
        let padded;
        let contents = if data.len() % align == 0 {
            data
        } else {
            let mut v = data.to_vec();
            v.resize(data.len().div_ceil(align) * align, 0);
            padded = v;
            &padded
        };

        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(match target {
                BufferTarget::Vertex => "lumen vertex buffer",
                BufferTarget::Index => "lumen index buffer",
            }),
            contents,
            usage,
        });
        Ok(BufferId(self.buffers.insert(GpuBuffer {
            target,
            buffer,
            len: data.len() as u64,
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
        layout.pipelines.clear();
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
        if let Some(b) = self.buffers.remove(buffer.0) {
            b.buffer.destroy();
        }
    }

    fn drawable_size(&self) -> (u32, u32) {
        (self.size.width, self.size.height)
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    fn clear_color(&self) -> Color {
        self.clear_color
    }

    fn clear(&mut self) {
        self.clear_requested = true;
        self.draws.clear();
    }

    fn supports_topology(&self, topology: Topology) -> bool {
        primitive_state(topology).is_some()
    }

    fn draw_indexed(&mut self, topology: Topology, first_index: u32, index_count: u32) {
        let (Some(program), Some(layout)) = (self.current_program, self.bound_layout) else {
            log::debug!("draw ignored: no program in use or no layout bound");
            return;
        };
        if !self.supports_topology(topology) {
            log::debug!("draw ignored: {topology} is not native");
            return;
        }
        // Pipelines are normally built when the layout is finalized.
        if !self.has_pipeline(layout, program, topology) {
            if let Err(e) = self.ensure_pipelines(layout, program) {
                log::warn!("draw ignored: {e}");
                return;
            }
        }
        self.draws.push(PendingDraw {
            layout,
            program,
            topology,
            first_index,
            index_count,
        });
    }

    fn present(&mut self) -> Result<(), GfxError> {
        if self.size.width == 0 || self.size.height == 0 {
            self.draws.clear();
            self.clear_requested = false;
            return Ok(());
        }

        let texture = match self.acquire() {
            Ok(t) => t,
            Err(SurfaceErrorAction::Fatal) => return Err(GfxError::SurfaceLost),
            Err(_) => {
                self.draws.clear();
                self.clear_requested = false;
                return Ok(());
            }
        };

        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let commands = self.encode(&view);

        self.queue.submit(std::iter::once(commands));
        self.window.pre_present_notify();
        texture.present();

        self.draws.clear();
        self.clear_requested = false;
        Ok(())
    }

    fn live_resources(&self) -> usize {
        self.stages.len() + self.programs.len() + self.buffers.len() + self.layouts.len()
    }
}
