use crate::gfx::{
    BufferId, BufferTarget, GfxError, GraphicsContext, ResourceScope, Topology, VertexAttribute,
    VertexLayoutId,
};

use super::GeometryError;

/// Components per vertex for plain `vec3` positions.
pub const POSITION_COMPONENTS: u32 = 3;

/// Input for [`GeometryResource::build_with`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeometryDesc<'a> {
    pub vertices: &'a [f32],
    /// Element indices; `None` or an empty slice builds non-indexed geometry.
    pub indices: Option<&'a [u16]>,
    /// Attribute slot the vertex data feeds.
    pub slot: u32,
    pub attribute: VertexAttribute,
}

impl<'a> GeometryDesc<'a> {
    /// Tightly packed `vec3` positions feeding `slot`.
    pub fn positions(vertices: &'a [f32], indices: Option<&'a [u16]>, slot: u32) -> Self {
        Self {
            vertices,
            indices,
            slot,
            attribute: VertexAttribute::packed(POSITION_COMPONENTS),
        }
    }

    /// Number of complete vertices described by `vertices` and `attribute`.
    fn vertex_count(&self) -> Result<u32, GeometryError> {
        let attr = self.attribute;
        if attr.stride == 0 && attr.offset == 0 && self.vertices.len() % attr.components as usize != 0 {
            return Err(GeometryError::RaggedVertices {
                len: self.vertices.len(),
                components: attr.components,
            });
        }

        let bytes = std::mem::size_of_val(self.vertices);
        let first = attr.offset as usize + attr.components as usize * std::mem::size_of::<f32>();
        if bytes < first {
            return Err(GeometryError::EmptyVertices);
        }
        let count = (bytes - first) / attr.byte_stride() as usize + 1;
        Ok(count as u32)
    }
}

/// One vertex layout plus its vertex buffer and optional index buffer.
#[derive(Debug, Eq, PartialEq)]
pub struct GeometryResource {
    layout: VertexLayoutId,
    vertex_buffer: BufferId,
    index_buffer: Option<BufferId>,
    vertex_count: u32,
    index_count: u32,
}

impl GeometryResource {
    /// Builds position-only geometry feeding `slot`.
    pub fn build<C: GraphicsContext + ?Sized>(
        ctx: &mut C,
        vertices: &[f32],
        indices: Option<&[u16]>,
        slot: u32,
    ) -> Result<Self, GeometryError> {
        Self::build_with(ctx, &GeometryDesc::positions(vertices, indices, slot))
    }

    /// Builds geometry from `desc`.
    ///
    /// Input is validated before anything is allocated; every index must be
    /// below the vertex count. If an allocation step fails, everything
    /// allocated before it is released and no layout is left bound.
    pub fn build_with<C: GraphicsContext + ?Sized>(
        ctx: &mut C,
        desc: &GeometryDesc<'_>,
    ) -> Result<Self, GeometryError> {
        desc.attribute.validate()?;
        let vertex_count = desc.vertex_count()?;
        let indices = desc.indices.filter(|i| !i.is_empty());

        if let Some(indices) = indices {
            if vertex_count > u16::MAX as u32 + 1 {
                return Err(GeometryError::TooManyVertices(vertex_count));
            }
            if let Some((position, &index)) = indices
                .iter()
                .enumerate()
                .find(|(_, i)| **i as u32 >= vertex_count)
            {
                return Err(GeometryError::IndexOutOfBounds {
                    index,
                    position,
                    vertex_count,
                });
            }
        }

        let mut scope = ResourceScope::new(ctx);

        let layout = scope.create_vertex_layout()?;
        scope.track(layout);
        scope.bind_vertex_layout(Some(layout))?;

        let vertex_buffer =
            scope.create_buffer(BufferTarget::Vertex, bytemuck::cast_slice(desc.vertices))?;
        scope.track(vertex_buffer);
        scope.set_vertex_attribute(desc.slot, vertex_buffer, desc.attribute)?;

        let index_buffer = match indices {
            Some(indices) => {
                let buffer = scope.create_buffer(BufferTarget::Index, bytemuck::cast_slice(indices))?;
                scope.track(buffer);
                scope.set_index_buffer(buffer)?;
                Some(buffer)
            }
            None => None,
        };

        scope.bind_vertex_layout(None)?;
        scope.keep_all();

        let index_count = indices.map_or(0, |i| i.len() as u32);
        log::debug!(
            "built {layout}: {vertex_count} vertices, {index_count} indices on slot {}",
            desc.slot
        );

        Ok(Self {
            layout,
            vertex_buffer,
            index_buffer,
            vertex_count,
            index_count,
        })
    }

    pub fn layout(&self) -> VertexLayoutId {
        self.layout
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn is_indexed(&self) -> bool {
        self.index_buffer.is_some()
    }

    /// Activates the layout until the returned guard is dropped.
    pub fn bind<'c, C: GraphicsContext + ?Sized>(
        &self,
        ctx: &'c mut C,
    ) -> Result<BoundGeometry<'c, C>, GfxError> {
        ctx.bind_vertex_layout(Some(self.layout))?;
        Ok(BoundGeometry {
            ctx,
            index_count: self.index_count,
        })
    }

    /// Releases the buffers and the layout.
    pub fn destroy<C: GraphicsContext + ?Sized>(self, ctx: &mut C) {
        if let Some(buffer) = self.index_buffer {
            ctx.delete_buffer(buffer);
        }
        ctx.delete_buffer(self.vertex_buffer);
        ctx.delete_vertex_layout(self.layout);
    }
}

/// A bound [`GeometryResource`]. Unbinds on drop.
pub struct BoundGeometry<'c, C: GraphicsContext + ?Sized> {
    ctx: &'c mut C,
    index_count: u32,
}

impl<C: GraphicsContext + ?Sized> BoundGeometry<'_, C> {
    /// Draws `index_count` indices starting at `first_index`.
    ///
    /// Ranges past the end of the index buffer are clamped.
    pub fn draw(&mut self, topology: Topology, first_index: u32, index_count: u32) {
        let first = first_index.min(self.index_count);
        let count = index_count.min(self.index_count - first);
        if count == 0 {
            return;
        }
        self.ctx.draw_indexed(topology, first, count);
    }

    /// Draws the whole index buffer.
    pub fn draw_all(&mut self, topology: Topology) {
        self.draw(topology, 0, self.index_count);
    }
}

impl<C: GraphicsContext + ?Sized> Drop for BoundGeometry<'_, C> {
    fn drop(&mut self) {
        if let Err(e) = self.ctx.bind_vertex_layout(None) {
            log::error!("failed to unbind vertex layout: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{Command, RecordingContext};

    // Trapezoid, 5 vertices.
    const VERTICES: [f32; 15] = [
        -0.5, -0.5, 0.0, //
        -0.25, 0.5, 0.0, //
        0.0, -0.5, 0.0, //
        0.25, 0.5, 0.0, //
        0.5, -0.5, 0.0,
    ];
    const INDICES: [u16; 6] = [0, 1, 2, 2, 3, 4];

    // ── build ─────────────────────────────────────────────────────────────

    #[test]
    fn builds_indexed_geometry() {
        let mut ctx = RecordingContext::new();
        let g = GeometryResource::build(&mut ctx, &VERTICES, Some(&INDICES), 0).unwrap();

        assert_eq!(g.vertex_count(), 5);
        assert_eq!(g.index_count(), 6);
        assert_eq!(ctx.live_resources(), 3);
        assert_eq!(ctx.bound_layout(), None, "build must leave no layout bound");

        let attrs = ctx.layout_attributes(g.layout());
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].0, 0);
        assert_eq!(attrs[0].2, VertexAttribute::packed(3));
        assert!(ctx.layout_index_buffer(g.layout()).is_some());
    }

    #[test]
    fn builds_without_indices() {
        let mut ctx = RecordingContext::new();
        let g = GeometryResource::build(&mut ctx, &VERTICES, None, 2).unwrap();
        assert!(!g.is_indexed());
        assert_eq!(ctx.live_resources(), 2);
    }

    #[test]
    fn index_equal_to_vertex_count_is_rejected() {
        let mut ctx = RecordingContext::new();
        let err = GeometryResource::build(&mut ctx, &VERTICES, Some(&[0, 1, 5]), 0).unwrap_err();
        assert_eq!(
            err,
            GeometryError::IndexOutOfBounds {
                index: 5,
                position: 2,
                vertex_count: 5
            }
        );
        assert_eq!(ctx.live_resources(), 0);
    }

    #[test]
    fn ragged_vertex_data_is_rejected() {
        let mut ctx = RecordingContext::new();
        let err = GeometryResource::build(&mut ctx, &VERTICES[..14], None, 0).unwrap_err();
        assert!(matches!(err, GeometryError::RaggedVertices { len: 14, components: 3 }));
    }

    #[test]
    fn strided_layout_counts_vertices() {
        let mut ctx = RecordingContext::new();
        // Two vertices of (x, y, z, pad).
        let data = [0.0f32; 8];
        let desc = GeometryDesc {
            vertices: &data,
            indices: Some(&[0, 1]),
            slot: 0,
            attribute: VertexAttribute {
                components: 3,
                stride: 16,
                offset: 0,
            },
        };
        let g = GeometryResource::build_with(&mut ctx, &desc).unwrap();
        assert_eq!(g.vertex_count(), 2);
    }

    // ── rollback ──────────────────────────────────────────────────────────

    #[test]
    fn every_allocation_failure_rolls_back() {
        for budget in 0..3 {
            let mut ctx = RecordingContext::new();
            ctx.fail_allocations_after(budget);
            let err = GeometryResource::build(&mut ctx, &VERTICES, Some(&INDICES), 0).unwrap_err();
            assert!(matches!(err, GeometryError::Context(GfxError::OutOfMemory(_))));
            assert_eq!(ctx.live_resources(), 0, "leak with budget {budget}");
            assert_eq!(ctx.bound_layout(), None, "layout left bound with budget {budget}");
        }
    }

    // ── bind ──────────────────────────────────────────────────────────────

    #[test]
    fn bind_guard_unbinds_on_drop() {
        let mut ctx = RecordingContext::new();
        let g = GeometryResource::build(&mut ctx, &VERTICES, Some(&INDICES), 0).unwrap();
        ctx.take_commands();
        {
            let _bound = g.bind(&mut ctx).unwrap();
        }
        assert_eq!(
            ctx.commands(),
            &[
                Command::BindLayout(Some(g.layout())),
                Command::BindLayout(None)
            ]
        );
    }

    #[test]
    fn draw_range_is_clamped_to_index_buffer() {
        let mut ctx = RecordingContext::new();
        let g = GeometryResource::build(&mut ctx, &VERTICES, Some(&INDICES), 0).unwrap();
        let mut bound = g.bind(&mut ctx).unwrap();
        // No program in use: the context rejects, but the call must not panic.
        bound.draw(Topology::Triangles, 4, 10);
        bound.draw(Topology::Triangles, 10, 1);
    }

    #[test]
    fn destroy_releases_everything() {
        let mut ctx = RecordingContext::new();
        let g = GeometryResource::build(&mut ctx, &VERTICES, Some(&INDICES), 0).unwrap();
        g.destroy(&mut ctx);
        assert_eq!(ctx.live_resources(), 0);
    }
}
