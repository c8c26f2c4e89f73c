use std::ops::{Deref, DerefMut};

use super::{GraphicsContext, Resource};

/// Scoped ownership of resources allocated during a multi-step build.
///
/// Every resource handed to [`track`](Self::track) is released when the scope
/// is dropped, in reverse allocation order, unless it was [`keep`](Self::keep)-ed
/// first. Build paths can therefore bail out with `?` at any step without
/// leaking the allocations made before it.
///
/// The scope dereferences to the context so the build can keep issuing calls.
pub struct ResourceScope<'c, C: GraphicsContext + ?Sized> {
    ctx: &'c mut C,
    owned: Vec<Resource>,
}

impl<'c, C: GraphicsContext + ?Sized> ResourceScope<'c, C> {
    pub fn new(ctx: &'c mut C) -> Self {
        Self {
            ctx,
            owned: Vec::new(),
        }
    }

    /// Takes ownership of `resource`; returns it for chaining.
    pub fn track<R>(&mut self, resource: R) -> R
    where
        R: Into<Resource> + Copy,
    {
        self.owned.push(resource.into());
        resource
    }

    /// Removes `resource` from the scope so it survives the drop.
    pub fn keep(&mut self, resource: impl Into<Resource>) {
        let resource = resource.into();
        self.owned.retain(|r| *r != resource);
    }

    /// Keeps everything the scope currently owns.
    pub fn keep_all(mut self) {
        self.owned.clear();
    }

    /// Resources that would be released if the scope ended now.
    pub fn owned(&self) -> &[Resource] {
        &self.owned
    }
}

impl<C: GraphicsContext + ?Sized> Deref for ResourceScope<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        &*self.ctx
    }
}

impl<C: GraphicsContext + ?Sized> DerefMut for ResourceScope<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut *self.ctx
    }
}

impl<C: GraphicsContext + ?Sized> Drop for ResourceScope<'_, C> {
    fn drop(&mut self) {
        while let Some(resource) = self.owned.pop() {
            log::trace!("releasing {resource}");
            self.ctx.release(resource);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{BufferTarget, RecordingContext};

    #[test]
    fn drop_releases_tracked_resources() {
        let mut ctx = RecordingContext::new();
        {
            let mut scope = ResourceScope::new(&mut ctx);
            let b = scope.create_buffer(BufferTarget::Vertex, &[0; 12]).unwrap();
            scope.track(b);
            let l = scope.create_vertex_layout().unwrap();
            scope.track(l);
            assert_eq!(scope.live_resources(), 2);
        }
        assert_eq!(ctx.live_resources(), 0);
    }

    #[test]
    fn kept_resources_survive() {
        let mut ctx = RecordingContext::new();
        let kept = {
            let mut scope = ResourceScope::new(&mut ctx);
            let a = scope.create_buffer(BufferTarget::Vertex, &[0; 4]).unwrap();
            scope.track(a);
            let b = scope.create_buffer(BufferTarget::Index, &[0; 2]).unwrap();
            scope.track(b);
            scope.keep(a);
            a
        };
        assert_eq!(ctx.live_resources(), 1);
        assert!(ctx.buffer_len(kept).is_some());
    }

    #[test]
    fn keep_all_disarms_the_scope() {
        let mut ctx = RecordingContext::new();
        {
            let mut scope = ResourceScope::new(&mut ctx);
            let a = scope.create_vertex_layout().unwrap();
            scope.track(a);
            scope.keep_all();
        }
        assert_eq!(ctx.live_resources(), 1);
    }
}
