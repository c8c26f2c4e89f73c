use std::fmt;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
        pub struct $name(pub(crate) u32);

        impl $name {
            #[inline]
            pub fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }
    };
}

handle!(
    /// Compiled (or failed) shader stage object.
    StageId,
    "stage"
);
handle!(
    /// Program object that stages are attached to and linked in.
    ProgramId,
    "program"
);
handle!(
    /// GPU buffer holding vertex or index data.
    BufferId,
    "buffer"
);
handle!(
    /// Vertex-layout descriptor binding buffers to attribute slots.
    VertexLayoutId,
    "layout"
);

/// Any releasable context resource.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Resource {
    Stage(StageId),
    Program(ProgramId),
    Buffer(BufferId),
    VertexLayout(VertexLayoutId),
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Stage(id) => id.fmt(f),
            Resource::Program(id) => id.fmt(f),
            Resource::Buffer(id) => id.fmt(f),
            Resource::VertexLayout(id) => id.fmt(f),
        }
    }
}

impl From<StageId> for Resource {
    fn from(id: StageId) -> Self {
        Resource::Stage(id)
    }
}

impl From<ProgramId> for Resource {
    fn from(id: ProgramId) -> Self {
        Resource::Program(id)
    }
}

impl From<BufferId> for Resource {
    fn from(id: BufferId) -> Self {
        Resource::Buffer(id)
    }
}

impl From<VertexLayoutId> for Resource {
    fn from(id: VertexLayoutId) -> Self {
        Resource::VertexLayout(id)
    }
}
