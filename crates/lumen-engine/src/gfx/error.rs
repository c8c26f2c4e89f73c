use thiserror::Error;

use super::{BufferId, VertexLayoutId};

/// Failures reported by a [`GraphicsContext`](super::GraphicsContext) backend.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum GfxError {
    /// The backend could not allocate another object of the named kind.
    #[error("out of memory while allocating a {0}")]
    OutOfMemory(&'static str),

    #[error("no vertex layout is bound")]
    NoLayoutBound,

    #[error("no program is in use")]
    NoProgramInUse,

    #[error("unknown {0}")]
    UnknownLayout(VertexLayoutId),

    #[error("unknown {0}")]
    UnknownBuffer(BufferId),

    #[error("{0} is not an index buffer")]
    NotAnIndexBuffer(BufferId),

    #[error("invalid vertex attribute: {0}")]
    InvalidAttribute(String),

    /// The vertex layout does not match the inputs of the program in use.
    #[error("vertex layout does not match the program: {0}")]
    LayoutMismatch(String),

    /// The presentation surface is gone and cannot be recovered.
    #[error("presentation surface lost")]
    SurfaceLost,
}
