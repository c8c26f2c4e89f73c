use thiserror::Error;

use crate::gfx::GfxError;

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum GeometryError {
    #[error("vertex data does not contain a single complete vertex")]
    EmptyVertices,

    #[error("{len} floats is not a whole number of {components}-component vertices")]
    RaggedVertices { len: usize, components: u32 },

    #[error("index {index} at position {position} is out of bounds for {vertex_count} vertices")]
    IndexOutOfBounds {
        index: u16,
        position: usize,
        vertex_count: u32,
    },

    #[error("{0} vertices cannot be addressed with 16-bit indices")]
    TooManyVertices(u32),

    #[error(transparent)]
    Context(#[from] GfxError),
}
