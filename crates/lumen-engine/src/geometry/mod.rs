//! GPU-resident geometry.
//!
//! A [`GeometryResource`] owns one vertex layout and the buffers it reads. It is
//! built in one step, never modified afterwards, and released with
//! [`GeometryResource::destroy`].

mod error;
mod resource;

pub use error::GeometryError;
pub use resource::{BoundGeometry, GeometryDesc, GeometryResource, POSITION_COMPONENTS};
