pub mod boundary;
pub mod clip;
pub mod project;

pub use boundary::{BoundaryPoint, DatelineKind, GeoBoundary};
pub use clip::{RectClipper, ScreenPolygon, Sector};
pub use project::VectorProjector;
