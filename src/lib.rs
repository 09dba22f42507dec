//! Planetary surface renderer core.
//!
//! Combines a multi-resolution tile pyramid (raster) with vector boundary
//! features under one of three map projections. The crate owns the
//! projection math, the scanline tile resampler and the horizon/viewport
//! clipping machinery; tile storage and the drawing backend are external
//! collaborators.

pub mod compose;
pub mod geo;
pub mod graticule;
pub mod hash;
pub mod math;
pub mod projection;
pub mod raster;
pub mod tile;
pub mod vector;

pub use compose::{Composer, Frame, FrameOptions, LayerKind, VectorLayer};
pub use math::quaternion::Quaternion;
pub use projection::{Projection, Viewport};
pub use tile::cache::{TileBuffer, TileCache, TileError, TileSource};
pub use tile::pyramid::TileId;
pub use vector::boundary::GeoBoundary;
pub use vector::clip::ScreenPolygon;
