pub mod cache;
pub mod pyramid;

pub use cache::{TileBuffer, TileCache, TileError, TileSource};
pub use pyramid::TileId;
