//! Tile cache with a per-frame working set. The cache sits between the
//! resampler and an externally provided tile source; a fetch always
//! yields a usable buffer, substituting a placeholder when the source
//! fails.

use crate::tile::pyramid::TileId;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, warn};

/// Color written where no tile data is available (opaque dark gray).
pub const PLACEHOLDER_COLOR: u32 = 0xff20_2020;

#[derive(Debug, Error)]
pub enum TileError {
    #[error("tile {id} is outside the pyramid")]
    OutOfRange { id: TileId },
    #[error("tile {id} could not be loaded: {reason}")]
    Unavailable { id: TileId, reason: String },
}

/// Fixed-size pixel buffer of one tile, immutable once loaded.
#[derive(Clone, Debug)]
pub struct TileBuffer {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl TileBuffer {
    pub fn new(width: usize, height: usize, pixels: Vec<u32>) -> Self {
        assert_eq!(pixels.len(), width * height);
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn filled(width: usize, height: usize, color: u32) -> Self {
        Self::new(width, height, vec![color; width * height])
    }

    #[inline(always)]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline(always)]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixel at a local tile coordinate. Out-of-bounds reads clamp to
    /// the edge; callers are expected to have recomputed the tile index
    /// already, this only absorbs the last ulp of float drift.
    #[inline(always)]
    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.pixels[y * self.width + x]
    }
}

/// Source of tile pixel data: the external collaborator that owns
/// storage and retrieval. Synchronous from the core's point of view.
pub trait TileSource {
    fn tile_width(&self) -> usize;
    fn tile_height(&self) -> usize;
    fn max_level(&self) -> u32;
    fn load(&self, id: TileId) -> Result<TileBuffer, TileError>;
}

/// Integer-keyed tile store with per-pass usage tracking.
///
/// A render pass brackets its fetches with [`TileCache::begin_pass`] and
/// [`TileCache::end_pass`]; tiles not touched between the two are
/// evicted, which keeps the resident set at roughly one screen's worth
/// of tiles.
pub struct TileCache<S: TileSource> {
    source: S,
    tiles: HashMap<TileId, TileBuffer>,
    touched: HashSet<TileId>,
    placeholder: TileBuffer,
}

impl<S: TileSource> TileCache<S> {
    pub fn new(source: S) -> Self {
        let placeholder =
            TileBuffer::filled(source.tile_width(), source.tile_height(), PLACEHOLDER_COLOR);
        Self {
            source,
            tiles: HashMap::new(),
            touched: HashSet::new(),
            placeholder,
        }
    }

    #[inline(always)]
    pub fn tile_width(&self) -> usize {
        self.source.tile_width()
    }

    #[inline(always)]
    pub fn tile_height(&self) -> usize {
        self.source.tile_height()
    }

    #[inline(always)]
    pub fn max_level(&self) -> u32 {
        self.source.max_level()
    }

    pub fn resident_tiles(&self) -> usize {
        self.tiles.len()
    }

    /// Start a render pass: forget which tiles the previous pass used.
    pub fn begin_pass(&mut self) {
        self.touched.clear();
    }

    /// End a render pass: evict every tile the pass did not touch.
    pub fn end_pass(&mut self) {
        let before = self.tiles.len();
        let touched = std::mem::take(&mut self.touched);
        self.tiles.retain(|id, _| touched.contains(id));
        if before != self.tiles.len() {
            debug!(
                evicted = before - self.tiles.len(),
                resident = self.tiles.len(),
                "tile cache trimmed after pass"
            );
        }
    }

    /// Fetch a tile, loading it through the source on a miss. Never
    /// fails: a failed load is logged and replaced by the placeholder so
    /// the scanline pass continues.
    pub fn fetch(&mut self, id: TileId) -> &TileBuffer {
        self.touched.insert(id);
        if !self.tiles.contains_key(&id) {
            let buffer = match self.source.load(id) {
                Ok(buffer) => buffer,
                Err(err) => {
                    warn!(tile = %id, error = %err, "tile load failed, using placeholder");
                    self.placeholder.clone()
                }
            };
            self.tiles.insert(id, buffer);
        }
        &self.tiles[&id]
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Checkerboard source that fails for rows >= `fail_from_row`.
    pub(crate) struct TestSource {
        pub fail_from_row: u32,
    }

    impl TileSource for TestSource {
        fn tile_width(&self) -> usize {
            16
        }
        fn tile_height(&self) -> usize {
            16
        }
        fn max_level(&self) -> u32 {
            4
        }
        fn load(&self, id: TileId) -> Result<TileBuffer, TileError> {
            if id.row >= self.fail_from_row {
                return Err(TileError::Unavailable {
                    id,
                    reason: "simulated".into(),
                });
            }
            let color = 0xff00_0000 | (id.column << 8) | id.row;
            Ok(TileBuffer::filled(16, 16, color))
        }
    }

    #[test]
    fn fetch_caches_and_marks() {
        let mut cache = TileCache::new(TestSource { fail_from_row: 99 });
        cache.begin_pass();
        let c = cache.fetch(TileId::new(1, 2, 1)).pixel(0, 0);
        assert_eq!(c, 0xff00_0201);
        assert_eq!(cache.resident_tiles(), 1);
        cache.fetch(TileId::new(1, 2, 1));
        assert_eq!(cache.resident_tiles(), 1);
    }

    #[test]
    fn failing_source_yields_placeholder() {
        let mut cache = TileCache::new(TestSource { fail_from_row: 0 });
        cache.begin_pass();
        let c = cache.fetch(TileId::new(0, 0, 0)).pixel(3, 3);
        assert_eq!(c, PLACEHOLDER_COLOR);
    }

    #[test]
    fn end_pass_evicts_untouched() {
        let mut cache = TileCache::new(TestSource { fail_from_row: 99 });
        cache.begin_pass();
        cache.fetch(TileId::new(1, 0, 0));
        cache.fetch(TileId::new(1, 1, 0));
        cache.end_pass();
        assert_eq!(cache.resident_tiles(), 2);

        // Second pass touches only one of the two.
        cache.begin_pass();
        cache.fetch(TileId::new(1, 1, 0));
        cache.end_pass();
        assert_eq!(cache.resident_tiles(), 1);
    }
}
