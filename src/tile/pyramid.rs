//! Tile pyramid addressing. The pyramid is an equirectangular world
//! strip: two columns by one row at level zero, doubling per level.

/// Plain integer key of a tile. Tiles are looked up through this key in
/// an external cache; tile objects never reference each other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId {
    pub level: u32,
    pub column: u32,
    pub row: u32,
}

impl TileId {
    pub fn new(level: u32, column: u32, row: u32) -> Self {
        Self { level, column, row }
    }
}

impl std::fmt::Display for TileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.level, self.column, self.row)
    }
}

/// Number of tile columns at a pyramid level.
#[inline(always)]
pub fn columns(level: u32) -> u32 {
    2 << level
}

/// Number of tile rows at a pyramid level.
#[inline(always)]
pub fn rows(level: u32) -> u32 {
    1 << level
}

/// Width in pixels of the whole level.
#[inline(always)]
pub fn global_width(level: u32, tile_width: usize) -> i64 {
    columns(level) as i64 * tile_width as i64
}

/// Height in pixels of the whole level.
#[inline(always)]
pub fn global_height(level: u32, tile_height: usize) -> i64 {
    rows(level) as i64 * tile_height as i64
}

/// Pick the pyramid level for a planet radius in pixels. The tile
/// resolution doubles per level, so the level follows from the radius
/// and tile size via log2. Monotonic non-decreasing in the radius.
pub fn select_level(radius: u32, tile_width: usize, max_level: u32) -> u32 {
    let linear = ((2 * radius) as f64 / tile_width as f64).max(1.0);
    let level = (linear.log2().floor() as i64 + 1).max(0) as u32;
    level.min(max_level)
}

/// Tile index of an absolute pixel position within a level. The x axis
/// wraps around the antimeridian; the y axis clamps at the poles.
pub fn tile_index(global_x: i64, global_y: i64, level: u32, tile_width: usize, tile_height: usize) -> TileId {
    let gw = global_width(level, tile_width);
    let gh = global_height(level, tile_height);
    let x = global_x.rem_euclid(gw);
    let y = global_y.clamp(0, gh - 1);
    TileId::new(
        level,
        (x / tile_width as i64) as u32,
        (y / tile_height as i64) as u32,
    )
}
