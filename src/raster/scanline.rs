//! Scanline texture resampler.
//!
//! Fills a [`PixelBuffer`] from the tile pyramid. For the globe, only
//! every `n`-th column per row runs the full inverse rotation; the
//! columns in between interpolate linearly in (lon, lat) between the
//! two surrounding anchors, taking the short way around the
//! antimeridian. Rows near the projected pole fall back to per-column
//! evaluation where the linear approximation would smear.

use std::f64::consts::{FRAC_PI_2, PI};

use glam::DVec3;
use tracing::trace;

use crate::geo;
use crate::projection::{Projection, Viewport};
use crate::raster::buffer::PixelBuffer;
use crate::tile::{pyramid, TileCache, TileId, TileSource};

/// Stride used when the globe spills past every screen edge and the
/// per-row spans are long enough that the exact stride barely matters.
const COARSE_STRIDE: usize = 8;

pub struct ScanlineRenderer {
    width: usize,
    height: usize,
    n_best: usize,
    /// Render every second scanline and duplicate it, halving the work
    /// for fast interaction at the cost of vertical resolution.
    pub interlaced: bool,
}

impl ScanlineRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            n_best: optimal_stride(width),
            interlaced: false,
        }
    }

    /// Fills `target` from the pyramid behind `cache` for the given
    /// view. Runs exactly one cache pass, so tiles untouched by this
    /// frame are evicted on return.
    pub fn map_texture<S: TileSource>(
        &self,
        target: &mut PixelBuffer,
        viewport: &Viewport,
        cache: &mut TileCache<S>,
    ) {
        cache.begin_pass();
        match viewport.projection {
            Projection::Spherical => self.map_spherical(target, viewport, cache),
            Projection::Equirectangular | Projection::Mercator => {
                self.map_flat(target, viewport, cache)
            }
        }
        cache.end_pass();
    }

    fn map_spherical<S: TileSource>(
        &self,
        target: &mut PixelBuffer,
        viewport: &Viewport,
        cache: &mut TileCache<S>,
    ) {
        let radius = viewport.radius as i64;
        let radius_sq = radius * radius;
        let inv_radius = 1.0 / viewport.radius_f();
        let cx = (self.width / 2) as i64;
        let cy = (self.height / 2) as i64;
        let mat = viewport.orientation.inverse().to_matrix();

        // With the globe larger than the screen diagonal the spans are
        // long and flat, so a fixed coarse stride wins over the
        // width-tuned one.
        let image_radius_sq = cx * cx + cy * cy;
        let n = if image_radius_sq < radius_sq {
            self.n_best
        } else {
            COARSE_STRIDE
        };

        // Screen position of the north pole, for the distortion guard.
        let pole = mat * DVec3::Y;
        let pole_x = cx + (viewport.radius_f() * pole.x) as i64;
        let pole_y = cy - (viewport.radius_f() * pole.y) as i64;
        let pole_front = pole.z > 0.0;

        let mut ctx = ScanContext::new(cache, viewport, n);
        trace!(
            level = ctx.level,
            stride = n,
            radius = viewport.radius,
            "globe raster pass"
        );

        let y_top = (cy - radius).max(0);
        let y_bottom = (cy + radius).min(self.height as i64);
        let y_skip = if self.interlaced { 2 } else { 1 };

        let mut y = y_top;
        while y < y_bottom {
            let dy = y - cy;
            let qy = -(dy as f64) * inv_radius;
            let qr = 1.0 - qy * qy;

            // Intersection of this scanline with the globe's disk.
            let rx = (((radius_sq - dy * dy) as f64).sqrt()) as i64;
            let x_left = (cx - rx).max(0) as usize;
            let x_right = ((cx + rx).min(self.width as i64)) as usize;
            if x_left >= x_right {
                y += y_skip;
                continue;
            }

            // First and last anchor columns; every column outside the
            // anchor range gets a full evaluation.
            let xip_left = n * (x_left / n + 1);
            let xip_right = n as i64 * (x_right as i64 / n as i64 - 1);

            let crossing_pole = pole_front
                && (pole_y - (n / 2) as i64) <= y
                && y <= (pole_y + (n / 2) as i64);

            let row = target.row_mut(y as usize);
            let mut x = x_left;
            let mut out = x_left;
            let mut ncount = 0usize;
            while x < x_right {
                let mut interpolate = false;
                if (xip_left as i64) <= x as i64 && (x as i64) <= xip_right {
                    let interval_left = (xip_left + ncount * n) as i64;
                    let pole_in_interval = crossing_pole
                        && pole_x > interval_left
                        && pole_x < interval_left + n as i64
                        && (x as i64) < interval_left + n as i64;
                    if !pole_in_interval {
                        x += n - 1;
                        ncount += 1;
                        interpolate = true;
                    }
                }

                let qx = (x as i64 - cx) as f64 * inv_radius;
                let qr2z = qr - qx * qx;
                let qz = if qr2z > 0.0 { qr2z.sqrt() } else { 0.0 };
                let (lon, lat) = geo::to_spherical(mat * DVec3::new(qx, qy, qz));

                if interpolate {
                    ctx.interpolate_span(lon, lat, &mut row[out..out + n - 1]);
                    out += n - 1;
                }
                row[out] = ctx.sample(lon, lat);
                out += 1;
                ctx.prev_lon = lon;
                ctx.prev_lat = lat;
                x += 1;
            }

            if self.interlaced && y + 1 < y_bottom {
                target.copy_row(y as usize, y as usize + 1);
            }
            y += y_skip;
        }
    }

    /// Equirectangular and Mercator share one path: latitude is fixed
    /// per row, longitude advances linearly per column, so the direct
    /// walk is already exact and no anchor interpolation is needed.
    fn map_flat<S: TileSource>(
        &self,
        target: &mut PixelBuffer,
        viewport: &Viewport,
        cache: &mut TileCache<S>,
    ) {
        let cx = self.width as f64 / 2.0;
        let (center_lon, _) = viewport.center_coordinates();
        let pixel_to_rad = 1.0 / viewport.rad_to_pixel();

        let mut ctx = ScanContext::new(cache, viewport, 1);
        trace!(level = ctx.level, radius = viewport.radius, "flat raster pass");

        let y_skip = if self.interlaced { 2 } else { 1 };
        let mut y = 0usize;
        while y < self.height {
            // Rows outside the projection's latitude strip stay at the
            // background color.
            let lat = match viewport
                .projection
                .geo_coordinates(cx, y as f64, viewport)
            {
                Some((_, lat)) => lat,
                None => {
                    y += y_skip;
                    continue;
                }
            };

            let mut lon = geo::normalize_lon(center_lon - cx * pixel_to_rad);
            let row = target.row_mut(y);
            for px in row.iter_mut() {
                *px = ctx.sample(lon, lat);
                lon += pixel_to_rad;
                if lon > PI {
                    lon -= 2.0 * PI;
                }
            }

            if self.interlaced && y + 1 < self.height {
                target.copy_row(y, y + 1);
            }
            y += y_skip;
        }
    }
}

/// Searches for the stride that minimizes full evaluations plus the
/// leftover columns outside the anchor range.
fn optimal_stride(width: usize) -> usize {
    let mut best = 2;
    let mut cost_min = width;
    for n in 1..32 {
        let cost = width / n + width % n;
        if cost < cost_min {
            cost_min = cost;
            best = n;
        }
    }
    best
}

/// Per-pass sampling state: the selected pyramid level, the scaling
/// from radians to global pixels, and a cursor on the tile the scan is
/// currently reading so consecutive samples skip the index math.
struct ScanContext<'a, S: TileSource> {
    cache: &'a mut TileCache<S>,
    level: u32,
    tile_width: usize,
    tile_height: usize,
    global_width: i64,
    global_height: i64,
    norm_width: f64,
    norm_height: f64,
    inv_stride: f64,
    current: Option<TileId>,
    origin_x: i64,
    origin_y: i64,
    prev_lon: f64,
    prev_lat: f64,
}

impl<'a, S: TileSource> ScanContext<'a, S> {
    fn new(cache: &'a mut TileCache<S>, viewport: &Viewport, stride: usize) -> Self {
        let tile_width = cache.tile_width();
        let tile_height = cache.tile_height();
        let level = pyramid::select_level(viewport.radius, tile_width, cache.max_level());
        let global_width = pyramid::global_width(level, tile_width);
        let global_height = pyramid::global_height(level, tile_height);
        Self {
            cache,
            level,
            tile_width,
            tile_height,
            global_width,
            global_height,
            norm_width: global_width as f64 / (2.0 * PI),
            norm_height: global_height as f64 / PI,
            inv_stride: 1.0 / stride as f64,
            current: None,
            origin_x: 0,
            origin_y: 0,
            prev_lon: 0.0,
            prev_lat: 0.0,
        }
    }

    /// Reads the pyramid pixel under (lon, lat).
    #[inline]
    fn sample(&mut self, lon: f64, lat: f64) -> u32 {
        let gx = ((self.norm_width * (lon + PI)) as i64).rem_euclid(self.global_width);
        let gy = ((self.norm_height * (FRAC_PI_2 - lat)) as i64).clamp(0, self.global_height - 1);

        let off_tile = match self.current {
            None => true,
            Some(_) => {
                gx < self.origin_x
                    || gx >= self.origin_x + self.tile_width as i64
                    || gy < self.origin_y
                    || gy >= self.origin_y + self.tile_height as i64
            }
        };
        if off_tile {
            let id = pyramid::tile_index(gx, gy, self.level, self.tile_width, self.tile_height);
            self.origin_x = id.column as i64 * self.tile_width as i64;
            self.origin_y = id.row as i64 * self.tile_height as i64;
            self.current = Some(id);
        }
        let id = match self.current {
            Some(id) => id,
            None => unreachable!(),
        };
        let lx = (gx - self.origin_x) as usize;
        let ly = (gy - self.origin_y) as usize;
        self.cache.fetch(id).pixel(lx, ly)
    }

    /// Fills `out` with samples linearly interpolated in (lon, lat)
    /// from the previous anchor toward (lon, lat), exclusive at both
    /// ends. When the two anchors straddle the antimeridian the
    /// longitude walks the short way around and wraps in place.
    fn interpolate_span(&mut self, lon: f64, lat: f64, out: &mut [u32]) {
        let step_lat = (lat - self.prev_lat) * self.inv_stride;
        let delta_lon = lon - self.prev_lon;
        if delta_lon.abs() < PI {
            let step_lon = delta_lon * self.inv_stride;
            for px in out.iter_mut() {
                self.prev_lon += step_lon;
                self.prev_lat += step_lat;
                *px = self.sample(self.prev_lon, self.prev_lat);
            }
        } else {
            let step_lon = (2.0 * PI - delta_lon.abs()) * self.inv_stride;
            if self.prev_lon < lon {
                // Heading west across the antimeridian.
                for px in out.iter_mut() {
                    self.prev_lon -= step_lon;
                    if self.prev_lon <= -PI {
                        self.prev_lon += 2.0 * PI;
                    }
                    self.prev_lat += step_lat;
                    *px = self.sample(self.prev_lon, self.prev_lat);
                }
            } else {
                for px in out.iter_mut() {
                    self.prev_lon += step_lon;
                    if self.prev_lon > PI {
                        self.prev_lon -= 2.0 * PI;
                    }
                    self.prev_lat += step_lat;
                    *px = self.sample(self.prev_lon, self.prev_lat);
                }
            }
        }
    }
}
