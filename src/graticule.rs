//! Latitude-circle and meridian polylines.
//!
//! Circles are walked in quarter arcs whose density scales with the
//! on-screen radius. On the globe each quarter runs through the horizon
//! split so hidden stretches vanish; on the flat strips latitude
//! circles become horizontal lines and meridians vertical lines
//! repeated at every map width.

use std::f64::consts::{FRAC_PI_2, PI};

use glam::{DMat3, DVec2};

use crate::geo;
use crate::projection::{mercator, Projection, Viewport};
use crate::vector::ScreenPolygon;

/// Besides the equator, the major circles of latitude derive from the
/// planet's axial tilt (about 23°26'21" for Earth).
pub const AXIAL_TILT: f64 = (23.0 + 26.0 / 60.0 + 21.0 / 3600.0) * PI / 180.0;

/// The tropics and polar circles only appear once the view is close
/// enough to tell them apart from the grid.
const TROPICS_MIN_RADIUS: u32 = 400;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Dim {
    Latitude,
    Longitude,
}

/// Grid density: (meridian count, latitude-circle count) per quarter
/// sphere.
fn density(radius: u32) -> (u32, u32) {
    match radius {
        r if r > 3200 => (32, 24),
        r if r > 1600 => (16, 12),
        r if r > 700 => (8, 6),
        r if r > 400 => (4, 3),
        r if r > 100 => (2, 3),
        _ => (2, 1),
    }
}

/// Vertex count per quarter circle.
fn precision(radius: u32) -> u32 {
    match radius {
        r if r > 3200 => 40,
        r if r > 1600 => 30,
        r if r > 700 => 30,
        r if r > 400 => 20,
        _ => 10,
    }
}

/// The full grid for one frame.
pub fn grid(viewport: &Viewport) -> Vec<ScreenPolygon> {
    let mut b = Builder::new(viewport);
    let (lon_num, lat_num) = density(viewport.radius);

    // Circles of latitude, equator excluded (it is its own layer).
    for i in 1..lat_num {
        let angle = i as f64 * FRAC_PI_2 / lat_num as f64;
        b.circle(angle, Dim::Latitude, 0.0);
        b.circle(-angle, Dim::Latitude, 0.0);
    }

    // Prime meridian and its orthogonal great circle run pole to pole;
    // the others stop short by one latitude-ring spacing.
    b.circle(0.0, Dim::Longitude, 0.0);
    b.circle(FRAC_PI_2, Dim::Longitude, 0.0);
    let cut_off = FRAC_PI_2 / lat_num as f64;
    for i in 1..lon_num {
        let angle = i as f64 * FRAC_PI_2 / lon_num as f64;
        b.circle(angle, Dim::Longitude, cut_off);
        b.circle(-angle, Dim::Longitude, cut_off);
    }
    b.out
}

pub fn equator(viewport: &Viewport) -> Vec<ScreenPolygon> {
    let mut b = Builder::new(viewport);
    b.circle(0.0, Dim::Latitude, 0.0);
    b.out
}

/// Tropics and polar circles; empty when zoomed too far out.
pub fn tropics(viewport: &Viewport) -> Vec<ScreenPolygon> {
    if viewport.radius <= TROPICS_MIN_RADIUS {
        return Vec::new();
    }
    let mut b = Builder::new(viewport);
    b.circle(FRAC_PI_2 - AXIAL_TILT, Dim::Latitude, 0.0);
    b.circle(AXIAL_TILT - FRAC_PI_2, Dim::Latitude, 0.0);
    b.circle(AXIAL_TILT, Dim::Latitude, 0.0);
    b.circle(-AXIAL_TILT, Dim::Latitude, 0.0);
    b.out
}

struct Builder<'a> {
    viewport: &'a Viewport,
    inverse_rotation: DMat3,
    quarter_steps: f64,
    out: Vec<ScreenPolygon>,
}

impl<'a> Builder<'a> {
    fn new(viewport: &'a Viewport) -> Self {
        Self {
            viewport,
            inverse_rotation: viewport.orientation.inverse().to_matrix(),
            quarter_steps: precision(viewport.radius) as f64,
            out: Vec::new(),
        }
    }

    fn circle(&mut self, angle: f64, dim: Dim, cut_off: f64) {
        match self.viewport.projection {
            Projection::Spherical => self.spherical_circle(angle, dim, cut_off),
            Projection::Equirectangular | Projection::Mercator => self.flat_circle(angle, dim),
        }
    }

    /// Walks the circle in four quarters. A longitude "circle" is the
    /// full great circle: sweeping the latitude parameter past the pole
    /// covers the opposite meridian too. `cut_off` shortens each
    /// quarter of a meridian so it stops before the pole.
    fn spherical_circle(&mut self, angle: f64, dim: Dim, cut_off: f64) {
        let radius = self.viewport.radius_f();
        let cx = self.viewport.width as f64 / 2.0;
        let cy = self.viewport.height as f64 / 2.0;
        let cut_coeff = 1.0 - cut_off / FRAC_PI_2;
        let steps = (cut_coeff * self.quarter_steps) as usize;

        for quarter in 0..4 {
            let coeff: f64 = if quarter > 1 { -1.0 } else { 1.0 };
            let offset: f64 = if quarter % 2 == 1 { 1.0 } else { 0.0 };

            let mut polygon: Vec<DVec2> = Vec::with_capacity(steps + 1);
            let mut last_visible = false;

            for j in 0..=steps {
                let itval = if j == steps {
                    cut_coeff
                } else {
                    j as f64 / self.quarter_steps
                };
                let dim_val = coeff * (FRAC_PI_2 * (offset - itval).abs() + offset * FRAC_PI_2);
                let (lon, lat) = match dim {
                    Dim::Latitude => (dim_val, angle),
                    Dim::Longitude => (angle, dim_val),
                };

                let v = self.inverse_rotation * geo::to_vec3(lon, lat);
                let current = DVec2::new(cx + radius * v.x, cy - radius * v.y);
                let visible = v.z >= 0.0;

                if j == 0 {
                    last_visible = visible;
                }
                if visible != last_visible {
                    let hp = horizon_point(current, DVec2::new(cx, cy), radius);
                    if visible {
                        // Entering: the stretch begins on the limb.
                        polygon.clear();
                        polygon.push(hp);
                    } else {
                        // Leaving: close at the limb and drop the rest
                        // of the quarter.
                        polygon.push(hp);
                        self.flush(&mut polygon);
                        break;
                    }
                }
                if visible {
                    polygon.push(current);
                }
                last_visible = visible;
            }
            self.flush(&mut polygon);
        }
    }

    fn flat_circle(&mut self, angle: f64, dim: Dim) {
        let viewport = self.viewport;
        let rad2pixel = viewport.rad_to_pixel();
        let repeat_width = viewport.repeat_width();
        let width = viewport.width as f64;
        let height = viewport.height as f64;
        let cx = width / 2.0;
        let cy = height / 2.0;
        let (center_lon, center_lat) = viewport.center_coordinates();
        let max_lat = viewport.projection.max_lat();
        let center_lat = center_lat.clamp(-max_lat, max_lat);

        let vertical = |lat: f64| -> f64 {
            let lat = lat.clamp(-max_lat, max_lat);
            match viewport.projection {
                Projection::Mercator => {
                    cy - rad2pixel
                        * (mercator::vertical_warp(lat) - mercator::vertical_warp(center_lat))
                }
                _ => cy - rad2pixel * (lat - center_lat),
            }
        };

        match dim {
            Dim::Latitude => {
                let y = vertical(angle);
                self.out.push(ScreenPolygon::open(vec![
                    DVec2::new(0.0, y),
                    DVec2::new(width, y),
                ]));
            }
            Dim::Longitude => {
                let begin_y = vertical(max_lat).max(0.0);
                let end_y = vertical(-max_lat).min(height);

                // Each great circle shows up as two meridians half a
                // turn apart, both repeated across the strip.
                for half in [angle, angle + PI] {
                    let mut x = (cx + rad2pixel * (half - center_lon)).rem_euclid(repeat_width);
                    while x < width {
                        self.out.push(ScreenPolygon::open(vec![
                            DVec2::new(x, begin_y),
                            DVec2::new(x, end_y),
                        ]));
                        x += repeat_width;
                    }
                }
            }
        }
    }

    fn flush(&mut self, polygon: &mut Vec<DVec2>) {
        if polygon.len() >= 2 {
            self.out.push(ScreenPolygon::open(std::mem::take(polygon)));
        } else {
            polygon.clear();
        }
    }
}

/// Drops a crossing vertex onto the limb circle along the y axis.
fn horizon_point(current: DVec2, center: DVec2, radius: f64) -> DVec2 {
    let xa = current.x - center.x;
    let radicant = radius * radius - xa * xa;
    let ya = if radicant > 0.0 { radicant.sqrt() } else { 0.0 };
    let ya = if current.y < center.y { -ya } else { ya };
    DVec2::new(center.x + xa, center.y + ya)
}
