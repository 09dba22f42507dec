//! Geographic runs to screen-space sub-paths.
//!
//! The spherical path tracks hemisphere transitions vertex by vertex:
//! every crossing lands a point on the limb circle, and a hidden
//! excursion between two crossings is stitched with a sampled arc so
//! coastlines follow the planet's edge instead of cutting chords
//! through its face. The flat path splits runs at the antimeridian and
//! re-emits them at every visible horizontal repeat.

use std::f64::consts::PI;

use glam::{DMat3, DVec2};
use tracing::debug;

use crate::geo;
use crate::projection::{mercator, Projection, Viewport};
use crate::vector::boundary::{detail_threshold, GeoBoundary};
use crate::vector::clip::ScreenPolygon;

/// Bounding-box cull limit on the rotated z component, with slack so
/// features reaching around the limb survive the cull.
const BOUNDING_Z_LIMIT: f64 = -0.3;

/// Target chord length for sampled limb arcs, in pixels.
const ARC_CHORD_PX: f64 = 3.0;

const ARC_STEP_MIN: f64 = 0.2 * PI / 180.0;
const ARC_STEP_MAX: f64 = 2.0 * PI / 180.0;

pub struct VectorProjector {
    width: usize,
    height: usize,
}

impl VectorProjector {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Projects a boundary set for one frame: bbox pre-cull, detail
    /// thinning, then the projection-specific path walk.
    pub fn project(&self, boundaries: &[GeoBoundary], viewport: &Viewport) -> Vec<ScreenPolygon> {
        let threshold = detail_threshold(viewport.radius);
        let mat = viewport.orientation.inverse().to_matrix();
        let spherical = viewport.projection == Projection::Spherical;

        let mut out = Vec::new();
        let mut culled = 0usize;
        for b in boundaries {
            if spherical && !b.is_visible(&mat, BOUNDING_Z_LIMIT) {
                culled += 1;
                continue;
            }
            let kept = b
                .points
                .iter()
                .filter(|p| p.detail >= threshold)
                .map(|p| (p.lon, p.lat));
            out.extend(self.project_path(kept, b.closed, viewport, &mat));
        }
        debug!(
            total = boundaries.len(),
            culled,
            polygons = out.len(),
            "projected boundary set"
        );
        out
    }

    /// Projects one geographic run. Exposed so the graticule builder
    /// runs its circles through the same horizon machinery.
    pub fn project_path(
        &self,
        points: impl Iterator<Item = (f64, f64)>,
        closed: bool,
        viewport: &Viewport,
        inverse_rotation: &DMat3,
    ) -> Vec<ScreenPolygon> {
        match viewport.projection {
            Projection::Spherical => {
                self.project_spherical(points, closed, viewport, inverse_rotation)
            }
            Projection::Equirectangular | Projection::Mercator => {
                self.project_flat(points, closed, viewport)
            }
        }
    }

    fn project_spherical(
        &self,
        points: impl Iterator<Item = (f64, f64)>,
        closed: bool,
        viewport: &Viewport,
        inverse_rotation: &DMat3,
    ) -> Vec<ScreenPolygon> {
        // Keep the limb strictly inside the rasterized disk.
        let radius = viewport.radius_f() - 1.0;
        let center = DVec2::new(self.width as f64 / 2.0, self.height as f64 / 2.0);

        // Lowest z value of the sphere still visible on screen; a
        // zoomed-in excerpt only shows a cap well above the horizon.
        let radius_sq = radius * radius;
        let image_radius_sq = center.x * center.x + center.y * center.y;
        let z_limit = if image_radius_sq < radius_sq {
            (1.0 - image_radius_sq / radius_sq).sqrt()
        } else {
            0.0
        };
        let r_limit_sq = radius_sq * (1.0 - z_limit * z_limit);

        let mut run = HorizonRun {
            center,
            r_limit_sq,
            closed,
            polygon: Vec::new(),
            last_point: DVec2::ZERO,
            last_visible: false,
            horizon_pair: false,
            horizon_a: DVec2::ZERO,
            first_horizon: None,
            started: false,
        };

        for (lon, lat) in points {
            let v = *inverse_rotation * geo::to_vec3(lon, lat);
            let current = DVec2::new(center.x + radius * v.x, center.y - radius * v.y);
            run.step(current, v.z >= 0.0);
        }
        run.finish()
    }

    fn project_flat(
        &self,
        points: impl Iterator<Item = (f64, f64)>,
        closed: bool,
        viewport: &Viewport,
    ) -> Vec<ScreenPolygon> {
        let rad2pixel = viewport.rad_to_pixel();
        let repeat_width = viewport.repeat_width();
        let cx = self.width as f64 / 2.0;
        let cy = self.height as f64 / 2.0;
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
        let horizontal = |lon: f64| cx + rad2pixel * (lon - center_lon);

        // Latitude at the seam, interpolated along the short way
        // around. `None` when the segment stays on one side.
        let seam_lat = |plon: f64, plat: f64, lon: f64, lat: f64| -> Option<f64> {
            if plon.signum() != lon.signum() && plon.abs() + lon.abs() > PI {
                let to_seam = PI - plon.abs();
                let from_seam = PI - lon.abs();
                let frac = to_seam / (to_seam + from_seam).max(f64::EPSILON);
                Some(plat + frac * (lat - plat))
            } else {
                None
            }
        };

        // Base sub-paths, split at the antimeridian.
        let mut subs: Vec<Vec<DVec2>> = Vec::new();
        let mut current: Vec<DVec2> = Vec::new();
        let mut split = false;
        let mut first: Option<(f64, f64)> = None;
        let mut prev: Option<(f64, f64)> = None;

        for (lon, lat) in points {
            if let Some((plon, plat)) = prev {
                if let Some(slat) = seam_lat(plon, plat, lon, lat) {
                    current.push(DVec2::new(horizontal(PI.copysign(plon)), vertical(slat)));
                    subs.push(std::mem::take(&mut current));
                    current.push(DVec2::new(horizontal(PI.copysign(lon)), vertical(slat)));
                    split = true;
                }
            } else {
                first = Some((lon, lat));
            }
            prev = Some((lon, lat));
            current.push(DVec2::new(horizontal(lon), vertical(lat)));
        }

        // A ring's wrap segment can cross the seam as well; end the
        // last sub-path on the seam and lead the first one in from it.
        if closed {
            if let (Some((plon, plat)), Some((flon, flat))) = (prev, first) {
                if let Some(slat) = seam_lat(plon, plat, flon, flat) {
                    current.push(DVec2::new(horizontal(PI.copysign(plon)), vertical(slat)));
                    let entry = DVec2::new(horizontal(PI.copysign(flon)), vertical(slat));
                    let head = subs.first_mut().unwrap_or(&mut current);
                    head.insert(0, entry);
                    split = true;
                }
            }
        }
        subs.push(current);

        // A split ring cannot stay closed on a flat strip.
        let closed = closed && !split;

        // Re-emit every sub-path at each horizontal repeat that touches
        // the screen.
        let width = self.width as f64;
        let mut out = Vec::new();
        for sub in subs {
            let min = if closed { 3 } else { 2 };
            if sub.len() < min {
                continue;
            }
            let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
            for p in &sub {
                min_x = min_x.min(p.x);
                max_x = max_x.max(p.x);
            }
            let k_first = ((-max_x) / repeat_width).floor() as i32;
            let k_last = ((width - min_x) / repeat_width).ceil() as i32;
            for k in k_first..=k_last {
                let shift = k as f64 * repeat_width;
                if max_x + shift < 0.0 || min_x + shift > width {
                    continue;
                }
                out.push(ScreenPolygon {
                    points: sub.iter().map(|p| DVec2::new(p.x + shift, p.y)).collect(),
                    closed,
                });
            }
        }
        out
    }
}

/// Vertex-walk state for the spherical horizon clip.
struct HorizonRun {
    center: DVec2,
    r_limit_sq: f64,
    closed: bool,
    polygon: Vec<DVec2>,
    last_point: DVec2,
    last_visible: bool,
    horizon_pair: bool,
    horizon_a: DVec2,
    /// Orphaned leading crossing: the run entered the visible side
    /// before ever leaving it, so its partner arrives at the end.
    first_horizon: Option<DVec2>,
    started: bool,
}

impl HorizonRun {
    fn step(&mut self, current: DVec2, visible: bool) {
        if !self.started {
            self.started = true;
            self.last_visible = visible;
            self.last_point = current + DVec2::ONE;
        } else if visible != self.last_visible {
            self.cross_horizon(current, visible);
        }
        if visible && current != self.last_point {
            self.polygon.push(current);
        }
        self.last_point = current;
        self.last_visible = visible;
    }

    fn cross_horizon(&mut self, current: DVec2, entering: bool) {
        let hp = self.horizon_point(current);
        if !self.horizon_pair {
            if entering {
                // No pending exit point to pair with.
                if self.closed {
                    self.first_horizon = Some(hp);
                } else {
                    self.polygon.push(hp);
                }
            } else {
                self.horizon_a = hp;
                self.horizon_pair = true;
            }
        } else {
            self.create_arc(self.horizon_a, hp);
            self.horizon_pair = false;
        }
    }

    /// Drops the crossing vertex onto the limb circle along the y axis.
    fn horizon_point(&self, current: DVec2) -> DVec2 {
        let xa = current.x - self.center.x;
        let ya = if self.r_limit_sq > xa * xa {
            (self.r_limit_sq - xa * xa).sqrt()
        } else {
            0.0
        };
        let ya = if current.y < self.center.y { -ya } else { ya };
        DVec2::new(self.center.x + xa, self.center.y + ya)
    }

    /// Connects two horizon points with samples along the limb, taking
    /// the shorter angular direction.
    fn create_arc(&mut self, a: DVec2, b: DVec2) {
        let alpha = (a.y - self.center.y).atan2(a.x - self.center.x);
        let beta = (b.y - self.center.y).atan2(b.x - self.center.x);
        let mut diff = beta - alpha;
        if diff == 0.0 || diff.abs() == PI {
            return;
        }
        if diff.abs() > PI {
            diff = -(2.0 * PI - diff.abs()).copysign(diff);
        }

        self.polygon.push(a);
        let arc_radius = self.r_limit_sq.sqrt();
        let step = (ARC_CHORD_PX / arc_radius).clamp(ARC_STEP_MIN, ARC_STEP_MAX);
        let sgn = diff.signum();
        let mut t = step;
        while t < diff.abs() {
            let angle = alpha + sgn * t;
            self.polygon.push(DVec2::new(
                self.center.x + arc_radius * angle.cos(),
                self.center.y + arc_radius * angle.sin(),
            ));
            t += step;
        }
        self.polygon.push(b);
    }

    fn finish(mut self) -> Vec<ScreenPolygon> {
        // Resolve an orphaned leading crossing against the trailing
        // exit so the ring closes along the limb.
        if let Some(first) = self.first_horizon.take() {
            if self.horizon_pair {
                self.create_arc(self.horizon_a, first);
                self.horizon_pair = false;
            }
        } else if self.horizon_pair && !self.closed {
            // An open run that ends hidden terminates at the limb.
            let a = self.horizon_a;
            self.polygon.push(a);
        }

        let min = if self.closed { 3 } else { 2 };
        if self.polygon.len() >= min {
            vec![ScreenPolygon {
                points: self.polygon,
                closed: self.closed,
            }]
        } else {
            Vec::new()
        }
    }
}
