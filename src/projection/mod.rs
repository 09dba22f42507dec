pub mod equirect;
pub mod mercator;
pub mod spherical;

use crate::math::Quaternion;
use std::f64::consts::PI;

/// Map projection kind. A closed set, dispatched by match rather than
/// trait objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Projection {
    Spherical,
    Equirectangular,
    Mercator,
}

/// Viewport: everything needed to map geographic coordinates to screen
/// pixels. Owned by the caller, passed by reference into every
/// operation, mutated only between frames.
#[derive(Clone)]
pub struct Viewport {
    pub projection: Projection,
    /// Planet radius in pixels; doubles per zoom step.
    pub radius: u32,
    /// Planet rotation: the rotation that carries the view axis onto the
    /// centered surface point.
    pub orientation: Quaternion,
    pub width: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(
        projection: Projection,
        center_lon: f64,
        center_lat: f64,
        radius: u32,
        width: usize,
        height: usize,
    ) -> Self {
        Self {
            projection,
            radius,
            orientation: Self::orientation_for(center_lon, center_lat),
            width,
            height,
        }
    }

    /// Rotation that brings (lon, lat) in front of the viewer.
    pub fn orientation_for(center_lon: f64, center_lat: f64) -> Quaternion {
        Quaternion::from_euler(-center_lat, center_lon, 0.0)
    }

    /// The surface point currently facing the viewer.
    pub fn center_coordinates(&self) -> (f64, f64) {
        let axis = Quaternion::from_vec3(glam::DVec3::Z);
        axis.rotated_around_axis(&self.orientation).to_spherical()
    }

    pub fn set_center(&mut self, center_lon: f64, center_lat: f64) {
        self.orientation = Self::orientation_for(center_lon, center_lat);
    }

    #[inline(always)]
    pub fn radius_f(&self) -> f64 {
        self.radius as f64
    }

    /// Pixels per radian of longitude for the flat projections.
    #[inline(always)]
    pub fn rad_to_pixel(&self) -> f64 {
        2.0 * self.radius_f() / PI
    }

    /// Horizontal distance in pixels after which the flat projections
    /// repeat the same geography.
    #[inline(always)]
    pub fn repeat_width(&self) -> f64 {
        4.0 * self.radius_f()
    }
}

impl Projection {
    /// Project (lon, lat) in radians to screen pixels. `None` means the
    /// point is hidden (spherical back hemisphere, or outside the
    /// Mercator latitude domain). Flat-projection results are the
    /// principal (nearest-to-center) repeat; see
    /// [`Projection::screen_coordinates_repeated`].
    pub fn screen_coordinates(&self, lon: f64, lat: f64, viewport: &Viewport) -> Option<(f64, f64)> {
        match self {
            Projection::Spherical => spherical::screen_coordinates(lon, lat, viewport),
            Projection::Equirectangular => equirect::screen_coordinates(lon, lat, viewport),
            Projection::Mercator => mercator::screen_coordinates(lon, lat, viewport),
        }
    }

    /// All on-screen x positions of a point. Spherical yields at most
    /// one; flat projections repeat every `repeat_width` pixels at low
    /// zoom.
    pub fn screen_coordinates_repeated(
        &self,
        lon: f64,
        lat: f64,
        viewport: &Viewport,
    ) -> Vec<(f64, f64)> {
        let Some((x, y)) = self.screen_coordinates(lon, lat, viewport) else {
            return Vec::new();
        };
        if !self.repeat_x() {
            if x >= 0.0 && x < viewport.width as f64 && y >= 0.0 && y < viewport.height as f64 {
                return vec![(x, y)];
            }
            return Vec::new();
        }
        if y < 0.0 || y >= viewport.height as f64 {
            return Vec::new();
        }
        let step = viewport.repeat_width();
        // Walk back to the leftmost repeat, then sweep right.
        let mut x0 = x;
        while x0 >= 0.0 {
            x0 -= step;
        }
        x0 += step;
        let mut out = Vec::new();
        let mut xi = x0;
        while xi < viewport.width as f64 {
            out.push((xi, y));
            xi += step;
        }
        out
    }

    /// Inverse projection: screen pixel to (lon, lat) in radians. `None`
    /// when the pixel lies off the projected surface.
    pub fn geo_coordinates(&self, x: f64, y: f64, viewport: &Viewport) -> Option<(f64, f64)> {
        match self {
            Projection::Spherical => spherical::geo_coordinates(x, y, viewport),
            Projection::Equirectangular => equirect::geo_coordinates(x, y, viewport),
            Projection::Mercator => mercator::geo_coordinates(x, y, viewport),
        }
    }

    /// Highest latitude the projection can represent. Used as the
    /// vertical clip bound of the flat projections.
    pub fn max_lat(&self) -> f64 {
        match self {
            Projection::Spherical | Projection::Equirectangular => PI / 2.0,
            Projection::Mercator => mercator::MAX_LAT,
        }
    }

    /// Whether the same geography appears at several horizontal offsets.
    pub fn repeat_x(&self) -> bool {
        !matches!(self, Projection::Spherical)
    }

    /// True when the projected surface covers the whole viewport, which
    /// lets the clipping stages skip work.
    pub fn covers_viewport(&self, viewport: &Viewport) -> bool {
        match self {
            Projection::Spherical => spherical::covers_viewport(viewport),
            Projection::Equirectangular => equirect::covers_viewport(viewport),
            Projection::Mercator => mercator::covers_viewport(viewport),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_round_trip() {
        let vp = Viewport::new(Projection::Spherical, 0.8, -0.4, 300, 640, 480);
        let (lon, lat) = vp.center_coordinates();
        assert!((lon - 0.8).abs() < 1e-10);
        assert!((lat + 0.4).abs() < 1e-10);
    }

    #[test]
    fn identity_orientation_globe() {
        // radius 100, looking at (0, 0): the canonical visibility scenario.
        let vp = Viewport::new(Projection::Spherical, 0.0, 0.0, 100, 400, 400);

        let (x, y) = Projection::Spherical
            .screen_coordinates(0.0, 0.0, &vp)
            .unwrap();
        assert!((x - 200.0).abs() < 1e-9);
        assert!((y - 200.0).abs() < 1e-9);

        // 90 degrees east sits exactly on the horizon.
        let (x, _) = Projection::Spherical
            .screen_coordinates(PI / 2.0, 0.0, &vp)
            .unwrap();
        assert!((x - 300.0).abs() < 1e-9);

        // The antipode is hidden.
        assert!(Projection::Spherical
            .screen_coordinates(PI, 0.0, &vp)
            .is_none());
    }

    #[test]
    fn flat_projection_repeats() {
        // Tiny radius: the world strip is 80 px wide on a 400 px screen.
        let vp = Viewport::new(Projection::Equirectangular, 0.0, 0.0, 20, 400, 200);
        let repeats = Projection::Equirectangular.screen_coordinates_repeated(0.5, 0.2, &vp);
        assert!(repeats.len() >= 4);
        for pair in repeats.windows(2) {
            assert!((pair[1].0 - pair[0].0 - vp.repeat_width()).abs() < 1e-9);
        }
    }

    #[test]
    fn spherical_outside_disk_is_none() {
        let vp = Viewport::new(Projection::Spherical, 0.0, 0.0, 100, 400, 400);
        assert!(Projection::Spherical.geo_coordinates(10.0, 10.0, &vp).is_none());
        assert!(Projection::Spherical.geo_coordinates(200.0, 200.0, &vp).is_some());
    }
}
