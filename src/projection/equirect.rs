//! Equirectangular projection: linear in both longitude and latitude,
//! centered on the viewport's center coordinates.

use crate::geo;
use crate::projection::Viewport;
use std::f64::consts::PI;

pub(crate) fn screen_coordinates(lon: f64, lat: f64, viewport: &Viewport) -> Option<(f64, f64)> {
    let rad2pixel = viewport.rad_to_pixel();
    let (center_lon, center_lat) = viewport.center_coordinates();

    let x = viewport.width as f64 / 2.0 + rad2pixel * geo::normalize_lon(lon - center_lon);
    let y = viewport.height as f64 / 2.0 - rad2pixel * (lat - center_lat);
    Some((x, y))
}

pub(crate) fn geo_coordinates(x: f64, y: f64, viewport: &Viewport) -> Option<(f64, f64)> {
    let rad2pixel = viewport.rad_to_pixel();
    let (center_lon, center_lat) = viewport.center_coordinates();

    let lat = center_lat + (viewport.height as f64 / 2.0 - y) / rad2pixel;
    if lat.abs() > PI / 2.0 {
        return None;
    }
    let lon = geo::normalize_lon(center_lon + (x - viewport.width as f64 / 2.0) / rad2pixel);
    Some((lon, lat))
}

pub(crate) fn covers_viewport(viewport: &Viewport) -> bool {
    // The strip always repeats horizontally; coverage is decided by the
    // vertical extent alone.
    let (_, center_lat) = viewport.center_coordinates();
    let rad2pixel = viewport.rad_to_pixel();
    let y_top = viewport.height as f64 / 2.0 - rad2pixel * (PI / 2.0 - center_lat);
    let y_bottom = viewport.height as f64 / 2.0 - rad2pixel * (-PI / 2.0 - center_lat);
    y_top <= 0.0 && y_bottom >= viewport.height as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::Projection;

    #[test]
    fn center_projects_to_screen_center() {
        let vp = Viewport::new(Projection::Equirectangular, 0.5, 0.25, 200, 640, 480);
        let (x, y) = screen_coordinates(0.5, 0.25, &vp).unwrap();
        assert!((x - 320.0).abs() < 1e-9);
        assert!((y - 240.0).abs() < 1e-9);
    }

    #[test]
    fn round_trip() {
        let vp = Viewport::new(Projection::Equirectangular, -1.0, 0.2, 200, 640, 480);
        let (x, y) = screen_coordinates(-0.7, -0.1, &vp).unwrap();
        let (lon, lat) = geo_coordinates(x, y, &vp).unwrap();
        assert!((lon + 0.7).abs() < 1e-9);
        assert!((lat + 0.1).abs() < 1e-9);
    }

    #[test]
    fn off_strip_pixels_are_none() {
        // Small radius: the strip is a narrow horizontal band.
        let vp = Viewport::new(Projection::Equirectangular, 0.0, 0.0, 20, 400, 400);
        assert!(geo_coordinates(200.0, 10.0, &vp).is_none());
        assert!(geo_coordinates(200.0, 200.0, &vp).is_some());
    }
}
