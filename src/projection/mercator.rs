//! Mercator projection. Longitude is linear; latitude maps through
//! atanh(sin(lat)) relative to the viewport's center latitude.

use crate::geo;
use crate::projection::Viewport;

/// Largest latitude where atanh(sin(lat)) stays finite in f64 practice;
/// the poles are not representable.
pub const MAX_LAT: f64 = 85.05113 * std::f64::consts::PI / 180.0;

#[inline(always)]
pub(crate) fn vertical_warp(lat: f64) -> f64 {
    lat.sin().atanh()
}

fn clamped_center(viewport: &Viewport) -> (f64, f64) {
    let (center_lon, center_lat) = viewport.center_coordinates();
    (center_lon, center_lat.clamp(-MAX_LAT, MAX_LAT))
}

pub(crate) fn screen_coordinates(lon: f64, lat: f64, viewport: &Viewport) -> Option<(f64, f64)> {
    if lat.abs() > MAX_LAT {
        return None;
    }
    let rad2pixel = viewport.rad_to_pixel();
    let (center_lon, center_lat) = clamped_center(viewport);

    let x = viewport.width as f64 / 2.0 + rad2pixel * geo::normalize_lon(lon - center_lon);
    let y = viewport.height as f64 / 2.0
        - rad2pixel * (vertical_warp(lat) - vertical_warp(center_lat));
    Some((x, y))
}

pub(crate) fn geo_coordinates(x: f64, y: f64, viewport: &Viewport) -> Option<(f64, f64)> {
    let rad2pixel = viewport.rad_to_pixel();
    let (center_lon, center_lat) = clamped_center(viewport);

    let warped = (viewport.height as f64 / 2.0 - y) / rad2pixel + vertical_warp(center_lat);
    if warped.abs() > vertical_warp(MAX_LAT) {
        return None;
    }
    let lat = warped.tanh().asin();
    let lon = geo::normalize_lon(center_lon + (x - viewport.width as f64 / 2.0) / rad2pixel);
    Some((lon, lat))
}

pub(crate) fn covers_viewport(viewport: &Viewport) -> bool {
    let rad2pixel = viewport.rad_to_pixel();
    let (_, center_lat) = clamped_center(viewport);
    let warp_max = vertical_warp(MAX_LAT);
    let center_warp = vertical_warp(center_lat);
    let y_top = viewport.height as f64 / 2.0 - rad2pixel * (warp_max - center_warp);
    let y_bottom = viewport.height as f64 / 2.0 - rad2pixel * (-warp_max - center_warp);
    y_top <= 0.0 && y_bottom >= viewport.height as f64
}
