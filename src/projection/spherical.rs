//! Orthographic globe projection: rotate the surface point into view
//! space, drop the depth component, scale by the pixel radius.

use crate::math::Quaternion;
use crate::projection::Viewport;

pub(crate) fn screen_coordinates(lon: f64, lat: f64, viewport: &Viewport) -> Option<(f64, f64)> {
    let inverse_axis = viewport.orientation.inverse();
    let p = Quaternion::from_spherical(lon, lat).rotated_around_axis(&inverse_axis);

    // Negative depth means the point sits on the hidden hemisphere; the
    // horizon itself (z == 0) counts as visible.
    if p.z < 0.0 {
        return None;
    }

    let r = viewport.radius_f();
    Some((
        viewport.width as f64 / 2.0 + r * p.x,
        viewport.height as f64 / 2.0 - r * p.y,
    ))
}

pub(crate) fn geo_coordinates(x: f64, y: f64, viewport: &Viewport) -> Option<(f64, f64)> {
    let r = viewport.radius_f();
    let dx = x - viewport.width as f64 / 2.0;
    let dy = y - viewport.height as f64 / 2.0;

    if dx * dx + dy * dy > r * r {
        return None;
    }

    let qx = dx / r;
    let qy = -dy / r;
    let qr2z = 1.0 - qy * qy - qx * qx;
    let qz = if qr2z > 0.0 { qr2z.sqrt() } else { 0.0 };

    let p = Quaternion::new(0.0, qx, qy, qz).rotated_around_axis(&viewport.orientation);
    Some(p.to_spherical())
}

pub(crate) fn covers_viewport(viewport: &Viewport) -> bool {
    let r = viewport.radius as u64;
    let w = viewport.width as u64;
    let h = viewport.height as u64;
    // Disk contains the screen diagonal (compared against the
    // half-diagonal, hence the factor 4).
    4 * r * r >= w * w + h * h
}
