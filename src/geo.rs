use glam::DVec3;
use std::f64::consts::PI;

/// Squared planar distance from the rotation axis below which the
/// longitude of a surface point is considered undefined.
const POLE_EPSILON_SQ: f64 = 1e-20;

/// Convert (lon, lat) in radians to a unit sphere vector.
/// Frame: +z points at the viewer (lon 0 / lat 0), +x east, +y north.
#[inline(always)]
pub fn to_vec3(lon: f64, lat: f64) -> DVec3 {
    let (sin_lon, cos_lon) = lon.sin_cos();
    let (sin_lat, cos_lat) = lat.sin_cos();
    DVec3::new(cos_lat * sin_lon, sin_lat, cos_lat * cos_lon)
}

/// Recover (lon, lat) in radians from a unit sphere vector.
/// At the poles the longitude is defined as 0 rather than left to the
/// whim of `atan2` over two vanishing components.
#[inline(always)]
pub fn to_spherical(v: DVec3) -> (f64, f64) {
    let plane = v.x * v.x + v.z * v.z;
    if plane < POLE_EPSILON_SQ {
        let lat = if v.y >= 0.0 { PI / 2.0 } else { -PI / 2.0 };
        return (0.0, lat);
    }
    (v.x.atan2(v.z), v.y.clamp(-1.0, 1.0).asin())
}

/// Wrap a longitude in radians into (-PI, PI].
#[inline(always)]
pub fn normalize_lon(lon: f64) -> f64 {
    if lon > -PI && lon <= PI {
        return lon;
    }
    let wrapped = lon.rem_euclid(2.0 * PI);
    if wrapped > PI {
        wrapped - 2.0 * PI
    } else {
        wrapped
    }
}

/// Clamp a latitude in radians into [-PI/2, PI/2].
#[inline(always)]
pub fn clamp_lat(lat: f64) -> f64 {
    lat.clamp(-PI / 2.0, PI / 2.0)
}
