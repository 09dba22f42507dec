use crate::geo;
use glam::{DMat3, DVec3};

/// Quaternion used both as a rotation (unit length) and as a surface
/// position (w = 0, (x, y, z) a point on the unit sphere).
///
/// Frame convention matches the rest of the crate: +z points at the
/// viewer, +x east, +y north. Positions are ephemeral values built per
/// conversion, never persisted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    pub const IDENTITY: Quaternion = Quaternion {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Position quaternion for a point on the unit sphere (radians).
    pub fn from_spherical(lon: f64, lat: f64) -> Self {
        let v = geo::to_vec3(lon, lat);
        Self::from_vec3(v)
    }

    /// Position quaternion from a 3D vector (w = 0).
    pub fn from_vec3(v: DVec3) -> Self {
        Self::new(0.0, v.x, v.y, v.z)
    }

    /// Rotation about an arbitrary unit axis.
    pub fn from_axis_angle(axis: DVec3, angle: f64) -> Self {
        let (s, c) = (angle / 2.0).sin_cos();
        Self::new(c, axis.x * s, axis.y * s, axis.z * s)
    }

    /// Euler-style rotation: yaw about +y, then pitch about +x, then
    /// roll about +z (applied right to left).
    pub fn from_euler(pitch: f64, yaw: f64, roll: f64) -> Self {
        let qy = Self::from_axis_angle(DVec3::Y, yaw);
        let qx = Self::from_axis_angle(DVec3::X, pitch);
        let qz = Self::from_axis_angle(DVec3::Z, roll);
        qy * qx * qz
    }

    /// The vector part, for position quaternions.
    #[inline(always)]
    pub fn as_vec3(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }

    /// Geographic coordinates of a position quaternion. The pole
    /// singularity yields longitude 0.
    pub fn to_spherical(&self) -> (f64, f64) {
        geo::to_spherical(self.as_vec3())
    }

    pub fn length(&self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len == 0.0 {
            return Self::IDENTITY;
        }
        let inv = 1.0 / len;
        Self::new(self.w * inv, self.x * inv, self.y * inv, self.z * inv)
    }

    pub fn conjugate(&self) -> Self {
        Self::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Inverse rotation. Conjugates, then renormalizes so that drift from
    /// repeated composition does not accumulate.
    pub fn inverse(&self) -> Self {
        self.conjugate().normalize()
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Rotate this position quaternion by the given rotation axis:
    /// `axis * self * axis^-1`.
    pub fn rotated_around_axis(&self, axis: &Quaternion) -> Self {
        *axis * *self * axis.conjugate()
    }

    /// Rotation matrix form. Per-frame batch loops (the scanline
    /// resampler, the vector projector) rotate through this matrix
    /// instead of repeating the quaternion sandwich per point.
    pub fn to_matrix(&self) -> DMat3 {
        let (w, x, y, z) = (self.w, self.x, self.y, self.z);
        let (xx, yy, zz) = (x * x, y * y, z * z);
        DMat3::from_cols(
            DVec3::new(
                1.0 - 2.0 * (yy + zz),
                2.0 * (x * y + w * z),
                2.0 * (x * z - w * y),
            ),
            DVec3::new(
                2.0 * (x * y - w * z),
                1.0 - 2.0 * (xx + zz),
                2.0 * (y * z + w * x),
            ),
            DVec3::new(
                2.0 * (x * z + w * y),
                2.0 * (y * z - w * x),
                1.0 - 2.0 * (xx + yy),
            ),
        )
    }

    /// Spherical linear interpolation between two rotations, taking the
    /// shorter arc. Falls back to linear weights when the angle between
    /// the rotations vanishes.
    pub fn slerp(&self, other: &Self, t: f64) -> Self {
        let mut cos_half = self.dot(other);
        let other = if cos_half < 0.0 {
            cos_half = -cos_half;
            Self::new(-other.w, -other.x, -other.y, -other.z)
        } else {
            *other
        };

        let (wa, wb) = if cos_half > 1.0 - 1e-9 {
            // Nearly identical rotations: sin(half) ~ 0, so the spherical
            // weights would divide by zero.
            (1.0 - t, t)
        } else {
            let half = cos_half.clamp(-1.0, 1.0).acos();
            let sin_half = half.sin();
            (((1.0 - t) * half).sin() / sin_half, (t * half).sin() / sin_half)
        };

        Self::new(
            wa * self.w + wb * other.w,
            wa * self.x + wb * other.x,
            wa * self.y + wb * other.y,
            wa * self.z + wb * other.z,
        )
        .normalize()
    }

    /// Normalized linear interpolation, cheaper than slerp and adequate
    /// for short camera transitions.
    pub fn nlerp(&self, other: &Self, t: f64) -> Self {
        let other = if self.dot(other) < 0.0 {
            Self::new(-other.w, -other.x, -other.y, -other.z)
        } else {
            *other
        };
        Self::new(
            (1.0 - t) * self.w + t * other.w,
            (1.0 - t) * self.x + t * other.x,
            (1.0 - t) * self.y + t * other.y,
            (1.0 - t) * self.z + t * other.z,
        )
        .normalize()
    }
}

impl std::ops::Mul for Quaternion {
    type Output = Quaternion;

    fn mul(self, rhs: Quaternion) -> Quaternion {
        Quaternion::new(
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::rand_simple;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn random_rotation(seed: u64) -> Quaternion {
        let axis = DVec3::new(
            rand_simple(seed) * 2.0 - 1.0,
            rand_simple(seed + 1) * 2.0 - 1.0,
            rand_simple(seed + 2) * 2.0 - 1.0,
        )
        .normalize();
        Quaternion::from_axis_angle(axis, rand_simple(seed + 3) * 2.0 * PI)
    }

    #[test]
    fn spherical_round_trip() {
        for i in 0..200 {
            let lon = (rand_simple(i) * 2.0 - 1.0) * (PI - 1e-6);
            let lat = (rand_simple(i + 1000) * 2.0 - 1.0) * (FRAC_PI_2 - 1e-3);
            let (lon2, lat2) = Quaternion::from_spherical(lon, lat).to_spherical();
            assert!((lon - lon2).abs() < 1e-10);
            assert!((lat - lat2).abs() < 1e-10);
        }
    }

    #[test]
    fn inverse_composes_to_identity() {
        for seed in 0..50 {
            let q = random_rotation(seed * 7);
            let ident = q.inverse() * q;
            let p = Quaternion::from_spherical(0.7, -0.3);
            let rotated = p.rotated_around_axis(&ident);
            assert!((rotated.x - p.x).abs() < 1e-10);
            assert!((rotated.y - p.y).abs() < 1e-10);
            assert!((rotated.z - p.z).abs() < 1e-10);
        }
    }

    #[test]
    fn matrix_matches_quaternion_rotation() {
        for seed in 0..50 {
            let q = random_rotation(seed * 13 + 1);
            let m = q.to_matrix();
            let p = Quaternion::from_spherical(
                rand_simple(seed) * 3.0 - 1.5,
                rand_simple(seed + 99) * 1.4 - 0.7,
            );
            let by_quat = p.rotated_around_axis(&q).as_vec3();
            let by_mat = m * p.as_vec3();
            assert!((by_quat - by_mat).length() < 1e-10, "seed {seed}");
        }
    }

    #[test]
    fn slerp_hits_endpoints() {
        let a = random_rotation(3);
        let b = random_rotation(11);
        let s0 = a.slerp(&b, 0.0);
        let s1 = a.slerp(&b, 1.0);
        assert!(a.dot(&s0).abs() > 1.0 - 1e-9);
        assert!(b.dot(&s1).abs() > 1.0 - 1e-9);
    }

    #[test]
    fn slerp_degenerate_angle_falls_back() {
        let a = random_rotation(5);
        let s = a.slerp(&a, 0.37);
        assert!(a.dot(&s).abs() > 1.0 - 1e-12);
        assert!((s.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn nlerp_stays_unit_length() {
        let a = random_rotation(17);
        let b = random_rotation(23);
        for i in 0..=10 {
            let t = i as f64 / 10.0;
            assert!((a.nlerp(&b, t).length() - 1.0).abs() < 1e-12);
        }
    }
}
