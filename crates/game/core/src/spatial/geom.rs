//! Small geometry helpers shared by overlap and trace backends.
//!
//! World up is +Y. Yaw is measured in degrees around +Y, with 0 facing +X.

use glam::{Quat, Vec3};

const EPSILON: f32 = 1e-6;

/// Parametric distance along a normalized ray where it first touches a sphere.
#[inline]
pub fn ray_sphere(origin: Vec3, dir: Vec3, max: f32, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    if c <= 0.0 {
        // Origin inside the sphere.
        return Some(0.0);
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    (t >= 0.0 && t <= max).then_some(t)
}

/// Distance along a normalized ray to the horizontal plane `y = height`.
#[inline]
pub fn ray_plane_y(origin: Vec3, dir: Vec3, max: f32, height: f32) -> Option<f32> {
    if dir.y.abs() < EPSILON {
        return None;
    }
    let t = (height - origin.y) / dir.y;
    (t >= 0.0 && t <= max).then_some(t)
}

/// Closest point to `p` on the segment `[a, b]`.
#[inline]
pub fn closest_point_on_segment(a: Vec3, b: Vec3, p: Vec3) -> Vec3 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    a + ab * t
}

/// True if a sphere touches an oriented box.
pub fn obb_touches_sphere(
    center: Vec3,
    rotation: Quat,
    half_extents: Vec3,
    sphere_center: Vec3,
    sphere_radius: f32,
) -> bool {
    let local = rotation.inverse() * (sphere_center - center);
    let closest = local.clamp(-half_extents, half_extents);
    (local - closest).length_squared() <= sphere_radius * sphere_radius
}

/// True if a sphere touches a capsule whose axis is the rotated +Y.
///
/// `half_height` includes the hemispherical caps.
pub fn capsule_touches_sphere(
    center: Vec3,
    rotation: Quat,
    radius: f32,
    half_height: f32,
    sphere_center: Vec3,
    sphere_radius: f32,
) -> bool {
    let inner = (half_height - radius).max(0.0);
    let axis = rotation * Vec3::Y;
    let a = center - axis * inner;
    let b = center + axis * inner;
    let closest = closest_point_on_segment(a, b, sphere_center);
    let reach = radius + sphere_radius;
    (sphere_center - closest).length_squared() <= reach * reach
}

/// Rotation that turns +X to face from `from` towards `to`.
///
/// Coincident points yield the identity rotation.
pub fn look_at_rotation(from: Vec3, to: Vec3) -> Quat {
    match (to - from).try_normalize() {
        Some(dir) => Quat::from_rotation_arc(Vec3::X, dir),
        None => Quat::IDENTITY,
    }
}

/// Yaw in degrees of the horizontal direction from `from` to `to`.
pub fn yaw_towards(from: Vec3, to: Vec3) -> f32 {
    let d = to - from;
    d.z.atan2(d.x).to_degrees()
}

/// Wraps an angle in degrees into `(-180, 180]`.
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = (angle + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped <= -180.0 { wrapped + 360.0 } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_hits_sphere_front_face() {
        let t = ray_sphere(Vec3::ZERO, Vec3::X, 100.0, Vec3::new(10.0, 0.0, 0.0), 2.0);
        assert_eq!(t, Some(8.0));
    }

    #[test]
    fn ray_misses_sphere_beyond_range() {
        let t = ray_sphere(Vec3::ZERO, Vec3::X, 5.0, Vec3::new(10.0, 0.0, 0.0), 2.0);
        assert_eq!(t, None);
    }

    #[test]
    fn rotated_box_touches_along_its_long_axis() {
        let rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let half = Vec3::new(10.0, 1.0, 1.0);
        // After a quarter turn around Y the long axis lies along -Z.
        assert!(obb_touches_sphere(Vec3::ZERO, rotation, half, Vec3::new(0.0, 0.0, -9.0), 0.5));
        assert!(!obb_touches_sphere(Vec3::ZERO, rotation, half, Vec3::new(9.0, 0.0, 0.0), 0.5));
    }

    #[test]
    fn capsule_reaches_its_caps() {
        assert!(capsule_touches_sphere(
            Vec3::ZERO,
            Quat::IDENTITY,
            1.0,
            5.0,
            Vec3::new(0.0, 5.5, 0.0),
            0.6,
        ));
        assert!(!capsule_touches_sphere(
            Vec3::ZERO,
            Quat::IDENTITY,
            1.0,
            5.0,
            Vec3::new(0.0, 7.0, 0.0),
            0.5,
        ));
    }

    #[test]
    fn wrap_keeps_half_open_range() {
        assert_eq!(wrap_degrees(190.0), -170.0);
        assert_eq!(wrap_degrees(-190.0), 170.0);
        assert_eq!(wrap_degrees(180.0), 180.0);
        assert_eq!(wrap_degrees(-180.0), 180.0);
        assert_eq!(wrap_degrees(540.0), 180.0);
    }
}
