use keelphys_core::types::{Isometry, Vec3, Mat3};
use crate::aabb::Aabb;

/// Collision geometry owned by a body, by value. Boxes are the primary
/// shape; spheres only participate in the broad phase for now.
#[derive(Copy, Clone, Debug)]
pub enum Shape {
    Box { half: Vec3 },
    Sphere { r: f32 },
}

impl Shape {
    /// Full extents along each local axis.
    #[inline]
    pub fn size(&self) -> Vec3 {
        match *self {
            Shape::Box { half } => half * 2.0,
            Shape::Sphere { r } => Vec3::splat(r * 2.0),
        }
    }

    #[inline]
    pub fn as_box(&self) -> Option<Vec3> {
        match *self {
            Shape::Box { half } => Some(half),
            Shape::Sphere { .. } => None,
        }
    }
}

/// World AABB of a shape at `xf`. For boxes this is the oriented-box bound:
/// world half-extents are |R| * half, so the result stays tight under
/// rotation without projecting corners one by one.
#[inline]
pub fn aabb_of(shape: &Shape, xf: &Isometry) -> Aabb {
    match *shape {
        Shape::Box { half } => {
            let rot = Mat3::from_quat(xf.rot);
            let m = Mat3::from_cols(rot.x_axis.abs(), rot.y_axis.abs(), rot.z_axis.abs());
            Aabb::from_center_half_extents(xf.pos, m * half)
        }
        Shape::Sphere { r } => Aabb::from_center_half_extents(xf.pos, Vec3::splat(r)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keelphys_core::{vec3, iso, quat_identity};
    use glam::Quat;

    #[test]
    fn unrotated_box_aabb_equals_half_extents() {
        let s = Shape::Box { half: vec3(0.5, 1.0, 2.0) };
        let bb = aabb_of(&s, &iso(vec3(1.0, 2.0, 3.0), quat_identity()));
        assert!((bb.min - vec3(0.5, 1.0, 1.0)).length() < 1.0e-6);
        assert!((bb.max - vec3(1.5, 3.0, 5.0)).length() < 1.0e-6);
    }

    #[test]
    fn rotated_box_aabb_grows() {
        // A unit box yawed 45 degrees spans sqrt(2) on x and z.
        let s = Shape::Box { half: vec3(0.5, 0.5, 0.5) };
        let q = Quat::from_rotation_y(core::f32::consts::FRAC_PI_4);
        let bb = aabb_of(&s, &iso(Vec3::ZERO, q));
        let expect = core::f32::consts::SQRT_2 * 0.5;
        assert!((bb.max.x - expect).abs() < 1.0e-5);
        assert!((bb.max.y - 0.5).abs() < 1.0e-5);
        assert!((bb.max.z - expect).abs() < 1.0e-5);
    }
}
