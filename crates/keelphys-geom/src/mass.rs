use keelphys_core::types::{Mat3, Vec3};
use keelphys_core::Scalar;
use crate::shape::Shape;

/// Mass, inverse mass and the body-space inertia tensor pair. Static bodies
/// use `infinite()`: zero inverse mass and zero inverse inertia, so impulses
/// and integration leave them untouched.
#[derive(Copy, Clone, Debug)]
pub struct MassProps {
    pub mass: Scalar,
    pub inv_mass: Scalar,
    pub inertia: Mat3,
    pub inv_inertia: Mat3,
}

impl MassProps {
    pub fn infinite() -> Self {
        Self { mass: Scalar::INFINITY, inv_mass: 0.0, inertia: Mat3::ZERO, inv_inertia: Mat3::ZERO }
    }

    /// Solid box with the given scalar mass. dims = 2 * half;
    /// I_x = m/12 * (dy^2 + dz^2), cyclic for the rest.
    pub fn box_with_mass(half: Vec3, mass: Scalar) -> Self {
        if mass <= 0.0 { return Self::infinite(); }
        let dims = half * 2.0;
        let x2 = dims.x * dims.x;
        let y2 = dims.y * dims.y;
        let z2 = dims.z * dims.z;
        let k = mass / 12.0;
        let diag = Vec3::new(k * (y2 + z2), k * (x2 + z2), k * (x2 + y2));
        let inertia = Mat3::from_diagonal(diag.into());
        Self { mass, inv_mass: 1.0 / mass, inertia, inv_inertia: inertia.inverse() }
    }

    /// Solid sphere: I = 2/5 * m * r^2 on every axis.
    pub fn sphere_with_mass(r: Scalar, mass: Scalar) -> Self {
        if mass <= 0.0 { return Self::infinite(); }
        let i = 0.4 * mass * r * r;
        let inertia = Mat3::from_diagonal(Vec3::splat(i).into());
        Self { mass, inv_mass: 1.0 / mass, inertia, inv_inertia: inertia.inverse() }
    }

    pub fn for_shape(shape: &Shape, mass: Scalar) -> Self {
        match *shape {
            Shape::Box { half } => Self::box_with_mass(half, mass),
            Shape::Sphere { r } => Self::sphere_with_mass(r, mass),
        }
    }
}
