use keelphys_core::types::{Isometry, Vec3, Mat3};
use keelphys_core::Scalar;

/// Minimum-overlap separating-axis result for an overlapping box pair.
/// `normal` is unit length and points from A toward B.
#[derive(Copy, Clone, Debug)]
pub struct SatHit {
    pub normal: Vec3,
    pub depth: Scalar,
}

const DEGENERATE_AXIS_SQ: Scalar = 1.0e-6;

const CORNER_SIGNS: [Vec3; 8] = [
    Vec3::new(1.0, 1.0, 1.0),
    Vec3::new(-1.0, 1.0, 1.0),
    Vec3::new(-1.0, -1.0, 1.0),
    Vec3::new(1.0, -1.0, 1.0),
    Vec3::new(1.0, 1.0, -1.0),
    Vec3::new(-1.0, 1.0, -1.0),
    Vec3::new(-1.0, -1.0, -1.0),
    Vec3::new(1.0, -1.0, -1.0),
];

/// Project all 8 corners of an oriented box onto a unit axis.
fn project_box(pos: Vec3, rot: &Mat3, half: Vec3, axis: Vec3) -> (Scalar, Scalar) {
    let mut min = Scalar::INFINITY;
    let mut max = Scalar::NEG_INFINITY;
    for s in CORNER_SIGNS {
        let p = (pos + *rot * (half * s)).dot(axis);
        min = min.min(p);
        max = max.max(p);
    }
    (min, max)
}

/// Separating-axis test over the 15 candidate axes of an oriented box pair:
/// 3 face normals each plus the 9 edge cross products (near-parallel edges
/// are skipped as degenerate). Returns the axis of least penetration, or
/// `None` as soon as any axis separates the boxes.
pub fn sat_box_box(
    pose_a: &Isometry, half_a: Vec3,
    pose_b: &Isometry, half_b: Vec3,
) -> Option<SatHit> {
    let rot_a = Mat3::from_quat(pose_a.rot);
    let rot_b = Mat3::from_quat(pose_b.rot);
    let axes_a = [rot_a.x_axis, rot_a.y_axis, rot_a.z_axis];
    let axes_b = [rot_b.x_axis, rot_b.y_axis, rot_b.z_axis];

    let mut min_overlap = Scalar::INFINITY;
    let mut best_axis = Vec3::ZERO;
    let mut flip = false;

    let center_delta = pose_b.pos - pose_a.pos;
    // None = separating axis found; Some(()) = keep going.
    let mut test = |axis: Vec3| -> Option<()> {
        if axis.length_squared() < DEGENERATE_AXIS_SQ { return Some(()); }
        let axis = axis.normalize();
        let (min_a, max_a) = project_box(pose_a.pos, &rot_a, half_a, axis);
        let (min_b, max_b) = project_box(pose_b.pos, &rot_b, half_b, axis);
        let overlap = max_a.min(max_b) - min_a.max(min_b);
        if overlap <= 0.0 { return None; }
        if overlap < min_overlap {
            min_overlap = overlap;
            best_axis = axis;
            flip = center_delta.dot(axis) < 0.0;
        }
        Some(())
    };

    for axis in axes_a {
        test(axis)?;
    }
    for axis in axes_b {
        test(axis)?;
    }
    for a in axes_a {
        for b in axes_b {
            test(a.cross(b))?;
        }
    }

    if min_overlap <= 0.0 || best_axis.length_squared() < 1.0e-5 {
        return None;
    }
    let normal = if flip { -best_axis } else { best_axis };
    Some(SatHit { normal, depth: min_overlap })
}
