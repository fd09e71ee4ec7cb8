use keelphys_core::types::{Isometry, Vec3, Mat3};
use keelphys_core::{BodyId, Scalar};
use crate::sat::SatHit;

pub const MAX_CONTACTS: usize = 4;

/// Points with depth beyond the SAT overlap by more than this are clip
/// artifacts and get dropped.
const DEPTH_MARGIN: Scalar = 0.01;
/// Small pessimistic bias added to every kept depth so the solver separates
/// slightly more than strictly measured.
const DEPTH_BIAS: Scalar = 0.001;

#[derive(Copy, Clone, Debug)]
pub struct ContactPoint {
    pub point: Vec3,
    pub normal: Vec3,
    pub depth: Scalar,
}

/// One overlapping pair for one step. Bodies are referenced by handle, never
/// by pointer, so a stale manifold can at worst name a removed body.
/// Rebuilt every step; the world keeps the previous step's manifolds only as
/// a read-only snapshot for debug drawing.
#[derive(Clone, Debug)]
pub struct ContactManifold {
    pub a: BodyId,
    pub b: BodyId,
    pub colliding: bool,
    pub penetration: Scalar,
    pub normal: Vec3,
    pub points: Vec<ContactPoint>,
}

impl ContactManifold {
    pub fn miss(a: BodyId, b: BodyId) -> Self {
        Self { a, b, colliding: false, penetration: 0.0, normal: Vec3::ZERO, points: Vec::new() }
    }
}

/// Clip a polygon against one plane, keeping the half-space dot(n, p) <= c.
/// Crossing edges are interpolated; the rest is standard Sutherland-Hodgman.
fn clip_plane(poly: &[Vec3], n: Vec3, c: Scalar) -> Vec<Vec3> {
    let mut out = Vec::with_capacity(poly.len() + 2);
    if poly.is_empty() { return out; }

    let mut prev = poly[poly.len() - 1];
    let mut prev_d = n.dot(prev) - c;
    for &curr in poly {
        let curr_d = n.dot(curr) - c;
        if curr_d <= 0.0 {
            if prev_d > 0.0 {
                let t = prev_d / (prev_d - curr_d);
                out.push(prev + (curr - prev) * t);
            }
            out.push(curr);
        } else if prev_d <= 0.0 {
            let t = prev_d / (prev_d - curr_d);
            out.push(prev + (curr - prev) * t);
        }
        prev = curr;
        prev_d = curr_d;
    }
    out
}

/// The 4 world-space corners of the face of an oriented box whose outward
/// normal is most anti-parallel to `normal` (the incident face).
fn incident_face(pose: &Isometry, half: Vec3, normal: Vec3) -> [Vec3; 4] {
    let rot = Mat3::from_quat(pose.rot);
    let local_n = rot.transpose() * normal;
    let abs_n = local_n.abs();

    let mut axis = 0;
    if abs_n.y > abs_n.x { axis = 1; }
    if abs_n.z > abs_n[axis] { axis = 2; }

    // Face whose outward local axis opposes the collision normal.
    let sign = if local_n[axis] > 0.0 { -1.0 } else { 1.0 };

    let mut center = Vec3::ZERO;
    center[axis] = sign * half[axis];

    let ua = (axis + 1) % 3;
    let va = (axis + 2) % 3;
    let mut u = Vec3::ZERO;
    let mut v = Vec3::ZERO;
    u[ua] = half[ua];
    v[va] = half[va];

    [center + u + v, center - u + v, center - u - v, center + u - v]
        .map(|corner| pose.pos + rot * corner)
}

/// Face-clipping manifold for an overlapping box pair. A is always the
/// reference body and B the incident body; roles are fixed by the caller's
/// pair order, not re-picked per face.
pub fn build_manifold(
    a: BodyId, pose_a: &Isometry, half_a: Vec3,
    b: BodyId, pose_b: &Isometry, half_b: Vec3,
    hit: &SatHit,
) -> ContactManifold {
    let rot_a = Mat3::from_quat(pose_a.rot);
    let axes_a = [rot_a.x_axis, rot_a.y_axis, rot_a.z_axis];

    // Reference face of A: the face normal most aligned with the collision
    // normal, oriented to match its sign.
    let mut ref_axis = 0;
    let mut best_dot: Scalar = 0.0;
    for (i, axis) in axes_a.iter().enumerate() {
        let d = axis.dot(hit.normal);
        if d.abs() > best_dot.abs() {
            best_dot = d;
            ref_axis = i;
        }
    }
    let ref_n = axes_a[ref_axis] * best_dot.signum();
    let ref_c = ref_n.dot(pose_a.pos) + half_a[ref_axis];

    // Clip the incident face of B against the reference face's 4 side
    // planes, one sequential edge-clipping pass per plane.
    let mut poly: Vec<Vec3> = incident_face(pose_b, half_b, hit.normal).to_vec();
    for side in [(ref_axis + 1) % 3, (ref_axis + 2) % 3] {
        let axis = axes_a[side];
        let d = axis.dot(pose_a.pos);
        poly = clip_plane(&poly, axis, d + half_a[side]);
        poly = clip_plane(&poly, -axis, -(d - half_a[side]));
        if poly.is_empty() { break; }
    }

    // Penetration depth per survivor: signed distance below the reference
    // face plane. Clip artifacts (non-finite, separated, or deeper than SAT
    // measured plus margin) are discarded.
    let mut points: Vec<ContactPoint> = Vec::with_capacity(poly.len());
    for p in poly {
        let depth = ref_c - ref_n.dot(p);
        if !depth.is_finite() || depth < 0.0 || depth > hit.depth + DEPTH_MARGIN {
            continue;
        }
        points.push(ContactPoint { point: p, normal: hit.normal, depth: depth + DEPTH_BIAS });
    }

    if points.len() > MAX_CONTACTS {
        // Deepest points carry the manifold; stable sort keeps clip order
        // for ties.
        points.sort_by(|p1, p2| p2.depth.total_cmp(&p1.depth));
        points.truncate(MAX_CONTACTS);
    }

    if points.is_empty() {
        // SAT said overlap but clipping found nothing usable (grazing or
        // near-degenerate configuration). Report no collision this step.
        return ContactManifold::miss(a, b);
    }

    ContactManifold {
        a, b,
        colliding: true,
        penetration: hit.depth,
        normal: hit.normal,
        points,
    }
}
