use keelphys_collision::ContactPoint;
use keelphys_core::Scalar;
use keelphys_dynamics::Bodies;
use keelphys_geom::pair_props;
use keelphys_viz::{EventLog, SimEvent};

/* ---------- Tuning ---------- */

/// Fraction of the penetration removed by the positional projection.
pub const BAUMGARTE: Scalar = 0.8;
/// Penetration below this is tolerated without stabilization.
pub const PENETRATION_SLOP: Scalar = 1.0e-4;
const MIN_CORRECTION: Scalar = 1.0e-4;
const MAX_CORRECTION: Scalar = 0.5;
/// Tangential relative velocity shorter than this has no usable friction
/// direction.
const TANGENT_MIN_LEN_SQ: Scalar = 1.0e-6;

/// Single-pass sequential impulse for one contact point: normal impulse,
/// Coulomb friction, then a direct positional projection. Called once per
/// point; manifolds are not iterated to convergence.
///
/// Penetration is stabilized only at the position level. Folding a bias
/// term into the velocity impulse as well would inject fresh velocity into
/// a resting body every step and it could never reach the sleep
/// tolerances.
pub fn resolve_contact(
    bodies: &mut Bodies,
    a: u32,
    b: u32,
    cp: &ContactPoint,
    events: &mut EventLog,
) {
    if cp.depth <= 0.0 { return; }

    let inv_mass_a = bodies.inv_mass_of(a);
    let inv_mass_b = bodies.inv_mass_of(b);
    if inv_mass_a == 0.0 && inv_mass_b == 0.0 { return; }

    let n = cp.normal.normalize();
    let r_a = cp.point - bodies.pose(a).pos;
    let r_b = cp.point - bodies.pose(b).pos;

    let inv_i_a = bodies.inv_inertia_world(a);
    let inv_i_b = bodies.inv_inertia_world(b);

    let vel_a = bodies.vel(a);
    let vel_b = bodies.vel(b);
    let rel = (vel_b.lin + vel_b.ang.cross(r_b)) - (vel_a.lin + vel_a.ang.cross(r_a));
    let vn = rel.dot(n);

    // Effective inverse mass along the normal, including the angular
    // response of both bodies.
    let ra_x_n = r_a.cross(n);
    let rb_x_n = r_b.cross(n);
    let k = inv_mass_a
        + inv_mass_b
        + ra_x_n.dot(inv_i_a * ra_x_n)
        + rb_x_n.dot(inv_i_b * rb_x_n);
    if k == 0.0 { return; }

    let props = pair_props(bodies.material_of(a), bodies.material_of(b));
    let j = -(1.0 + props.restitution) * vn / k;
    let impulse = n * j;

    {
        let mut va = bodies.vel(a);
        va.lin -= impulse * inv_mass_a;
        va.ang -= inv_i_a * r_a.cross(impulse);
        bodies.set_vel(a, va);

        let mut vb = bodies.vel(b);
        vb.lin += impulse * inv_mass_b;
        vb.ang += inv_i_b * r_b.cross(impulse);
        bodies.set_vel(b, vb);
    }
    events.push(SimEvent::NormalImpulse { a, b, j });

    // Friction against the post-impulse relative velocity.
    let vel_a = bodies.vel(a);
    let vel_b = bodies.vel(b);
    let rel = (vel_b.lin + vel_b.ang.cross(r_b)) - (vel_a.lin + vel_a.ang.cross(r_a));
    let tangent = rel - n * rel.dot(n);
    if tangent.length_squared() > TANGENT_MIN_LEN_SQ {
        let t = tangent.normalize();
        let jt = -rel.dot(t) / k;

        // Coulomb cone: inside the static cone the raw impulse holds the
        // point; outside, slide at the dynamic coefficient.
        let friction = if jt.abs() < j * props.mu_s {
            t * jt
        } else {
            t * (-props.mu_d * j)
        };

        let mut va = bodies.vel(a);
        va.lin -= friction * inv_mass_a;
        va.ang -= inv_i_a * r_a.cross(friction);
        bodies.set_vel(a, va);

        let mut vb = bodies.vel(b);
        vb.lin += friction * inv_mass_b;
        vb.ang += inv_i_b * r_b.cross(friction);
        bodies.set_vel(b, vb);

        events.push(SimEvent::FrictionImpulse { a, b, jt: friction.length() });
    }

    // Direct positional projection, applied immediately rather than
    // deferred to a second solve.
    let mag = (BAUMGARTE * (cp.depth - PENETRATION_SLOP).max(0.0) / k)
        .clamp(MIN_CORRECTION, MAX_CORRECTION);
    let correction = n * mag;
    bodies.apply_position_delta(a, -correction * inv_mass_a);
    bodies.apply_position_delta(b, correction * inv_mass_b);
    events.push(SimEvent::PositionCorrection { a, b, mag });

    // Contact is a wake source; already-awake bodies keep their sleep
    // counters so persistent resting contact can still reach sleep.
    if bodies.is_sleeping(a) { bodies.wake(a); }
    if bodies.is_sleeping(b) { bodies.wake(b); }
}
