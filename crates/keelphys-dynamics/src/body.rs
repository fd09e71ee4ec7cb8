use glam::Quat;
use keelphys_core::types::{Isometry, Velocity, Vec3, Mat3};
use keelphys_core::{BodyId, Scalar, vec3};
use keelphys_geom::{Aabb, MassProps, Material, Shape, aabb_of};
use log::warn;

use crate::tuning::*;

/// Input descriptor when creating a body.
#[derive(Copy, Clone, Debug)]
pub struct BodyDesc {
    pub pose: Isometry,
    pub vel: Velocity,
    pub mass: Scalar,
    pub shape: Shape,
    pub material: Material,
    pub is_static: bool,
}

impl BodyDesc {
    pub fn dynamic_box(pos: Vec3, half: Vec3, mass: Scalar) -> Self {
        Self {
            pose: Isometry { pos, rot: Quat::IDENTITY },
            vel: Velocity::default(),
            mass,
            shape: Shape::Box { half },
            material: Material::default(),
            is_static: false,
        }
    }

    pub fn static_box(pos: Vec3, half: Vec3) -> Self {
        Self {
            pose: Isometry { pos, rot: Quat::IDENTITY },
            vel: Velocity::default(),
            mass: 0.0,
            shape: Shape::Box { half },
            material: Material::default(),
            is_static: true,
        }
    }
}

/// SoA body arena with id = index semantics. Slots are never reused:
/// `remove` leaves a tombstone so every `BodyId` handed out stays valid
/// (and visibly dead) for the rest of the run.
pub struct Bodies {
    pos: Vec<Vec3>,
    rot: Vec<Quat>,
    linvel: Vec<Vec3>,
    angvel: Vec<Vec3>,
    force: Vec<Vec3>,
    torque: Vec<Vec3>,
    mass: Vec<Scalar>,
    inv_mass: Vec<Scalar>,
    inv_inertia_local: Vec<Mat3>,
    shape: Vec<Shape>,
    material: Vec<Material>,
    is_static: Vec<bool>,
    sleeping: Vec<bool>,
    sleep_counter: Vec<u32>,
    alive: Vec<bool>,
}

impl Bodies {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            pos: Vec::with_capacity(cap),
            rot: Vec::with_capacity(cap),
            linvel: Vec::with_capacity(cap),
            angvel: Vec::with_capacity(cap),
            force: Vec::with_capacity(cap),
            torque: Vec::with_capacity(cap),
            mass: Vec::with_capacity(cap),
            inv_mass: Vec::with_capacity(cap),
            inv_inertia_local: Vec::with_capacity(cap),
            shape: Vec::with_capacity(cap),
            material: Vec::with_capacity(cap),
            is_static: Vec::with_capacity(cap),
            sleeping: Vec::with_capacity(cap),
            sleep_counter: Vec::with_capacity(cap),
            alive: Vec::with_capacity(cap),
        }
    }

    pub fn add(&mut self, desc: BodyDesc) -> u32 {
        let props = if desc.is_static {
            MassProps::infinite()
        } else {
            MassProps::for_shape(&desc.shape, desc.mass)
        };
        // A zero-mass dynamic request degrades to static mass properties;
        // keep the flag consistent with them.
        let is_static = desc.is_static || props.inv_mass == 0.0;

        self.pos.push(desc.pose.pos);
        self.rot.push(desc.pose.rot.normalize());
        self.linvel.push(if is_static { Vec3::ZERO } else { desc.vel.lin });
        self.angvel.push(if is_static { Vec3::ZERO } else { desc.vel.ang });
        self.force.push(Vec3::ZERO);
        self.torque.push(Vec3::ZERO);
        self.mass.push(props.mass);
        self.inv_mass.push(props.inv_mass);
        self.inv_inertia_local.push(props.inv_inertia);
        self.shape.push(desc.shape);
        self.material.push(desc.material);
        self.is_static.push(is_static);
        self.sleeping.push(false);
        self.sleep_counter.push(0);
        self.alive.push(true);

        (self.pos.len() as u32) - 1
    }

    /// Tombstone removal: the slot stays allocated, the id stays stable.
    pub fn remove(&mut self, id: u32) {
        let i = id as usize;
        if i >= self.alive.len() { return; }
        self.alive[i] = false;
        self.linvel[i] = Vec3::ZERO;
        self.angvel[i] = Vec3::ZERO;
        self.force[i] = Vec3::ZERO;
        self.torque[i] = Vec3::ZERO;
    }

    pub fn clear(&mut self) {
        self.pos.clear();
        self.rot.clear();
        self.linvel.clear();
        self.angvel.clear();
        self.force.clear();
        self.torque.clear();
        self.mass.clear();
        self.inv_mass.clear();
        self.inv_inertia_local.clear();
        self.shape.clear();
        self.material.clear();
        self.is_static.clear();
        self.sleeping.clear();
        self.sleep_counter.clear();
        self.alive.clear();
    }

    #[inline] pub fn len(&self) -> usize { self.pos.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.pos.is_empty() }
    /// Id range of every slot, dead or alive. Returns a plain range so
    /// callers can keep mutating the arena while they iterate.
    pub fn indices(&self) -> std::ops::Range<u32> {
        0..(self.len() as u32)
    }

    /* ---------- Accessors ---------- */

    #[inline] pub fn pose(&self, id: u32) -> Isometry {
        let i = id as usize;
        Isometry { pos: self.pos[i], rot: self.rot[i] }
    }
    #[inline] pub fn set_pose(&mut self, id: u32, iso: Isometry) {
        let i = id as usize;
        self.pos[i] = iso.pos;
        self.rot[i] = iso.rot.normalize();
    }
    #[inline] pub fn vel(&self, id: u32) -> Velocity {
        let i = id as usize;
        Velocity { lin: self.linvel[i], ang: self.angvel[i] }
    }
    #[inline] pub fn set_vel(&mut self, id: u32, v: Velocity) {
        let i = id as usize;
        if self.is_static[i] { return; }
        self.linvel[i] = v.lin;
        self.angvel[i] = v.ang;
    }
    #[inline] pub fn inv_mass_of(&self, id: u32) -> Scalar { self.inv_mass[id as usize] }
    #[inline] pub fn mass_of(&self, id: u32) -> Scalar { self.mass[id as usize] }
    #[inline] pub fn is_static(&self, id: u32) -> bool { self.is_static[id as usize] }
    #[inline] pub fn is_sleeping(&self, id: u32) -> bool { self.sleeping[id as usize] }
    #[inline] pub fn is_alive(&self, id: u32) -> bool { self.alive[id as usize] }
    #[inline] pub fn sleep_counter_of(&self, id: u32) -> u32 { self.sleep_counter[id as usize] }
    #[inline] pub fn shape_of(&self, id: u32) -> &Shape { &self.shape[id as usize] }
    #[inline] pub fn material_of(&self, id: u32) -> &Material { &self.material[id as usize] }

    /// A body takes part in this step's integration only if it is alive,
    /// dynamic and awake. Sleeping and static bodies still contribute
    /// geometry to collision queries.
    #[inline] pub fn is_active(&self, id: u32) -> bool {
        let i = id as usize;
        self.alive[i] && !self.is_static[i] && !self.sleeping[i]
    }

    pub fn aabb(&self, id: u32) -> Aabb {
        aabb_of(&self.shape[id as usize], &self.pose(id))
    }

    /// World-space inverse inertia: R * I_local^-1 * R^T.
    pub fn inv_inertia_world(&self, id: u32) -> Mat3 {
        let i = id as usize;
        if self.inv_mass[i] == 0.0 { return Mat3::ZERO; }
        let r = Mat3::from_quat(self.rot[i]);
        r * self.inv_inertia_local[i] * r.transpose()
    }

    /* ---------- Forces & impulses ---------- */

    /// Accumulate a force for this step. Wakes the body.
    pub fn apply_force(&mut self, id: u32, f: Vec3) {
        let i = id as usize;
        if !self.alive[i] || self.is_static[i] { return; }
        self.force[i] += f;
        self.sleeping[i] = false;
        self.sleep_counter[i] = 0;
    }

    /// Accumulate a force without touching sleep state. Persistent
    /// environment forces (gravity) use this path so resting bodies can
    /// still fall asleep; inactive bodies are skipped so the accumulator
    /// cannot build up while integration is suspended.
    pub fn accumulate_force(&mut self, id: u32, f: Vec3) {
        let i = id as usize;
        if !self.is_active(id) { return; }
        self.force[i] += f;
    }

    pub fn apply_torque(&mut self, id: u32, t: Vec3) {
        let i = id as usize;
        if !self.alive[i] || self.is_static[i] { return; }
        self.torque[i] += t;
    }

    #[inline] pub fn apply_impulse(&mut self, id: u32, j: Vec3) {
        let i = id as usize;
        let im = self.inv_mass[i];
        if im != 0.0 { self.linvel[i] += j * im; }
    }

    pub fn apply_angular_impulse(&mut self, id: u32, tau: Vec3) {
        let i = id as usize;
        if self.inv_mass[i] == 0.0 { return; }
        let inv_i_w = self.inv_inertia_world(id);
        self.angvel[i] += inv_i_w * tau;
    }

    #[inline] pub fn apply_position_delta(&mut self, id: u32, dp: Vec3) {
        let i = id as usize;
        if self.inv_mass[i] != 0.0 { self.pos[i] += dp; }
    }

    pub fn wake(&mut self, id: u32) {
        let i = id as usize;
        if !self.alive[i] || self.is_static[i] { return; }
        self.sleeping[i] = false;
        self.sleep_counter[i] = 0;
    }

    /* ---------- Integration ---------- */

    /// Semi-implicit velocity update from accumulated force, then damping,
    /// clamping and snap-to-zero. Clears the force accumulator. Returns
    /// true when a non-finite velocity had to be reset.
    pub fn integrate_velocity(&mut self, id: u32, dt: Scalar) -> bool {
        let i = id as usize;
        if !self.is_active(id) { return false; }

        let accel = self.force[i] * self.inv_mass[i];
        let mut v = self.linvel[i] + accel * dt;

        v *= LINEAR_DAMPING.powf(dt);

        let speed_sq = v.length_squared();
        if speed_sq > MAX_LINEAR_VELOCITY * MAX_LINEAR_VELOCITY {
            v = v.normalize() * MAX_LINEAR_VELOCITY;
        } else if speed_sq < VELOCITY_SNAP * VELOCITY_SNAP {
            v = Vec3::ZERO;
        }

        let mut reset = false;
        if !v.is_finite() {
            warn!("non-finite linear velocity on body {id}, resetting");
            v = Vec3::ZERO;
            reset = true;
        }

        self.linvel[i] = v;
        self.force[i] = Vec3::ZERO;
        reset
    }

    /// Angular counterpart: torque through the world-space inverse inertia,
    /// exponential damping, clamp, snap, NaN guard. Clears the torque.
    pub fn integrate_angular_velocity(&mut self, id: u32, dt: Scalar) -> bool {
        let i = id as usize;
        if !self.is_active(id) { return false; }

        let ang_accel = self.inv_inertia_world(id) * self.torque[i];
        let mut w = self.angvel[i] + ang_accel * dt;

        w *= (-ANGULAR_DAMPING * dt).exp();

        let rate_sq = w.length_squared();
        if rate_sq > MAX_ANGULAR_VELOCITY * MAX_ANGULAR_VELOCITY {
            w = w.normalize() * MAX_ANGULAR_VELOCITY;
        } else if rate_sq < ANGULAR_SNAP * ANGULAR_SNAP {
            w = Vec3::ZERO;
        }

        let mut reset = false;
        if !w.is_finite() {
            warn!("non-finite angular velocity on body {id}, resetting");
            w = Vec3::ZERO;
            reset = true;
        }

        self.angvel[i] = w;
        self.torque[i] = Vec3::ZERO;
        reset
    }

    /// First-order quaternion integration:
    /// q += 0.5 * ((0, w*dt) ⊗ q), renormalized. Good enough for the
    /// clamped angular rates this core allows.
    pub fn integrate_orientation(&mut self, id: u32, dt: Scalar) {
        let i = id as usize;
        if !self.is_active(id) { return; }

        let w = self.angvel[i] * dt;
        let dq = Quat::from_xyzw(w.x, w.y, w.z, 0.0) * self.rot[i];
        self.rot[i] = (self.rot[i] + dq * 0.5).normalize();
    }

    /// Position update plus the last-resort world-floor guard: a body that
    /// leaves the sane world volume is parked back at the rescue position
    /// with zeroed motion rather than propagated as an error. Returns true
    /// when the rescue fired.
    pub fn integrate_position(&mut self, id: u32, dt: Scalar) -> bool {
        let i = id as usize;
        if !self.is_active(id) { return false; }

        let p = self.pos[i] + self.linvel[i] * dt;
        if !p.is_finite() || p.y < WORLD_FLOOR_Y {
            warn!("body {id} left the world volume, rescuing");
            self.linvel[i] = Vec3::ZERO;
            self.angvel[i] = Vec3::ZERO;
            self.pos[i] = vec3(RESCUE_POS[0], RESCUE_POS[1], RESCUE_POS[2]);
            return true;
        }
        self.pos[i] = p;
        false
    }

    /* ---------- Sleep bookkeeping ---------- */

    /// Post-integration sleep update. Returns true when the body fell
    /// asleep this step.
    pub fn update_sleep(&mut self, id: u32) -> bool {
        let i = id as usize;
        if !self.is_active(id) { return false; }

        let vel_sq = self.linvel[i].length_squared();
        let ang_sq = self.angvel[i].length_squared();
        if vel_sq < SLEEP_VEL_TOL_SQ && ang_sq < SLEEP_ANG_TOL_SQ {
            self.sleep_counter[i] += 1;
            if self.sleep_counter[i] > SLEEP_STEPS {
                self.sleeping[i] = true;
                self.linvel[i] = Vec3::ZERO;
                self.angvel[i] = Vec3::ZERO;
                return true;
            }
        } else {
            self.sleep_counter[i] = 0;
        }
        false
    }
}

impl Default for Bodies {
    fn default() -> Self { Self::with_capacity(0) }
}

/// Convenience wrapper so callers can use `BodyId` handles directly.
impl Bodies {
    #[inline] pub fn id_alive(&self, id: BodyId) -> bool {
        (id.0 as usize) < self.len() && self.is_alive(id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keelphys_core::vec3;

    const DT: Scalar = 1.0 / 60.0;

    fn single_box() -> (Bodies, u32) {
        let mut bodies = Bodies::default();
        let id = bodies.add(BodyDesc::dynamic_box(vec3(0.0, 5.0, 0.0), vec3(0.5, 0.5, 0.5), 1.0));
        (bodies, id)
    }

    #[test]
    fn damping_speed_is_non_increasing() {
        let (mut bodies, id) = single_box();
        bodies.set_vel(id, Velocity { lin: vec3(4.0, 0.0, 0.0), ang: Vec3::ZERO });

        let mut last = bodies.vel(id).lin.length();
        for _ in 0..600 {
            bodies.integrate_velocity(id, DT);
            let speed = bodies.vel(id).lin.length();
            assert!(speed <= last + 1.0e-6);
            last = speed;
        }
        // 600 steps of 1/60 s is 10 s of damping; the speed must match the
        // analytic decay 4.0 * 0.99^10.
        let expected = 4.0 * LINEAR_DAMPING.powf(600.0 * DT);
        assert!((last - expected).abs() < 1.0e-3);
    }

    #[test]
    fn indices_permit_mutation_mid_iteration() {
        let (mut bodies, _) = single_box();
        bodies.add(BodyDesc::dynamic_box(vec3(2.0, 5.0, 0.0), vec3(0.5, 0.5, 0.5), 1.0));
        // The integration loops mutate the arena per id; the id range must
        // not hold a borrow across them.
        for id in bodies.indices() {
            bodies.accumulate_force(id, vec3(0.0, -9.81, 0.0));
            bodies.integrate_velocity(id, DT);
            bodies.integrate_position(id, DT);
            bodies.update_sleep(id);
        }
        for id in bodies.indices() {
            assert!(bodies.vel(id).lin.y < 0.0);
        }
    }

    #[test]
    fn velocity_is_clamped_to_maximum() {
        let (mut bodies, id) = single_box();
        bodies.apply_force(id, vec3(1.0e4, 0.0, 0.0));
        bodies.integrate_velocity(id, DT);
        assert!(bodies.vel(id).lin.length() <= MAX_LINEAR_VELOCITY + 1.0e-4);
    }

    #[test]
    fn non_finite_velocity_resets_to_zero() {
        let (mut bodies, id) = single_box();
        bodies.set_vel(id, Velocity { lin: vec3(Scalar::NAN, 0.0, 0.0), ang: Vec3::ZERO });
        bodies.integrate_velocity(id, DT);
        assert_eq!(bodies.vel(id).lin, Vec3::ZERO);
    }

    #[test]
    fn runaway_body_is_rescued() {
        let (mut bodies, id) = single_box();
        bodies.set_pose(id, Isometry { pos: vec3(0.0, -99.9, 0.0), rot: Quat::IDENTITY });
        bodies.set_vel(id, Velocity { lin: vec3(0.0, -50.0, 0.0), ang: Vec3::ZERO });
        assert!(bodies.integrate_position(id, DT));
        let p = bodies.pose(id).pos;
        assert!((p - vec3(0.0, 5.0, 0.0)).length() < 1.0e-6);
        assert_eq!(bodies.vel(id).lin, Vec3::ZERO);
    }

    #[test]
    fn statics_are_never_integrated() {
        let mut bodies = Bodies::default();
        let id = bodies.add(BodyDesc::static_box(vec3(0.0, 0.0, 0.0), vec3(10.0, 1.0, 10.0)));
        bodies.apply_force(id, vec3(0.0, 100.0, 0.0));
        bodies.integrate_velocity(id, DT);
        bodies.integrate_position(id, DT);
        assert_eq!(bodies.vel(id).lin, Vec3::ZERO);
        assert_eq!(bodies.pose(id).pos, vec3(0.0, 0.0, 0.0));
    }

    #[test]
    fn sleep_after_sustained_stillness() {
        let (mut bodies, id) = single_box();
        let mut slept_at = None;
        for step in 0..40 {
            if bodies.update_sleep(id) {
                slept_at = Some(step);
                break;
            }
        }
        assert_eq!(slept_at, Some(SLEEP_STEPS as usize));
        assert!(bodies.is_sleeping(id));
    }

    #[test]
    fn force_wakes_and_resets_counter() {
        let (mut bodies, id) = single_box();
        for _ in 0..=SLEEP_STEPS {
            bodies.update_sleep(id);
        }
        assert!(bodies.is_sleeping(id));
        bodies.apply_force(id, vec3(0.0, 1.0, 0.0));
        assert!(!bodies.is_sleeping(id));
        assert_eq!(bodies.sleep_counter_of(id), 0);
    }

    #[test]
    fn motion_resets_sleep_counter() {
        let (mut bodies, id) = single_box();
        for _ in 0..10 {
            bodies.update_sleep(id);
        }
        assert_eq!(bodies.sleep_counter_of(id), 10);
        bodies.set_vel(id, Velocity { lin: vec3(1.0, 0.0, 0.0), ang: Vec3::ZERO });
        bodies.update_sleep(id);
        assert_eq!(bodies.sleep_counter_of(id), 0);
    }

    #[test]
    fn orientation_stays_unit_under_spin() {
        let (mut bodies, id) = single_box();
        bodies.set_vel(id, Velocity { lin: Vec3::ZERO, ang: vec3(0.0, 3.0, 0.0) });
        for _ in 0..120 {
            bodies.integrate_orientation(id, DT);
        }
        assert!((bodies.pose(id).rot.length() - 1.0).abs() < 1.0e-5);
    }

    #[test]
    fn removed_body_is_a_tombstone() {
        let (mut bodies, id) = single_box();
        bodies.remove(id);
        assert!(!bodies.is_alive(id));
        assert!(!bodies.is_active(id));
        // The slot is still addressable; a later add gets a fresh id.
        let id2 = bodies.add(BodyDesc::dynamic_box(vec3(1.0, 1.0, 1.0), vec3(0.5, 0.5, 0.5), 1.0));
        assert_ne!(id, id2);
    }
}
