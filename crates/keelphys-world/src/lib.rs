//! Step orchestrator: owns the body arena and runs the fixed-order
//! pipeline integrate velocities -> broad phase -> narrow phase -> solve ->
//! integrate poses -> sleep update, with timestep subdivision layered on
//! top for fast bodies.

pub mod solver;
pub mod stepper;

use keelphys_collision::{build_manifold, overlapping_pairs, sat_box_box, ContactManifold};
use keelphys_core::{
    hash_quat, hash_vec3, vec3, BodyId, Scalar, StepHasher, StepStage, StepStats, Vec3,
};
use keelphys_dynamics::{Bodies, BodyDesc};
use keelphys_geom::Aabb;
use keelphys_viz::{DebugSettings, EventLog, SimEvent};
use log::debug;

pub use stepper::FixedTimestep;

/* ---------- Tuning ---------- */

pub const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);
/// Per-step dt is clamped into this window regardless of what the host
/// passes in.
pub const MIN_DT: Scalar = 0.001;
pub const MAX_DT: Scalar = 0.016;
/// Recommended fixed tick for the outer accumulator.
pub const FIXED_DT: Scalar = 0.016;
/// Above this speed a step is subdivided to mitigate tunneling.
pub const MAX_SAFE_SPEED: Scalar = 3.0;
pub const MAX_SUBSTEPS: u32 = 8;

const DEFAULT_EVENT_CAPACITY: usize = 256;

pub struct WorldBuilder {
    gravity: Vec3,
    debug: DebugSettings,
    event_capacity: usize,
    body_capacity: usize,
}

impl WorldBuilder {
    pub fn new() -> Self {
        Self {
            gravity: GRAVITY,
            debug: DebugSettings::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            body_capacity: 0,
        }
    }

    pub fn gravity(mut self, g: Vec3) -> Self {
        self.gravity = g;
        self
    }

    pub fn debug(mut self, settings: DebugSettings) -> Self {
        self.debug = settings;
        self
    }

    pub fn event_capacity(mut self, cap: usize) -> Self {
        self.event_capacity = cap;
        self
    }

    pub fn body_capacity(mut self, cap: usize) -> Self {
        self.body_capacity = cap;
        self
    }

    pub fn build(self) -> World {
        World {
            bodies: Bodies::with_capacity(self.body_capacity),
            gravity: self.gravity,
            tick: 0,
            sim_time: 0.0,
            debug: self.debug,
            events: EventLog::new(self.event_capacity),
            manifolds: Vec::new(),
        }
    }
}

impl Default for WorldBuilder {
    fn default() -> Self { Self::new() }
}

/// The simulation. Exclusively owns all body state; one `step` is one
/// synchronous ordered pass with no external mutation in between.
pub struct World {
    bodies: Bodies,
    gravity: Vec3,
    tick: u64,
    sim_time: f64,
    debug: DebugSettings,
    events: EventLog,
    manifolds: Vec<ContactManifold>,
}

impl World {
    pub const SCHEDULE: [StepStage; 6] = [
        StepStage::IntegrateVelocities,
        StepStage::Broadphase,
        StepStage::Narrowphase,
        StepStage::Solve,
        StepStage::IntegratePoses,
        StepStage::SleepUpdate,
    ];

    pub fn new() -> Self { WorldBuilder::new().build() }
    pub fn builder() -> WorldBuilder { WorldBuilder::new() }

    /* ---------- Body management ---------- */

    pub fn add_body(&mut self, desc: BodyDesc) -> BodyId {
        BodyId(self.bodies.add(desc))
    }

    pub fn remove_body(&mut self, id: BodyId) {
        self.bodies.remove(id.0);
    }

    /// Drop all bodies and restart the clock. Handles from before the
    /// reset are invalid.
    pub fn reset(&mut self) {
        self.bodies.clear();
        self.manifolds.clear();
        self.events.clear();
        self.tick = 0;
        self.sim_time = 0.0;
    }

    #[inline] pub fn bodies(&self) -> &Bodies { &self.bodies }
    #[inline] pub fn bodies_mut(&mut self) -> &mut Bodies { &mut self.bodies }

    pub fn apply_force(&mut self, id: BodyId, f: Vec3) {
        self.bodies.apply_force(id.0, f);
    }

    pub fn apply_torque(&mut self, id: BodyId, t: Vec3) {
        self.bodies.apply_torque(id.0, t);
    }

    pub fn wake(&mut self, id: BodyId) {
        self.bodies.wake(id.0);
    }

    /* ---------- Read access ---------- */

    #[inline] pub fn tick(&self) -> u64 { self.tick }
    #[inline] pub fn sim_time(&self) -> f64 { self.sim_time }
    #[inline] pub fn gravity(&self) -> Vec3 { self.gravity }

    /// Manifolds from the most recent step, kept for debug drawing.
    #[inline] pub fn manifolds(&self) -> &[ContactManifold] { &self.manifolds }

    /// Event ledger of the most recent tick.
    #[inline] pub fn events(&self) -> &EventLog { &self.events }
    #[inline] pub fn debug_settings_mut(&mut self) -> &mut DebugSettings { &mut self.debug }

    /// Digest of tick number, poses and velocities of all live bodies.
    /// Two runs of the same scene agree on this at every tick.
    pub fn step_hash(&self) -> [u8; 32] {
        let mut h = StepHasher::new();
        h.update_bytes(&self.tick.to_le_bytes());
        for id in self.bodies.indices() {
            if !self.bodies.is_alive(id) { continue; }
            let pose = self.bodies.pose(id);
            let vel = self.bodies.vel(id);
            hash_vec3(&mut h, &pose.pos);
            hash_quat(&mut h, &pose.rot);
            hash_vec3(&mut h, &vel.lin);
            hash_vec3(&mut h, &vel.ang);
        }
        h.finalize()
    }

    /// Heuristic tunneling check: would the body cross more than half its
    /// own smallest extent in one step at its current speed?
    pub fn would_tunnel(&self, id: BodyId, dt: Scalar) -> bool {
        let id = id.0;
        if !self.bodies.is_alive(id) || self.bodies.is_static(id) {
            return false;
        }
        let speed = self.bodies.vel(id).lin.length();
        let size = self.bodies.shape_of(id).size();
        let min_dim = size.x.min(size.y).min(size.z);
        speed * dt > min_dim * 0.5
    }

    /* ---------- Stepping ---------- */

    /// Advance by one tick. `dt` is clamped into `[MIN_DT, MAX_DT]`.
    pub fn step(&mut self, dt: Scalar) -> StepStats {
        let dt = dt.clamp(MIN_DT, MAX_DT);
        let mut stats = StepStats::default();
        self.events.clear();

        // Gravity and velocity integration for awake dynamic bodies.
        for id in self.bodies.indices() {
            if !self.bodies.is_active(id) { continue; }
            let g = self.gravity * self.bodies.mass_of(id);
            self.bodies.accumulate_force(id, g);
            if self.bodies.integrate_velocity(id, dt) {
                self.events.push(SimEvent::VelocityReset { id });
            }
            if self.bodies.integrate_angular_velocity(id, dt) {
                self.events.push(SimEvent::VelocityReset { id });
            }
        }

        // Broad phase over current world bounds. Dead slots get collapsed
        // boxes the pruner skips.
        let mut alive = 0u32;
        let mut aabbs: Vec<Aabb> = Vec::with_capacity(self.bodies.len());
        for id in self.bodies.indices() {
            if self.bodies.is_alive(id) {
                alive += 1;
                aabbs.push(self.bodies.aabb(id));
            } else {
                aabbs.push(Aabb::new(Vec3::INFINITY, Vec3::NEG_INFINITY));
            }
        }
        stats.pairs_tested = alive.saturating_sub(1) * alive / 2;
        let pairs = overlapping_pairs(&aabbs);
        stats.aabb_overlaps = pairs.len() as u32;

        // Narrow phase + resolution. Pairs with no movable awake side are
        // skipped so sleeping stacks stay asleep.
        let mut manifolds: Vec<ContactManifold> = Vec::new();
        for (i, j) in pairs {
            let (a, b) = (i as u32, j as u32);
            if !self.bodies.is_active(a) && !self.bodies.is_active(b) { continue; }

            // Spheres stop at the broad phase for now.
            let (Some(half_a), Some(half_b)) =
                (self.bodies.shape_of(a).as_box(), self.bodies.shape_of(b).as_box())
            else { continue; };

            let pose_a = self.bodies.pose(a);
            let pose_b = self.bodies.pose(b);
            let Some(hit) = sat_box_box(&pose_a, half_a, &pose_b, half_b) else { continue; };

            let m = build_manifold(BodyId(a), &pose_a, half_a, BodyId(b), &pose_b, half_b, &hit);
            if !m.colliding { continue; }

            stats.contacts += m.points.len() as u32;
            for cp in &m.points {
                solver::resolve_contact(&mut self.bodies, a, b, cp, &mut self.events);
            }
            manifolds.push(m);
        }
        self.manifolds = manifolds;

        // Pose integration and sleep bookkeeping.
        for id in self.bodies.indices() {
            if !self.bodies.is_active(id) { continue; }
            if self.bodies.integrate_position(id, dt) {
                self.events.push(SimEvent::PositionRescue { id });
            }
            self.bodies.integrate_orientation(id, dt);
            if self.bodies.update_sleep(id) {
                self.events.push(SimEvent::FellAsleep { id });
            }
        }

        self.tick += 1;
        self.sim_time += dt as f64;
        self.emit_debug(&stats);
        stats
    }

    /// Recommended entry point: inspect the fastest body and subdivide the
    /// tick when it could cross a collision feature in one step. Not
    /// continuous collision detection, just a mitigation.
    pub fn step_subdivided(&mut self, dt: Scalar) -> StepStats {
        let dt = dt.clamp(MIN_DT, MAX_DT);

        let mut max_speed: Scalar = 0.0;
        for id in self.bodies.indices() {
            if !self.bodies.is_alive(id) || self.bodies.is_static(id) { continue; }
            max_speed = max_speed.max(self.bodies.vel(id).lin.length());
        }

        let substeps = if max_speed > MAX_SAFE_SPEED {
            ((max_speed / MAX_SAFE_SPEED).ceil() as u32).min(MAX_SUBSTEPS)
        } else {
            1
        };

        let sub_dt = dt / substeps as Scalar;
        let mut total = StepStats::default();
        for _ in 0..substeps {
            let s = self.step(sub_dt);
            total.pairs_tested += s.pairs_tested;
            total.aabb_overlaps += s.aabb_overlaps;
            total.contacts += s.contacts;
        }
        total.substeps = substeps;
        // The ledger is per-tick; record the subdivision on the last one.
        self.events.push(SimEvent::Substeps { n: substeps });
        total
    }

    /* ---------- Debug ---------- */

    fn emit_debug(&self, stats: &StepStats) {
        if self.debug.print_every == 0 || self.tick % self.debug.print_every as u64 != 0 {
            return;
        }
        debug!(
            "tick {}: {} pairs, {} aabb overlaps, {} contacts",
            self.tick, stats.pairs_tested, stats.aabb_overlaps, stats.contacts
        );
        if self.debug.show_bodies {
            for id in self.bodies.indices().take(self.debug.max_lines) {
                if !self.bodies.is_alive(id) { continue; }
                let pose = self.bodies.pose(id);
                let vel = self.bodies.vel(id);
                debug!(
                    "  body {id}: pos={:?} |v|={:.3} sleeping={}",
                    pose.pos,
                    vel.lin.length(),
                    self.bodies.is_sleeping(id)
                );
            }
        }
        if self.debug.show_contacts {
            for m in self.manifolds.iter().take(self.debug.max_lines) {
                debug!(
                    "  contact {}-{}: {} points, depth {:.4}",
                    m.a, m.b, m.points.len(), m.penetration
                );
            }
        }
        if self.debug.show_energy {
            let mut ke = 0.0;
            for id in self.bodies.indices() {
                if !self.bodies.is_alive(id) || self.bodies.is_static(id) { continue; }
                let v = self.bodies.vel(id).lin;
                ke += 0.5 * self.bodies.mass_of(id) * v.length_squared();
            }
            debug!("  linear kinetic energy: {ke:.4}");
        }
    }
}

impl Default for World {
    fn default() -> Self { Self::new() }
}

/// Convenience: a dynamic unit cube of mass 1, the canonical test body.
pub fn unit_cube_at(pos: Vec3) -> BodyDesc {
    BodyDesc::dynamic_box(pos, vec3(0.5, 0.5, 0.5), 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keelphys_core::schedule_digest;

    #[test]
    fn schedule_digest_is_stable() {
        assert_eq!(schedule_digest(&World::SCHEDULE), schedule_digest(&World::SCHEDULE));
    }

    #[test]
    fn empty_world_steps_without_contacts() {
        let mut world = World::new();
        let stats = world.step(FIXED_DT);
        assert_eq!(stats.pairs_tested, 0);
        assert_eq!(stats.contacts, 0);
        assert_eq!(world.tick(), 1);
    }

    #[test]
    fn dt_is_clamped_into_window() {
        let mut world = World::new();
        world.step(100.0);
        assert!((world.sim_time() - MAX_DT as f64).abs() < 1.0e-9);
        world.step(0.0);
        assert!((world.sim_time() - (MAX_DT + MIN_DT) as f64).abs() < 1.0e-9);
    }

    #[test]
    fn removed_body_no_longer_collides() {
        let mut world = World::new();
        let floor = world.add_body(BodyDesc::static_box(vec3(0.0, -1.0, 0.0), vec3(20.0, 1.0, 20.0)));
        let cube = world.add_body(unit_cube_at(vec3(0.0, 0.4, 0.0)));
        world.step(FIXED_DT);
        assert!(!world.manifolds().is_empty());

        world.remove_body(cube);
        world.step(FIXED_DT);
        assert!(world.manifolds().is_empty());
        assert!(world.bodies().is_alive(floor.0));
    }

    #[test]
    fn would_tunnel_flags_fast_small_bodies() {
        let mut world = World::new();
        let cube = world.add_body(unit_cube_at(vec3(0.0, 5.0, 0.0)));
        assert!(!world.would_tunnel(cube, FIXED_DT));
        world.bodies_mut().set_vel(
            cube.0,
            keelphys_core::types::Velocity { lin: vec3(40.0, 0.0, 0.0), ang: Vec3::ZERO },
        );
        assert!(world.would_tunnel(cube, FIXED_DT));
    }

    #[test]
    fn step_hash_detects_divergence() {
        let build = || {
            let mut w = World::new();
            w.add_body(BodyDesc::static_box(vec3(0.0, -1.0, 0.0), vec3(20.0, 1.0, 20.0)));
            w.add_body(unit_cube_at(vec3(0.0, 3.0, 0.0)));
            w
        };
        let mut w1 = build();
        let mut w2 = build();
        for _ in 0..60 {
            w1.step(FIXED_DT);
            w2.step(FIXED_DT);
        }
        assert_eq!(w1.step_hash(), w2.step_hash());

        w2.apply_force(BodyId(1), vec3(5.0, 0.0, 0.0));
        w2.step(FIXED_DT);
        w1.step(FIXED_DT);
        assert_ne!(w1.step_hash(), w2.step_hash());
    }
}
