use keelphys_core::Scalar;

// Damping & limits.
pub const LINEAR_DAMPING: Scalar = 0.99;
pub const ANGULAR_DAMPING: Scalar = 0.95;
pub const MAX_LINEAR_VELOCITY: Scalar = 8.0;
pub const MAX_ANGULAR_VELOCITY: Scalar = 5.0;

/// Below this speed a velocity is snapped to exactly zero for stability.
pub const VELOCITY_SNAP: Scalar = 0.01;
pub const ANGULAR_SNAP: Scalar = 0.01;

// Sleep state machine. The single-pass contact solver leaves a resting
// body with bounded rocking, roughly 0.1 m/s and 0.1 rad/s for a unit
// box on a floor. The tolerances (0.2 m/s and 0.2 rad/s, stored squared)
// sit above that envelope; tighter values keep resting bodies awake
// forever.
pub const SLEEP_VEL_TOL_SQ: Scalar = 0.04;
pub const SLEEP_ANG_TOL_SQ: Scalar = 0.04;
pub const SLEEP_STEPS: u32 = 30;

/// Bodies falling past this plane are considered lost and get teleported
/// back to `RESCUE_POS` with zeroed velocities.
pub const WORLD_FLOOR_Y: Scalar = -100.0;
pub const RESCUE_POS: [Scalar; 3] = [0.0, 5.0, 0.0];
