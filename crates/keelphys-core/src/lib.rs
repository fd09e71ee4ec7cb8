pub mod scalar;
pub mod ids;
pub mod types;
pub mod hash;
pub mod rng;
pub mod schedule;
pub mod time;

pub use scalar::Scalar;
pub use ids::BodyId;
pub use types::{Vec3, Mat3, Isometry, Velocity, vec3, iso, quat_identity};
pub use hash::{StepHasher, hash_vec3, hash_quat};
pub use rng::XorShift64;
pub use schedule::{StepStage, schedule_digest};
pub use time::StepStats;
pub use glam::Quat;
