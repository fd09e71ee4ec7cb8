pub mod broadphase;
pub mod sat;
pub mod manifold;

pub use broadphase::overlapping_pairs;
pub use sat::{SatHit, sat_box_box};
pub use manifold::{ContactPoint, ContactManifold, build_manifold, MAX_CONTACTS};
