pub mod aabb;
pub mod shape;
pub mod mass;
pub mod material;

pub use aabb::Aabb;
pub use shape::{Shape, aabb_of};
pub use mass::MassProps;
pub use material::{Material, PairProps, pair_props};
