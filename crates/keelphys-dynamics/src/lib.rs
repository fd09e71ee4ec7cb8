pub mod body;
pub mod tuning;

pub use body::{Bodies, BodyDesc};
