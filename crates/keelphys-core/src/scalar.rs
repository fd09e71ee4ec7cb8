/// Simulation scalar. f32 everywhere; the solver quantizes nothing beyond it.
pub type Scalar = f32;
