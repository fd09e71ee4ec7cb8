use crate::StepHasher;

/// Stages of one simulation step, in pipeline order.
#[repr(u8)]
#[derive(Copy, Clone, Debug)]
pub enum StepStage {
    IntegrateVelocities = 1,
    Broadphase = 2,
    Narrowphase = 3,
    Solve = 4,
    IntegratePoses = 5,
    SleepUpdate = 6,
}

pub fn schedule_digest(stages: &[StepStage]) -> [u8; 32] {
    let mut h = StepHasher::new();
    for s in stages { h.update_bytes(&[*s as u8]); }
    h.finalize()
}
