/// Per-step counters returned by `World::step`.
#[derive(Copy, Clone, Debug, Default)]
pub struct StepStats {
    pub pairs_tested: u32,
    pub aabb_overlaps: u32,
    pub contacts: u32,
    pub substeps: u32,
}
