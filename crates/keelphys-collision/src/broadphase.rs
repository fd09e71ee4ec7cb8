use keelphys_geom::Aabb;

/// All-pairs AABB pruning: every unordered pair (i < j) is tested on all
/// three axes and rejected on the first separated one. Quadratic in the body
/// count — fine for the modest scenes this core targets, and the documented
/// scaling limit. Boxes with non-finite bounds are skipped.
pub fn overlapping_pairs(aabbs: &[Aabb]) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    for i in 0..aabbs.len() {
        if !aabbs[i].is_finite() { continue; }
        for j in (i + 1)..aabbs.len() {
            if !aabbs[j].is_finite() { continue; }
            if aabbs[i].overlaps(&aabbs[j]) {
                out.push((i, j));
            }
        }
    }
    out
}
