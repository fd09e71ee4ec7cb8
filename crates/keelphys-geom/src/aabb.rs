use keelphys_core::types::Vec3;

/// World-space axis-aligned box. Recomputed from the rotated shape every
/// step; never cached across frames.
#[derive(Copy, Clone, Debug, Default)]
pub struct Aabb { pub min: Vec3, pub max: Vec3 }

impl Aabb {
    #[inline] pub fn new(min: Vec3, max: Vec3) -> Self { Self { min, max } }

    #[inline] pub fn from_center_half_extents(c: Vec3, he: Vec3) -> Self {
        Self { min: c - he, max: c + he }
    }

    #[inline] pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    #[inline] pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x &&
        p.y >= self.min.y && p.y <= self.max.y &&
        p.z >= self.min.z && p.z <= self.max.z
    }

    /// Per-axis overlap extents, zero where separated.
    pub fn overlap_extents(&self, other: &Aabb) -> Vec3 {
        (self.max.min(other.max) - self.min.max(other.min)).max(Vec3::ZERO)
    }

    #[inline] pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keelphys_core::vec3;

    fn unit_at(c: Vec3) -> Aabb {
        Aabb::from_center_half_extents(c, vec3(0.5, 0.5, 0.5))
    }

    #[test]
    fn overlap_is_symmetric() {
        let cases = [
            (unit_at(vec3(0.0, 0.0, 0.0)), unit_at(vec3(0.4, 0.2, -0.3))),
            (unit_at(vec3(0.0, 0.0, 0.0)), unit_at(vec3(2.0, 0.0, 0.0))),
            (unit_at(vec3(1.0, 1.0, 1.0)), unit_at(vec3(1.0, 2.0, 1.0))),
            (unit_at(vec3(-3.0, 0.0, 0.0)), unit_at(vec3(3.0, 0.0, 0.0))),
        ];
        for (a, b) in cases {
            assert_eq!(a.overlaps(&b), b.overlaps(&a));
        }
    }

    #[test]
    fn gap_on_any_axis_separates() {
        let a = unit_at(vec3(0.0, 0.0, 0.0));
        for axis in 0..3 {
            let mut c = vec3(0.0, 0.0, 0.0);
            c[axis] = 1.0 + 1.0e-3;
            assert!(!a.overlaps(&unit_at(c)));
        }
    }

    #[test]
    fn touching_faces_overlap() {
        // Closed-interval test: exact touch counts as overlap.
        let a = unit_at(vec3(0.0, 0.0, 0.0));
        let b = unit_at(vec3(1.0, 0.0, 0.0));
        assert!(a.overlaps(&b));
    }

    #[test]
    fn overlap_extents_match_penetration() {
        let a = unit_at(vec3(0.0, 0.0, 0.0));
        let b = unit_at(vec3(0.75, 0.0, 0.0));
        let e = a.overlap_extents(&b);
        assert!((e.x - 0.25).abs() < 1.0e-6);
        assert!((e.y - 1.0).abs() < 1.0e-6);
    }
}
