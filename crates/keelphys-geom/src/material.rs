use keelphys_core::Scalar;

/// Per-body surface properties.
#[derive(Copy, Clone, Debug)]
pub struct Material {
    pub mu_s: Scalar,
    pub mu_d: Scalar,
    pub restitution: Scalar,
}

impl Default for Material {
    fn default() -> Self { Self { mu_s: 0.5, mu_d: 0.3, restitution: 0.05 } }
}

impl Material {
    pub fn frictionless() -> Self { Self { mu_s: 0.0, mu_d: 0.0, restitution: 0.0 } }
}

/// What the solver actually consumes for one body pair.
#[derive(Copy, Clone, Debug)]
pub struct PairProps {
    pub mu_s: Scalar,
    pub mu_d: Scalar,
    pub restitution: Scalar,
}

/// Symmetric mixing: geometric-mean friction, max restitution.
pub fn pair_props(a: &Material, b: &Material) -> PairProps {
    PairProps {
        mu_s: (a.mu_s * b.mu_s).abs().sqrt(),
        mu_d: (a.mu_d * b.mu_d).abs().sqrt(),
        restitution: a.restitution.max(b.restitution),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_mixing_is_symmetric() {
        let ice = Material { mu_s: 0.05, mu_d: 0.03, restitution: 0.02 };
        let rubber = Material { mu_s: 1.1, mu_d: 0.95, restitution: 0.8 };
        let p1 = pair_props(&ice, &rubber);
        let p2 = pair_props(&rubber, &ice);
        assert!((p1.mu_s - p2.mu_s).abs() < 1.0e-7);
        assert!((p1.mu_d - p2.mu_d).abs() < 1.0e-7);
        assert!((p1.restitution - p2.restitution).abs() < 1.0e-7);
    }

    #[test]
    fn identical_materials_mix_to_themselves() {
        let m = Material::default();
        let p = pair_props(&m, &m);
        assert!((p.mu_s - m.mu_s).abs() < 1.0e-6);
        assert!((p.mu_d - m.mu_d).abs() < 1.0e-6);
    }
}
