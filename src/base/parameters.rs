use serde::{Deserialize, Serialize};

/// Defines the keys of the material property values
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Variable {
    /// Young's modulus E
    YoungModulus,

    /// Poisson's coefficient ν
    PoissonRatio,

    /// Initial yield stress σy0 (von Mises stress or cohesive strength)
    YieldStress,

    /// Saturation (asymptotic) yield stress σ∞ of the exponential hardening
    SaturationStress,

    /// Linear hardening modulus H (negative values render softening)
    HardeningModulus,

    /// Exponent δ of the exponential hardening
    HardeningExponent,

    /// Friction angle φ in degrees
    FrictionAngle,

    /// Dilatancy angle ψ in degrees (ψ = φ renders associative flow)
    DilatancyAngle,

    /// Slope λ of the normal compression line (ln p vs. volumetric strain)
    CompressionIndex,

    /// Slope κ of the swelling (unloading-reloading) line
    SwellingIndex,

    /// Density
    Density,
}

/// Holds the hardening rule selection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamHardening {
    /// Linear hardening (or softening)
    ///
    /// ```text
    /// σy(κ) = σy0 + H κ
    /// ```
    ///
    /// Uses [Variable::YieldStress] and [Variable::HardeningModulus]
    Linear,

    /// Exponential saturation (Voce) hardening (or softening if σ∞ < σy0)
    ///
    /// ```text
    /// σy(κ) = σy0 + (σ∞ - σy0) (1 - exp(-δ κ)) + H κ
    /// ```
    ///
    /// Uses [Variable::YieldStress], [Variable::SaturationStress],
    /// [Variable::HardeningExponent] and (optionally) [Variable::HardeningModulus]
    Exponential,

    /// Preconsolidation (critical-state-like) hardening driven by the plastic volumetric strain
    ///
    /// ```text
    /// σy(εpv) = σy0 exp(-εpv / (λ - κ))
    /// ```
    ///
    /// Compaction (εpv < 0, tension positive) hardens and dilation softens.
    ///
    /// Uses [Variable::YieldStress], [Variable::CompressionIndex] and [Variable::SwellingIndex]
    Preconsolidation,
}

/// Holds the yield surface selection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamYieldSurface {
    /// von Mises (J2) yield surface
    ///
    /// ```text
    /// f = q - σy(κ)
    /// ```
    VonMises,

    /// Drucker-Prager cone fitted to the outer edges of Mohr-Coulomb
    ///
    /// ```text
    /// f = q + η p - ξ σy(κ)
    /// ```
    ///
    /// Uses [Variable::FrictionAngle] and (optionally) [Variable::DilatancyAngle]
    DruckerPrager,

    /// Mohr-Coulomb hexagonal pyramid (Lode angle dependent)
    ///
    /// ```text
    /// f = p sin φ + √J2 (cos θ - sin θ sin φ / √3) - c(κ) cos φ
    /// ```
    ///
    /// Uses [Variable::FrictionAngle] and (optionally) [Variable::DilatancyAngle]
    MohrCoulomb,

    /// Tresca hexagonal prism (Lode angle dependent)
    ///
    /// ```text
    /// f = √J2 cos θ - σy(κ) / 2
    /// ```
    ///
    /// The yield stress is the uniaxial one; thus the shear strength is σy/2.
    Tresca,
}

/// Holds the constitutive law selection
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ParamLaw {
    /// Linear elastic (isotropic) law
    ///
    /// Uses [Variable::YoungModulus] and [Variable::PoissonRatio]
    LinearElastic,

    /// Elastoplastic law with implicit return mapping
    Plasticity {
        /// Yield surface
        yield_surface: ParamYieldSurface,

        /// Hardening rule
        hardening: ParamHardening,
    },

    /// Serial-parallel rule of mixtures
    ///
    /// The first sub-property set holds the matrix and the second one holds the fiber.
    SerialParallel {
        /// Fiber volumetric participation kf ∈ (0, 1)
        fiber_fraction: f64,

        /// Flags indicating the parallel (equal strain) components; the others are serial (equal stress)
        parallel_directions: Vec<bool>,
    },
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{ParamHardening, ParamLaw, ParamYieldSurface, Variable};

    #[test]
    fn derive_works() {
        let p = ParamLaw::Plasticity {
            yield_surface: ParamYieldSurface::VonMises,
            hardening: ParamHardening::Linear,
        };
        let q = p.clone();
        assert_eq!(p, q);
        assert_eq!(
            format!("{:?}", q),
            "Plasticity { yield_surface: VonMises, hardening: Linear }"
        );
        assert!(Variable::YoungModulus < Variable::PoissonRatio);
    }

    #[test]
    fn serialize_works() {
        let p = ParamLaw::SerialParallel {
            fiber_fraction: 0.5,
            parallel_directions: vec![true, false, true],
        };
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(
            json,
            r#"{"SerialParallel":{"fiber_fraction":0.5,"parallel_directions":[true,false,true]}}"#
        );
        let q: ParamLaw = serde_json::from_str(&json).unwrap();
        assert_eq!(p, q);
    }
}
