use super::{ParamHardening, ParamLaw, ParamYieldSurface, Properties, Variable};

/// Holds samples of material properties
pub struct SampleProperties {}

impl SampleProperties {
    /// Returns the properties of a linear elastic material
    pub fn linear_elastic(young: f64, poisson: f64) -> Properties {
        let mut props = Properties::new(1);
        props
            .set_law(ParamLaw::LinearElastic)
            .set(Variable::YoungModulus, young)
            .set(Variable::PoissonRatio, poisson);
        props
    }

    /// Returns the properties of a von Mises material with linear hardening
    pub fn von_mises(young: f64, poisson: f64, yield_stress: f64, hh: f64) -> Properties {
        let mut props = Properties::new(1);
        props
            .set_law(ParamLaw::Plasticity {
                yield_surface: ParamYieldSurface::VonMises,
                hardening: ParamHardening::Linear,
            })
            .set(Variable::YoungModulus, young)
            .set(Variable::PoissonRatio, poisson)
            .set(Variable::YieldStress, yield_stress)
            .set(Variable::HardeningModulus, hh);
        props
    }

    /// Returns the properties of a von Mises material with exponential (saturation) hardening
    pub fn von_mises_exponential(
        young: f64,
        poisson: f64,
        yield_stress: f64,
        saturation_stress: f64,
        delta: f64,
        hh: f64,
    ) -> Properties {
        let mut props = Properties::new(1);
        props
            .set_law(ParamLaw::Plasticity {
                yield_surface: ParamYieldSurface::VonMises,
                hardening: ParamHardening::Exponential,
            })
            .set(Variable::YoungModulus, young)
            .set(Variable::PoissonRatio, poisson)
            .set(Variable::YieldStress, yield_stress)
            .set(Variable::SaturationStress, saturation_stress)
            .set(Variable::HardeningExponent, delta)
            .set(Variable::HardeningModulus, hh);
        props
    }

    /// Returns the properties of a Drucker-Prager material with linear hardening
    ///
    /// The friction and dilatancy angles are given in degrees.
    pub fn drucker_prager(young: f64, poisson: f64, yield_stress: f64, phi: f64, psi: f64, hh: f64) -> Properties {
        let mut props = Properties::new(1);
        props
            .set_law(ParamLaw::Plasticity {
                yield_surface: ParamYieldSurface::DruckerPrager,
                hardening: ParamHardening::Linear,
            })
            .set(Variable::YoungModulus, young)
            .set(Variable::PoissonRatio, poisson)
            .set(Variable::YieldStress, yield_stress)
            .set(Variable::FrictionAngle, phi)
            .set(Variable::DilatancyAngle, psi)
            .set(Variable::HardeningModulus, hh);
        props
    }

    /// Returns the properties of a Mohr-Coulomb material with linear hardening of the cohesion
    ///
    /// The friction and dilatancy angles are given in degrees.
    pub fn mohr_coulomb(young: f64, poisson: f64, cohesion: f64, phi: f64, psi: f64, hh: f64) -> Properties {
        let mut props = Properties::new(1);
        props
            .set_law(ParamLaw::Plasticity {
                yield_surface: ParamYieldSurface::MohrCoulomb,
                hardening: ParamHardening::Linear,
            })
            .set(Variable::YoungModulus, young)
            .set(Variable::PoissonRatio, poisson)
            .set(Variable::YieldStress, cohesion)
            .set(Variable::FrictionAngle, phi)
            .set(Variable::DilatancyAngle, psi)
            .set(Variable::HardeningModulus, hh);
        props
    }

    /// Returns the properties of a Tresca material with linear hardening
    pub fn tresca(young: f64, poisson: f64, yield_stress: f64, hh: f64) -> Properties {
        let mut props = Properties::new(1);
        props
            .set_law(ParamLaw::Plasticity {
                yield_surface: ParamYieldSurface::Tresca,
                hardening: ParamHardening::Linear,
            })
            .set(Variable::YoungModulus, young)
            .set(Variable::PoissonRatio, poisson)
            .set(Variable::YieldStress, yield_stress)
            .set(Variable::HardeningModulus, hh);
        props
    }

    /// Returns the properties of a Drucker-Prager material with preconsolidation hardening
    ///
    /// The friction and dilatancy angles are given in degrees; `lambda > kappa > 0`.
    pub fn drucker_prager_preconsolidation(
        young: f64,
        poisson: f64,
        yield_stress: f64,
        phi: f64,
        psi: f64,
        lambda: f64,
        kappa: f64,
    ) -> Properties {
        let mut props = Properties::new(1);
        props
            .set_law(ParamLaw::Plasticity {
                yield_surface: ParamYieldSurface::DruckerPrager,
                hardening: ParamHardening::Preconsolidation,
            })
            .set(Variable::YoungModulus, young)
            .set(Variable::PoissonRatio, poisson)
            .set(Variable::YieldStress, yield_stress)
            .set(Variable::FrictionAngle, phi)
            .set(Variable::DilatancyAngle, psi)
            .set(Variable::CompressionIndex, lambda)
            .set(Variable::SwellingIndex, kappa);
        props
    }

    /// Returns the properties of a serial-parallel composite
    ///
    /// The matrix properties become sub-properties 0 and the fiber properties become sub-properties 1.
    pub fn serial_parallel(
        matrix: Properties,
        fiber: Properties,
        fiber_fraction: f64,
        parallel_directions: &[bool],
    ) -> Properties {
        let mut props = Properties::new(1);
        props
            .set_law(ParamLaw::SerialParallel {
                fiber_fraction,
                parallel_directions: parallel_directions.to_vec(),
            })
            .add_sub_properties(matrix)
            .add_sub_properties(fiber);
        props
    }

    /// Returns the properties of a serial-parallel composite made of two linear elastic materials
    pub fn serial_parallel_elastic(
        young_fiber: f64,
        young_matrix: f64,
        poisson: f64,
        fiber_fraction: f64,
        parallel_directions: &[bool],
    ) -> Properties {
        let mut matrix = SampleProperties::linear_elastic(young_matrix, poisson);
        matrix.id = 2;
        let mut fiber = SampleProperties::linear_elastic(young_fiber, poisson);
        fiber.id = 3;
        SampleProperties::serial_parallel(matrix, fiber, fiber_fraction, parallel_directions)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::SampleProperties;
    use crate::base::{ParamHardening, ParamLaw, ParamYieldSurface, Variable};

    #[test]
    fn sample_properties_work() {
        let props = SampleProperties::linear_elastic(1000.0, 0.25);
        assert_eq!(props.law().unwrap(), &ParamLaw::LinearElastic);

        let props = SampleProperties::von_mises(1500.0, 0.25, 9.0, 800.0);
        assert_eq!(props.get(Variable::HardeningModulus).unwrap(), 800.0);

        let props = SampleProperties::von_mises_exponential(1500.0, 0.25, 9.0, 12.0, 10.0, 0.0);
        assert_eq!(
            props.law().unwrap(),
            &ParamLaw::Plasticity {
                yield_surface: ParamYieldSurface::VonMises,
                hardening: ParamHardening::Exponential,
            }
        );

        let props = SampleProperties::drucker_prager(1500.0, 0.25, 9.0, 30.0, 10.0, 0.0);
        assert_eq!(props.get(Variable::DilatancyAngle).unwrap(), 10.0);

        let props = SampleProperties::mohr_coulomb(1500.0, 0.25, 2.0, 30.0, 10.0, 0.0);
        assert_eq!(props.get(Variable::FrictionAngle).unwrap(), 30.0);

        let props = SampleProperties::tresca(1500.0, 0.25, 9.0, 0.0);
        assert_eq!(
            props.law().unwrap(),
            &ParamLaw::Plasticity {
                yield_surface: ParamYieldSurface::Tresca,
                hardening: ParamHardening::Linear,
            }
        );

        let props = SampleProperties::drucker_prager_preconsolidation(1500.0, 0.25, 9.0, 30.0, 10.0, 0.2, 0.05);
        assert_eq!(props.get(Variable::CompressionIndex).unwrap(), 0.2);
        assert_eq!(props.get(Variable::SwellingIndex).unwrap(), 0.05);

        let props = SampleProperties::serial_parallel_elastic(200.0, 70.0, 0.3, 0.5, &[true, false, true]);
        assert_eq!(props.sub_properties(0).unwrap().id, 2);
        assert_eq!(props.sub_properties(1).unwrap().id, 3);
    }
}
