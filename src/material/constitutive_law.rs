use super::{
    allocate_yield_surface, ConstitutiveLawParameters, InternalVariables, LinearElastic, PlasticityModel,
    SerialParallelLaw,
};
use crate::base::{Config, Idealization, ParamLaw, Properties};
use crate::Result;
use russell_lab::Matrix;

/// Specifies the capabilities of every constitutive law
///
/// A law instance belongs to a single integration point. The trial evaluation
/// [ConstitutiveLaw::calculate_material_response] never changes the committed
/// state; only [ConstitutiveLaw::finalize_material_response] does.
pub trait ConstitutiveLaw: Send + Sync {
    /// Returns the name of the law
    fn name(&self) -> &'static str;

    /// Returns the number of Voigt components of the strain and stress vectors
    fn voigt_size(&self) -> usize;

    /// Returns the number of internal values
    fn n_internal_values(&self) -> usize {
        self.internal_variables().size()
    }

    /// Indicates whether the tangent matrix is symmetric or not
    fn symmetric_tangent(&self) -> bool;

    /// Validates the material properties against the requirements of this law
    fn check(&self, props: &Properties) -> Result<()>;

    /// Resets the internal (history) variables to the virgin state
    fn initialize_material(&mut self) -> Result<()>;

    /// Calculates the stress and (optionally) the tangent without committing anything
    fn calculate_material_response(&self, params: &mut ConstitutiveLawParameters) -> Result<()>;

    /// Calculates the response and commits the internal variables (once per converged step)
    fn finalize_material_response(&mut self, params: &mut ConstitutiveLawParameters) -> Result<()>;

    /// Returns the elastic stiffness matrix
    fn elastic_stiffness(&self) -> Result<Matrix>;

    /// Returns the internal variables
    fn internal_variables(&self) -> &InternalVariables;

    /// Undoes the last commit
    fn rollback(&mut self);

    /// Returns the accumulated (equivalent) plastic strain
    fn plastic_strain(&self) -> f64 {
        0.0
    }

    /// Returns the increment of the equivalent plastic strain over the last committed step
    fn delta_plastic_strain(&self) -> f64 {
        0.0
    }

    /// Returns a deep copy
    fn clone_box(&self) -> Box<dyn ConstitutiveLaw>;
}

impl Clone for Box<dyn ConstitutiveLaw> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Allocates a constitutive law from the material properties
///
/// Composite laws allocate their constituents recursively from the sub-properties
/// (sub-properties 0 hold the matrix and sub-properties 1 hold the fiber).
pub fn allocate_law(props: &Properties, ideal: &Idealization, config: &Config) -> Result<Box<dyn ConstitutiveLaw>> {
    let law: Box<dyn ConstitutiveLaw> = match props.law()? {
        ParamLaw::LinearElastic => Box::new(LinearElastic::from_properties(props, ideal)?),
        ParamLaw::Plasticity {
            yield_surface,
            hardening,
        } => {
            let elasticity = LinearElastic::from_properties(props, ideal)?;
            let surface = allocate_yield_surface(*yield_surface, *hardening, props)?;
            Box::new(PlasticityModel::new(ideal, config, Box::new(elasticity), surface)?)
        }
        ParamLaw::SerialParallel {
            fiber_fraction,
            parallel_directions,
        } => {
            let matrix = allocate_law(props.sub_properties(0)?, ideal, config)?;
            let fiber = allocate_law(props.sub_properties(1)?, ideal, config)?;
            Box::new(SerialParallelLaw::new(
                config,
                matrix,
                fiber,
                *fiber_fraction,
                parallel_directions,
            )?)
        }
    };
    law.check(props)?;
    Ok(law)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::allocate_law;
    use crate::base::{Config, Idealization, Properties, SampleProperties};
    use crate::Error;

    #[test]
    fn allocate_law_works() {
        let config = Config::new();
        let ideal = Idealization::new(3);

        let props = SampleProperties::linear_elastic(1000.0, 0.25);
        let law = allocate_law(&props, &ideal, &config).unwrap();
        assert_eq!(law.name(), "linear elastic");
        assert_eq!(law.voigt_size(), 6);
        assert_eq!(law.n_internal_values(), 0);

        let props = SampleProperties::von_mises(1000.0, 0.25, 10.0, 100.0);
        let law = allocate_law(&props, &ideal, &config).unwrap();
        assert_eq!(law.name(), "von Mises plasticity");
        assert_eq!(law.n_internal_values(), 7);
        assert!(law.symmetric_tangent());

        let props = SampleProperties::drucker_prager(1000.0, 0.25, 10.0, 30.0, 10.0, 0.0);
        let law = allocate_law(&props, &ideal, &config).unwrap();
        assert_eq!(law.name(), "Drucker-Prager plasticity");
        assert!(!law.symmetric_tangent());

        let props = SampleProperties::mohr_coulomb(1000.0, 0.25, 2.0, 30.0, 10.0, 0.0);
        let law = allocate_law(&props, &ideal, &config).unwrap();
        assert_eq!(law.name(), "Mohr-Coulomb plasticity");

        let props = SampleProperties::tresca(1000.0, 0.25, 10.0, 0.0);
        let law = allocate_law(&props, &ideal, &config).unwrap();
        assert_eq!(law.name(), "Tresca plasticity");
        assert!(law.symmetric_tangent());

        let props = SampleProperties::serial_parallel_elastic(200.0, 70.0, 0.3, 0.5, &[true, true, false, true, true, true]);
        let law = allocate_law(&props, &ideal, &config).unwrap();
        assert_eq!(law.name(), "serial-parallel rule of mixtures");
        let copy = law.clone();
        assert_eq!(copy.voigt_size(), 6);
    }

    #[test]
    fn allocate_law_captures_errors() {
        let config = Config::new();
        let ideal = Idealization::new(3);
        let props = Properties::new(7);
        assert_eq!(
            allocate_law(&props, &ideal, &config).err(),
            Some(Error::input("no constitutive law set (properties 7)"))
        );

        let mut ideal_2d = Idealization::new(2);
        ideal_2d.plane_stress = true;
        let props = SampleProperties::von_mises(1000.0, 0.25, 10.0, 100.0);
        assert_eq!(
            allocate_law(&props, &ideal_2d, &config).err(),
            Some(Error::input("plasticity models do not work in plane-stress"))
        );

        let matrix = SampleProperties::linear_elastic(70.0, 0.3);
        let mut props = SampleProperties::linear_elastic(200.0, 0.3);
        props.set_law(crate::base::ParamLaw::SerialParallel {
            fiber_fraction: 0.5,
            parallel_directions: vec![true; 6],
        });
        props.add_sub_properties(matrix);
        assert_eq!(
            allocate_law(&props, &ideal, &config).err(),
            Some(Error::input("sub-properties 1 are missing (properties 1)"))
        );
    }
}
