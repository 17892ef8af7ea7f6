use super::{ConstitutiveLaw, ConstitutiveLawParameters, InternalVariables};
use crate::base::{Idealization, Properties, Variable};
use crate::util::n_normal;
use crate::{Error, Result};
use russell_lab::{mat_vec_mul, Matrix, Vector};

/// Specifies an elasticity law used by the plasticity models
pub trait ElasticityLaw: Send + Sync {
    /// Returns the bulk modulus K and the shear modulus G
    fn bulk_shear(&self) -> (f64, f64);

    /// Returns the elastic stiffness matrix for the given number of Voigt components
    ///
    /// The stiffness maps the strain vector (engineering shear) to the stress vector.
    fn stiffness_matrix(&self, voigt_size: usize) -> Matrix;

    /// Returns a deep copy
    fn clone_box(&self) -> Box<dyn ElasticityLaw>;
}

impl Clone for Box<dyn ElasticityLaw> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Implements the isotropic linear elastic (Hooke) law
///
/// Works in 3D, 2D plane-strain and 2D plane-stress.
#[derive(Clone, Debug)]
pub struct LinearElastic {
    /// Young's modulus E
    young: f64,

    /// Poisson's coefficient ν
    poisson: f64,

    /// Modelling type
    ideal: Idealization,

    /// Elastic stiffness D
    dd: Matrix,

    /// Empty set of internal variables
    internal: InternalVariables,
}

impl LinearElastic {
    /// Allocates a new instance
    pub fn new(ideal: &Idealization, young: f64, poisson: f64) -> Result<Self> {
        if young <= 0.0 {
            return Err(Error::input("Young's modulus must be > 0.0"));
        }
        if poisson <= -1.0 || poisson >= 0.5 {
            return Err(Error::input("Poisson's coefficient must satisfy -1 < ν < 0.5"));
        }
        let mut model = LinearElastic {
            young,
            poisson,
            ideal: *ideal,
            dd: Matrix::new(0, 0),
            internal: InternalVariables::new(0),
        };
        model.dd = if ideal.two_dim && ideal.plane_stress {
            model.plane_stress_stiffness()
        } else {
            model.stiffness_matrix(ideal.voigt_size())
        };
        Ok(model)
    }

    /// Allocates a new instance from the material properties
    pub fn from_properties(props: &Properties, ideal: &Idealization) -> Result<Self> {
        let young = props.get(Variable::YoungModulus)?;
        let poisson = props.get(Variable::PoissonRatio)?;
        LinearElastic::new(ideal, young, poisson)
    }

    /// Returns the plane-stress stiffness matrix
    fn plane_stress_stiffness(&self) -> Matrix {
        let (e, nu) = (self.young, self.poisson);
        let c = e / (1.0 - nu * nu);
        Matrix::from(&[
            [c, c * nu, 0.0],
            [c * nu, c, 0.0],
            [0.0, 0.0, c * (1.0 - nu) / 2.0],
        ])
    }
}

impl ElasticityLaw for LinearElastic {
    fn bulk_shear(&self) -> (f64, f64) {
        let kk = self.young / (3.0 * (1.0 - 2.0 * self.poisson));
        let gg = self.young / (2.0 * (1.0 + self.poisson));
        (kk, gg)
    }

    /// Returns the isotropic stiffness (3D or plane-strain)
    ///
    /// ```text
    /// D = K I⊗I + 2G Idev
    /// ```
    fn stiffness_matrix(&self, voigt_size: usize) -> Matrix {
        let (kk, gg) = self.bulk_shear();
        let nn = n_normal(voigt_size);
        let mut dd = Matrix::new(voigt_size, voigt_size);
        for i in 0..voigt_size {
            for j in 0..voigt_size {
                if i < nn && j < nn {
                    let delta = if i == j { 1.0 } else { 0.0 };
                    dd.set(i, j, kk + 2.0 * gg * (delta - 1.0 / 3.0));
                } else if i == j {
                    dd.set(i, j, gg);
                }
            }
        }
        dd
    }

    fn clone_box(&self) -> Box<dyn ElasticityLaw> {
        Box::new(self.clone())
    }
}

impl ConstitutiveLaw for LinearElastic {
    fn name(&self) -> &'static str {
        "linear elastic"
    }

    fn voigt_size(&self) -> usize {
        self.ideal.voigt_size()
    }

    fn symmetric_tangent(&self) -> bool {
        true
    }

    fn check(&self, props: &Properties) -> Result<()> {
        LinearElastic::from_properties(props, &self.ideal).map(|_| ())
    }

    fn initialize_material(&mut self) -> Result<()> {
        Ok(())
    }

    /// Calculates σ = D ε
    fn calculate_material_response(&self, params: &mut ConstitutiveLawParameters) -> Result<()> {
        params.prepare(self.voigt_size())?;
        if params.options.compute_stress {
            params.stress = Vector::new(params.strain.dim());
            mat_vec_mul(&mut params.stress, 1.0, &self.dd, &params.strain)?;
        }
        if params.options.compute_tangent {
            params.tangent = self.dd.clone();
        }
        Ok(())
    }

    fn finalize_material_response(&mut self, params: &mut ConstitutiveLawParameters) -> Result<()> {
        self.calculate_material_response(params)
    }

    fn elastic_stiffness(&self) -> Result<Matrix> {
        Ok(self.dd.clone())
    }

    fn internal_variables(&self) -> &InternalVariables {
        &self.internal
    }

    fn rollback(&mut self) {}

    fn clone_box(&self) -> Box<dyn ConstitutiveLaw> {
        Box::new(self.clone())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{ElasticityLaw, LinearElastic};
    use crate::base::{Idealization, SampleProperties};
    use crate::material::{ConstitutiveLaw, ConstitutiveLawParameters};
    use crate::Error;
    use russell_lab::approx_eq;

    #[test]
    fn new_captures_errors() {
        let ideal = Idealization::new(3);
        assert_eq!(
            LinearElastic::new(&ideal, 0.0, 0.2).err(),
            Some(Error::input("Young's modulus must be > 0.0"))
        );
        assert_eq!(
            LinearElastic::new(&ideal, 100.0, 0.5).err(),
            Some(Error::input("Poisson's coefficient must satisfy -1 < ν < 0.5"))
        );
        let props = SampleProperties::linear_elastic(100.0, 0.2);
        let model = LinearElastic::new(&ideal, 100.0, 0.2).unwrap();
        model.check(&props).unwrap();
    }

    #[test]
    fn plane_strain_stiffness_works() {
        let ideal = Idealization::new(2);
        let model = LinearElastic::new(&ideal, 1500.0, 0.25).unwrap();
        let dd = model.elastic_stiffness().unwrap();
        let correct = [[1800.0, 600.0, 0.0], [600.0, 1800.0, 0.0], [0.0, 0.0, 600.0]];
        for i in 0..3 {
            for j in 0..3 {
                approx_eq(dd.get(i, j), correct[i][j], 1e-12);
            }
        }
        let (kk, gg) = model.bulk_shear();
        approx_eq(kk, 1000.0, 1e-12);
        approx_eq(gg, 600.0, 1e-12);
    }

    #[test]
    fn plane_stress_stiffness_works() {
        let mut ideal = Idealization::new(2);
        ideal.plane_stress = true;
        let model = LinearElastic::new(&ideal, 1500.0, 0.25).unwrap();
        let dd = model.elastic_stiffness().unwrap();
        let c = 1500.0 / (1.0 - 0.0625);
        approx_eq(dd.get(0, 0), c, 1e-12);
        approx_eq(dd.get(0, 1), 0.25 * c, 1e-12);
        approx_eq(dd.get(2, 2), 600.0, 1e-12);

        // uniaxial stress
        let mut params = ConstitutiveLawParameters::with_strain(&[0.001, -0.00025, 0.0]);
        model.calculate_material_response(&mut params).unwrap();
        approx_eq(params.stress[0], 1.5, 1e-12);
        approx_eq(params.stress[1], 0.0, 1e-12);
    }

    #[test]
    fn calculate_material_response_works() {
        let ideal = Idealization::new(3);
        let mut model = LinearElastic::new(&ideal, 1000.0, 0.25).unwrap();
        let mut params = ConstitutiveLawParameters::with_strain(&[0.001, 0.0, 0.0, 0.002, 0.0, 0.0]);
        model.calculate_material_response(&mut params).unwrap();
        // λ = 400, G = 400
        approx_eq(params.stress[0], 1.2, 1e-12);
        approx_eq(params.stress[1], 0.4, 1e-12);
        approx_eq(params.stress[2], 0.4, 1e-12);
        approx_eq(params.stress[3], 0.8, 1e-12);
        approx_eq(params.tangent.get(3, 3), 400.0, 1e-12);

        model.finalize_material_response(&mut params).unwrap();
        assert_eq!(model.plastic_strain(), 0.0);
        assert_eq!(model.n_internal_values(), 0);

        let mut wrong = ConstitutiveLawParameters::new(3);
        assert!(matches!(
            model.calculate_material_response(&mut wrong),
            Err(Error::Input(_))
        ));
    }
}
