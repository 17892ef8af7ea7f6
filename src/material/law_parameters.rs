use crate::util::{check_voigt_size, inverse, strain_from_tensor};
use crate::{Error, Result};
use russell_lab::{mat_add, mat_inverse, mat_mat_mul, Matrix, Vector};

/// Defines the tolerance used to compare the given determinant of F against the computed one
const DET_F_TOL: f64 = 1e-10;

/// Holds the flags selecting what a constitutive law evaluation should do
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LawOptions {
    /// Compute the stress vector
    pub compute_stress: bool,

    /// Compute the tangent (constitutive) matrix
    pub compute_tangent: bool,

    /// Use the given strain vector; otherwise, compute it from the deformation gradient
    pub use_provided_strain: bool,
}

impl Default for LawOptions {
    fn default() -> Self {
        LawOptions {
            compute_stress: true,
            compute_tangent: true,
            use_provided_strain: true,
        }
    }
}

/// Holds the input and output data of one constitutive law evaluation
///
/// The bundle is created by the caller (e.g., an element at a Gauss point) and lives
/// only for the duration of the evaluation.
#[derive(Clone, Debug)]
pub struct ConstitutiveLawParameters {
    /// Holds the total strain vector (engineering shear components)
    pub strain: Vector,

    /// Holds the computed stress vector
    pub stress: Vector,

    /// Holds the computed tangent matrix (dσ/dε)
    pub tangent: Matrix,

    /// Holds the options
    pub options: LawOptions,

    /// Holds the deformation gradient F
    pub deformation_gradient: Matrix,

    /// Holds the determinant of the deformation gradient
    pub determinant_f: f64,
}

impl ConstitutiveLawParameters {
    /// Allocates a new instance with zero strain and identity deformation gradient
    pub fn new(voigt_size: usize) -> Self {
        ConstitutiveLawParameters {
            strain: Vector::new(voigt_size),
            stress: Vector::new(voigt_size),
            tangent: Matrix::new(voigt_size, voigt_size),
            options: LawOptions::default(),
            deformation_gradient: Matrix::identity(3),
            determinant_f: 1.0,
        }
    }

    /// Allocates a new instance with the given strain vector
    pub fn with_strain(strain: &[f64]) -> Self {
        let mut params = ConstitutiveLawParameters::new(strain.len());
        params.set_strain(strain);
        params
    }

    /// Returns the number of Voigt components
    pub fn voigt_size(&self) -> usize {
        self.strain.dim()
    }

    /// Sets the strain vector
    ///
    /// # Panics
    ///
    /// A panic will occur if `values` has a different number of components.
    pub fn set_strain(&mut self, values: &[f64]) -> &mut Self {
        assert_eq!(values.len(), self.strain.dim());
        for i in 0..values.len() {
            self.strain[i] = values[i];
        }
        self
    }

    /// Sets the deformation gradient and its determinant
    ///
    /// The strain will be computed from F (see [ConstitutiveLawParameters::prepare]).
    pub fn set_deformation_gradient(&mut self, ff: &[[f64; 3]; 3]) -> &mut Self {
        self.deformation_gradient = Matrix::from(ff);
        self.determinant_f = determinant(&self.deformation_gradient);
        self.options.use_provided_strain = false;
        self
    }

    /// Validates the input data and computes the strain if needed
    ///
    /// When the strain is not provided, the Almansi strain is calculated:
    ///
    /// ```text
    /// e = ½ (I - (F Fᵀ)⁻¹)
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [Error::Input] if the vectors do not have `voigt_size` components,
    /// if the determinant of F is negative, or if the given determinant is
    /// inconsistent with the deformation gradient.
    pub fn prepare(&mut self, voigt_size: usize) -> Result<()> {
        check_voigt_size(&self.strain, voigt_size, "strain")?;
        check_voigt_size(&self.stress, voigt_size, "stress")?;
        if self.tangent.dims() != (voigt_size, voigt_size) {
            self.tangent = Matrix::new(voigt_size, voigt_size);
        }
        if self.determinant_f < 0.0 {
            return Err(Error::input(format!(
                "the determinant of the deformation gradient must not be negative (detF = {:e})",
                self.determinant_f
            )));
        }
        if self.options.use_provided_strain {
            return Ok(());
        }
        let ff = &self.deformation_gradient;
        if ff.dims() != (3, 3) {
            return Err(Error::input("the deformation gradient must be a 3×3 matrix"));
        }
        let det = determinant(ff);
        if f64::abs(det - self.determinant_f) > DET_F_TOL * f64::max(1.0, f64::abs(det)) {
            return Err(Error::input(format!(
                "the deformation gradient is inconsistent with its determinant ({:e} != {:e})",
                det, self.determinant_f
            )));
        }
        if det <= 0.0 {
            return Err(Error::input("the deformation gradient must have a positive determinant"));
        }
        let mut bb = Matrix::new(3, 3);
        mat_mat_mul(&mut bb, 1.0, ff, &ff.transposed(), 0.0)?;
        let bb_inv = inverse(&bb)?;
        let mut ee = Matrix::new(3, 3);
        mat_add(&mut ee, 0.5, &Matrix::identity(3), -0.5, &bb_inv)?;
        self.strain = strain_from_tensor(&ee, voigt_size);
        Ok(())
    }

    /// Returns a copy holding a different strain vector and providing the strain
    ///
    /// Used by composite and perturbation algorithms to evaluate nested laws.
    pub fn derive(&self, strain: Vector) -> Self {
        let n = strain.dim();
        ConstitutiveLawParameters {
            strain,
            stress: Vector::new(n),
            tangent: Matrix::new(n, n),
            options: LawOptions {
                use_provided_strain: true,
                ..self.options
            },
            deformation_gradient: self.deformation_gradient.clone(),
            determinant_f: self.determinant_f,
        }
    }
}

/// Returns the determinant of a 3×3 matrix (zero if the matrix is singular)
fn determinant(a: &Matrix) -> f64 {
    let mut ai = Matrix::new(3, 3);
    mat_inverse(&mut ai, a).unwrap_or(0.0)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{ConstitutiveLawParameters, LawOptions};
    use crate::Error;
    use russell_lab::{approx_eq, Vector};

    #[test]
    fn new_and_options_work() {
        let params = ConstitutiveLawParameters::new(6);
        assert_eq!(params.voigt_size(), 6);
        assert_eq!(params.tangent.dims(), (6, 6));
        assert_eq!(params.options, LawOptions::default());
        assert_eq!(params.determinant_f, 1.0);
        let params = ConstitutiveLawParameters::with_strain(&[1.0, 2.0, 3.0]);
        assert_eq!(params.strain.as_data(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn prepare_captures_errors() {
        let mut params = ConstitutiveLawParameters::new(3);
        assert_eq!(
            params.prepare(6).err(),
            Some(Error::input("the strain vector must have 6 components (found 3)"))
        );
        params.determinant_f = -0.5;
        assert_eq!(
            params.prepare(3).err(),
            Some(Error::input(
                "the determinant of the deformation gradient must not be negative (detF = -5e-1)"
            ))
        );
        params.set_deformation_gradient(&[[1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, 1.0]]);
        assert!(matches!(params.prepare(3), Err(Error::Input(_))));
        params.set_deformation_gradient(&[[2.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        params.determinant_f = 1.0;
        assert!(matches!(params.prepare(3), Err(Error::Input(_))));
    }

    #[test]
    fn almansi_strain_works() {
        // stretch
        let mut params = ConstitutiveLawParameters::new(6);
        params.set_deformation_gradient(&[[2.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        assert_eq!(params.determinant_f, 2.0);
        params.prepare(6).unwrap();
        approx_eq(params.strain[0], 0.375, 1e-15);
        for i in 1..6 {
            approx_eq(params.strain[i], 0.0, 1e-15);
        }

        // simple shear
        let gamma = 0.1;
        let mut params = ConstitutiveLawParameters::new(3);
        params.set_deformation_gradient(&[[1.0, gamma, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        params.prepare(3).unwrap();
        approx_eq(params.strain[0], 0.0, 1e-15);
        approx_eq(params.strain[1], -0.5 * gamma * gamma, 1e-15);
        approx_eq(params.strain[2], gamma, 1e-15);
    }

    #[test]
    fn derive_works() {
        let mut params = ConstitutiveLawParameters::new(6);
        params.options.compute_tangent = false;
        params.options.use_provided_strain = false;
        let derived = params.derive(Vector::from(&[1.0, 0.0, 0.0]));
        assert_eq!(derived.voigt_size(), 3);
        assert_eq!(derived.tangent.dims(), (3, 3));
        assert!(!derived.options.compute_tangent);
        assert!(derived.options.use_provided_strain);
    }
}
