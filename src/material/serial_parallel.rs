use super::{calc_tangent_by_perturbation, ConstitutiveLaw, ConstitutiveLawParameters, InternalVariables};
use crate::base::{Config, NonConvergencePolicy, ParamLaw, Properties, TangentEstimation};
use crate::util::{inverse, project};
use crate::{Error, Result};
use russell_lab::{
    mat_add, mat_mat_mul, mat_update, mat_vec_mul, mat_vec_mul_update, vec_add, vec_mat_mul, vec_minus, vec_norm,
    Matrix, Norm, Vector,
};
use tracing::{trace, warn};

/// Defines the name of the local solver used in error messages
const SOLVER_NAME: &str = "serial-parallel rule of mixtures";

/// Defines the reference stress used when both serial stresses vanish
const REFERENCE_FLOOR: f64 = 1e-9;

/// Holds the convergence data of the last serial-parallel equilibrium iteration
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SerialParallelReport {
    /// Number of Newton corrections
    pub iterations: usize,

    /// Norm of the serial stress residual
    pub residual: f64,

    /// Tolerance on the residual norm
    pub tolerance: f64,

    /// Indicates whether the equilibrium was reached or not
    pub converged: bool,
}

/// Holds the state of both constituents after the equilibrium iterations
#[derive(Clone, Debug)]
pub struct SerialParallelSolution {
    /// Serial strain of the matrix (the unknown of the iterations)
    pub serial_strain_matrix: Vector,

    /// Total strain of the matrix
    pub matrix_strain: Vector,

    /// Total strain of the fiber
    pub fiber_strain: Vector,

    /// Stress of the matrix
    pub matrix_stress: Vector,

    /// Stress of the fiber
    pub fiber_stress: Vector,

    /// Homogenized stress kf σf + (1 - kf) σm
    pub stress: Vector,

    /// Convergence data
    pub report: SerialParallelReport,
}

/// Implements the serial-parallel rule of mixtures for a matrix reinforced by fibers
///
/// The strain components are split into parallel components (equal strain in both
/// constituents) and serial components (equal stress). With the projectors P and S:
///
/// ```text
/// εm = P Pᵀ ε + S εmˢ
/// εf = P Pᵀ ε + S (Sᵀ ε / kf - km/kf εmˢ)
/// r  = Sᵀ σm - Sᵀ σf = 0
/// σ  = kf σf + km σm
/// ```
///
/// where `kf` is the fiber volumetric participation and `km = 1 - kf`. The serial
/// strain of the matrix `εmˢ` is found by Newton iterations. The converged value is
/// stored as the starting point of the next step only when the response is finalized.
#[derive(Clone)]
pub struct SerialParallelLaw {
    /// Matrix constitutive law
    matrix: Box<dyn ConstitutiveLaw>,

    /// Fiber constitutive law
    fiber: Box<dyn ConstitutiveLaw>,

    /// Fiber volumetric participation kf
    fiber_fraction: f64,

    /// Parallel projector P (voigt_size × n_parallel)
    parallel_projector: Matrix,

    /// Serial projector S (voigt_size × n_serial)
    serial_projector: Matrix,

    /// Tolerance factor multiplying the reference serial stress
    tol_factor: f64,

    /// Maximum number of Newton corrections
    n_max_it: usize,

    /// What to do on non-convergence
    policy: NonConvergencePolicy,

    /// Tangent estimation method
    tangent_estimation: TangentEstimation,

    /// Strain perturbation
    perturbation: f64,

    /// Committed values [εmˢ, ε]
    internal: InternalVariables,

    /// Convergence data of the last finalized step
    report: SerialParallelReport,
}

/// Calculates the parallel and serial projectors
///
/// Each column of the projectors selects one Voigt component. The projectors
/// partition the components with no overlap and no omission.
///
/// # Errors
///
/// Returns [Error::Input] if there is no parallel direction.
pub fn serial_parallel_projectors(parallel_directions: &[bool]) -> Result<(Matrix, Matrix)> {
    let n = parallel_directions.len();
    let n_parallel = parallel_directions.iter().filter(|p| **p).count();
    if n_parallel == 0 {
        return Err(Error::input("there is no parallel direction"));
    }
    let mut pp = Matrix::new(n, n_parallel);
    let mut ss = Matrix::new(n, n - n_parallel);
    let (mut ip, mut is) = (0, 0);
    for (i, parallel) in parallel_directions.iter().enumerate() {
        if *parallel {
            pp.set(i, ip, 1.0);
            ip += 1;
        } else {
            ss.set(i, is, 1.0);
            is += 1;
        }
    }
    Ok((pp, ss))
}

impl SerialParallelLaw {
    /// Allocates a new instance
    pub fn new(
        config: &Config,
        matrix: Box<dyn ConstitutiveLaw>,
        fiber: Box<dyn ConstitutiveLaw>,
        fiber_fraction: f64,
        parallel_directions: &[bool],
    ) -> Result<Self> {
        if fiber_fraction <= 0.0 || fiber_fraction >= 1.0 {
            return Err(Error::input("the fiber volumetric participation must be in (0, 1)"));
        }
        let n = matrix.voigt_size();
        if fiber.voigt_size() != n {
            return Err(Error::input("the matrix and fiber laws must have the same Voigt size"));
        }
        if parallel_directions.len() != n {
            return Err(Error::input(format!(
                "the parallel directions must have {} components (found {})",
                n,
                parallel_directions.len()
            )));
        }
        let (parallel_projector, serial_projector) = serial_parallel_projectors(parallel_directions)?;
        let n_serial = serial_projector.dims().1;
        Ok(SerialParallelLaw {
            matrix,
            fiber,
            fiber_fraction,
            parallel_projector,
            serial_projector,
            tol_factor: config.serial_parallel_tol_factor,
            n_max_it: config.serial_parallel_n_max_it,
            policy: config.serial_parallel_policy,
            tangent_estimation: config.tangent_estimation,
            perturbation: config.perturbation,
            internal: InternalVariables::new(n_serial + n),
            report: SerialParallelReport {
                iterations: 0,
                residual: 0.0,
                tolerance: 0.0,
                converged: true,
            },
        })
    }

    /// Returns the matrix constitutive law
    pub fn matrix(&self) -> &dyn ConstitutiveLaw {
        self.matrix.as_ref()
    }

    /// Returns the fiber constitutive law
    pub fn fiber(&self) -> &dyn ConstitutiveLaw {
        self.fiber.as_ref()
    }

    /// Returns the number of serial components
    pub fn n_serial(&self) -> usize {
        self.serial_projector.dims().1
    }

    /// Returns the convergence data of the last finalized step
    pub fn report(&self) -> SerialParallelReport {
        self.report
    }

    /// Returns the committed serial strain of the matrix (warm-start seed)
    pub fn serial_strain_matrix(&self) -> Vector {
        let ns = self.n_serial();
        let committed = self.internal.current();
        Vector::from(&committed.as_data()[..ns].to_vec())
    }

    /// Returns the committed total strain
    fn previous_strain(&self) -> Vector {
        let ns = self.n_serial();
        let n = self.internal.size() - ns;
        let committed = self.internal.current();
        Vector::from(&committed.as_data()[ns..ns + n].to_vec())
    }

    /// Returns the serial components Sᵀ v
    fn serial_part(&self, v: &Vector) -> Result<Vector> {
        let mut res = Vector::new(self.serial_projector.ncol());
        vec_mat_mul(&mut res, 1.0, v, &self.serial_projector)?;
        Ok(res)
    }

    /// Returns the parallel components Pᵀ v
    fn parallel_part(&self, v: &Vector) -> Result<Vector> {
        let mut res = Vector::new(self.parallel_projector.ncol());
        vec_mat_mul(&mut res, 1.0, v, &self.parallel_projector)?;
        Ok(res)
    }

    /// Calculates the strains of the matrix and fiber given the serial strain of the matrix
    fn constituent_strains(&self, strain: &Vector, serial_strain_matrix: &Vector) -> Result<(Vector, Vector)> {
        let kf = self.fiber_fraction;
        let km = 1.0 - kf;
        let ss = &self.serial_projector;
        let serial = self.serial_part(strain)?;
        let mut serial_fiber = Vector::new(serial.dim());
        vec_add(&mut serial_fiber, 1.0 / kf, &serial, -km / kf, serial_strain_matrix)?;
        let mut matrix_strain = Vector::new(strain.dim());
        mat_vec_mul(&mut matrix_strain, 1.0, &self.parallel_projector, &self.parallel_part(strain)?)?;
        let mut fiber_strain = matrix_strain.clone();
        if serial.dim() > 0 {
            mat_vec_mul_update(&mut matrix_strain, 1.0, ss, serial_strain_matrix, 1.0)?;
            mat_vec_mul_update(&mut fiber_strain, 1.0, ss, &serial_fiber, 1.0)?;
        }
        Ok((matrix_strain, fiber_strain))
    }

    /// Calculates the initial approximation of the serial strain of the matrix
    ///
    /// Uses the elastic stiffnesses and the strain increment w.r.t. the committed state:
    ///
    /// ```text
    /// εmˢ = (km Cfˢˢ + kf Cmˢˢ)⁻¹ (Cfˢˢ Δεˢ + kf (Cfˢᵖ - Cmˢᵖ) Δεᵖ) + εmˢ_prev
    /// ```
    fn initial_approximation(&self, strain: &Vector) -> Result<Vector> {
        let kf = self.fiber_fraction;
        let km = 1.0 - kf;
        let pp = &self.parallel_projector;
        let ss = &self.serial_projector;
        let mut delta = Vector::new(strain.dim());
        vec_minus(&mut delta, strain, &self.previous_strain())?;
        let delta_s = self.serial_part(&delta)?;
        let delta_p = self.parallel_part(&delta)?;
        let cm = self.matrix.elastic_stiffness()?;
        let cf = self.fiber.elastic_stiffness()?;
        let cm_ss = project(ss, &cm, ss)?;
        let cf_ss = project(ss, &cf, ss)?;
        let cm_sp = project(ss, &cm, pp)?;
        let cf_sp = project(ss, &cf, pp)?;
        let ns = self.n_serial();
        let mut aux = Matrix::new(ns, ns);
        mat_add(&mut aux, km, &cf_ss, kf, &cm_ss)?;
        let mut coupling = Matrix::new(ns, pp.ncol());
        mat_add(&mut coupling, kf, &cf_sp, -kf, &cm_sp)?;
        let mut rhs = Vector::new(ns);
        mat_vec_mul(&mut rhs, 1.0, &cf_ss, &delta_s)?;
        mat_vec_mul_update(&mut rhs, 1.0, &coupling, &delta_p, 1.0)?;
        let mut approximation = self.serial_strain_matrix();
        mat_vec_mul_update(&mut approximation, 1.0, &inverse(&aux)?, &rhs, 1.0)?;
        Ok(approximation)
    }

    /// Calculates the reference stress of the convergence criterion
    fn reference_stress(&self, strain: &Vector, serial_stress_matrix: &Vector, serial_stress_fiber: &Vector) -> Result<f64> {
        if self.n_serial() == 0 {
            return Ok(REFERENCE_FLOOR);
        }
        let mut reference = f64::min(
            vec_norm(serial_stress_matrix, Norm::Euc),
            vec_norm(serial_stress_fiber, Norm::Euc),
        );
        if reference <= 0.0 {
            let ss = &self.serial_projector;
            let serial = self.serial_part(strain)?;
            let cm_ss = project(ss, &self.matrix.elastic_stiffness()?, ss)?;
            let cf_ss = project(ss, &self.fiber.elastic_stiffness()?, ss)?;
            let mut trial_matrix = Vector::new(serial.dim());
            let mut trial_fiber = Vector::new(serial.dim());
            mat_vec_mul(&mut trial_matrix, 1.0, &cm_ss, &serial)?;
            mat_vec_mul(&mut trial_fiber, 1.0, &cf_ss, &serial)?;
            reference = f64::min(vec_norm(&trial_matrix, Norm::Euc), vec_norm(&trial_fiber, Norm::Euc));
        }
        if reference < f64::EPSILON {
            reference = REFERENCE_FLOOR;
        }
        Ok(reference)
    }

    /// Solves the serial stress equilibrium without committing anything
    pub fn solve(&self, params: &mut ConstitutiveLawParameters) -> Result<SerialParallelSolution> {
        params.prepare(self.voigt_size())?;
        let strain = &params.strain;
        let kf = self.fiber_fraction;
        let km = 1.0 - kf;
        let ss = &self.serial_projector;
        let ns = self.n_serial();

        let mut serial_strain_matrix = if ns > 0 {
            self.initial_approximation(strain)?
        } else {
            Vector::new(0)
        };
        let mut report = SerialParallelReport {
            iterations: 0,
            residual: 0.0,
            tolerance: 0.0,
            converged: false,
        };
        let (mut matrix_params, mut fiber_params);
        loop {
            let (matrix_strain, fiber_strain) = self.constituent_strains(strain, &serial_strain_matrix)?;
            matrix_params = params.derive(matrix_strain);
            fiber_params = params.derive(fiber_strain);
            matrix_params.options.compute_stress = true;
            fiber_params.options.compute_stress = true;
            matrix_params.options.compute_tangent = ns > 0;
            fiber_params.options.compute_tangent = ns > 0;
            self.matrix.calculate_material_response(&mut matrix_params)?;
            self.fiber.calculate_material_response(&mut fiber_params)?;

            let serial_stress_matrix = self.serial_part(&matrix_params.stress)?;
            let serial_stress_fiber = self.serial_part(&fiber_params.stress)?;
            let mut residual = Vector::new(ns);
            vec_minus(&mut residual, &serial_stress_matrix, &serial_stress_fiber)?;
            report.residual = if ns > 0 { vec_norm(&residual, Norm::Euc) } else { 0.0 };
            report.tolerance =
                self.tol_factor * self.reference_stress(strain, &serial_stress_matrix, &serial_stress_fiber)?;
            trace!(iteration = report.iterations, residual = report.residual, tolerance = report.tolerance);
            if report.residual < report.tolerance {
                report.converged = true;
                break;
            }
            if report.iterations >= self.n_max_it {
                break;
            }

            // Newton correction: J = Cmˢˢ + km/kf Cfˢˢ (current tangents)
            let cm_ss = project(ss, &matrix_params.tangent, ss)?;
            let cf_ss = project(ss, &fiber_params.tangent, ss)?;
            let mut jacobian = Matrix::new(ns, ns);
            mat_add(&mut jacobian, 1.0, &cm_ss, km / kf, &cf_ss)?;
            mat_vec_mul_update(&mut serial_strain_matrix, -1.0, &inverse(&jacobian)?, &residual, 1.0)?;
            report.iterations += 1;
        }

        if !report.converged {
            match self.policy {
                NonConvergencePolicy::Fail => {
                    return Err(Error::Convergence {
                        solver: SOLVER_NAME,
                        iterations: report.iterations,
                        residual: report.residual,
                    });
                }
                NonConvergencePolicy::Warn => warn!(
                    iterations = report.iterations,
                    residual = report.residual,
                    tolerance = report.tolerance,
                    "serial-parallel equilibrium did not converge; using the last iterate"
                ),
            }
        }

        let mut stress = Vector::new(strain.dim());
        vec_add(&mut stress, kf, &fiber_params.stress, km, &matrix_params.stress)?;
        Ok(SerialParallelSolution {
            serial_strain_matrix,
            matrix_strain: matrix_params.strain,
            fiber_strain: fiber_params.strain,
            matrix_stress: matrix_params.stress,
            fiber_stress: fiber_params.stress,
            stress,
            report,
        })
    }

    /// Calculates the response and returns the convergence data (non-committing)
    pub fn calculate_with_report(&self, params: &mut ConstitutiveLawParameters) -> Result<SerialParallelReport> {
        let solution = self.solve(params)?;
        self.write_outputs(params, &solution)?;
        Ok(solution.report)
    }

    /// Writes the stress and the (perturbation) tangent into the parameters
    fn write_outputs(&self, params: &mut ConstitutiveLawParameters, solution: &SerialParallelSolution) -> Result<()> {
        if params.options.compute_stress {
            params.stress = solution.stress.clone();
        }
        if params.options.compute_tangent {
            params.tangent = calc_tangent_by_perturbation(self, params, self.tangent_estimation, self.perturbation)?;
        }
        Ok(())
    }
}

impl ConstitutiveLaw for SerialParallelLaw {
    fn name(&self) -> &'static str {
        "serial-parallel rule of mixtures"
    }

    fn voigt_size(&self) -> usize {
        self.matrix.voigt_size()
    }

    fn n_internal_values(&self) -> usize {
        self.internal.size() + self.matrix.n_internal_values() + self.fiber.n_internal_values()
    }

    fn symmetric_tangent(&self) -> bool {
        false
    }

    fn check(&self, props: &Properties) -> Result<()> {
        match props.law()? {
            ParamLaw::SerialParallel { fiber_fraction, .. } => {
                if *fiber_fraction <= 0.0 || *fiber_fraction >= 1.0 {
                    return Err(Error::input("the fiber volumetric participation must be in (0, 1)"));
                }
                self.matrix.check(props.sub_properties(0)?)?;
                self.fiber.check(props.sub_properties(1)?)
            }
            _ => Err(Error::input(format!(
                "the properties {} do not describe a serial-parallel composite",
                props.id
            ))),
        }
    }

    fn initialize_material(&mut self) -> Result<()> {
        self.internal.reset();
        self.matrix.initialize_material()?;
        self.fiber.initialize_material()
    }

    fn calculate_material_response(&self, params: &mut ConstitutiveLawParameters) -> Result<()> {
        self.calculate_with_report(params).map(|_| ())
    }

    fn finalize_material_response(&mut self, params: &mut ConstitutiveLawParameters) -> Result<()> {
        let solution = self.solve(params)?;
        self.write_outputs(params, &solution)?;
        let mut matrix_params = params.derive(solution.matrix_strain.clone());
        let mut fiber_params = params.derive(solution.fiber_strain.clone());
        matrix_params.options.compute_tangent = false;
        fiber_params.options.compute_tangent = false;
        self.matrix.finalize_material_response(&mut matrix_params)?;
        self.fiber.finalize_material_response(&mut fiber_params)?;
        let ns = self.n_serial();
        let mut values = Vector::new(self.internal.size());
        for i in 0..ns {
            values[i] = solution.serial_strain_matrix[i];
        }
        for i in 0..params.strain.dim() {
            values[ns + i] = params.strain[i];
        }
        self.internal.commit(&values);
        self.report = solution.report;
        Ok(())
    }

    /// Calculates the homogenized elastic stiffness
    ///
    /// ```text
    /// C = kf Cf Af + km Cm Am
    /// ```
    ///
    /// where `Am` and `Af` map the total strain onto the strain of each constituent.
    fn elastic_stiffness(&self) -> Result<Matrix> {
        let kf = self.fiber_fraction;
        let km = 1.0 - kf;
        let n = self.voigt_size();
        let ns = self.n_serial();
        let pp = &self.parallel_projector;
        let ss = &self.serial_projector;
        let cm = self.matrix.elastic_stiffness()?;
        let cf = self.fiber.elastic_stiffness()?;

        // B maps ε onto εmˢ: B = (km Cfˢˢ + kf Cmˢˢ)⁻¹ (Cfˢˢ Sᵀ + kf (Cfˢᵖ - Cmˢᵖ) Pᵀ)
        let mut bb = Matrix::new(ns, n);
        if ns > 0 {
            let cm_ss = project(ss, &cm, ss)?;
            let cf_ss = project(ss, &cf, ss)?;
            let cm_sp = project(ss, &cm, pp)?;
            let cf_sp = project(ss, &cf, pp)?;
            let mut aux = Matrix::new(ns, ns);
            mat_add(&mut aux, km, &cf_ss, kf, &cm_ss)?;
            let mut coupling = Matrix::new(ns, pp.ncol());
            mat_add(&mut coupling, kf, &cf_sp, -kf, &cm_sp)?;
            let mut rhs = Matrix::new(ns, n);
            mat_mat_mul(&mut rhs, 1.0, &cf_ss, &ss.transposed(), 0.0)?;
            mat_mat_mul(&mut rhs, 1.0, &coupling, &pp.transposed(), 1.0)?;
            mat_mat_mul(&mut bb, 1.0, &inverse(&aux)?, &rhs, 0.0)?;
        }

        // strain concentration matrices
        // Am = P Pᵀ + S B
        // Af = P Pᵀ + (S Sᵀ - km S B) / kf
        let mut ppt = Matrix::new(n, n);
        let mut sst = Matrix::new(n, n);
        let mut s_bb = Matrix::new(n, n);
        mat_mat_mul(&mut ppt, 1.0, pp, &pp.transposed(), 0.0)?;
        mat_mat_mul(&mut sst, 1.0, ss, &ss.transposed(), 0.0)?;
        mat_mat_mul(&mut s_bb, 1.0, ss, &bb, 0.0)?;
        let mut am = Matrix::new(n, n);
        let mut af = Matrix::new(n, n);
        mat_add(&mut am, 1.0, &ppt, 1.0, &s_bb)?;
        mat_add(&mut af, 1.0 / kf, &sst, -km / kf, &s_bb)?;
        mat_update(&mut af, 1.0, &ppt)?;
        let mut cc = Matrix::new(n, n);
        mat_mat_mul(&mut cc, kf, &cf, &af, 0.0)?;
        mat_mat_mul(&mut cc, km, &cm, &am, 1.0)?;
        Ok(cc)
    }

    fn internal_variables(&self) -> &InternalVariables {
        &self.internal
    }

    fn rollback(&mut self) {
        self.internal.rollback();
        self.matrix.rollback();
        self.fiber.rollback();
    }

    /// Returns the volume average of the equivalent plastic strains
    fn plastic_strain(&self) -> f64 {
        let kf = self.fiber_fraction;
        kf * self.fiber.plastic_strain() + (1.0 - kf) * self.matrix.plastic_strain()
    }

    fn delta_plastic_strain(&self) -> f64 {
        let kf = self.fiber_fraction;
        kf * self.fiber.delta_plastic_strain() + (1.0 - kf) * self.matrix.delta_plastic_strain()
    }

    fn clone_box(&self) -> Box<dyn ConstitutiveLaw> {
        Box::new(self.clone())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
