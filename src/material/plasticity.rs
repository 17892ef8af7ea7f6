use super::{
    allocate_yield_surface, calc_tangent_by_perturbation, ConstitutiveLaw, ConstitutiveLawParameters, ElasticityLaw,
    InternalVariables, LinearElastic, YieldSurface,
};
use crate::base::{Config, Idealization, NonConvergencePolicy, ParamLaw, Properties, TangentEstimation};
use crate::util::{calc_i1, calc_j2, matrix_3d_to_plane, strain_plane_to_3d, vector_3d_to_plane};
use crate::{Error, Result};
use russell_lab::{mat_vec_mul, vec_inner, vec_update, Matrix, Vector};
use tracing::{debug, trace, warn};

/// Holds the index of the accumulated plastic strain κ in the internal values
const KAPPA: usize = 0;

/// Holds the index of the first plastic strain component in the internal values
const EPS_P: usize = 1;

/// Holds the number of internal values: [κ, εp_xx, εp_yy, εp_zz, εp_xy, εp_yz, εp_xz]
const N_INTERNAL_VALUES: usize = 7;

/// Holds the unit second-order tensor in Voigt notation
const I: [f64; 6] = [1.0, 1.0, 1.0, 0.0, 0.0, 0.0];

/// Defines the name of the local solver used in error messages
const SOLVER_NAME: &str = "return mapping";

/// Defines the states of the return-mapping algorithm
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReturnMappingState {
    /// Elastic predictor computed from the committed state
    Trial,

    /// Evaluation of the yield function at the trial stress
    CheckYield,

    /// The trial stress is admissible (terminal)
    AcceptElastic,

    /// Newton (or cutting-plane) iterations on the plastic multiplier
    Iterate,

    /// The yield condition is satisfied (terminal)
    Converged,

    /// The iteration cap was reached (terminal)
    Failed,
}

/// Holds the outcome of a return mapping
#[derive(Clone, Debug)]
pub struct ReturnMapping {
    /// Terminal state
    pub state: ReturnMappingState,

    /// Updated 3D stress vector
    pub stress: Vector,

    /// Updated internal values (not committed)
    pub internal_values: Vector,

    /// Plastic multiplier Δγ (equal to the increment of κ)
    pub delta_gamma: f64,

    /// Indicates that the stress was returned to the apex of the cone
    pub apex: bool,

    /// Indicates that the stress was returned by the cutting-plane algorithm (Lode angle dependent surfaces)
    pub cutting_plane: bool,

    /// Number of Newton iterations
    pub iterations: usize,

    /// Last yield function residual
    pub residual: f64,

    /// Trial von Mises stress (used by the tangent)
    q_trial: f64,

    /// Trial deviatoric stress (used by the tangent)
    s_trial: Vector,
}

/// Implements elastoplastic models with implicit (backward Euler) return mapping
///
/// The model is composed of an elasticity law and a yield surface, the latter holding
/// the hardening rule. For cone and cylinder surfaces, the return mapping is performed
/// in the (p, q) space:
///
/// ```text
/// Φ(Δγ) = q_trial - 3G Δγ + η (p_trial - K η̄ Δγ) - ξ σy(α_n + r Δγ) = 0
/// ```
///
/// where `r = dα/dΔγ` is one for rules driven by κ and η̄ for rules driven by the
/// plastic volumetric strain. Lode angle dependent surfaces (Mohr-Coulomb, Tresca)
/// are returned by the cutting-plane algorithm and their tangent is computed by
/// perturbation.
///
/// **Note:** This model works in 2D (plane-strain only) or 3D.
#[derive(Clone)]
pub struct PlasticityModel {
    /// Modelling type
    ideal: Idealization,

    /// Elasticity law
    elasticity: Box<dyn ElasticityLaw>,

    /// Yield surface (holding the hardening rule)
    yield_surface: Box<dyn YieldSurface>,

    /// Bulk modulus K
    kk: f64,

    /// Shear modulus G
    gg: f64,

    /// 3D elastic stiffness
    dd: Matrix,

    /// Tolerance on the yield function (relative)
    tol: f64,

    /// Maximum number of Newton iterations
    n_max_it: usize,

    /// What to do on non-convergence
    policy: NonConvergencePolicy,

    /// Allows an initial state outside the yield surface
    allow_initial_drift: bool,

    /// Tangent estimation method (cutting-plane returns)
    tangent_estimation: TangentEstimation,

    /// Strain perturbation (cutting-plane returns)
    perturbation: f64,

    /// Internal values [κ, εp]
    internal: InternalVariables,
}

impl PlasticityModel {
    /// Allocates a new instance
    pub fn new(
        ideal: &Idealization,
        config: &Config,
        elasticity: Box<dyn ElasticityLaw>,
        yield_surface: Box<dyn YieldSurface>,
    ) -> Result<Self> {
        if ideal.two_dim && ideal.plane_stress {
            return Err(Error::input("plasticity models do not work in plane-stress"));
        }
        let (kk, gg) = elasticity.bulk_shear();
        let dd = elasticity.stiffness_matrix(6);
        Ok(PlasticityModel {
            ideal: *ideal,
            elasticity,
            yield_surface,
            kk,
            gg,
            dd,
            tol: config.return_mapping_tol,
            n_max_it: config.return_mapping_n_max_it,
            policy: config.return_mapping_policy,
            allow_initial_drift: config.allow_initial_drift,
            tangent_estimation: config.tangent_estimation,
            perturbation: config.perturbation,
            internal: InternalVariables::new(N_INTERNAL_VALUES),
        })
    }

    /// Returns the yield surface
    pub fn yield_surface(&self) -> &dyn YieldSurface {
        self.yield_surface.as_ref()
    }

    /// Calculates the yield function at the given 3D stress and hardening variable
    pub fn yield_function(&self, stress: &Vector, alpha: f64) -> f64 {
        self.yield_surface.yield_value_at(stress, alpha)
    }

    /// Returns the hardening variable α given the internal values [κ, εp]
    ///
    /// α is the plastic volumetric strain if the hardening rule is volumetric; otherwise, α = κ.
    pub fn hardening_variable(&self, internal_values: &Vector) -> f64 {
        if self.yield_surface.hardening().volumetric() {
            internal_values[EPS_P] + internal_values[EPS_P + 1] + internal_values[EPS_P + 2]
        } else {
            internal_values[KAPPA]
        }
    }

    /// Returns r = dα/dΔγ along the flow of cone and cylinder surfaces
    fn hardening_rate(&self) -> f64 {
        if self.yield_surface.hardening().volumetric() {
            self.yield_surface.dg_dp()
        } else {
            1.0
        }
    }

    /// Performs the return mapping starting from the committed state
    ///
    /// The strain vector has the Voigt size of the model; plane-strain vectors are
    /// embedded into 3D with zero out-of-plane strain.
    pub fn return_mapping(&self, strain: &Vector) -> Result<ReturnMapping> {
        let strain = if self.ideal.two_dim {
            strain_plane_to_3d(strain)
        } else {
            strain.clone()
        };
        let committed = self.internal.current();
        let alpha_n = self.hardening_variable(committed);
        let rate = self.hardening_rate();
        let (kk, gg) = (self.kk, self.gg);
        let eta = self.yield_surface.df_dp();
        let eta_bar = self.yield_surface.dg_dp();

        let mut out = ReturnMapping {
            state: ReturnMappingState::Trial,
            stress: Vector::new(6),
            internal_values: committed.clone(),
            delta_gamma: 0.0,
            apex: false,
            cutting_plane: false,
            iterations: 0,
            residual: 0.0,
            q_trial: 0.0,
            s_trial: Vector::new(6),
        };
        let (mut p_trial, mut tol_abs) = (0.0, 0.0);

        loop {
            out.state = match out.state {
                ReturnMappingState::Trial => {
                    // σ_trial = D (ε - εp_n)
                    let mut eps_e = strain.clone();
                    for i in 0..6 {
                        eps_e[i] -= committed[EPS_P + i];
                    }
                    mat_vec_mul(&mut out.stress, 1.0, &self.dd, &eps_e)?;
                    let i1 = calc_i1(&out.stress);
                    let (dev, j2) = calc_j2(&out.stress, i1);
                    p_trial = i1 / 3.0;
                    out.q_trial = f64::sqrt(3.0 * j2);
                    out.s_trial = dev;
                    ReturnMappingState::CheckYield
                }

                ReturnMappingState::CheckYield => {
                    let f_trial = self.yield_surface.yield_value_at(&out.stress, alpha_n);
                    let scale = f64::max(
                        f64::abs(self.yield_surface.yield_stress(alpha_n)),
                        f64::max(out.q_trial, f64::abs(eta * p_trial)),
                    );
                    tol_abs = self.tol * f64::max(scale, f64::MIN_POSITIVE);
                    out.residual = f_trial;
                    if f_trial <= tol_abs {
                        ReturnMappingState::AcceptElastic
                    } else {
                        ReturnMappingState::Iterate
                    }
                }

                ReturnMappingState::AcceptElastic => return Ok(out),

                ReturnMappingState::Iterate => {
                    let phi = |dg: f64| {
                        out.q_trial - 3.0 * gg * dg + eta * (p_trial - kk * eta_bar * dg)
                            - self.yield_surface.yield_stress(alpha_n + rate * dg)
                    };
                    let converged = if self.yield_surface.lode_dependent() {
                        self.iterate_cutting_plane(&mut out, tol_abs)?
                    } else if eta > 0.0 && phi(out.q_trial / (3.0 * gg)) > 0.0 {
                        self.iterate_apex(&mut out, p_trial, alpha_n, tol_abs)?
                    } else {
                        self.iterate_smooth(&mut out, p_trial, alpha_n, tol_abs)?
                    };
                    if converged {
                        ReturnMappingState::Converged
                    } else {
                        ReturnMappingState::Failed
                    }
                }

                ReturnMappingState::Converged => {
                    self.update_state(&mut out, p_trial);
                    debug!(
                        iterations = out.iterations,
                        delta_gamma = out.delta_gamma,
                        apex = out.apex,
                        cutting_plane = out.cutting_plane,
                        "return mapping converged"
                    );
                    return Ok(out);
                }

                ReturnMappingState::Failed => match self.policy {
                    NonConvergencePolicy::Fail => {
                        return Err(Error::Convergence {
                            solver: SOLVER_NAME,
                            iterations: out.iterations,
                            residual: out.residual,
                        });
                    }
                    NonConvergencePolicy::Warn => {
                        warn!(
                            iterations = out.iterations,
                            residual = out.residual,
                            "return mapping did not converge; using the last iterate"
                        );
                        self.update_state(&mut out, p_trial);
                        return Ok(out);
                    }
                },
            };
        }
    }

    /// Runs the Newton iterations on the smooth part of the yield surface
    ///
    /// Returns whether the iterations converged or not.
    fn iterate_smooth(&self, out: &mut ReturnMapping, p_trial: f64, alpha_n: f64, tol_abs: f64) -> Result<bool> {
        let (kk, gg) = (self.kk, self.gg);
        let eta = self.yield_surface.df_dp();
        let eta_bar = self.yield_surface.dg_dp();
        let rate = self.hardening_rate();
        let mut dg = 0.0;
        while out.iterations < self.n_max_it {
            let jac = -3.0 * gg - kk * eta * eta_bar - rate * self.yield_surface.delta_yield_stress(alpha_n + rate * dg);
            if jac >= 0.0 || !jac.is_finite() {
                return Err(Error::numerical(format!(
                    "the return mapping Jacobian must be negative (dΦ/dΔγ = {:e})",
                    jac
                )));
            }
            dg -= out.residual / jac;
            out.iterations += 1;
            out.residual = out.q_trial - 3.0 * gg * dg + eta * (p_trial - kk * eta_bar * dg)
                - self.yield_surface.yield_stress(alpha_n + rate * dg);
            trace!(iteration = out.iterations, delta_gamma = dg, residual = out.residual);
            if f64::abs(out.residual) <= tol_abs {
                out.delta_gamma = dg;
                return Ok(true);
            }
        }
        out.delta_gamma = dg;
        Ok(false)
    }

    /// Runs the Newton iterations on the volumetric plastic strain of the apex return
    ///
    /// Returns whether the iterations converged or not.
    fn iterate_apex(&self, out: &mut ReturnMapping, p_trial: f64, alpha_n: f64, tol_abs: f64) -> Result<bool> {
        let kk = self.kk;
        let eta = self.yield_surface.df_dp();
        let eta_bar = self.yield_surface.dg_dp();
        let rate = self.hardening_rate();
        if eta_bar <= 0.0 {
            return Err(Error::numerical(
                "the stress cannot be returned to the apex without dilatancy",
            ));
        }
        out.apex = true;
        let mut deps_v = 0.0;
        out.residual = eta * p_trial - self.yield_surface.yield_stress(alpha_n);
        while out.iterations < self.n_max_it {
            let alpha = alpha_n + rate * deps_v / eta_bar;
            let jac = -eta * kk - rate * self.yield_surface.delta_yield_stress(alpha) / eta_bar;
            if jac >= 0.0 || !jac.is_finite() {
                return Err(Error::numerical(format!(
                    "the apex return Jacobian must be negative (dr/dΔεv = {:e})",
                    jac
                )));
            }
            deps_v -= out.residual / jac;
            out.iterations += 1;
            out.residual =
                eta * (p_trial - kk * deps_v) - self.yield_surface.yield_stress(alpha_n + rate * deps_v / eta_bar);
            trace!(iteration = out.iterations, delta_eps_v = deps_v, residual = out.residual);
            if f64::abs(out.residual) <= tol_abs {
                out.delta_gamma = deps_v / eta_bar;
                return Ok(true);
            }
        }
        out.delta_gamma = deps_v / eta_bar;
        Ok(false)
    }

    /// Runs the cutting-plane iterations of Lode angle dependent surfaces
    ///
    /// Starting from the trial state, each iteration linearizes the yield function
    /// about the current stress and moves along the elastic image of the flow direction:
    ///
    /// ```text
    /// δγ = f / (nf · D ng + r ξ σy'(α))
    /// σ  ← σ - δγ D ng
    /// εp ← εp + δγ ng
    /// κ  ← κ + δγ
    /// ```
    ///
    /// where `nf = ∂f/∂σ`, `ng = ∂g/∂σ` and `r` is one (κ rules) or `tr(ng)` (volumetric
    /// rules). The stress and the internal values are updated in place.
    ///
    /// Returns whether the iterations converged or not.
    fn iterate_cutting_plane(&self, out: &mut ReturnMapping, tol_abs: f64) -> Result<bool> {
        let surface = self.yield_surface.as_ref();
        let volumetric = surface.hardening().volumetric();
        out.cutting_plane = true;
        let mut dng = Vector::new(6);
        while out.iterations < self.n_max_it {
            let nf = surface.yield_gradient(&out.stress);
            let ng = surface.potential_gradient(&out.stress);
            mat_vec_mul(&mut dng, 1.0, &self.dd, &ng)?;
            let rate = if volumetric { ng[0] + ng[1] + ng[2] } else { 1.0 };
            let alpha = self.hardening_variable(&out.internal_values);
            let denominator = vec_inner(&nf, &dng) + rate * surface.delta_yield_stress(alpha);
            if denominator <= 0.0 || !denominator.is_finite() {
                return Err(Error::numerical(format!(
                    "the cutting-plane denominator must be positive (nf·D·ng + h = {:e})",
                    denominator
                )));
            }
            let dg = out.residual / denominator;
            vec_update(&mut out.stress, -dg, &dng)?;
            for i in 0..6 {
                out.internal_values[EPS_P + i] += dg * ng[i];
            }
            out.internal_values[KAPPA] += dg;
            out.delta_gamma += dg;
            out.iterations += 1;
            out.residual = surface.yield_value_at(&out.stress, self.hardening_variable(&out.internal_values));
            trace!(iteration = out.iterations, delta_gamma = out.delta_gamma, residual = out.residual);
            if f64::abs(out.residual) <= tol_abs {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Updates the stress and the internal values given the plastic multiplier
    ///
    /// Cutting-plane returns have already updated the state.
    fn update_state(&self, out: &mut ReturnMapping, p_trial: f64) {
        if out.cutting_plane {
            return;
        }
        let (kk, gg) = (self.kk, self.gg);
        let eta_bar = self.yield_surface.dg_dp();
        let dg = out.delta_gamma;
        out.internal_values[KAPPA] += dg;
        if out.apex {
            // s = 0 and p = p_trial - K Δεv with Δεv = η̄ Δγ
            let p = p_trial - kk * eta_bar * dg;
            for i in 0..6 {
                let s = out.s_trial[i];
                let deps_p = if i < 3 {
                    s / (2.0 * gg) + eta_bar * dg / 3.0
                } else {
                    s / gg
                };
                out.internal_values[EPS_P + i] += deps_p;
                out.stress[i] = p * I[i];
            }
            return;
        }
        // Δεp = Δγ (3/2 s_trial/q_trial + η̄/3 I), engineering shear components
        let q_trial = out.q_trial;
        let m = if q_trial > 0.0 { 1.0 - 3.0 * gg * dg / q_trial } else { 1.0 };
        let p = p_trial - kk * eta_bar * dg;
        for i in 0..6 {
            let s = out.s_trial[i];
            let flow = if q_trial > 0.0 { 1.5 * s / q_trial } else { 0.0 };
            let deps_p = if i < 3 {
                dg * (flow + eta_bar / 3.0)
            } else {
                2.0 * dg * flow
            };
            out.internal_values[EPS_P + i] += deps_p;
            out.stress[i] = m * s + p * I[i];
        }
    }

    /// Calculates the consistent (algorithmic) tangent in 3D
    ///
    /// ```text
    /// D = 2G (1 - 3GΔγ/q_tr) Idev + 6G² Δγ/q_tr n⊗n + K I⊗I
    ///   - (√6 G n + K η̄ I) ⊗ (√6 G n + K η I) / A
    ///
    /// A = 3G + K η η̄ + r ξ σy'(α)
    /// n = s_tr / ‖s_tr‖
    /// ```
    ///
    /// At the apex: `D = K (1 - η K / (η K + r ξ σy'/η̄)) I⊗I`.
    ///
    /// # Errors
    ///
    /// Returns [Error::Numerical] for cutting-plane returns, whose tangent is
    /// computed by perturbation of the response.
    pub fn consistent_tangent(&self, out: &ReturnMapping) -> Result<Matrix> {
        if out.state == ReturnMappingState::AcceptElastic {
            return Ok(self.dd.clone());
        }
        if out.cutting_plane {
            return Err(Error::numerical(
                "the tangent of Lode angle dependent surfaces must be computed by perturbation",
            ));
        }
        let (kk, gg) = (self.kk, self.gg);
        let eta = self.yield_surface.df_dp();
        let eta_bar = self.yield_surface.dg_dp();
        let alpha = self.hardening_variable(&out.internal_values);
        let hh = self.hardening_rate() * self.yield_surface.delta_yield_stress(alpha);
        let mut dd = Matrix::new(6, 6);
        if out.apex {
            let c = kk * (1.0 - eta * kk / (eta * kk + hh / eta_bar));
            for i in 0..3 {
                for j in 0..3 {
                    dd.set(i, j, c);
                }
            }
            return Ok(dd);
        }
        let q_trial = out.q_trial;
        let dg = out.delta_gamma;
        let norm_s = q_trial * f64::sqrt(2.0 / 3.0);
        let mut n = Vector::new(6);
        if norm_s > 0.0 {
            for i in 0..6 {
                n[i] = out.s_trial[i] / norm_s;
            }
        }
        let ratio = if q_trial > 0.0 { dg / q_trial } else { 0.0 };
        let a = 3.0 * gg + kk * eta * eta_bar + hh;
        let sq6g = f64::sqrt(6.0) * gg;
        for i in 0..6 {
            for j in 0..6 {
                let idev = if i < 3 && j < 3 {
                    (if i == j { 1.0 } else { 0.0 }) - 1.0 / 3.0
                } else if i == j {
                    0.5
                } else {
                    0.0
                };
                let flow = sq6g * n[i] + kk * eta_bar * I[i];
                let grad = sq6g * n[j] + kk * eta * I[j];
                let value = 2.0 * gg * (1.0 - 3.0 * gg * ratio) * idev
                    + 6.0 * gg * gg * ratio * n[i] * n[j]
                    + kk * I[i] * I[j]
                    - flow * grad / a;
                dd.set(i, j, value);
            }
        }
        Ok(dd)
    }

    /// Evaluates the law and writes the requested outputs into the parameters
    fn evaluate(&self, params: &mut ConstitutiveLawParameters) -> Result<ReturnMapping> {
        params.prepare(self.voigt_size())?;
        let out = self.return_mapping(&params.strain)?;
        if params.options.compute_stress {
            params.stress = if self.ideal.two_dim {
                vector_3d_to_plane(&out.stress)
            } else {
                out.stress.clone()
            };
        }
        if params.options.compute_tangent {
            params.tangent = if out.cutting_plane && out.state != ReturnMappingState::AcceptElastic {
                calc_tangent_by_perturbation(self, params, self.tangent_estimation, self.perturbation)?
            } else if self.ideal.two_dim {
                matrix_3d_to_plane(&self.consistent_tangent(&out)?)
            } else {
                self.consistent_tangent(&out)?
            };
        }
        Ok(out)
    }
}

impl ConstitutiveLaw for PlasticityModel {
    fn name(&self) -> &'static str {
        self.yield_surface.model_name()
    }

    fn voigt_size(&self) -> usize {
        self.ideal.voigt_size()
    }

    fn symmetric_tangent(&self) -> bool {
        self.yield_surface.associated()
    }

    fn check(&self, props: &Properties) -> Result<()> {
        match props.law()? {
            ParamLaw::Plasticity {
                yield_surface,
                hardening,
            } => {
                LinearElastic::from_properties(props, &self.ideal)?;
                allocate_yield_surface(*yield_surface, *hardening, props)?;
                Ok(())
            }
            _ => Err(Error::input(format!(
                "the properties {} do not describe a plasticity model",
                props.id
            ))),
        }
    }

    fn initialize_material(&mut self) -> Result<()> {
        self.internal.reset();
        let f = self.yield_function(&Vector::new(6), 0.0);
        if f > 0.0 && !self.allow_initial_drift {
            return Err(Error::input("the initial stress state is outside the yield surface"));
        }
        Ok(())
    }

    fn calculate_material_response(&self, params: &mut ConstitutiveLawParameters) -> Result<()> {
        self.evaluate(params).map(|_| ())
    }

    fn finalize_material_response(&mut self, params: &mut ConstitutiveLawParameters) -> Result<()> {
        let out = self.evaluate(params)?;
        self.internal.commit(&out.internal_values);
        Ok(())
    }

    fn elastic_stiffness(&self) -> Result<Matrix> {
        Ok(self.elasticity.stiffness_matrix(self.voigt_size()))
    }

    fn internal_variables(&self) -> &InternalVariables {
        &self.internal
    }

    fn rollback(&mut self) {
        self.internal.rollback();
    }

    fn plastic_strain(&self) -> f64 {
        self.internal.current()[KAPPA]
    }

    fn delta_plastic_strain(&self) -> f64 {
        self.internal.delta(KAPPA)
    }

    fn clone_box(&self) -> Box<dyn ConstitutiveLaw> {
        Box::new(self.clone())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
