use crate::StrError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Defines what a local solver does when it reaches its iteration cap
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NonConvergencePolicy {
    /// Returns a convergence error (the caller must treat the step as failed)
    Fail,

    /// Logs a warning and returns the last iterate
    Warn,
}

/// Defines how the tangent operator of a law without analytical tangent is estimated
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TangentEstimation {
    /// Forward differences
    FirstOrderPerturbation,

    /// Central differences
    SecondOrderPerturbation,
}

/// Holds configuration data for the local (integration point) solvers
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Tolerance on the yield function, relative to the current yield stress
    pub return_mapping_tol: f64,

    /// Maximum number of Newton iterations of the return mapping
    pub return_mapping_n_max_it: usize,

    /// What the return mapping does when it does not converge
    pub return_mapping_policy: NonConvergencePolicy,

    /// Factor multiplying the reference serial stress to obtain the equilibrium tolerance
    pub serial_parallel_tol_factor: f64,

    /// Maximum number of iterations of the serial-parallel equilibrium
    pub serial_parallel_n_max_it: usize,

    /// What the serial-parallel solver does when it does not converge
    pub serial_parallel_policy: NonConvergencePolicy,

    /// Estimation of the tangent operator of composite laws
    pub tangent_estimation: TangentEstimation,

    /// Relative size of the strain perturbation used to estimate tangents
    pub perturbation: f64,

    /// Allows an initial stress state outside the yield surface (e.g., for debugging)
    pub allow_initial_drift: bool,
}

impl Config {
    /// Allocates a new instance with default values
    pub fn new() -> Self {
        Config {
            return_mapping_tol: 1e-10,
            return_mapping_n_max_it: 50,
            return_mapping_policy: NonConvergencePolicy::Fail,
            serial_parallel_tol_factor: 1e-4,
            serial_parallel_n_max_it: 100,
            serial_parallel_policy: NonConvergencePolicy::Warn,
            tangent_estimation: TangentEstimation::SecondOrderPerturbation,
            perturbation: 1e-7,
            allow_initial_drift: false,
        }
    }

    /// Sets the tolerance of the return mapping
    pub fn set_return_mapping_tol(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value <= 0.0 {
            return Err("return_mapping_tol must be > 0.0");
        }
        self.return_mapping_tol = value;
        Ok(self)
    }

    /// Sets the maximum number of iterations of the return mapping
    pub fn set_return_mapping_n_max_it(&mut self, value: usize) -> Result<&mut Self, StrError> {
        if value < 1 {
            return Err("return_mapping_n_max_it must be ≥ 1");
        }
        self.return_mapping_n_max_it = value;
        Ok(self)
    }

    /// Sets the non-convergence policy of the return mapping
    pub fn set_return_mapping_policy(&mut self, policy: NonConvergencePolicy) -> &mut Self {
        self.return_mapping_policy = policy;
        self
    }

    /// Sets the tolerance factor of the serial-parallel equilibrium
    pub fn set_serial_parallel_tol_factor(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value <= 0.0 || value >= 1.0 {
            return Err("serial_parallel_tol_factor must be in (0.0, 1.0)");
        }
        self.serial_parallel_tol_factor = value;
        Ok(self)
    }

    /// Sets the maximum number of iterations of the serial-parallel equilibrium
    pub fn set_serial_parallel_n_max_it(&mut self, value: usize) -> Result<&mut Self, StrError> {
        if value < 1 {
            return Err("serial_parallel_n_max_it must be ≥ 1");
        }
        self.serial_parallel_n_max_it = value;
        Ok(self)
    }

    /// Sets the non-convergence policy of the serial-parallel equilibrium
    pub fn set_serial_parallel_policy(&mut self, policy: NonConvergencePolicy) -> &mut Self {
        self.serial_parallel_policy = policy;
        self
    }

    /// Sets the estimation method of the tangent operator for composite laws
    pub fn set_tangent_estimation(&mut self, method: TangentEstimation) -> &mut Self {
        self.tangent_estimation = method;
        self
    }

    /// Sets the relative size of the strain perturbation
    pub fn set_perturbation(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value <= 0.0 || value > 1e-2 {
            return Err("perturbation must be in (0.0, 1e-2]");
        }
        self.perturbation = value;
        Ok(self)
    }

    /// Allows an initial stress state outside the yield surface
    pub fn set_allow_initial_drift(&mut self, flag: bool) -> &mut Self {
        self.allow_initial_drift = flag;
        self
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Local solvers\n").unwrap();
        write!(f, "=============\n").unwrap();
        write!(f, "return_mapping_tol = {:?}\n", self.return_mapping_tol).unwrap();
        write!(f, "return_mapping_n_max_it = {:?}\n", self.return_mapping_n_max_it).unwrap();
        write!(f, "return_mapping_policy = {:?}\n", self.return_mapping_policy).unwrap();
        write!(f, "serial_parallel_tol_factor = {:?}\n", self.serial_parallel_tol_factor).unwrap();
        write!(f, "serial_parallel_n_max_it = {:?}\n", self.serial_parallel_n_max_it).unwrap();
        write!(f, "serial_parallel_policy = {:?}\n", self.serial_parallel_policy).unwrap();
        write!(f, "tangent_estimation = {:?}\n", self.tangent_estimation).unwrap();
        write!(f, "perturbation = {:?}\n", self.perturbation).unwrap();
        write!(f, "allow_initial_drift = {:?}\n", self.allow_initial_drift).unwrap();
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{Config, NonConvergencePolicy, TangentEstimation};

    #[test]
    fn new_works() {
        let config = Config::new();
        assert_eq!(config.return_mapping_n_max_it, 50);
        assert_eq!(config.return_mapping_policy, NonConvergencePolicy::Fail);
        assert_eq!(config.serial_parallel_n_max_it, 100);
        assert_eq!(config.serial_parallel_policy, NonConvergencePolicy::Warn);
        assert_eq!(config.serial_parallel_tol_factor, 1e-4);
        assert_eq!(config.tangent_estimation, TangentEstimation::SecondOrderPerturbation);
        assert!(!config.allow_initial_drift);
    }

    #[test]
    fn setters_capture_errors() {
        let mut config = Config::new();
        assert_eq!(
            config.set_return_mapping_tol(0.0).err(),
            Some("return_mapping_tol must be > 0.0")
        );
        assert_eq!(
            config.set_return_mapping_n_max_it(0).err(),
            Some("return_mapping_n_max_it must be ≥ 1")
        );
        assert_eq!(
            config.set_serial_parallel_tol_factor(1.0).err(),
            Some("serial_parallel_tol_factor must be in (0.0, 1.0)")
        );
        assert_eq!(
            config.set_serial_parallel_n_max_it(0).err(),
            Some("serial_parallel_n_max_it must be ≥ 1")
        );
        assert_eq!(config.set_perturbation(0.1).err(), Some("perturbation must be in (0.0, 1e-2]"));
    }

    #[test]
    fn setters_work() {
        let mut config = Config::new();
        config
            .set_return_mapping_tol(1e-8)
            .unwrap()
            .set_return_mapping_n_max_it(10)
            .unwrap()
            .set_serial_parallel_n_max_it(3)
            .unwrap()
            .set_serial_parallel_policy(NonConvergencePolicy::Fail)
            .set_tangent_estimation(TangentEstimation::FirstOrderPerturbation)
            .set_allow_initial_drift(true);
        assert_eq!(config.return_mapping_tol, 1e-8);
        assert_eq!(config.return_mapping_n_max_it, 10);
        assert_eq!(config.serial_parallel_n_max_it, 3);
        assert_eq!(config.serial_parallel_policy, NonConvergencePolicy::Fail);
        assert_eq!(config.tangent_estimation, TangentEstimation::FirstOrderPerturbation);
        assert!(config.allow_initial_drift);
    }

    #[test]
    fn display_works() {
        let config = Config::new();
        let text = format!("{}", config);
        assert!(text.contains("return_mapping_n_max_it = 50"));
        assert!(text.contains("serial_parallel_policy = Warn"));
    }
}
