use crate::StrError;
use thiserror::Error;

/// Defines the result type of constitutive-law operations
pub type Result<T> = std::result::Result<T, Error>;

/// Holds the errors raised while evaluating a material response
///
/// All errors are local to a single integration-point evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Invalid or inconsistent input (properties, sizes, deformation gradient)
    #[error("input error: {0}")]
    Input(String),

    /// Internal numerical inconsistency (e.g., complex roots, singular matrix)
    #[error("numerical error: {0}")]
    Numerical(String),

    /// A local iterative solver exceeded its iteration cap
    #[error("{solver} did not converge after {iterations} iterations (residual = {residual:e})")]
    Convergence {
        /// Name of the local solver
        solver: &'static str,

        /// Number of performed iterations
        iterations: usize,

        /// Last residual norm
        residual: f64,
    },
}

impl Error {
    /// Returns a new input error
    pub fn input(message: impl Into<String>) -> Self {
        Error::Input(message.into())
    }

    /// Returns a new numerical error
    pub fn numerical(message: impl Into<String>) -> Self {
        Error::Numerical(message.into())
    }
}

impl From<StrError> for Error {
    fn from(message: StrError) -> Self {
        Error::Numerical(message.to_string())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn display_works() {
        assert_eq!(
            format!("{}", Error::input("no parallel direction")),
            "input error: no parallel direction"
        );
        assert_eq!(
            format!("{}", Error::numerical("complex roots")),
            "numerical error: complex roots"
        );
        let err = Error::Convergence {
            solver: "return mapping",
            iterations: 50,
            residual: 0.5,
        };
        assert_eq!(
            format!("{}", err),
            "return mapping did not converge after 50 iterations (residual = 5e-1)"
        );
    }

    #[test]
    fn from_str_error_works() {
        let err: Error = "cannot compute inverse due to singularity".into();
        assert_eq!(err, Error::numerical("cannot compute inverse due to singularity"));
    }
}
