use crate::{Error, Result};
use russell_lab::{mat_inverse, mat_mat_mul, mat_t_mat_mul, Matrix};

/// Defines the smallest acceptable absolute determinant when inverting local Jacobians
pub const SINGULAR_TOL: f64 = 1e-30;

/// Calculates the inverse and the determinant of a square matrix
///
/// # Errors
///
/// Returns [Error::Numerical] if the matrix is not square or is singular.
pub fn inverse_and_determinant(a: &Matrix) -> Result<(Matrix, f64)> {
    let (m, n) = a.dims();
    if m != n {
        return Err(Error::numerical("only square matrices can be inverted"));
    }
    let mut ai = Matrix::new(m, m);
    let det = mat_inverse(&mut ai, a)
        .map_err(|_| Error::numerical("the matrix is singular (det = 0e0)"))?;
    if f64::abs(det) < SINGULAR_TOL || !det.is_finite() {
        return Err(Error::numerical(format!("the matrix is singular (det = {:e})", det)));
    }
    Ok((ai, det))
}

/// Calculates the inverse of a square matrix
///
/// # Errors
///
/// Returns [Error::Numerical] if the matrix is singular.
pub fn inverse(a: &Matrix) -> Result<Matrix> {
    let (ai, _) = inverse_and_determinant(a)?;
    Ok(ai)
}

/// Calculates the projection of a matrix onto two bases
///
/// ```text
/// r = pᵀ ⋅ a ⋅ q
/// ```
///
/// # Errors
///
/// Returns [Error::Numerical] if the dimensions are incompatible.
pub fn project(p: &Matrix, a: &Matrix, q: &Matrix) -> Result<Matrix> {
    let mut aq = Matrix::new(a.nrow(), q.ncol());
    mat_mat_mul(&mut aq, 1.0, a, q, 0.0)?;
    let mut r = Matrix::new(p.ncol(), q.ncol());
    mat_t_mat_mul(&mut r, 1.0, p, &aq, 0.0)?;
    Ok(r)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use russell_lab::{approx_eq, Matrix};

    #[test]
    fn inverse_works() {
        let a = Matrix::from(&[[2.0, 1.0], [1.0, 3.0]]);
        let ai = inverse(&a).unwrap();
        approx_eq(ai.get(0, 0), 0.6, 1e-15);
        approx_eq(ai.get(0, 1), -0.2, 1e-15);
        approx_eq(ai.get(1, 0), -0.2, 1e-15);
        approx_eq(ai.get(1, 1), 0.4, 1e-15);
    }

    #[test]
    fn inverse_captures_singular_matrices() {
        let a = Matrix::from(&[[1.0, 2.0], [2.0, 4.0]]);
        assert!(matches!(inverse(&a), Err(Error::Numerical(_))));
        let a = Matrix::new(2, 3);
        assert_eq!(
            inverse(&a).err(),
            Some(Error::numerical("only square matrices can be inverted"))
        );
        let a = Matrix::from(&[[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 0.0, 1.0]]);
        assert!(matches!(inverse_and_determinant(&a), Err(Error::Numerical(_))));
    }

    #[test]
    fn inverse_and_determinant_works() {
        let a = Matrix::from(&[[2.0, 0.0, 0.0], [0.0, 1.0, 0.5], [0.0, 0.0, 4.0]]);
        let (ai, det) = inverse_and_determinant(&a).unwrap();
        approx_eq(det, 8.0, 1e-15);
        approx_eq(ai.get(0, 0), 0.5, 1e-15);
        approx_eq(ai.get(1, 1), 1.0, 1e-15);
        approx_eq(ai.get(1, 2), -0.125, 1e-15);
        approx_eq(ai.get(2, 2), 0.25, 1e-15);
        approx_eq(ai.get(2, 1), 0.0, 1e-15);
    }

    #[test]
    fn project_works() {
        // selects the second and third components of a 3×3 matrix
        let b = Matrix::from(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        let s = Matrix::from(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        let r = project(&s, &b, &s).unwrap();
        assert_eq!(r.dims(), (2, 2));
        assert_eq!(r.get(0, 0), 5.0);
        assert_eq!(r.get(0, 1), 6.0);
        assert_eq!(r.get(1, 0), 8.0);
        assert_eq!(r.get(1, 1), 9.0);

        // mixed bases
        let p = Matrix::from(&[[1.0], [0.0], [0.0]]);
        let r = project(&s, &b, &p).unwrap();
        assert_eq!(r.dims(), (2, 1));
        assert_eq!(r.get(0, 0), 4.0);
        assert_eq!(r.get(1, 0), 7.0);

        let wrong = Matrix::new(2, 2);
        assert!(matches!(project(&s, &wrong, &s), Err(Error::Numerical(_))));
    }
}
