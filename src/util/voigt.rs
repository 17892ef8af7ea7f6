use crate::{Error, Result};
use russell_lab::{Matrix, Vector};

/// Maps the 2D (plane) Voigt components into the 3D Voigt components
///
/// ```text
/// 2D: [xx, yy, xy]
/// 3D: [xx, yy, zz, xy, yz, xz]
/// ```
pub const PLANE_TO_3D: [usize; 3] = [0, 1, 3];

/// Returns the number of normal (direct) components given the Voigt size
///
/// # Panics
///
/// A panic will occur if `voigt_size` is not 3 or 6.
pub fn n_normal(voigt_size: usize) -> usize {
    match voigt_size {
        3 => 2,
        6 => 3,
        _ => panic!("the Voigt size must be 3 or 6"),
    }
}

/// Checks whether a vector has the expected number of Voigt components or not
pub fn check_voigt_size(vector: &Vector, voigt_size: usize, name: &str) -> Result<()> {
    if vector.dim() != voigt_size {
        return Err(Error::input(format!(
            "the {} vector must have {} components (found {})",
            name,
            voigt_size,
            vector.dim()
        )));
    }
    Ok(())
}

/// Converts a 3×3 strain tensor into a Voigt vector (engineering shear components)
///
/// # Panics
///
/// A panic will occur if `voigt_size` is not 3 or 6.
pub fn strain_from_tensor(eps: &Matrix, voigt_size: usize) -> Vector {
    let e = |i, j| eps.get(i, j);
    match voigt_size {
        3 => Vector::from(&[e(0, 0), e(1, 1), e(0, 1) + e(1, 0)]),
        6 => Vector::from(&[
            e(0, 0),
            e(1, 1),
            e(2, 2),
            e(0, 1) + e(1, 0),
            e(1, 2) + e(2, 1),
            e(0, 2) + e(2, 0),
        ]),
        _ => panic!("the Voigt size must be 3 or 6"),
    }
}

/// Calculates the Frobenius norm of the tensor represented by a Voigt stress vector
///
/// ```text
/// ‖σ‖ = sqrt(σ:σ) = sqrt(Σ σᵢᵢ² + 2 Σ σᵢⱼ²)
/// ```
pub fn stress_norm(stress: &Vector) -> f64 {
    let nn = n_normal(stress.dim());
    let mut sum = 0.0;
    for i in 0..stress.dim() {
        if i < nn {
            sum += stress[i] * stress[i];
        } else {
            sum += 2.0 * stress[i] * stress[i];
        }
    }
    f64::sqrt(sum)
}

/// Embeds a plane (3-component) strain vector into a 3D (6-component) vector with zero out-of-plane components
pub fn strain_plane_to_3d(strain: &Vector) -> Vector {
    let mut res = Vector::new(6);
    for i in 0..3 {
        res[PLANE_TO_3D[i]] = strain[i];
    }
    res
}

/// Extracts the in-plane components of a 3D (6-component) vector
pub fn vector_3d_to_plane(vector: &Vector) -> Vector {
    let mut res = Vector::new(3);
    for i in 0..3 {
        res[i] = vector[PLANE_TO_3D[i]];
    }
    res
}

/// Extracts the in-plane rows and columns of a 3D (6×6) matrix
pub fn matrix_3d_to_plane(matrix: &Matrix) -> Matrix {
    let mut res = Matrix::new(3, 3);
    for i in 0..3 {
        for j in 0..3 {
            res.set(i, j, matrix.get(PLANE_TO_3D[i], PLANE_TO_3D[j]));
        }
    }
    res
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use russell_lab::{approx_eq, Matrix, Vector};

    #[test]
    #[should_panic(expected = "the Voigt size must be 3 or 6")]
    fn n_normal_panics_on_wrong_size() {
        n_normal(4);
    }

    #[test]
    fn check_voigt_size_works() {
        let v = Vector::new(4);
        assert_eq!(
            check_voigt_size(&v, 6, "strain").err(),
            Some(Error::input("the strain vector must have 6 components (found 4)"))
        );
        assert!(check_voigt_size(&v, 4, "strain").is_ok());
    }

    #[test]
    fn strain_from_tensor_works() {
        let eps = Matrix::from(&[[1.0, 0.5, 0.25], [0.5, 2.0, 0.75], [0.25, 0.75, 3.0]]);
        let v = strain_from_tensor(&eps, 6);
        assert_eq!(v.as_data(), &[1.0, 2.0, 3.0, 1.0, 1.5, 0.5]);
        let v = strain_from_tensor(&eps, 3);
        assert_eq!(v.as_data(), &[1.0, 2.0, 1.0]);
    }

    #[test]
    fn stress_norm_works() {
        let s = Vector::from(&[1.0, 2.0, 3.0, 1.0, 1.0, 1.0]);
        approx_eq(stress_norm(&s), f64::sqrt(14.0 + 6.0), 1e-15);
        let s = Vector::from(&[3.0, 4.0, 0.0]);
        approx_eq(stress_norm(&s), 5.0, 1e-15);
    }

    #[test]
    fn plane_maps_work() {
        let eps = Vector::from(&[1.0, 2.0, 3.0]);
        let eps_3d = strain_plane_to_3d(&eps);
        assert_eq!(eps_3d.as_data(), &[1.0, 2.0, 0.0, 3.0, 0.0, 0.0]);
        let back = vector_3d_to_plane(&eps_3d);
        assert_eq!(back.as_data(), &[1.0, 2.0, 3.0]);

        let mut dd = Matrix::new(6, 6);
        for i in 0..6 {
            for j in 0..6 {
                dd.set(i, j, (10 * i + j) as f64);
            }
        }
        let d2 = matrix_3d_to_plane(&dd);
        assert_eq!(d2.get(0, 0), 0.0);
        assert_eq!(d2.get(0, 2), 3.0);
        assert_eq!(d2.get(2, 1), 31.0);
        assert_eq!(d2.get(2, 2), 33.0);
    }
}
