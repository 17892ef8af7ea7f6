use super::{calc_i1, calc_i2, calc_i3, stress_norm};
use crate::{Error, Result};
use russell_lab::{vec_scale, Vector};
use std::f64::consts::PI;

/// Holds the tolerance to detect (numerically) isotropic tensors after normalization
const ISOTROPIC_TOL: f64 = 1e-14;

/// Holds the tolerance on the (normalized) discriminant of the characteristic cubic
const DISCRIMINANT_TOL: f64 = 1e-12;

/// Holds the norm below which the stress tensor is not normalized
const NORM_TOL: f64 = f64::EPSILON;

/// Calculates the principal stresses using the trigonometric solution of the characteristic cubic
///
/// The tensor is first normalized by its Frobenius norm (unless the norm is
/// negligible). Then, with the invariants of the normalized tensor:
///
/// ```text
/// R = (2 I1³ - 9 I2 I1 + 27 I3) / 54
/// Q = (3 I2 - I1²) / 9
/// φ = acos(R / √(-Q³))
/// σₖ = ‖σ‖ (I1/3 + 2 √(-Q) cos(φ/3 + k 2π/3))   k = 0, 1, 2
/// ```
///
/// If Q is negligible, the tensor is isotropic and the normal components are returned.
///
/// The 2D (3-component) version returns the two in-plane principal stresses
/// of the 2×2 tensor.
///
/// Returns the principal stresses sorted in descending order.
///
/// # Panics
///
/// A panic will occur if the vector does not have 3 or 6 components.
pub fn principal_stresses(stress: &Vector) -> Vector {
    let mut res = if stress.dim() == 3 {
        principal_stresses_plane(stress)
    } else {
        let norm = normalization_factor(stress);
        let mut normalized = stress.clone();
        vec_scale(&mut normalized, 1.0 / norm);
        let i1 = calc_i1(&normalized);
        let i2 = calc_i2(&normalized);
        let i3 = calc_i3(&normalized);
        let r = (2.0 * i1 * i1 * i1 - 9.0 * i2 * i1 + 27.0 * i3) / 54.0;
        let q = (3.0 * i2 - i1 * i1) / 9.0;
        if q > -ISOTROPIC_TOL {
            Vector::from(&[stress[0], stress[1], stress[2]])
        } else {
            let cos_phi = f64::max(-1.0, f64::min(1.0, r / f64::sqrt(-q * q * q)));
            let phi_3 = f64::acos(cos_phi) / 3.0;
            let aux1 = 2.0 * f64::sqrt(-q);
            let aux2 = i1 / 3.0;
            let mut sig = Vector::new(3);
            for k in 0..3 {
                sig[k] = norm * (aux2 + aux1 * f64::cos(phi_3 + 2.0 * PI * (k as f64) / 3.0));
            }
            sig
        }
    };
    sort_descending(&mut res);
    res
}

/// Calculates the principal stresses using Cardano's (discriminant) method
///
/// With a = I1, b = I2 and c = I3 of the normalized tensor, the characteristic
/// polynomial `λ³ - a λ² + b λ - c = 0` is reduced to `y³ + p y + q = 0` with
/// `λ = y + a/3`. A real symmetric tensor always renders three real roots;
/// thus a positive discriminant `q² + 4p³/27` indicates corrupted data.
///
/// Returns the principal stresses sorted in descending order.
///
/// # Errors
///
/// Returns [Error::Numerical] if the discriminant indicates complex roots.
///
/// # Panics
///
/// A panic will occur if the vector does not have 3 or 6 components.
pub fn principal_stresses_cardano(stress: &Vector) -> Result<Vector> {
    if stress.dim() == 3 {
        let mut res = principal_stresses_plane(stress);
        sort_descending(&mut res);
        return Ok(res);
    }
    let norm = normalization_factor(stress);
    let mut normalized = stress.clone();
    vec_scale(&mut normalized, 1.0 / norm);
    let a = calc_i1(&normalized);
    let b = calc_i2(&normalized);
    let c = calc_i3(&normalized);
    let mut res = Vector::new(3);
    if f64::abs(b - a * a / 3.0) <= ISOTROPIC_TOL {
        for i in 0..3 {
            res[i] = stress[i];
        }
    } else {
        let roots = cubic_roots_cardano(a, b, c)?;
        for k in 0..3 {
            res[k] = norm * roots[k];
        }
    }
    sort_descending(&mut res);
    Ok(res)
}

/// Calculates the three real roots of `λ³ - a λ² + b λ - c = 0` using Cardano's method
///
/// The cubic is reduced to `y³ + p y + q = 0` with `λ = y + a/3`, where
///
/// ```text
/// p = b - a²/3
/// q = -2a³/27 + a b/3 - c
/// Δ = q² + 4p³/27
/// ```
///
/// # Errors
///
/// Returns [Error::Numerical] if Δ > 0 (complex conjugated roots).
pub fn cubic_roots_cardano(a: f64, b: f64, c: f64) -> Result<[f64; 3]> {
    let p = b - a * a / 3.0;
    let q = -2.0 * a * a * a / 27.0 + a * b / 3.0 - c;
    let discriminant = q * q + 4.0 * p * p * p / 27.0;
    if discriminant > DISCRIMINANT_TOL {
        return Err(Error::numerical(format!(
            "the characteristic cubic has complex conjugated roots (discriminant = {:e})",
            discriminant
        )));
    }
    let mut roots = [a / 3.0; 3];
    if f64::abs(p) <= ISOTROPIC_TOL {
        return Ok(roots);
    }
    if discriminant < -DISCRIMINANT_TOL {
        let aux = 2.0 * f64::sqrt(-p / 3.0);
        let arg = f64::max(-1.0, f64::min(1.0, 3.0 * q / (2.0 * p) * f64::sqrt(-3.0 / p)));
        let phi_3 = f64::acos(arg) / 3.0;
        for k in 0..3 {
            roots[k] += aux * f64::cos(phi_3 - 2.0 * PI * (k as f64) / 3.0);
        }
    } else {
        // double root
        roots[0] += 3.0 * q / p;
        roots[1] -= 1.5 * q / p;
        roots[2] -= 1.5 * q / p;
    }
    Ok(roots)
}

/// Calculates the in-plane principal stresses of a 3-component stress vector
fn principal_stresses_plane(stress: &Vector) -> Vector {
    let center = 0.5 * (stress[0] + stress[1]);
    let half_diff = 0.5 * (stress[0] - stress[1]);
    let radius = f64::sqrt(half_diff * half_diff + stress[2] * stress[2]);
    Vector::from(&[center + radius, center - radius])
}

/// Returns the Frobenius norm or one if the norm is negligible
fn normalization_factor(stress: &Vector) -> f64 {
    let norm = stress_norm(stress);
    if norm < NORM_TOL {
        1.0
    } else {
        norm
    }
}

/// Sorts the components in descending order
fn sort_descending(v: &mut Vector) {
    v.as_mut_data().sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{cubic_roots_cardano, principal_stresses, principal_stresses_cardano};
    use crate::util::{calc_i1, calc_i2, calc_i3};
    use crate::Error;
    use russell_lab::{approx_eq, Vector};

    // stress states with distinct, double and triple eigenvalues
    fn samples() -> Vec<Vector> {
        vec![
            Vector::from(&[-50.0, -20.0, 10.0, 15.0, -5.0, 8.0]),
            Vector::from(&[100.0, 50.0, -30.0, 25.0, 10.0, -40.0]),
            Vector::from(&[1e-3, 2e-3, -4e-3, 1e-3, 0.0, 5e-4]),
            Vector::from(&[5.0, 2.0, 2.0, 0.0, 0.0, 0.0]),
            Vector::from(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0]),
        ]
    }

    fn check_characteristic_polynomial(stress: &Vector, sig: &Vector) {
        let i1 = calc_i1(stress);
        let i2 = calc_i2(stress);
        let i3 = calc_i3(stress);
        let scale = f64::max(1.0, i1.abs().max(i2.abs()).max(i3.abs()));
        for k in 0..3 {
            let s = sig[k];
            let res = s * s * s - i1 * s * s + i2 * s - i3;
            approx_eq(res / scale, 0.0, 1e-9);
        }
        // round-trip: the invariants of the principal tensor
        let principal = Vector::from(&[sig[0], sig[1], sig[2], 0.0, 0.0, 0.0]);
        approx_eq(calc_i1(&principal), i1, 1e-9 * f64::max(1.0, i1.abs()));
        approx_eq(calc_i2(&principal), i2, 1e-9 * f64::max(1.0, i2.abs()));
        approx_eq(calc_i3(&principal), i3, 1e-9 * f64::max(1.0, i3.abs()));
    }

    #[test]
    fn principal_stresses_satisfy_characteristic_polynomial() {
        for stress in samples() {
            let sig = principal_stresses(&stress);
            assert!(sig[0] >= sig[1] && sig[1] >= sig[2]);
            check_characteristic_polynomial(&stress, &sig);
        }
    }

    #[test]
    fn principal_stresses_cardano_match_trigonometric() {
        for stress in samples() {
            let sig = principal_stresses_cardano(&stress).unwrap();
            check_characteristic_polynomial(&stress, &sig);
            let correct = principal_stresses(&stress);
            for k in 0..3 {
                approx_eq(sig[k], correct[k], 1e-6 * f64::max(1.0, correct[k].abs()));
            }
        }
    }

    #[test]
    fn principal_stresses_known_values() {
        // pure shear: ±τ and zero
        let sig = principal_stresses(&Vector::from(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0]));
        approx_eq(sig[0], 1.0, 1e-14);
        approx_eq(sig[1], 0.0, 1e-14);
        approx_eq(sig[2], -1.0, 1e-14);

        // double root
        let sig = principal_stresses_cardano(&Vector::from(&[5.0, 2.0, 2.0, 0.0, 0.0, 0.0])).unwrap();
        approx_eq(sig[0], 5.0, 1e-12);
        approx_eq(sig[1], 2.0, 1e-12);
        approx_eq(sig[2], 2.0, 1e-12);
    }

    #[test]
    fn isotropic_and_zero_tensors_work() {
        let stress = Vector::from(&[-3.0, -3.0, -3.0, 0.0, 0.0, 0.0]);
        assert_eq!(principal_stresses(&stress).as_data(), &[-3.0, -3.0, -3.0]);
        assert_eq!(principal_stresses_cardano(&stress).unwrap().as_data(), &[-3.0, -3.0, -3.0]);
        let zero = Vector::new(6);
        assert_eq!(principal_stresses(&zero).as_data(), &[0.0, 0.0, 0.0]);
        assert_eq!(principal_stresses_cardano(&zero).unwrap().as_data(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn plane_principal_stresses_work() {
        let stress = Vector::from(&[3.0, 1.0, 2.0]);
        let sig = principal_stresses(&stress);
        assert_eq!(sig.dim(), 2);
        approx_eq(sig[0], 2.0 + f64::sqrt(5.0), 1e-14);
        approx_eq(sig[1], 2.0 - f64::sqrt(5.0), 1e-14);
        let sig = principal_stresses_cardano(&stress).unwrap();
        approx_eq(sig[0], 2.0 + f64::sqrt(5.0), 1e-14);
    }

    #[test]
    fn cardano_captures_complex_roots() {
        // λ³ + λ = 0 has the roots 0 and ±i
        assert!(matches!(cubic_roots_cardano(0.0, 1.0, 0.0), Err(Error::Numerical(_))));
        // (λ - 1)(λ - 2)(λ - 3) = λ³ - 6λ² + 11λ - 6
        let mut roots = cubic_roots_cardano(6.0, 11.0, 6.0).unwrap();
        roots.sort_by(|a, b| a.partial_cmp(b).unwrap());
        approx_eq(roots[0], 1.0, 1e-14);
        approx_eq(roots[1], 2.0, 1e-14);
        approx_eq(roots[2], 3.0, 1e-14);
    }
}
