use super::n_normal;
use russell_lab::Vector;

/// Holds the tolerance below which J2 is regarded as zero (hydrostatic state)
pub const J2_TOLERANCE: f64 = f64::EPSILON;

/// Holds √3
const SQRT_3: f64 = 1.7320508075688772;

/// Calculates the first invariant of the stress tensor
///
/// ```text
/// I1 = σxx + σyy + σzz
/// ```
///
/// The 2D (3-component) version sums the in-plane normal components only.
pub fn calc_i1(stress: &Vector) -> f64 {
    let nn = n_normal(stress.dim());
    let mut i1 = stress[0];
    for i in 1..nn {
        i1 += stress[i];
    }
    i1
}

/// Calculates the second invariant of the stress tensor
///
/// ```text
/// I2 = σxx σyy + σyy σzz + σxx σzz - σxy² - σyz² - σxz²
/// ```
///
/// The 2D (3-component) version is the determinant of the in-plane 2×2 tensor:
///
/// ```text
/// I2 = σxx σyy - σxy²
/// ```
///
/// **Note:** In 2D, `calc_i2` and [calc_i3] coincide.
///
/// # Panics
///
/// A panic will occur if the vector does not have 3 or 6 components.
pub fn calc_i2(stress: &Vector) -> f64 {
    let s = stress;
    match s.dim() {
        3 => s[0] * s[1] - s[2] * s[2],
        6 => (s[0] + s[2]) * s[1] + s[0] * s[2] - s[3] * s[3] - s[4] * s[4] - s[5] * s[5],
        _ => panic!("the Voigt size must be 3 or 6"),
    }
}

/// Calculates the third invariant of the stress tensor (determinant)
///
/// ```text
/// I3 = det(σ)
/// ```
///
/// The 2D (3-component) version uses the same reduced expression as [calc_i2].
///
/// # Panics
///
/// A panic will occur if the vector does not have 3 or 6 components.
pub fn calc_i3(stress: &Vector) -> f64 {
    let s = stress;
    match s.dim() {
        3 => s[0] * s[1] - s[2] * s[2],
        6 => {
            (s[1] * s[2] - s[4] * s[4]) * s[0] - s[1] * s[5] * s[5] - s[2] * s[3] * s[3]
                + 2.0 * s[3] * s[4] * s[5]
        }
        _ => panic!("the Voigt size must be 3 or 6"),
    }
}

/// Calculates the deviatoric stress and the second invariant of the deviatoric tensor
///
/// ```text
/// s = σ - (I1/3) I
/// J2 = ½ s:s
/// ```
///
/// In 2D, the out-of-plane normal stress is zero and thus the out-of-plane
/// deviatoric component (-I1/3) also contributes to J2.
///
/// Returns `(deviator, J2)`.
pub fn calc_j2(stress: &Vector, i1: f64) -> (Vector, f64) {
    let n = stress.dim();
    let nn = n_normal(n);
    let p_mean = i1 / 3.0;
    let mut dev = stress.clone();
    for i in 0..nn {
        dev[i] -= p_mean;
    }
    let mut j2 = 0.0;
    for i in 0..nn {
        j2 += 0.5 * dev[i] * dev[i];
    }
    for i in nn..n {
        j2 += dev[i] * dev[i];
    }
    if n == 3 {
        j2 += 0.5 * p_mean * p_mean;
    }
    (dev, j2)
}

/// Calculates the third invariant of the deviatoric tensor
///
/// ```text
/// J3 = det(s)
/// ```
///
/// The 2D (3-component) version uses the reduced in-plane expression `sxx syy - sxy²`.
///
/// # Panics
///
/// A panic will occur if the vector does not have 3 or 6 components.
pub fn calc_j3(deviator: &Vector) -> f64 {
    let d = deviator;
    match d.dim() {
        3 => d[0] * d[1] - d[2] * d[2],
        6 => {
            d[0] * (d[1] * d[2] - d[4] * d[4])
                + d[3] * (-d[3] * d[2] + d[5] * d[4])
                + d[5] * (d[3] * d[4] - d[5] * d[1])
        }
        _ => panic!("the Voigt size must be 3 or 6"),
    }
}

/// Calculates the Lode angle θ ∈ [-π/6, π/6]
///
/// ```text
/// θ = ⅓ asin(-3√3 J3 / (2 J2^(3/2)))
/// ```
///
/// Returns zero if J2 is below [J2_TOLERANCE] (hydrostatic state).
pub fn calc_lode_angle(j2: f64, j3: f64) -> f64 {
    if j2 > J2_TOLERANCE {
        let sin_3theta = (-3.0 * SQRT_3 * j3) / (2.0 * j2 * f64::sqrt(j2));
        f64::asin(f64::max(-1.0, f64::min(1.0, sin_3theta))) / 3.0
    } else {
        0.0
    }
}

/// Calculates the first direction vector (derivative of I1 w.r.t. stress)
///
/// ```text
/// 3D: [1, 1, 1, 0, 0, 0]
/// 2D: [1, 1, 0]
/// ```
pub fn first_vector(voigt_size: usize) -> Vector {
    let nn = n_normal(voigt_size);
    let mut res = Vector::new(voigt_size);
    for i in 0..nn {
        res[i] = 1.0;
    }
    res
}

/// Calculates the second direction vector (derivative of √J2 w.r.t. stress)
///
/// ```text
/// a₂ = s / (2 √J2)   with shear components doubled
/// ```
///
/// Returns the zero vector if 2√J2 is below [J2_TOLERANCE] (hydrostatic state).
pub fn second_vector(deviator: &Vector, j2: f64) -> Vector {
    let n = deviator.dim();
    let nn = n_normal(n);
    let mut res = Vector::new(n);
    let two_sqrt_j2 = 2.0 * f64::sqrt(j2);
    if two_sqrt_j2 > J2_TOLERANCE {
        for i in 0..n {
            res[i] = deviator[i] / two_sqrt_j2;
        }
        for i in nn..n {
            res[i] *= 2.0;
        }
    }
    res
}

/// Calculates the third direction vector (derivative of J3 w.r.t. stress)
///
/// ```text
/// a₃ = s·s - (2/3) J2 I   (cofactor form; shear components doubled)
/// ```
///
/// In 2D, the out-of-plane deviatoric component is `-(sxx + syy)`.
///
/// # Panics
///
/// A panic will occur if the vector does not have 3 or 6 components.
pub fn third_vector(deviator: &Vector, j2: f64) -> Vector {
    let d = deviator;
    let j2_thirds = j2 / 3.0;
    match d.dim() {
        3 => {
            let dzz = -(d[0] + d[1]);
            Vector::from(&[
                d[1] * dzz + j2_thirds,
                d[0] * dzz + j2_thirds,
                -2.0 * d[2] * dzz,
            ])
        }
        6 => Vector::from(&[
            d[1] * d[2] - d[4] * d[4] + j2_thirds,
            d[0] * d[2] - d[5] * d[5] + j2_thirds,
            d[0] * d[1] - d[3] * d[3] + j2_thirds,
            2.0 * (d[4] * d[5] - d[3] * d[2]),
            2.0 * (d[3] * d[5] - d[0] * d[4]),
            2.0 * (d[3] * d[4] - d[1] * d[5]),
        ]),
        _ => panic!("the Voigt size must be 3 or 6"),
    }
}

/// Holds the invariants of a stress state used by the yield surfaces
#[derive(Clone, Copy, Debug)]
pub struct StressInvariants {
    /// First invariant I1
    pub i1: f64,

    /// Second deviatoric invariant J2
    pub j2: f64,

    /// Third deviatoric invariant J3
    pub j3: f64,

    /// Mean stress p = I1/3 (tension positive)
    pub p: f64,

    /// von Mises equivalent stress q = √(3 J2)
    pub q: f64,

    /// Lode angle θ
    pub lode: f64,
}

impl StressInvariants {
    /// Calculates all invariants of a Voigt stress vector
    pub fn new(stress: &Vector) -> Self {
        let i1 = calc_i1(stress);
        let (dev, j2) = calc_j2(stress, i1);
        let j3 = calc_j3(&dev);
        StressInvariants {
            i1,
            j2,
            j3,
            p: i1 / 3.0,
            q: f64::sqrt(3.0 * j2),
            lode: calc_lode_angle(j2, j3),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use russell_lab::{approx_eq, Vector};
    use russell_tensor::{Mandel, Tensor2};

    // sample stress state with all components
    fn sample_stress() -> Vector {
        Vector::from(&[-50.0, -20.0, 10.0, 15.0, -5.0, 8.0])
    }

    fn sample_tensor2() -> Tensor2 {
        let s = sample_stress();
        Tensor2::from_matrix(
            &[[s[0], s[3], s[5]], [s[3], s[1], s[4]], [s[5], s[4], s[2]]],
            Mandel::Symmetric,
        )
        .unwrap()
    }

    #[test]
    fn invariants_3d_match_tensor_algebra() {
        let stress = sample_stress();
        let tt = sample_tensor2();
        let i1 = calc_i1(&stress);
        approx_eq(i1, -60.0, 1e-15);
        approx_eq(i1, tt.invariant_ii1(), 1e-12);
        approx_eq(calc_i2(&stress), tt.invariant_ii2(), 1e-10);
        approx_eq(calc_i3(&stress), tt.invariant_ii3(), 1e-8);
        let (dev, j2) = calc_j2(&stress, i1);
        approx_eq(j2, tt.invariant_jj2(), 1e-10);
        approx_eq(calc_j3(&dev), tt.invariant_jj3(), 1e-8);
        approx_eq(dev[0] + dev[1] + dev[2], 0.0, 1e-13);
        assert_eq!(dev[3], 15.0);
    }

    #[test]
    fn invariants_3d_hand_calculated() {
        // diagonal tensor: I2 = 1·2 + 2·3 + 1·3 = 11, I3 = 6
        let stress = Vector::from(&[1.0, 2.0, 3.0, 0.0, 0.0, 0.0]);
        approx_eq(calc_i2(&stress), 11.0, 1e-15);
        approx_eq(calc_i3(&stress), 6.0, 1e-15);
        // J2 = ½ (1 + 0 + 1) = 1
        let (dev, j2) = calc_j2(&stress, 6.0);
        approx_eq(j2, 1.0, 1e-15);
        // J3 = (-1)(0)(1) = 0
        approx_eq(calc_j3(&dev), 0.0, 1e-15);
        approx_eq(calc_lode_angle(j2, 0.0), 0.0, 1e-15);
    }

    #[test]
    fn invariants_2d_work() {
        let stress = Vector::from(&[3.0, 1.0, 2.0]);
        approx_eq(calc_i1(&stress), 4.0, 1e-15);
        approx_eq(calc_i2(&stress), -1.0, 1e-15);
        approx_eq(calc_i3(&stress), calc_i2(&stress), 1e-15);
        // plane stress (σzz = 0): p = 4/3, s = [5/3, -1/3, 2], szz = -4/3
        let (dev, j2) = calc_j2(&stress, 4.0);
        approx_eq(dev[0], 5.0 / 3.0, 1e-15);
        approx_eq(dev[1], -1.0 / 3.0, 1e-15);
        approx_eq(dev[2], 2.0, 1e-15);
        let correct = 0.5 * (25.0 / 9.0 + 1.0 / 9.0 + 16.0 / 9.0) + 4.0;
        approx_eq(j2, correct, 1e-14);
        approx_eq(calc_j3(&dev), -5.0 / 9.0 - 4.0, 1e-14);
    }

    #[test]
    fn lode_angle_works() {
        // uniaxial tension: θ = -π/6 (sin3θ = -1)
        let stress = Vector::from(&[1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let inv = StressInvariants::new(&stress);
        approx_eq(inv.lode, -std::f64::consts::PI / 6.0, 1e-7);
        approx_eq(inv.q, 1.0, 1e-15);
        approx_eq(inv.p, 1.0 / 3.0, 1e-15);

        // uniaxial compression
        let stress = Vector::from(&[-1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let inv = StressInvariants::new(&stress);
        approx_eq(inv.lode, std::f64::consts::PI / 6.0, 1e-7);

        // pure shear: θ = 0
        let stress = Vector::from(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        let inv = StressInvariants::new(&stress);
        approx_eq(inv.lode, 0.0, 1e-15);
    }

    #[test]
    fn hydrostatic_state_is_handled() {
        let stress = Vector::from(&[-7.0, -7.0, -7.0, 0.0, 0.0, 0.0]);
        let inv = StressInvariants::new(&stress);
        assert_eq!(inv.j2, 0.0);
        assert_eq!(inv.lode, 0.0);
        assert!(!inv.lode.is_nan());
        let (dev, j2) = calc_j2(&stress, inv.i1);
        let a2 = second_vector(&dev, j2);
        assert_eq!(a2.as_data(), &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(calc_lode_angle(0.0, 1.0), 0.0);
    }

    #[test]
    fn direction_vectors_work() {
        assert_eq!(first_vector(6).as_data(), &[1.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
        assert_eq!(first_vector(3).as_data(), &[1.0, 1.0, 0.0]);

        // a₂ = d√J2/dσ: check with finite differences
        let stress = sample_stress();
        let sqrt_j2 = |s: &Vector| {
            let i1 = calc_i1(s);
            f64::sqrt(calc_j2(s, i1).1)
        };
        let (dev, j2) = calc_j2(&stress, calc_i1(&stress));
        let a2 = second_vector(&dev, j2);
        let a3 = third_vector(&dev, j2);
        let h = 1e-6;
        for k in 0..6 {
            // the shear components of stress appear twice in the tensor
            let mut sp = stress.clone();
            let mut sm = stress.clone();
            sp[k] += h;
            sm[k] -= h;
            let num = (sqrt_j2(&sp) - sqrt_j2(&sm)) / (2.0 * h);
            approx_eq(a2[k], num, 1e-7);
            let j3p = calc_j3(&calc_j2(&sp, calc_i1(&sp)).0);
            let j3m = calc_j3(&calc_j2(&sm, calc_i1(&sm)).0);
            approx_eq(a3[k], (j3p - j3m) / (2.0 * h), 1e-4);
        }
    }
}
