use super::{ConstitutiveLaw, ConstitutiveLawParameters};
use crate::base::TangentEstimation;
use crate::Result;
use russell_lab::{Matrix, Vector};

/// Estimates the tangent operator dσ/dε by perturbing the strain components
///
/// The perturbation size is `δ = perturbation · max(‖ε‖∞, 1)` and the columns are
/// computed by forward (first order) or central (second order) differences:
///
/// ```text
/// first order:  D[:,j] = (σ(ε + δ eⱼ) - σ(ε)) / δ
/// second order: D[:,j] = (σ(ε + δ eⱼ) - σ(ε - δ eⱼ)) / (2 δ)
/// ```
///
/// Only trial evaluations are performed; the law is not modified.
///
/// **Note:** The strain in `params` must be already available (see [ConstitutiveLawParameters::prepare]).
pub fn calc_tangent_by_perturbation(
    law: &dyn ConstitutiveLaw,
    params: &ConstitutiveLawParameters,
    method: TangentEstimation,
    perturbation: f64,
) -> Result<Matrix> {
    let n = law.voigt_size();
    let strain = &params.strain;
    let mut max_abs = 1.0;
    for i in 0..n {
        max_abs = f64::max(max_abs, f64::abs(strain[i]));
    }
    let delta = perturbation * max_abs;

    let stress_at = |shift: Option<(usize, f64)>| -> Result<Vector> {
        let mut shifted = strain.clone();
        if let Some((j, value)) = shift {
            shifted[j] += value;
        }
        let mut local = params.derive(shifted);
        local.options.compute_stress = true;
        local.options.compute_tangent = false;
        law.calculate_material_response(&mut local)?;
        Ok(local.stress)
    };

    let mut tangent = Matrix::new(n, n);
    match method {
        TangentEstimation::FirstOrderPerturbation => {
            let stress = stress_at(None)?;
            for j in 0..n {
                let stress_plus = stress_at(Some((j, delta)))?;
                for i in 0..n {
                    tangent.set(i, j, (stress_plus[i] - stress[i]) / delta);
                }
            }
        }
        TangentEstimation::SecondOrderPerturbation => {
            for j in 0..n {
                let stress_plus = stress_at(Some((j, delta)))?;
                let stress_minus = stress_at(Some((j, -delta)))?;
                for i in 0..n {
                    tangent.set(i, j, (stress_plus[i] - stress_minus[i]) / (2.0 * delta));
                }
            }
        }
    }
    Ok(tangent)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::calc_tangent_by_perturbation;
    use crate::base::{Config, Idealization, SampleProperties, TangentEstimation};
    use crate::material::{allocate_law, ConstitutiveLaw, ConstitutiveLawParameters, LinearElastic};
    use russell_lab::approx_eq;

    #[test]
    fn linear_elastic_tangent_is_recovered() {
        let ideal = Idealization::new(2);
        let law = LinearElastic::new(&ideal, 1000.0, 0.25).unwrap();
        let dd = law.elastic_stiffness().unwrap();
        let params = ConstitutiveLawParameters::with_strain(&[0.001, -0.002, 0.0005]);
        for method in [
            TangentEstimation::FirstOrderPerturbation,
            TangentEstimation::SecondOrderPerturbation,
        ] {
            let tangent = calc_tangent_by_perturbation(&law, &params, method, 1e-6).unwrap();
            for i in 0..3 {
                for j in 0..3 {
                    approx_eq(tangent.get(i, j), dd.get(i, j), 1e-6);
                }
            }
        }
    }

    #[test]
    fn plastic_tangent_is_recovered() {
        let ideal = Idealization::new(3);
        let mut config = Config::new();
        config.set_return_mapping_tol(1e-14).unwrap();
        let props = SampleProperties::von_mises(1000.0, 0.25, 1.0, 100.0);
        let law = allocate_law(&props, &ideal, &config).unwrap();
        let mut params = ConstitutiveLawParameters::with_strain(&[0.004, -0.001, 0.0005, 0.002, -0.0015, 0.001]);
        law.calculate_material_response(&mut params).unwrap();
        let tangent = calc_tangent_by_perturbation(
            law.as_ref(),
            &params,
            TangentEstimation::SecondOrderPerturbation,
            1e-7,
        )
        .unwrap();
        for i in 0..6 {
            for j in 0..6 {
                approx_eq(tangent.get(i, j), params.tangent.get(i, j), 1e-4);
            }
        }
        // trial evaluations do not commit
        assert_eq!(law.plastic_strain(), 0.0);
    }
}
