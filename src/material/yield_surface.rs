use super::{allocate_hardening, HardeningData, HardeningRule};
use crate::base::{ParamHardening, ParamYieldSurface, Properties, Variable};
use crate::util::{calc_i1, calc_j2, calc_j3, calc_lode_angle, first_vector, principal_stresses};
use crate::util::{second_vector, third_vector, StressInvariants, J2_TOLERANCE};
use crate::{Error, Result};
use russell_lab::Vector;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Holds √3
const SQRT_3: f64 = 1.7320508075688772;

/// Holds the Lode angle (30° - 1°) beyond which the gradient is evaluated with frozen θ
///
/// The terms with tan 3θ and 1/cos 3θ are singular at the corners of hexagonal surfaces.
const LODE_CORNER: f64 = 29.0 * std::f64::consts::PI / 180.0;

/// Specifies a pressure-sensitive yield surface written in terms of (p, q, θ, α)
///
/// ```text
/// f(p, q, θ, α) = η p + m(θ) q - ξ σy(α)
/// g(p, q, θ)    = η̄ p + m̄(θ) q
/// ```
///
/// where `p` is the mean stress (tension positive), `q = √(3 J2)`, `θ` is the Lode
/// angle and `σy(α)` is given by the hardening rule. The plastic potential `g`
/// defines the flow direction. Cone and cylinder surfaces have `m = m̄ = 1`.
pub trait YieldSurface: Send + Sync {
    /// Returns the name of the surface
    fn name(&self) -> &'static str;

    /// Returns the name of the plasticity model using this surface
    fn model_name(&self) -> &'static str;

    /// Returns the slope of the yield function w.r.t. the mean stress (η)
    fn df_dp(&self) -> f64;

    /// Returns the slope of the plastic potential w.r.t. the mean stress (η̄)
    fn dg_dp(&self) -> f64;

    /// Returns the factor multiplying the hardening rule (ξ)
    fn cohesion_factor(&self) -> f64;

    /// Indicates whether the surface depends on the Lode angle or not
    fn lode_dependent(&self) -> bool {
        false
    }

    /// Returns the deviatoric shape factor m(θ) of the yield function
    fn shape(&self, _lode: f64) -> f64 {
        1.0
    }

    /// Returns dm/dθ
    fn d_shape(&self, _lode: f64) -> f64 {
        0.0
    }

    /// Returns the deviatoric shape factor m̄(θ) of the plastic potential
    fn potential_shape(&self, lode: f64) -> f64 {
        self.shape(lode)
    }

    /// Returns dm̄/dθ
    fn d_potential_shape(&self, lode: f64) -> f64 {
        self.d_shape(lode)
    }

    /// Indicates whether the flow rule is associated (g = f) or not
    fn associated(&self) -> bool {
        self.df_dp() == self.dg_dp()
    }

    /// Calculates the yield function f
    fn yield_value(&self, p: f64, q: f64, lode: f64, alpha: f64) -> f64 {
        self.df_dp() * p + self.shape(lode) * q - self.yield_stress(alpha)
    }

    /// Calculates the yield function f at the given stress vector
    fn yield_value_at(&self, stress: &Vector, alpha: f64) -> f64 {
        let inv = StressInvariants::new(stress);
        self.yield_value(inv.p, inv.q, inv.lode, alpha)
    }

    /// Calculates ∂f/∂σ (shear components doubled)
    fn yield_gradient(&self, stress: &Vector) -> Vector {
        invariant_gradient(stress, self.df_dp(), |t| self.shape(t), |t| self.d_shape(t))
    }

    /// Calculates ∂g/∂σ (shear components doubled)
    fn potential_gradient(&self, stress: &Vector) -> Vector {
        invariant_gradient(
            stress,
            self.dg_dp(),
            |t| self.potential_shape(t),
            |t| self.d_potential_shape(t),
        )
    }

    /// Returns the hardening rule
    fn hardening(&self) -> &dyn HardeningRule;

    /// Calculates ξ σy(α)
    fn yield_stress(&self, alpha: f64) -> f64 {
        self.cohesion_factor() * self.hardening().hardening(alpha)
    }

    /// Calculates ξ dσy/dα
    fn delta_yield_stress(&self, alpha: f64) -> f64 {
        self.cohesion_factor() * self.hardening().delta_hardening(alpha)
    }

    /// Returns the parameters of the surface (used for serialization)
    fn data(&self) -> YieldSurfaceData;

    /// Returns a deep copy
    fn clone_box(&self) -> Box<dyn YieldSurface>;
}

impl Clone for Box<dyn YieldSurface> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Calculates the gradient of `η p + m(θ) q` w.r.t. the stress vector
///
/// ```text
/// ∂f/∂σ = c₁ a₁ + c₂ a₂ + c₃ a₃
///
/// c₁ = η / 3
/// c₂ = √3 (m - m' tan 3θ)
/// c₃ = -3 m' / (2 cos 3θ J2)
/// ```
///
/// where a₁, a₂ and a₃ are the derivatives of I1, √J2 and J3. Near the corners
/// (|θ| > 29°) and at hydrostatic states, θ is frozen (c₂ = √3 m and c₃ = 0).
fn invariant_gradient<M, D>(stress: &Vector, eta: f64, m: M, dm: D) -> Vector
where
    M: Fn(f64) -> f64,
    D: Fn(f64) -> f64,
{
    let n = stress.dim();
    let i1 = calc_i1(stress);
    let (dev, j2) = calc_j2(stress, i1);
    let mut res = first_vector(n);
    for i in 0..n {
        res[i] *= eta / 3.0;
    }
    if j2 <= J2_TOLERANCE {
        return res;
    }
    let lode = calc_lode_angle(j2, calc_j3(&dev));
    let (c2, c3) = if f64::abs(lode) > LODE_CORNER {
        (SQRT_3 * m(lode), 0.0)
    } else {
        let dm_dt = dm(lode);
        (
            SQRT_3 * (m(lode) - dm_dt * f64::tan(3.0 * lode)),
            -3.0 * dm_dt / (2.0 * f64::cos(3.0 * lode) * j2),
        )
    };
    let a2 = second_vector(&dev, j2);
    if c3 == 0.0 {
        for i in 0..n {
            res[i] += c2 * a2[i];
        }
    } else {
        let a3 = third_vector(&dev, j2);
        for i in 0..n {
            res[i] += c2 * a2[i] + c3 * a3[i];
        }
    }
    res
}

/// Returns the Mohr-Coulomb deviatoric shape factor
///
/// ```text
/// m(θ) = (cos θ - sin θ sin φ / √3) / √3
/// ```
fn mohr_coulomb_shape(lode: f64, sin_phi: f64) -> f64 {
    (f64::cos(lode) - f64::sin(lode) * sin_phi / SQRT_3) / SQRT_3
}

/// Returns the derivative of the Mohr-Coulomb shape factor w.r.t. θ
fn mohr_coulomb_d_shape(lode: f64, sin_phi: f64) -> f64 {
    (-f64::sin(lode) - f64::cos(lode) * sin_phi / SQRT_3) / SQRT_3
}

/// Implements the von Mises (J2) yield surface
///
/// ```text
/// f = q - σy(κ)
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct VonMisesSurface {
    hardening: Box<dyn HardeningRule>,
}

/// Implements the Drucker-Prager cone fitted to the outer edges of the Mohr-Coulomb surface
///
/// ```text
///     6 sin φ            6 cos φ             6 sin ψ
/// η = ─────────     ξ = ─────────      η̄ = ─────────
///     3 - sin φ         3 - sin φ          3 - sin ψ
/// ```
///
/// The hardening rule yields the cohesion c(α).
#[derive(Clone, Serialize, Deserialize)]
pub struct DruckerPragerSurface {
    /// Friction angle φ in degrees
    phi: f64,

    /// Dilatancy angle ψ in degrees
    psi: f64,

    /// Friction slope η
    #[serde(skip)]
    eta: f64,

    /// Cohesion factor ξ
    #[serde(skip)]
    xi: f64,

    /// Dilatancy slope η̄
    #[serde(skip)]
    eta_bar: f64,

    /// Hardening rule of the cohesion
    hardening: Box<dyn HardeningRule>,
}

/// Implements the Mohr-Coulomb hexagonal pyramid
///
/// ```text
/// f = p sin φ + √J2 (cos θ - sin θ sin φ / √3) - c(α) cos φ
///   = (σ1 - σ3)/2 + (σ1 + σ3)/2 sin φ - c(α) cos φ
/// ```
///
/// The plastic potential has the same form with the dilatancy angle ψ.
#[derive(Clone, Serialize, Deserialize)]
pub struct MohrCoulombSurface {
    /// Friction angle φ in degrees
    phi: f64,

    /// Dilatancy angle ψ in degrees
    psi: f64,

    /// sin φ
    #[serde(skip)]
    sin_phi: f64,

    /// cos φ
    #[serde(skip)]
    cos_phi: f64,

    /// sin ψ
    #[serde(skip)]
    sin_psi: f64,

    /// Hardening rule of the cohesion
    hardening: Box<dyn HardeningRule>,
}

/// Implements the Tresca hexagonal prism
///
/// ```text
/// f = √J2 cos θ - σy(κ)/2 = (σ1 - σ3)/2 - σy(κ)/2
/// ```
///
/// The hardening rule yields the uniaxial yield stress.
#[derive(Clone, Serialize, Deserialize)]
pub struct TrescaSurface {
    hardening: Box<dyn HardeningRule>,
}

impl VonMisesSurface {
    /// Allocates a new instance
    pub fn new(hardening: Box<dyn HardeningRule>) -> Result<Self> {
        if hardening.hardening(0.0) <= 0.0 {
            return Err(Error::input("the von Mises yield stress must be > 0.0"));
        }
        Ok(VonMisesSurface { hardening })
    }
}

/// Checks the friction and dilatancy angles (in degrees)
fn check_angles(phi: f64, psi: f64) -> Result<()> {
    if phi < 0.0 || phi >= 90.0 {
        return Err(Error::input("the friction angle must satisfy 0 ≤ φ < 90"));
    }
    if psi < 0.0 || psi > phi {
        return Err(Error::input("the dilatancy angle must satisfy 0 ≤ ψ ≤ φ"));
    }
    Ok(())
}

impl DruckerPragerSurface {
    /// Allocates a new instance
    ///
    /// # Input
    ///
    /// * `phi` -- friction angle in degrees; 0 ≤ φ < 90
    /// * `psi` -- dilatancy angle in degrees; 0 ≤ ψ ≤ φ
    pub fn new(phi: f64, psi: f64, hardening: Box<dyn HardeningRule>) -> Result<Self> {
        check_angles(phi, psi)?;
        let (sin_phi, cos_phi) = f64::sin_cos(phi.to_radians());
        let sin_psi = f64::sin(psi.to_radians());
        Ok(DruckerPragerSurface {
            phi,
            psi,
            eta: 6.0 * sin_phi / (3.0 - sin_phi),
            xi: 6.0 * cos_phi / (3.0 - sin_phi),
            eta_bar: 6.0 * sin_psi / (3.0 - sin_psi),
            hardening,
        })
    }
}

impl MohrCoulombSurface {
    /// Allocates a new instance
    ///
    /// # Input
    ///
    /// * `phi` -- friction angle in degrees; 0 ≤ φ < 90
    /// * `psi` -- dilatancy angle in degrees; 0 ≤ ψ ≤ φ
    pub fn new(phi: f64, psi: f64, hardening: Box<dyn HardeningRule>) -> Result<Self> {
        check_angles(phi, psi)?;
        if hardening.hardening(0.0) <= 0.0 {
            return Err(Error::input("the Mohr-Coulomb cohesion must be > 0.0"));
        }
        let (sin_phi, cos_phi) = f64::sin_cos(phi.to_radians());
        Ok(MohrCoulombSurface {
            phi,
            psi,
            sin_phi,
            cos_phi,
            sin_psi: f64::sin(psi.to_radians()),
            hardening,
        })
    }
}

impl TrescaSurface {
    /// Allocates a new instance
    pub fn new(hardening: Box<dyn HardeningRule>) -> Result<Self> {
        if hardening.hardening(0.0) <= 0.0 {
            return Err(Error::input("the Tresca yield stress must be > 0.0"));
        }
        Ok(TrescaSurface { hardening })
    }
}

impl YieldSurface for VonMisesSurface {
    fn name(&self) -> &'static str {
        "von Mises"
    }

    fn model_name(&self) -> &'static str {
        "von Mises plasticity"
    }

    fn df_dp(&self) -> f64 {
        0.0
    }

    fn dg_dp(&self) -> f64 {
        0.0
    }

    fn cohesion_factor(&self) -> f64 {
        1.0
    }

    fn hardening(&self) -> &dyn HardeningRule {
        self.hardening.as_ref()
    }

    fn data(&self) -> YieldSurfaceData {
        YieldSurfaceData::VonMises(self.clone())
    }

    fn clone_box(&self) -> Box<dyn YieldSurface> {
        Box::new(self.clone())
    }
}

impl YieldSurface for DruckerPragerSurface {
    fn name(&self) -> &'static str {
        "Drucker-Prager"
    }

    fn model_name(&self) -> &'static str {
        "Drucker-Prager plasticity"
    }

    fn df_dp(&self) -> f64 {
        self.eta
    }

    fn dg_dp(&self) -> f64 {
        self.eta_bar
    }

    fn cohesion_factor(&self) -> f64 {
        self.xi
    }

    fn hardening(&self) -> &dyn HardeningRule {
        self.hardening.as_ref()
    }

    fn data(&self) -> YieldSurfaceData {
        YieldSurfaceData::DruckerPrager(self.clone())
    }

    fn clone_box(&self) -> Box<dyn YieldSurface> {
        Box::new(self.clone())
    }
}

impl YieldSurface for MohrCoulombSurface {
    fn name(&self) -> &'static str {
        "Mohr-Coulomb"
    }

    fn model_name(&self) -> &'static str {
        "Mohr-Coulomb plasticity"
    }

    fn df_dp(&self) -> f64 {
        self.sin_phi
    }

    fn dg_dp(&self) -> f64 {
        self.sin_psi
    }

    fn cohesion_factor(&self) -> f64 {
        self.cos_phi
    }

    fn lode_dependent(&self) -> bool {
        true
    }

    fn shape(&self, lode: f64) -> f64 {
        mohr_coulomb_shape(lode, self.sin_phi)
    }

    fn d_shape(&self, lode: f64) -> f64 {
        mohr_coulomb_d_shape(lode, self.sin_phi)
    }

    fn potential_shape(&self, lode: f64) -> f64 {
        mohr_coulomb_shape(lode, self.sin_psi)
    }

    fn d_potential_shape(&self, lode: f64) -> f64 {
        mohr_coulomb_d_shape(lode, self.sin_psi)
    }

    fn yield_value_at(&self, stress: &Vector, alpha: f64) -> f64 {
        let sig = principal_stresses(stress);
        let n = sig.dim();
        let (s1, s3) = (sig[0], sig[n - 1]);
        (s1 - s3) / 2.0 + (s1 + s3) / 2.0 * self.sin_phi - self.yield_stress(alpha)
    }

    fn hardening(&self) -> &dyn HardeningRule {
        self.hardening.as_ref()
    }

    fn data(&self) -> YieldSurfaceData {
        YieldSurfaceData::MohrCoulomb(self.clone())
    }

    fn clone_box(&self) -> Box<dyn YieldSurface> {
        Box::new(self.clone())
    }
}

impl YieldSurface for TrescaSurface {
    fn name(&self) -> &'static str {
        "Tresca"
    }

    fn model_name(&self) -> &'static str {
        "Tresca plasticity"
    }

    fn df_dp(&self) -> f64 {
        0.0
    }

    fn dg_dp(&self) -> f64 {
        0.0
    }

    fn cohesion_factor(&self) -> f64 {
        0.5
    }

    fn lode_dependent(&self) -> bool {
        true
    }

    fn shape(&self, lode: f64) -> f64 {
        mohr_coulomb_shape(lode, 0.0)
    }

    fn d_shape(&self, lode: f64) -> f64 {
        mohr_coulomb_d_shape(lode, 0.0)
    }

    fn yield_value_at(&self, stress: &Vector, alpha: f64) -> f64 {
        let sig = principal_stresses(stress);
        (sig[0] - sig[sig.dim() - 1]) / 2.0 - self.yield_stress(alpha)
    }

    fn hardening(&self) -> &dyn HardeningRule {
        self.hardening.as_ref()
    }

    fn data(&self) -> YieldSurfaceData {
        YieldSurfaceData::Tresca(self.clone())
    }

    fn clone_box(&self) -> Box<dyn YieldSurface> {
        Box::new(self.clone())
    }
}

/// Holds the parameters of any yield surface (including its hardening rule)
///
/// Only the angles are serialized; the derived slopes are recomputed when the
/// surface is allocated again.
#[derive(Clone, Serialize, Deserialize)]
pub enum YieldSurfaceData {
    VonMises(VonMisesSurface),
    DruckerPrager(DruckerPragerSurface),
    MohrCoulomb(MohrCoulombSurface),
    Tresca(TrescaSurface),
}

impl YieldSurfaceData {
    /// Allocates the yield surface (validating the parameters)
    pub fn into_surface(self) -> Result<Box<dyn YieldSurface>> {
        let surface: Box<dyn YieldSurface> = match self {
            YieldSurfaceData::VonMises(s) => Box::new(VonMisesSurface::new(s.hardening)?),
            YieldSurfaceData::DruckerPrager(s) => Box::new(DruckerPragerSurface::new(s.phi, s.psi, s.hardening)?),
            YieldSurfaceData::MohrCoulomb(s) => Box::new(MohrCoulombSurface::new(s.phi, s.psi, s.hardening)?),
            YieldSurfaceData::Tresca(s) => Box::new(TrescaSurface::new(s.hardening)?),
        };
        Ok(surface)
    }

    /// Returns the parameters of the hardening rule
    pub fn hardening(&self) -> HardeningData {
        match self {
            YieldSurfaceData::VonMises(s) => s.hardening.data(),
            YieldSurfaceData::DruckerPrager(s) => s.hardening.data(),
            YieldSurfaceData::MohrCoulomb(s) => s.hardening.data(),
            YieldSurfaceData::Tresca(s) => s.hardening.data(),
        }
    }
}

impl Serialize for dyn YieldSurface {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.data().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Box<dyn YieldSurface> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let data = YieldSurfaceData::deserialize(deserializer)?;
        data.into_surface().map_err(serde::de::Error::custom)
    }
}

/// Allocates a yield surface (and its hardening rule) from the material properties
pub fn allocate_yield_surface(
    kind: ParamYieldSurface,
    hardening: ParamHardening,
    props: &Properties,
) -> Result<Box<dyn YieldSurface>> {
    let rule = allocate_hardening(hardening, props)?;
    let surface: Box<dyn YieldSurface> = match kind {
        ParamYieldSurface::VonMises => Box::new(VonMisesSurface::new(rule)?),
        ParamYieldSurface::DruckerPrager => {
            let phi = props.get(Variable::FrictionAngle)?;
            let psi = props.get_or(Variable::DilatancyAngle, phi);
            Box::new(DruckerPragerSurface::new(phi, psi, rule)?)
        }
        ParamYieldSurface::MohrCoulomb => {
            let phi = props.get(Variable::FrictionAngle)?;
            let psi = props.get_or(Variable::DilatancyAngle, phi);
            Box::new(MohrCoulombSurface::new(phi, psi, rule)?)
        }
        ParamYieldSurface::Tresca => Box::new(TrescaSurface::new(rule)?),
    };
    Ok(surface)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
