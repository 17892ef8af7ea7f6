use crate::base::{ParamHardening, Properties, Variable};
use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Specifies the evolution of the yield stress with a hardening variable α
///
/// The hardening variable is the accumulated plastic strain κ, unless the rule
/// is [volumetric](HardeningRule::volumetric), in which case α is the plastic
/// volumetric strain εpv (tension positive).
pub trait HardeningRule: Send + Sync {
    /// Calculates the yield stress σy(α)
    fn hardening(&self, alpha: f64) -> f64;

    /// Calculates the hardening modulus dσy/dα
    fn delta_hardening(&self, alpha: f64) -> f64;

    /// Indicates that the hardening variable is the plastic volumetric strain
    fn volumetric(&self) -> bool {
        false
    }

    /// Returns the parameters of the rule (used for serialization)
    fn data(&self) -> HardeningData;

    /// Returns a deep copy
    fn clone_box(&self) -> Box<dyn HardeningRule>;
}

impl Clone for Box<dyn HardeningRule> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Holds the parameters of any hardening rule
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum HardeningData {
    Linear(LinearHardening),
    Exponential(ExponentialHardening),
    Preconsolidation(PreconsolidationHardening),
}

impl HardeningData {
    /// Allocates the hardening rule (validating the parameters)
    pub fn into_rule(self) -> Result<Box<dyn HardeningRule>> {
        let rule: Box<dyn HardeningRule> = match self {
            HardeningData::Linear(r) => Box::new(LinearHardening::new(r.yield_stress, r.hh)?),
            HardeningData::Exponential(r) => Box::new(ExponentialHardening::new(
                r.yield_stress,
                r.saturation_stress,
                r.delta,
                r.hh,
            )?),
            HardeningData::Preconsolidation(r) => {
                Box::new(PreconsolidationHardening::new(r.yield_stress, r.lambda, r.kappa)?)
            }
        };
        Ok(rule)
    }
}

impl Serialize for dyn HardeningRule {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.data().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Box<dyn HardeningRule> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let data = HardeningData::deserialize(deserializer)?;
        data.into_rule().map_err(serde::de::Error::custom)
    }
}

/// Implements linear hardening (or softening if H < 0)
///
/// ```text
/// σy(κ) = σy0 + H κ
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearHardening {
    /// Initial yield stress σy0
    pub yield_stress: f64,

    /// Hardening modulus H
    pub hh: f64,
}

/// Implements exponential saturation (Voce) hardening
///
/// ```text
/// σy(κ) = σy0 + (σ∞ - σy0) (1 - exp(-δ κ)) + H κ
/// ```
///
/// Softening occurs if σ∞ < σy0.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExponentialHardening {
    /// Initial yield stress σy0
    pub yield_stress: f64,

    /// Saturation stress σ∞
    pub saturation_stress: f64,

    /// Exponent δ
    pub delta: f64,

    /// Linear hardening modulus H
    pub hh: f64,
}

/// Implements preconsolidation hardening driven by the plastic volumetric strain
///
/// ```text
/// σy(εpv) = σy0 exp(-εpv / (λ - κ))
/// ```
///
/// The exponent follows the normal compression (λ) and swelling (κ) lines of
/// critical-state soil models: plastic compaction (εpv < 0) increases the yield
/// stress and dilation decreases it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreconsolidationHardening {
    /// Initial yield stress σy0
    pub yield_stress: f64,

    /// Compression index λ
    pub lambda: f64,

    /// Swelling index κ
    pub kappa: f64,
}

impl LinearHardening {
    /// Allocates a new instance
    pub fn new(yield_stress: f64, hh: f64) -> Result<Self> {
        if yield_stress < 0.0 {
            return Err(Error::input("the yield stress must be ≥ 0.0"));
        }
        Ok(LinearHardening { yield_stress, hh })
    }
}

impl ExponentialHardening {
    /// Allocates a new instance
    pub fn new(yield_stress: f64, saturation_stress: f64, delta: f64, hh: f64) -> Result<Self> {
        if yield_stress < 0.0 {
            return Err(Error::input("the yield stress must be ≥ 0.0"));
        }
        if saturation_stress < 0.0 {
            return Err(Error::input("the saturation stress must be ≥ 0.0"));
        }
        if delta < 0.0 {
            return Err(Error::input("the hardening exponent must be ≥ 0.0"));
        }
        Ok(ExponentialHardening {
            yield_stress,
            saturation_stress,
            delta,
            hh,
        })
    }
}

impl PreconsolidationHardening {
    /// Allocates a new instance
    pub fn new(yield_stress: f64, lambda: f64, kappa: f64) -> Result<Self> {
        if yield_stress < 0.0 {
            return Err(Error::input("the yield stress must be ≥ 0.0"));
        }
        if kappa <= 0.0 {
            return Err(Error::input("the swelling index must be > 0.0"));
        }
        if lambda <= kappa {
            return Err(Error::input("the compression index must be greater than the swelling index"));
        }
        Ok(PreconsolidationHardening {
            yield_stress,
            lambda,
            kappa,
        })
    }
}

impl HardeningRule for LinearHardening {
    fn hardening(&self, alpha: f64) -> f64 {
        self.yield_stress + self.hh * alpha
    }

    fn delta_hardening(&self, _alpha: f64) -> f64 {
        self.hh
    }

    fn data(&self) -> HardeningData {
        HardeningData::Linear(self.clone())
    }

    fn clone_box(&self) -> Box<dyn HardeningRule> {
        Box::new(self.clone())
    }
}

impl HardeningRule for ExponentialHardening {
    fn hardening(&self, alpha: f64) -> f64 {
        let diff = self.saturation_stress - self.yield_stress;
        self.yield_stress + diff * (1.0 - f64::exp(-self.delta * alpha)) + self.hh * alpha
    }

    fn delta_hardening(&self, alpha: f64) -> f64 {
        let diff = self.saturation_stress - self.yield_stress;
        diff * self.delta * f64::exp(-self.delta * alpha) + self.hh
    }

    fn data(&self) -> HardeningData {
        HardeningData::Exponential(self.clone())
    }

    fn clone_box(&self) -> Box<dyn HardeningRule> {
        Box::new(self.clone())
    }
}

impl HardeningRule for PreconsolidationHardening {
    fn hardening(&self, alpha: f64) -> f64 {
        self.yield_stress * f64::exp(-alpha / (self.lambda - self.kappa))
    }

    fn delta_hardening(&self, alpha: f64) -> f64 {
        -self.hardening(alpha) / (self.lambda - self.kappa)
    }

    fn volumetric(&self) -> bool {
        true
    }

    fn data(&self) -> HardeningData {
        HardeningData::Preconsolidation(self.clone())
    }

    fn clone_box(&self) -> Box<dyn HardeningRule> {
        Box::new(self.clone())
    }
}

/// Allocates a hardening rule from the material properties
pub fn allocate_hardening(kind: ParamHardening, props: &Properties) -> Result<Box<dyn HardeningRule>> {
    let yield_stress = props.get(Variable::YieldStress)?;
    let rule: Box<dyn HardeningRule> = match kind {
        ParamHardening::Linear => {
            let hh = props.get_or(Variable::HardeningModulus, 0.0);
            Box::new(LinearHardening::new(yield_stress, hh)?)
        }
        ParamHardening::Exponential => {
            let saturation_stress = props.get(Variable::SaturationStress)?;
            let delta = props.get(Variable::HardeningExponent)?;
            let hh = props.get_or(Variable::HardeningModulus, 0.0);
            Box::new(ExponentialHardening::new(yield_stress, saturation_stress, delta, hh)?)
        }
        ParamHardening::Preconsolidation => {
            let lambda = props.get(Variable::CompressionIndex)?;
            let kappa = props.get(Variable::SwellingIndex)?;
            Box::new(PreconsolidationHardening::new(yield_stress, lambda, kappa)?)
        }
    };
    Ok(rule)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
