//! Makes available common structures needed to evaluate constitutive laws
//!
//! You may write `use plastix::prelude::*` in your code and obtain
//! access to commonly used functionality.

pub use crate::base::{
    Config, Idealization, NonConvergencePolicy, ParamHardening, ParamLaw, ParamYieldSurface, Properties,
    SampleProperties, TangentEstimation, Variable,
};
pub use crate::material::{
    allocate_law, ConstitutiveLaw, ConstitutiveLawParameters, MaterialPoints, PathResults, SerialParallelLaw,
    SerialParallelReport, StrainPath,
};
pub use crate::{Error, Result};
