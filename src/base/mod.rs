//! Implements the base structures: idealization, configuration and material properties

mod config;
mod idealization;
mod parameters;
mod properties;
mod samples;
pub use crate::base::config::*;
pub use crate::base::idealization::*;
pub use crate::base::parameters::*;
pub use crate::base::properties::*;
pub use crate::base::samples::*;
