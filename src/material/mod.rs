//! Implements the constitutive laws and the material point drivers

mod constitutive_law;
mod hardening;
mod internal_variables;
mod law_parameters;
mod linear_elastic;
mod material_points;
mod perturbation;
mod plasticity;
mod serial_parallel;
mod strain_path;
mod yield_surface;
pub use crate::material::constitutive_law::*;
pub use crate::material::hardening::*;
pub use crate::material::internal_variables::*;
pub use crate::material::law_parameters::*;
pub use crate::material::linear_elastic::*;
pub use crate::material::material_points::*;
pub use crate::material::perturbation::*;
pub use crate::material::plasticity::*;
pub use crate::material::serial_parallel::*;
pub use crate::material::strain_path::*;
pub use crate::material::yield_surface::*;
