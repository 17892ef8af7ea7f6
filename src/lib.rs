//! Plastix -- Elastoplastic constitutive-law evaluation engine
//!
//! Given a strain state at an integration (Gauss) point, the laws in this crate
//! return the stress, the updated internal (history) variables and, optionally,
//! the consistent tangent operator. The main components are:
//!
//! * [util] -- Voigt algebra, stress invariants and principal stresses
//! * [material] -- constitutive laws, hardening rules, yield surfaces, the
//!   local return-mapping solver and the serial-parallel rule of mixtures
//! * [base] -- idealization, configuration and material properties
//!
//! # Voigt convention
//!
//! Symmetric tensors are flattened as `[xx, yy, zz, xy, yz, xz]` in 3D and
//! `[xx, yy, xy]` in 2D. Stress vectors hold the tensor shear components,
//! whereas strain vectors hold the engineering (doubled) shear components.

/// Defines a type alias for the error type as a static string
pub type StrError = &'static str;

mod error;
pub use crate::error::*;

pub mod base;
pub mod material;
pub mod prelude;
pub mod util;
