//! Contains Voigt algebra, stress invariants and principal stress solvers

mod invariants;
mod linalg;
mod principal;
mod voigt;

pub use crate::util::invariants::*;
pub use crate::util::linalg::*;
pub use crate::util::principal::*;
pub use crate::util::voigt::*;
