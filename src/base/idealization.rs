use serde::{Deserialize, Serialize};

/// Defines the geometry idealization (plane-strain, plane-stress, none)
///
/// # Default values
///
/// * In 2D, the default choice is **plane-strain**
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idealization {
    /// Indicates 2D instead of 3D
    pub two_dim: bool,

    /// Indicates a plane-stress idealization in 2D
    pub plane_stress: bool,
}

impl Idealization {
    /// Allocates a new instance
    ///
    /// # Default values
    ///
    /// * `2D`: plane-strain
    /// * `3D`: no idealization
    pub fn new(ndim: usize) -> Self {
        Idealization {
            two_dim: ndim == 2,
            plane_stress: false,
        }
    }

    /// Returns the number of components of the Voigt vectors
    ///
    /// # Results
    ///
    /// * `2D`: 3 components `[xx, yy, xy]`
    /// * `3D`: 6 components `[xx, yy, zz, xy, yz, xz]`
    pub fn voigt_size(&self) -> usize {
        if self.two_dim {
            3
        } else {
            6
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
