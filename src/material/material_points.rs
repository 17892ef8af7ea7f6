use super::{allocate_law, ConstitutiveLaw, ConstitutiveLawParameters};
use crate::base::{Config, Idealization, Properties};
use crate::{Error, Result};
use rayon::prelude::*;
use std::sync::Arc;

/// Holds the data of one integration (material) point
pub struct MaterialPoint {
    /// Constitutive law owned by this point
    pub law: Box<dyn ConstitutiveLaw>,

    /// Input and output data of the last evaluation
    pub params: ConstitutiveLawParameters,
}

/// Holds a set of material points sharing the same (read-only) properties
///
/// Each point owns an independent deep copy of the constitutive law, thus the
/// points may be evaluated concurrently.
pub struct MaterialPoints {
    /// Shared material properties
    props: Arc<Properties>,

    /// All points
    pub all: Vec<MaterialPoint>,
}

impl MaterialPoints {
    /// Allocates a new instance
    ///
    /// The law is allocated (and checked) once and then cloned for every point.
    pub fn new(props: Arc<Properties>, ideal: &Idealization, config: &Config, n_points: usize) -> Result<Self> {
        let mut prototype = allocate_law(props.as_ref(), ideal, config)?;
        prototype.initialize_material()?;
        let voigt_size = prototype.voigt_size();
        let all = (0..n_points)
            .map(|_| MaterialPoint {
                law: prototype.clone_box(),
                params: ConstitutiveLawParameters::new(voigt_size),
            })
            .collect();
        Ok(MaterialPoints { props, all })
    }

    /// Returns the shared properties
    pub fn properties(&self) -> &Properties {
        self.props.as_ref()
    }

    /// Returns the number of points
    pub fn len(&self) -> usize {
        self.all.len()
    }

    /// Indicates whether there are no points
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// Sets the strain of one point
    pub fn set_strain(&mut self, index: usize, strain: &[f64]) -> Result<()> {
        let n = self.all.len();
        let point = self
            .all
            .get_mut(index)
            .ok_or_else(|| Error::input(format!("the point index {} is out of range (n_points = {})", index, n)))?;
        if strain.len() != point.params.voigt_size() {
            return Err(Error::input(format!(
                "the strain must have {} components (found {})",
                point.params.voigt_size(),
                strain.len()
            )));
        }
        point.params.set_strain(strain);
        Ok(())
    }

    /// Calculates the trial response of all points sequentially
    pub fn calculate_all_sequential(&mut self) -> Result<()> {
        self.all
            .iter_mut()
            .map(|p| p.law.calculate_material_response(&mut p.params))
            .collect()
    }

    /// Calculates the trial response of all points in parallel
    pub fn calculate_all(&mut self) -> Result<()> {
        self.all
            .par_iter_mut()
            .map(|p| p.law.calculate_material_response(&mut p.params))
            .collect()
    }

    /// Finalizes (commits) the response of all points in parallel
    pub fn finalize_all(&mut self) -> Result<()> {
        self.all
            .par_iter_mut()
            .map(|p| p.law.finalize_material_response(&mut p.params))
            .collect()
    }

    /// Undoes the last commit of all points
    pub fn rollback_all(&mut self) {
        self.all.iter_mut().for_each(|p| p.law.rollback());
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
