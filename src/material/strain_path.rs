use super::{ConstitutiveLaw, ConstitutiveLawParameters};
use crate::{Error, Result, StrError};
use russell_lab::{Matrix, Vector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Holds a sequence of total strain states driving a single material point
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrainPath {
    /// Number of Voigt components
    pub voigt_size: usize,

    /// Total strains (engineering shear components)
    pub strains: Vec<Vec<f64>>,
}

/// Holds the response at one state of the path
#[derive(Clone, Debug)]
pub struct PathState {
    /// Total strain
    pub strain: Vector,

    /// Stress
    pub stress: Vector,

    /// Committed internal values
    pub internal_values: Vector,

    /// Equivalent plastic strain
    pub plastic_strain: f64,

    /// Tangent matrix (if requested)
    pub tangent: Option<Matrix>,
}

/// Holds all states computed along a path
#[derive(Clone, Debug)]
pub struct PathResults {
    /// States in the order of the path
    pub states: Vec<PathState>,
}

impl StrainPath {
    /// Allocates a new (empty) instance
    pub fn new(voigt_size: usize) -> Self {
        StrainPath {
            voigt_size,
            strains: Vec::new(),
        }
    }

    /// Allocates a path with equal increments from zero to the final strain
    ///
    /// The zero state is not included; thus the path has `n_increments` states.
    pub fn new_linear(final_strain: &[f64], n_increments: usize) -> Result<Self> {
        if n_increments < 1 {
            return Err(Error::input("the number of increments must be ≥ 1"));
        }
        let mut path = StrainPath::new(final_strain.len());
        for i in 0..n_increments {
            let m = (i + 1) as f64 / (n_increments as f64);
            let strain: Vec<_> = final_strain.iter().map(|e| m * e).collect();
            path.push_strain(&strain)?;
        }
        Ok(path)
    }

    /// Pushes a new strain state
    pub fn push_strain(&mut self, strain: &[f64]) -> std::result::Result<&mut Self, StrError> {
        if strain.len() != self.voigt_size {
            return Err("the strain vector has an incorrect number of components");
        }
        self.strains.push(strain.to_vec());
        Ok(self)
    }

    /// Parses a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let path: StrainPath =
            serde_json::from_str(json).map_err(|e| Error::input(format!("cannot parse strain path: {}", e)))?;
        if path.strains.iter().any(|s| s.len() != path.voigt_size) {
            return Err(Error::input("the strain vector has an incorrect number of components"));
        }
        Ok(path)
    }

    /// Reads a JSON file
    pub fn read_json<P>(full_path: &P) -> Result<Self>
    where
        P: AsRef<Path> + ?Sized,
    {
        let json = fs::read_to_string(full_path.as_ref()).map_err(|_| Error::input("cannot open strain path file"))?;
        StrainPath::from_json(&json)
    }

    /// Drives the law through all states, committing each one
    ///
    /// Stops at the first error; the states committed so far remain committed.
    pub fn follow(&self, law: &mut dyn ConstitutiveLaw, compute_tangent: bool) -> Result<PathResults> {
        if law.voigt_size() != self.voigt_size {
            return Err(Error::input(format!(
                "the law requires {} strain components but the path has {}",
                law.voigt_size(),
                self.voigt_size
            )));
        }
        let mut states = Vec::with_capacity(self.strains.len());
        for strain in &self.strains {
            let mut params = ConstitutiveLawParameters::with_strain(strain);
            params.options.compute_tangent = compute_tangent;
            law.finalize_material_response(&mut params)?;
            states.push(PathState {
                strain: params.strain,
                stress: params.stress,
                internal_values: law.internal_variables().current().clone(),
                plastic_strain: law.plastic_strain(),
                tangent: if compute_tangent { Some(params.tangent) } else { None },
            });
        }
        Ok(PathResults { states })
    }
}

impl fmt::Display for PathResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = match self.states.first() {
            Some(state) => state.strain.dim(),
            None => return Ok(()),
        };
        let width = 5 + 2 * 14 * n + 14;
        let thin_line = format!("{:─^1$}", "", width);
        writeln!(f, "{}", thin_line).unwrap();
        write!(f, "{:>5}", "step").unwrap();
        for i in 0..n {
            write!(f, "{:>14}", format!("ε{}", i)).unwrap();
        }
        for i in 0..n {
            write!(f, "{:>14}", format!("σ{}", i)).unwrap();
        }
        writeln!(f, "{:>14}", "κ").unwrap();
        writeln!(f, "{}", thin_line).unwrap();
        for (step, state) in self.states.iter().enumerate() {
            write!(f, "{:>5}", step + 1).unwrap();
            for i in 0..n {
                write!(f, "{:>14.6e}", state.strain[i]).unwrap();
            }
            for i in 0..n {
                write!(f, "{:>14.6e}", state.stress[i]).unwrap();
            }
            writeln!(f, "{:>14.6e}", state.plastic_strain).unwrap();
        }
        writeln!(f, "{}", thin_line).unwrap();
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::StrainPath;
    use crate::base::{Config, Idealization, SampleProperties};
    use crate::material::allocate_law;
    use crate::Error;
    use russell_lab::approx_eq;

    #[test]
    fn new_linear_works() {
        let path = StrainPath::new_linear(&[0.004, 0.0, 0.001], 4).unwrap();
        assert_eq!(path.strains.len(), 4);
        approx_eq(path.strains[0][0], 0.001, 1e-17);
        approx_eq(path.strains[3][2], 0.001, 1e-17);
        assert_eq!(
            StrainPath::new_linear(&[0.0], 0).err(),
            Some(Error::input("the number of increments must be ≥ 1"))
        );
        let mut path = StrainPath::new(3);
        assert_eq!(
            path.push_strain(&[0.0]).err(),
            Some("the strain vector has an incorrect number of components")
        );
    }

    #[test]
    fn json_works() {
        let path = StrainPath::from_json(r#"{"voigt_size": 3, "strains": [[0.001, 0.0, 0.0], [0.002, 0.0, 0.0]]}"#).unwrap();
        assert_eq!(path.strains.len(), 2);
        assert!(StrainPath::from_json(r#"{"voigt_size": 3, "strains": [[0.001]]}"#).is_err());
        assert_eq!(
            StrainPath::read_json("/tmp/__plastix__/not-found.json").err(),
            Some(Error::input("cannot open strain path file"))
        );
    }

    #[test]
    fn follow_works() {
        let ideal = Idealization::new(2);
        let props = SampleProperties::von_mises(1000.0, 0.25, 5.0, 0.0);
        let mut law = allocate_law(&props, &ideal, &Config::new()).unwrap();
        let path = StrainPath::new_linear(&[0.012, -0.006, 0.0], 4).unwrap();
        let results = path.follow(law.as_mut(), true).unwrap();
        assert_eq!(results.states.len(), 4);
        assert_eq!(results.states[0].plastic_strain, 0.0);
        assert!(results.states[3].plastic_strain > 0.0);
        assert!(results.states[3].tangent.is_some());
        assert_eq!(results.states[3].internal_values.dim(), 7);
        let table = format!("{}", results);
        assert!(table.contains("step"));

        let wrong = StrainPath::new_linear(&[0.001; 6], 1).unwrap();
        assert_eq!(
            wrong.follow(law.as_mut(), false).err(),
            Some(Error::input("the law requires 3 strain components but the path has 6"))
        );
    }
}
