use super::{ParamLaw, Variable};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Holds the (read-only) material properties of one material
///
/// The values are accessed by [Variable] keys. Composite laws store the
/// properties of their constituents as nested sub-property sets.
///
/// Once the laws are allocated, the properties are meant to be shared
/// (e.g., via `Arc`) by all integration points and never modified.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    /// Identification number
    pub id: usize,

    /// Selects the constitutive law
    #[serde(default)]
    pub law: Option<ParamLaw>,

    /// Holds the values
    #[serde(default)]
    values: BTreeMap<Variable, f64>,

    /// Holds nested property sets (e.g., matrix and fiber of composites)
    #[serde(default)]
    sub_properties: Vec<Properties>,
}

impl Properties {
    /// Allocates a new (empty) instance
    pub fn new(id: usize) -> Self {
        Properties {
            id,
            law: None,
            values: BTreeMap::new(),
            sub_properties: Vec::new(),
        }
    }

    /// Sets the constitutive law
    pub fn set_law(&mut self, law: ParamLaw) -> &mut Self {
        self.law = Some(law);
        self
    }

    /// Sets a value
    pub fn set(&mut self, key: Variable, value: f64) -> &mut Self {
        self.values.insert(key, value);
        self
    }

    /// Appends a nested property set
    pub fn add_sub_properties(&mut self, sub: Properties) -> &mut Self {
        self.sub_properties.push(sub);
        self
    }

    /// Indicates whether a value is available or not
    pub fn has(&self, key: Variable) -> bool {
        self.values.contains_key(&key)
    }

    /// Returns a value
    pub fn get(&self, key: Variable) -> Result<f64> {
        match self.values.get(&key) {
            Some(value) => Ok(*value),
            None => Err(Error::input(format!("property {:?} is missing (properties {})", key, self.id))),
        }
    }

    /// Returns a value or a default one if not available
    pub fn get_or(&self, key: Variable, default: f64) -> f64 {
        *self.values.get(&key).unwrap_or(&default)
    }

    /// Returns the constitutive law selection
    pub fn law(&self) -> Result<&ParamLaw> {
        self.law
            .as_ref()
            .ok_or_else(|| Error::input(format!("no constitutive law set (properties {})", self.id)))
    }

    /// Returns the number of nested property sets
    pub fn n_sub_properties(&self) -> usize {
        self.sub_properties.len()
    }

    /// Returns a nested property set
    pub fn sub_properties(&self, index: usize) -> Result<&Properties> {
        self.sub_properties
            .get(index)
            .ok_or_else(|| Error::input(format!("sub-properties {} are missing (properties {})", index, self.id)))
    }

    /// Parses a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::input(format!("cannot parse properties: {}", e)))
    }

    /// Reads a JSON file
    pub fn read_json<P>(full_path: &P) -> Result<Self>
    where
        P: AsRef<Path> + ?Sized,
    {
        let json = fs::read_to_string(full_path.as_ref()).map_err(|_| Error::input("cannot open properties file"))?;
        Properties::from_json(&json)
    }

    /// Returns a JSON representation
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::input(format!("cannot serialize properties: {}", e)))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
