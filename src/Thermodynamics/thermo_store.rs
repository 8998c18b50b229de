//! Source of NASA7 polynomial coefficients.
//!
//! The equilibrium calculator only talks to the [`ThermoCoefficientStore`] trait: a store maps
//! (species, regime) to the 7 coefficients `a1..a7` and tells which species are valid at a
//! temperature. [`NASA7Library`] is an in-memory store that can be read from a JSON document
//! of the form
//! ```json
//! {
//!   "H2": {
//!     "low":  { "t_min": 200.0,  "t_max": 1000.0, "coeffs": [a1, a2, a3, a4, a5, a6, a7] },
//!     "high": { "t_min": 1000.0, "t_max": 3500.0, "coeffs": [a1, a2, a3, a4, a5, a6, a7] }
//!   }
//! }
//! ```
#![allow(non_snake_case)]
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThermoError {
    #[error("no {regime} regime coefficients found for species {species}")]
    NoCoefficientsFound { species: String, regime: Regime },
    #[error("invalid temperature range for species {species}: [{t_min}, {t_max}]")]
    InvalidTemperatureRange {
        species: String,
        t_min: f64,
        t_max: f64,
    },
    #[error("failed to read thermodynamic library: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to deserialize thermodynamic library: {0}")]
    SerdeError(#[from] serde_json::Error),
}

/// temperature regime of a NASA7 polynomial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    Low,
    High,
}

impl Regime {
    /// `High` if T >= switch_temperature, else `Low`
    pub fn for_temperature(T: f64, switch_temperature: f64) -> Self {
        if T >= switch_temperature {
            Regime::High
        } else {
            Regime::Low
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Regime::Low => write!(f, "low"),
            Regime::High => write!(f, "high"),
        }
    }
}

/// source of polynomial thermodynamic coefficients
pub trait ThermoCoefficientStore: Send + Sync {
    /// the 7 coefficients a1..a7 of species in regime
    fn get_coefficients(&self, species: &str, regime: Regime) -> Result<[f64; 7], ThermoError>;
    /// species whose regime polynomial is valid at T
    fn list_species_valid(&self, T: f64, regime: Regime) -> BTreeSet<String>;
}

/// one polynomial and the temperature interval it is valid on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NASA7Polynomial {
    pub t_min: f64,
    pub t_max: f64,
    pub coeffs: [f64; 7],
}

impl NASA7Polynomial {
    pub fn contains(&self, T: f64) -> bool {
        self.t_min <= T && T <= self.t_max
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NASA7Record {
    #[serde(default)]
    pub low: Option<NASA7Polynomial>,
    #[serde(default)]
    pub high: Option<NASA7Polynomial>,
}

impl NASA7Record {
    fn regime(&self, regime: Regime) -> Option<&NASA7Polynomial> {
        match regime {
            Regime::Low => self.low.as_ref(),
            Regime::High => self.high.as_ref(),
        }
    }
}

/// in-memory NASA7 library
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NASA7Library {
    pub records: BTreeMap<String, NASA7Record>,
}

impl NASA7Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        species: &str,
        regime: Regime,
        polynomial: NASA7Polynomial,
    ) -> Result<(), ThermoError> {
        check_range(species, &polynomial)?;
        let record = self.records.entry(species.to_owned()).or_default();
        match regime {
            Regime::Low => record.low = Some(polynomial),
            Regime::High => record.high = Some(polynomial),
        }
        Ok(())
    }

    pub fn from_json_str(content: &str) -> Result<Self, ThermoError> {
        let library: NASA7Library = serde_json::from_str(content)?;
        for (species, record) in library.records.iter() {
            for polynomial in [&record.low, &record.high].into_iter().flatten() {
                check_range(species, polynomial)?;
            }
        }
        Ok(library)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ThermoError> {
        let content = fs::read_to_string(path.as_ref())?;
        let library = Self::from_json_str(&content)?;
        info!(
            "loaded NASA7 coefficients of {} species from {}",
            library.records.len(),
            path.as_ref().display()
        );
        Ok(library)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn check_range(species: &str, polynomial: &NASA7Polynomial) -> Result<(), ThermoError> {
    let ok = polynomial.t_min.is_finite()
        && polynomial.t_max.is_finite()
        && polynomial.t_min > 0.0
        && polynomial.t_min < polynomial.t_max;
    if ok {
        Ok(())
    } else {
        Err(ThermoError::InvalidTemperatureRange {
            species: species.to_owned(),
            t_min: polynomial.t_min,
            t_max: polynomial.t_max,
        })
    }
}

impl ThermoCoefficientStore for NASA7Library {
    fn get_coefficients(&self, species: &str, regime: Regime) -> Result<[f64; 7], ThermoError> {
        self.records
            .get(species)
            .and_then(|record| record.regime(regime))
            .map(|polynomial| polynomial.coeffs)
            .ok_or_else(|| ThermoError::NoCoefficientsFound {
                species: species.to_owned(),
                regime,
            })
    }

    fn list_species_valid(&self, T: f64, regime: Regime) -> BTreeSet<String> {
        self.records
            .iter()
            .filter(|(_, record)| record.regime(regime).is_some_and(|p| p.contains(T)))
            .map(|(species, _)| species.clone())
            .collect()
    }
}
