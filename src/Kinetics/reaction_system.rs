//! Reaction records, per-temperature assembly and the temperature pipeline.
//!
//! A [`ReactionRecord`] is what a mechanism parser hands over: stoichiometry by species name,
//! a reversibility flag and a rate-coefficient model. For a fixed species order and a
//! temperature, [`ReactionSystem::assemble`] turns a list of records into stoichiometric
//! matrices and forward rate coefficients. [`temperature_points`] repeats this for a list of
//! temperatures and adds backward coefficients from thermodynamics; when thermodynamic data
//! does not cover a temperature the point is kept with [`BackwardCoefficients::NotDefined`]
//! instead of failing the whole batch.
//!
//! # Examples
//! ```
//! use KinEq::Kinetics::rate_coefficients::{ArrheniusCoefficient, RateCoefficient};
//! use KinEq::Kinetics::reaction_system::{ReactionRecord, ReactionSystem};
//! use std::collections::BTreeMap;
//! let record = ReactionRecord {
//!     id: "reaction01".to_string(),
//!     reversible: false,
//!     reactants: BTreeMap::from([("H".to_string(), 1), ("O2".to_string(), 1)]),
//!     products: BTreeMap::from([("OH".to_string(), 1), ("O".to_string(), 1)]),
//!     rate: ArrheniusCoefficient::new(3.52e10, 7.4e4).into(),
//! };
//! assert_eq!(record.equation(), "H + O2 [=] O + OH");
//! let species: Vec<String> = ["H", "O", "OH", "O2"].iter().map(|s| s.to_string()).collect();
//! let system = ReactionSystem::assemble(&species, &[record], 1500.0).unwrap();
//! assert_eq!(system.stoichiometry.reactants()[(0, 3)], 1.0);
//! ```
#![allow(non_snake_case)]
use crate::Kinetics::elementary_kinetics::{ElementaryReactions, ReactionKind, Stoichiometry};
use crate::Kinetics::kinetics_errors::KineticsError;
use crate::Kinetics::rate_coefficients::{RateCoefficient, RateConstant};
use crate::Thermodynamics::equilibrium_constants::backward_coefficients;
use crate::Thermodynamics::thermo_store::ThermoCoefficientStore;
use crate::settings::EngineConfig;
use log::{info, warn};
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// one elementary reaction as delivered by a mechanism parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionRecord {
    pub id: String,
    pub reversible: bool,
    pub reactants: BTreeMap<String, u32>,
    pub products: BTreeMap<String, u32>,
    pub rate: RateCoefficient,
}

impl ReactionRecord {
    /// "2A + B [=] C": species in alphabetical order, unit coefficients omitted
    pub fn equation(&self) -> String {
        format!(
            "{} [=] {}",
            equation_side(&self.reactants),
            equation_side(&self.products)
        )
    }
}

fn equation_side(side: &BTreeMap<String, u32>) -> String {
    side.iter()
        .map(|(species, coeff)| {
            if *coeff == 1 {
                species.clone()
            } else {
                format!("{}{}", coeff, species)
            }
        })
        .collect::<Vec<_>>()
        .join(" + ")
}

/// reactions assembled over a fixed species order at one temperature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReactionSystem {
    pub species: Vec<String>,
    pub equations: Vec<String>,
    pub stoichiometry: Stoichiometry,
    pub forward_k: DVector<f64>,
    pub reversibility: Vec<bool>,
    pub T: f64,
}

impl ReactionSystem {
    /// Builds ν′, ν″ (reactions × species), forward coefficients at T and reversibility flags.
    ///
    /// Species must be a non-empty list without duplicates; every species named by a record
    /// must be in it.
    pub fn assemble(
        species: &[String],
        records: &[ReactionRecord],
        T: f64,
    ) -> Result<Self, KineticsError> {
        let index = species_index(species)?;
        if records.is_empty() {
            return Err(KineticsError::invalid(
                "number of reactions",
                0.0,
                "reaction list is empty",
            ));
        }
        let n_species = species.len();
        let n_reactions = records.len();
        let mut reactants = DMatrix::zeros(n_reactions, n_species);
        let mut products = DMatrix::zeros(n_reactions, n_species);
        let mut forward_k = DVector::zeros(n_reactions);
        for (j, record) in records.iter().enumerate() {
            for (side, matrix) in [
                (&record.reactants, &mut reactants),
                (&record.products, &mut products),
            ] {
                for (name, coeff) in side.iter() {
                    let i = index.get(name.as_str()).ok_or_else(|| {
                        KineticsError::UnknownSpecies {
                            reaction: record.id.clone(),
                            species: name.clone(),
                        }
                    })?;
                    matrix[(j, *i)] = *coeff as f64;
                }
            }
            forward_k[j] = record.rate.compute(T)?;
        }
        let stoichiometry = Stoichiometry::new(reactants, products)?;
        info!(
            "assembled {} reactions over {} species at T = {} K",
            n_reactions, n_species, T
        );
        Ok(Self {
            species: species.to_vec(),
            equations: records.iter().map(|r| r.equation()).collect(),
            stoichiometry,
            forward_k,
            reversibility: records.iter().map(|r| r.reversible).collect(),
            T,
        })
    }

    /// Adds backward coefficients; an out-of-range thermodynamic lookup gives `NotDefined`.
    pub fn with_thermodynamics(
        self,
        store: &dyn ThermoCoefficientStore,
        config: &EngineConfig,
    ) -> Result<TemperaturePoint, KineticsError> {
        let backward_k = match backward_coefficients(
            store,
            &self.species,
            self.T,
            &self.forward_k,
            &self.reversibility,
            &self.stoichiometry,
            config,
        ) {
            Ok(kb) => BackwardCoefficients::Defined(kb),
            Err(KineticsError::SpeciesTemperatureOutOfRange {
                species, regime, ..
            }) => {
                warn!(
                    "backward rate coefficients not defined at T = {} K: species {} has no {} regime data",
                    self.T, species, regime
                );
                BackwardCoefficients::NotDefined { species, regime }
            }
            Err(e) => return Err(e),
        };
        Ok(TemperaturePoint {
            system: self,
            backward_k,
        })
    }
}

fn species_index(species: &[String]) -> Result<HashMap<&str, usize>, KineticsError> {
    if species.is_empty() {
        return Err(KineticsError::invalid(
            "number of species",
            0.0,
            "species list is empty",
        ));
    }
    let mut index = HashMap::with_capacity(species.len());
    for (i, name) in species.iter().enumerate() {
        if index.insert(name.as_str(), i).is_some() {
            return Err(KineticsError::invalid(
                "species index",
                i as f64,
                &format!("duplicate species {}", name),
            ));
        }
    }
    Ok(index)
}

/// backward rate coefficients of a temperature point
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackwardCoefficients {
    Defined(DVector<f64>),
    /// thermodynamic data of `species` does not cover the temperature
    NotDefined { species: String, regime: String },
}

impl BackwardCoefficients {
    pub fn as_vector(&self) -> Option<&DVector<f64>> {
        match self {
            BackwardCoefficients::Defined(kb) => Some(kb),
            BackwardCoefficients::NotDefined { .. } => None,
        }
    }
}

/// everything known about the reactions at one temperature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperaturePoint {
    #[serde(flatten)]
    pub system: ReactionSystem,
    pub backward_k: BackwardCoefficients,
}

impl TemperaturePoint {
    pub fn T(&self) -> f64 {
        self.system.T
    }

    /// Rate model of the point: irreversible when no reaction is reversible, reversible otherwise.
    pub fn elementary_reactions(&self) -> Result<ElementaryReactions, KineticsError> {
        let kf = self.system.forward_k.clone();
        let kinetics = if !self.system.reversibility.iter().any(|r| *r) {
            ReactionKind::new(kf, None)
        } else {
            match &self.backward_k {
                BackwardCoefficients::Defined(kb) => ReactionKind::new(kf, Some(kb.clone())),
                BackwardCoefficients::NotDefined { species, regime } => {
                    return Err(KineticsError::SpeciesTemperatureOutOfRange {
                        species: species.clone(),
                        temperature: self.system.T,
                        regime: regime.clone(),
                    });
                }
            }
        };
        ElementaryReactions::new(kinetics, self.system.stoichiometry.clone())
    }

    /// net production rate of every species at concentrations x
    pub fn reaction_rates(&self, x: &DVector<f64>) -> Result<DVector<f64>, KineticsError> {
        self.elementary_reactions()?.reaction_rates(x)
    }
}

/// One [`TemperaturePoint`] per temperature, in input order.
pub fn temperature_points(
    species: &[String],
    records: &[ReactionRecord],
    temperatures: &[f64],
    store: &dyn ThermoCoefficientStore,
    config: &EngineConfig,
) -> Result<Vec<TemperaturePoint>, KineticsError> {
    temperatures
        .iter()
        .map(|T| ReactionSystem::assemble(species, records, *T)?.with_thermodynamics(store, config))
        .collect()
}

/// [`temperature_points`] with temperatures processed in parallel; order is preserved.
pub fn temperature_points_par(
    species: &[String],
    records: &[ReactionRecord],
    temperatures: &[f64],
    store: &dyn ThermoCoefficientStore,
    config: &EngineConfig,
) -> Result<Vec<TemperaturePoint>, KineticsError> {
    temperatures
        .par_iter()
        .map(|T| ReactionSystem::assemble(species, records, *T)?.with_thermodynamics(store, config))
        .collect()
}
