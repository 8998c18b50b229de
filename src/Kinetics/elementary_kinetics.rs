//! Progress rates and net production rates of systems of elementary reactions.
//!
//! For reaction j with reactant coefficients ν′ and product coefficients ν″ (rows = reactions,
//! columns = species):
//! ```text
//! wf_j = kf_j * Π_s x_s^ν′_js
//! wb_j = kb_j * Π_s x_s^ν″_js        (reversible systems only)
//! w_j  = wf_j - wb_j
//! dx_s/dt = Σ_j (ν″_js - ν′_js) * w_j
//! ```
//! The kinetic model is a closed enum [`ReactionKind`]: irreversible systems carry only forward
//! coefficients, reversible ones carry both (a zero backward coefficient marks a reaction that
//! is currently irreversible). Progress rates are returned as values ([`ProgressRates`]) and
//! passed explicitly to [`ElementaryReactions::production_rates`].
use crate::Kinetics::kinetics_errors::KineticsError;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Reactant (ν′) and product (ν″) stoichiometric matrices, reactions × species.
///
/// The net matrix ν = ν″ - ν′ is never stored, it is recomputed on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stoichiometry {
    reactants: DMatrix<f64>,
    products: DMatrix<f64>,
}

impl Stoichiometry {
    pub fn new(reactants: DMatrix<f64>, products: DMatrix<f64>) -> Result<Self, KineticsError> {
        if reactants.shape() != products.shape() {
            return Err(KineticsError::dimensions(
                "product stoichiometry",
                shape_str(reactants.shape()),
                shape_str(products.shape()),
            ));
        }
        check_coefficients(&reactants, "reactant stoichiometric coefficient")?;
        check_coefficients(&products, "product stoichiometric coefficient")?;
        Ok(Self {
            reactants,
            products,
        })
    }

    /// from row vectors, one row per reaction; ragged rows are a dimension mismatch
    pub fn from_rows(
        reactants: &[Vec<f64>],
        products: &[Vec<f64>],
    ) -> Result<Self, KineticsError> {
        let reactants = matrix_from_rows(reactants, "reactant stoichiometry")?;
        let products = matrix_from_rows(products, "product stoichiometry")?;
        Self::new(reactants, products)
    }

    pub fn n_reactions(&self) -> usize {
        self.reactants.nrows()
    }

    pub fn n_species(&self) -> usize {
        self.reactants.ncols()
    }

    pub fn reactants(&self) -> &DMatrix<f64> {
        &self.reactants
    }

    pub fn products(&self) -> &DMatrix<f64> {
        &self.products
    }

    pub fn set_reactants(&mut self, reactants: DMatrix<f64>) -> Result<(), KineticsError> {
        *self = Self::new(reactants, self.products.clone())?;
        Ok(())
    }

    pub fn set_products(&mut self, products: DMatrix<f64>) -> Result<(), KineticsError> {
        *self = Self::new(self.reactants.clone(), products)?;
        Ok(())
    }

    /// ν = ν″ - ν′
    pub fn net(&self) -> DMatrix<f64> {
        &self.products - &self.reactants
    }
}

fn shape_str(shape: (usize, usize)) -> String {
    format!("{}x{}", shape.0, shape.1)
}

fn matrix_from_rows(rows: &[Vec<f64>], what: &str) -> Result<DMatrix<f64>, KineticsError> {
    let ncols = rows.first().map(|row| row.len()).unwrap_or(0);
    for row in rows {
        if row.len() != ncols {
            return Err(KineticsError::dimensions(what, ncols, row.len()));
        }
    }
    Ok(DMatrix::from_fn(rows.len(), ncols, |i, j| rows[i][j]))
}

fn check_coefficients(matrix: &DMatrix<f64>, what: &str) -> Result<(), KineticsError> {
    for &value in matrix.iter() {
        if !value.is_finite() || value < 0.0 {
            return Err(KineticsError::invalid(
                what,
                value,
                "stoichiometric coefficients must be finite and non-negative",
            ));
        }
    }
    Ok(())
}

/// kinetic model of the system, chosen by whether backward coefficients are present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReactionKind {
    Irreversible { kf: DVector<f64> },
    Reversible { kf: DVector<f64>, kb: DVector<f64> },
}

impl ReactionKind {
    pub fn new(kf: DVector<f64>, kb: Option<DVector<f64>>) -> Self {
        match kb {
            Some(kb) => ReactionKind::Reversible { kf, kb },
            None => ReactionKind::Irreversible { kf },
        }
    }

    pub fn forward(&self) -> &DVector<f64> {
        match self {
            ReactionKind::Irreversible { kf } => kf,
            ReactionKind::Reversible { kf, .. } => kf,
        }
    }

    pub fn backward(&self) -> Option<&DVector<f64>> {
        match self {
            ReactionKind::Irreversible { .. } => None,
            ReactionKind::Reversible { kb, .. } => Some(kb),
        }
    }

    /// a reaction is reversible iff its backward coefficient is non-zero
    pub fn reversibility(&self) -> Vec<bool> {
        match self {
            ReactionKind::Irreversible { kf } => vec![false; kf.len()],
            ReactionKind::Reversible { kb, .. } => kb.iter().map(|k| *k != 0.0).collect(),
        }
    }
}

/// forward, backward and net progress rates of every reaction
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRates {
    pub forward: DVector<f64>,
    /// zero for irreversible systems
    pub backward: DVector<f64>,
    pub net: DVector<f64>,
}

impl ProgressRates {
    /// |wb_j - wf_j| for every reaction
    pub fn imbalance(&self) -> DVector<f64> {
        (&self.backward - &self.forward).abs()
    }

    /// ‖wb - wf‖₂ over all reactions
    pub fn imbalance_norm(&self) -> f64 {
        (&self.backward - &self.forward).norm()
    }
}

/// a system of elementary reactions: kinetic coefficients plus stoichiometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementaryReactions {
    pub kinetics: ReactionKind,
    pub stoichiometry: Stoichiometry,
}

impl ElementaryReactions {
    pub fn new(kinetics: ReactionKind, stoichiometry: Stoichiometry) -> Result<Self, KineticsError> {
        let system = Self {
            kinetics,
            stoichiometry,
        };
        system.check_dimensions()?;
        Ok(system)
    }

    /// number of reactions
    pub fn len(&self) -> usize {
        self.stoichiometry.n_reactions()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn n_species(&self) -> usize {
        self.stoichiometry.n_species()
    }

    fn check_dimensions(&self) -> Result<(), KineticsError> {
        let n_reactions = self.len();
        let kf = self.kinetics.forward();
        if kf.len() != n_reactions {
            return Err(KineticsError::dimensions(
                "forward rate coefficients",
                n_reactions,
                kf.len(),
            ));
        }
        if let Some(kb) = self.kinetics.backward() {
            if kb.len() != n_reactions {
                return Err(KineticsError::dimensions(
                    "backward rate coefficients",
                    n_reactions,
                    kb.len(),
                ));
            }
        }
        Ok(())
    }

    fn check_values(&self, x: &DVector<f64>) -> Result<(), KineticsError> {
        if x.len() != self.n_species() {
            return Err(KineticsError::dimensions(
                "concentrations",
                self.n_species(),
                x.len(),
            ));
        }
        for &k in self.kinetics.forward().iter() {
            if !k.is_finite() || k <= 0.0 {
                return Err(KineticsError::invalid(
                    "kf",
                    k,
                    "forward reaction rate coefficients must be positive",
                ));
            }
        }
        if let Some(kb) = self.kinetics.backward() {
            for &k in kb.iter() {
                if !k.is_finite() || k < 0.0 {
                    return Err(KineticsError::invalid(
                        "kb",
                        k,
                        "backward reaction rate coefficients cannot be negative",
                    ));
                }
            }
        }
        for &value in x.iter() {
            if !value.is_finite() || value < 0.0 {
                return Err(KineticsError::invalid(
                    "x",
                    value,
                    "concentrations cannot be negative",
                ));
            }
        }
        Ok(())
    }

    /// Π_s x_s^ν_js for every reaction row j
    fn mass_action(x: &DVector<f64>, nu: &DMatrix<f64>) -> DVector<f64> {
        DVector::from_fn(nu.nrows(), |j, _| {
            nu.row(j)
                .iter()
                .zip(x.iter())
                .map(|(power, conc)| conc.powf(*power))
                .product::<f64>()
        })
    }

    /// forward, backward and net progress rates at concentrations x
    pub fn progress_rates(&self, x: &DVector<f64>) -> Result<ProgressRates, KineticsError> {
        self.check_dimensions()?;
        self.check_values(x)?;
        let kf = self.kinetics.forward();
        let forward = kf.component_mul(&Self::mass_action(x, self.stoichiometry.reactants()));
        let backward = match self.kinetics.backward() {
            Some(kb) => kb.component_mul(&Self::mass_action(x, self.stoichiometry.products())),
            None => DVector::zeros(self.len()),
        };
        let net = &forward - &backward;
        Ok(ProgressRates {
            forward,
            backward,
            net,
        })
    }

    /// net production rate of every species, νᵀ·w
    pub fn production_rates(&self, progress: &ProgressRates) -> Result<DVector<f64>, KineticsError> {
        if progress.net.len() != self.len() {
            return Err(KineticsError::dimensions(
                "progress rates",
                self.len(),
                progress.net.len(),
            ));
        }
        Ok(self.stoichiometry.net().tr_mul(&progress.net))
    }

    /// progress rates followed by production rates
    pub fn reaction_rates(&self, x: &DVector<f64>) -> Result<DVector<f64>, KineticsError> {
        let progress = self.progress_rates(x)?;
        self.production_rates(&progress)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn system_strategy() -> impl Strategy<Value = (Vec<Vec<f64>>, Vec<Vec<f64>>, Vec<f64>, Vec<f64>)> {
        (1usize..5, 1usize..6).prop_flat_map(|(n_reactions, n_species)| {
            (
                prop::collection::vec(prop::collection::vec(0u8..3, n_species), n_reactions),
                prop::collection::vec(prop::collection::vec(0u8..3, n_species), n_reactions),
                prop::collection::vec(0.1f64..100.0, n_reactions),
                prop::collection::vec(0.0f64..5.0, n_species),
            )
                .prop_map(|(nu_p, nu_pp, k, x)| {
                    let to_f64 = |m: Vec<Vec<u8>>| {
                        m.into_iter()
                            .map(|row| row.into_iter().map(f64::from).collect())
                            .collect::<Vec<Vec<f64>>>()
                    };
                    (to_f64(nu_p), to_f64(nu_pp), k, x)
                })
        })
    }

    /// backward coefficients for a system, zeros included
    fn backward_strategy(n_reactions: usize) -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(prop_oneof![Just(0.0f64), 0.1f64..100.0], n_reactions)
    }

    fn mass_action(k: f64, x: &DVector<f64>, nu: &[f64]) -> f64 {
        k * (0..x.len()).map(|i| x[i].powf(nu[i])).product::<f64>()
    }

    proptest! {
        #[test]
        fn reversible_production_rate_is_net_stoichiometry_times_progress(
            ((nu_p, nu_pp, kf, x), kb) in system_strategy()
                .prop_flat_map(|system| {
                    let n_reactions = system.2.len();
                    (Just(system), backward_strategy(n_reactions))
                })
        ) {
            let stoichiometry = Stoichiometry::from_rows(&nu_p, &nu_pp).unwrap();
            let rxn = ElementaryReactions::new(
                ReactionKind::new(DVector::from_vec(kf.clone()), Some(DVector::from_vec(kb.clone()))),
                stoichiometry,
            ).unwrap();
            let x = DVector::from_vec(x);
            let progress = rxn.progress_rates(&x).unwrap();
            let rates = rxn.production_rates(&progress).unwrap();

            for j in 0..kf.len() {
                let wf = mass_action(kf[j], &x, &nu_p[j]);
                let wb = mass_action(kb[j], &x, &nu_pp[j]);
                prop_assert!((progress.net[j] - (wf - wb)).abs() <= 1e-9 * (1.0 + wf + wb));
            }
            for s in 0..x.len() {
                let mut expected = 0.0;
                let mut scale = 1.0;
                for j in 0..kf.len() {
                    let w = mass_action(kf[j], &x, &nu_p[j]) - mass_action(kb[j], &x, &nu_pp[j]);
                    expected += (nu_pp[j][s] - nu_p[j][s]) * w;
                    scale += (nu_pp[j][s] - nu_p[j][s]).abs()
                        * (mass_action(kf[j], &x, &nu_p[j]) + mass_action(kb[j], &x, &nu_pp[j]));
                }
                prop_assert!((rates[s] - expected).abs() <= 1e-9 * scale);
            }
        }

        #[test]
        fn production_rate_is_net_stoichiometry_times_progress((nu_p, nu_pp, k, x) in system_strategy()) {
            let stoichiometry = Stoichiometry::from_rows(&nu_p, &nu_pp).unwrap();
            let rxn = ElementaryReactions::new(
                ReactionKind::new(DVector::from_vec(k.clone()), None),
                stoichiometry,
            ).unwrap();
            let x = DVector::from_vec(x);
            let rates = rxn.reaction_rates(&x).unwrap();

            for s in 0..x.len() {
                let mut expected = 0.0;
                let mut scale = 1.0;
                for j in 0..k.len() {
                    let w: f64 = k[j] * (0..x.len()).map(|i| x[i].powf(nu_p[j][i])).product::<f64>();
                    expected += (nu_pp[j][s] - nu_p[j][s]) * w;
                    scale += ((nu_pp[j][s] - nu_p[j][s]) * w).abs();
                }
                prop_assert!((rates[s] - expected).abs() <= 1e-9 * scale);
            }
        }
    }
}
