//! Backward rate coefficients from equilibrium constants.
//!
//! For every species the NASA7 polynomial of the regime selected by T gives
//! ```text
//! H/RT = a1 + a2*T/2 + a3*T^2/3 + a4*T^3/4 + a5*T^4/5 + a6/T
//! S/R  = a1*ln(T) + a2*T + a3*T^2/2 + a4*T^3/3 + a5*T^4/4 + a7
//! ```
//! Reaction quantities follow from the net stoichiometry ν = ν″ - ν′:
//! ```text
//! ΔH/RT_j = Σ_s ν_js * H_s/RT      ΔS/R_j = Σ_s ν_js * S_s/R      γ_j = Σ_s ν_js
//! Ke_j = (p0/(R*T))^γ_j * exp(ΔS/R_j - ΔH/RT_j)
//! kb_j = kf_j / Ke_j      (reversible reactions, 0 otherwise)
//! ```
#![allow(non_snake_case)]
use crate::Kinetics::elementary_kinetics::Stoichiometry;
use crate::Kinetics::kinetics_errors::KineticsError;
use crate::Thermodynamics::thermo_store::{Regime, ThermoCoefficientStore};
use crate::settings::EngineConfig;
use log::debug;
use nalgebra::DVector;

/// dimensionless enthalpy H/RT of one species
pub fn enthalpy_RT(a: &[f64; 7], T: f64) -> f64 {
    a[0] + a[1] * T / 2.0
        + a[2] * T.powi(2) / 3.0
        + a[3] * T.powi(3) / 4.0
        + a[4] * T.powi(4) / 5.0
        + a[5] / T
}

/// dimensionless entropy S/R of one species
pub fn entropy_R(a: &[f64; 7], T: f64) -> f64 {
    a[0] * T.ln()
        + a[1] * T
        + a[2] * T.powi(2) / 2.0
        + a[3] * T.powi(3) / 3.0
        + a[4] * T.powi(4) / 4.0
        + a[6]
}

/// H/RT and S/R of every species at T.
///
/// All species must be valid in the regime selected by T; the first one that is not aborts
/// the whole batch with `SpeciesTemperatureOutOfRange`.
pub fn species_thermo(
    store: &dyn ThermoCoefficientStore,
    species: &[String],
    T: f64,
    config: &EngineConfig,
) -> Result<(DVector<f64>, DVector<f64>), KineticsError> {
    if !T.is_finite() || T <= 0.0 {
        return Err(KineticsError::invalid(
            "T",
            T,
            "thermodynamic functions need a positive temperature",
        ));
    }
    let regime = Regime::for_temperature(T, config.regime_switch_temperature);
    let valid = store.list_species_valid(T, regime);
    let out_of_range = |s: &str| KineticsError::SpeciesTemperatureOutOfRange {
        species: s.to_owned(),
        temperature: T,
        regime: regime.to_string(),
    };
    let mut h = DVector::zeros(species.len());
    let mut s = DVector::zeros(species.len());
    for (i, name) in species.iter().enumerate() {
        if !valid.contains(name) {
            return Err(out_of_range(name));
        }
        let a = store
            .get_coefficients(name, regime)
            .map_err(|_| out_of_range(name))?;
        h[i] = enthalpy_RT(&a, T);
        s[i] = entropy_R(&a, T);
    }
    Ok((h, s))
}

/// Equilibrium constant of every reaction at T.
///
/// Values are returned as computed, so a reaction far from balance may get `inf` or 0;
/// [`backward_coefficients`] rejects those only for reversible reactions.
pub fn equilibrium_constants(
    store: &dyn ThermoCoefficientStore,
    species: &[String],
    T: f64,
    stoichiometry: &Stoichiometry,
    config: &EngineConfig,
) -> Result<DVector<f64>, KineticsError> {
    if species.len() != stoichiometry.n_species() {
        return Err(KineticsError::dimensions(
            "species list",
            stoichiometry.n_species(),
            species.len(),
        ));
    }
    let (h, s) = species_thermo(store, species, T, config)?;
    let nu = stoichiometry.net();
    let delta_H = &nu * &h;
    let delta_S = &nu * &s;
    let pressure_term = config.reference_pressure / (config.gas_constant * T);
    let mut Ke = DVector::zeros(stoichiometry.n_reactions());
    for j in 0..stoichiometry.n_reactions() {
        let gamma: f64 = nu.row(j).sum();
        Ke[j] = pressure_term.powf(gamma) * (delta_S[j] - delta_H[j]).exp();
    }
    debug!("equilibrium constants at T = {}: {:?}", T, Ke.as_slice());
    Ok(Ke)
}

/// Backward rate coefficients `kb = kf/Ke`, zero for irreversible reactions.
///
/// # Arguments
/// * `store` - source of NASA7 coefficients
/// * `species` - ordered species list, one entry per stoichiometry column
/// * `T` - temperature, K
/// * `kf` - forward rate coefficients at T
/// * `reversible` - reversibility flag of every reaction
/// * `stoichiometry` - ν′ and ν″
/// * `config` - gas constant, reference pressure and regime switch
///
/// # Returns
/// * `Err(SpeciesTemperatureOutOfRange)` - some species has no valid polynomial at T; no partial result
/// * `Err(NumericOverflow)` - Ke of a reversible reaction is zero or not finite
pub fn backward_coefficients(
    store: &dyn ThermoCoefficientStore,
    species: &[String],
    T: f64,
    kf: &DVector<f64>,
    reversible: &[bool],
    stoichiometry: &Stoichiometry,
    config: &EngineConfig,
) -> Result<DVector<f64>, KineticsError> {
    let n_reactions = stoichiometry.n_reactions();
    if kf.len() != n_reactions {
        return Err(KineticsError::dimensions(
            "forward rate coefficients",
            n_reactions,
            kf.len(),
        ));
    }
    if reversible.len() != n_reactions {
        return Err(KineticsError::dimensions(
            "reversibility flags",
            n_reactions,
            reversible.len(),
        ));
    }
    let Ke = equilibrium_constants(store, species, T, stoichiometry, config)?;
    let mut kb = DVector::zeros(n_reactions);
    for j in (0..n_reactions).filter(|j| reversible[*j]) {
        if !Ke[j].is_finite() || Ke[j] == 0.0 {
            return Err(KineticsError::overflow("equilibrium constant"));
        }
        kb[j] = kf[j] / Ke[j];
        if !kb[j].is_finite() {
            return Err(KineticsError::overflow("backward rate coefficient"));
        }
    }
    Ok(kb)
}
