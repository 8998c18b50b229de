//! Rate coefficients of elementary reactions.
//!
//! Three models are supported, each one a plain struct carrying its parameters:
//! - [`ConstantCoefficient`]: `k` is fixed
//! - [`ArrheniusCoefficient`]: `k = A*exp(-E/(R*T))`
//! - [`ModifiedArrheniusCoefficient`]: `k = A*T^b*exp(-E/(R*T))`
//!
//! They are gathered into the closed enum [`RateCoefficient`]; evaluation goes through the
//! [`RateConstant`] trait, statically dispatched over the enum.
//!
//! # Examples
//! ```
//! use KinEq::Kinetics::rate_coefficients::{ArrheniusCoefficient, RateCoefficient, RateConstant};
//! let k: RateCoefficient = ArrheniusCoefficient::new(2.0, 3.0).into();
//! let value = k.compute(100.0).unwrap();
//! assert!((value - 1.9927962618542914).abs() < 1e-12);
//! ```
#![allow(non_snake_case)]
use crate::Kinetics::kinetics_errors::KineticsError;
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

/// ideal gas constant, J/(mol·K). Change only for unit conversion
pub const GAS_CONSTANT: f64 = 8.314;

fn default_R() -> f64 {
    GAS_CONSTANT
}

#[enum_dispatch]
pub trait RateConstant {
    /// rate coefficient at temperature T (K)
    fn compute(&self, T: f64) -> Result<f64, KineticsError>;
}

/// closed family of rate-coefficient models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[enum_dispatch(RateConstant)]
pub enum RateCoefficient {
    Constant(ConstantCoefficient),
    Arrhenius(ArrheniusCoefficient),
    ModifiedArrhenius(ModifiedArrheniusCoefficient),
}

impl RateCoefficient {
    /// two models are equal when they give the same k at T
    pub fn equivalent(&self, other: &RateCoefficient, T: f64) -> Result<bool, KineticsError> {
        Ok(self.compute(T)? == other.compute(T)?)
    }
}

////////////////////////////////////CONSTANT/////////////////////////////////////////////
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantCoefficient {
    pub k: f64,
}

impl ConstantCoefficient {
    pub fn new(k: f64) -> Self {
        Self { k }
    }
}

impl RateConstant for ConstantCoefficient {
    fn compute(&self, _T: f64) -> Result<f64, KineticsError> {
        if !self.k.is_finite() {
            return Err(KineticsError::invalid("k", self.k, "rate coefficient must be finite"));
        }
        if self.k < 0.0 {
            return Err(KineticsError::invalid(
                "k",
                self.k,
                "negative reaction rate coefficients are prohibited",
            ));
        }
        Ok(self.k)
    }
}

////////////////////////////////////ARRHENIUS/////////////////////////////////////////////
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrheniusCoefficient {
    /// pre-exponential factor
    pub A: f64,
    /// activation energy, J/mol
    pub E: f64,
    #[serde(default = "default_R")]
    pub R: f64,
}

impl ArrheniusCoefficient {
    pub fn new(A: f64, E: f64) -> Self {
        Self {
            A,
            E,
            R: GAS_CONSTANT,
        }
    }
    /// the same model with the gas constant in other units
    pub fn with_gas_constant(mut self, R: f64) -> Self {
        self.R = R;
        self
    }
}

impl RateConstant for ArrheniusCoefficient {
    fn compute(&self, T: f64) -> Result<f64, KineticsError> {
        check_arrhenius_parameters(self.A, self.E, T, self.R)?;
        let exp_term = boltzmann_factor(self.E, self.R, T)?;
        finite_or_overflow(self.A * exp_term, "Arrhenius rate coefficient")
    }
}

////////////////////////////////////MODIFIED ARRHENIUS/////////////////////////////////////////////
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifiedArrheniusCoefficient {
    pub A: f64,
    /// temperature exponent
    pub b: f64,
    pub E: f64,
    #[serde(default = "default_R")]
    pub R: f64,
}

impl ModifiedArrheniusCoefficient {
    pub fn new(A: f64, b: f64, E: f64) -> Self {
        Self {
            A,
            b,
            E,
            R: GAS_CONSTANT,
        }
    }
    pub fn with_gas_constant(mut self, R: f64) -> Self {
        self.R = R;
        self
    }
}

impl RateConstant for ModifiedArrheniusCoefficient {
    fn compute(&self, T: f64) -> Result<f64, KineticsError> {
        check_arrhenius_parameters(self.A, self.E, T, self.R)?;
        if !self.b.is_finite() {
            return Err(KineticsError::invalid(
                "b",
                self.b,
                "modified Arrhenius parameter b must be real",
            ));
        }
        let power_term = finite_or_overflow(T.powf(self.b), "T^b")?;
        let exp_term = boltzmann_factor(self.E, self.R, T)?;
        finite_or_overflow(
            self.A * power_term * exp_term,
            "modified Arrhenius rate coefficient",
        )
    }
}

fn check_arrhenius_parameters(A: f64, E: f64, T: f64, R: f64) -> Result<(), KineticsError> {
    for (name, value) in [("A", A), ("E", E), ("T", T), ("R", R)] {
        if !value.is_finite() {
            return Err(KineticsError::invalid(name, value, "parameter must be finite"));
        }
    }
    if A < 0.0 {
        return Err(KineticsError::invalid(
            "A",
            A,
            "negative Arrhenius prefactor is prohibited",
        ));
    }
    if T < 0.0 {
        return Err(KineticsError::invalid("T", T, "negative temperatures are prohibited"));
    }
    if R < 0.0 {
        return Err(KineticsError::invalid(
            "R",
            R,
            "negative ideal gas constant is prohibited",
        ));
    }
    Ok(())
}

/// exp(-E/(R*T)); over- and underflow of f64 are both errors
fn boltzmann_factor(E: f64, R: f64, T: f64) -> Result<f64, KineticsError> {
    let exponent = -E / (R * T);
    let value = exponent.exp();
    if exponent.is_nan() || value.is_infinite() || value == 0.0 || value.is_subnormal() {
        return Err(KineticsError::overflow("exp(-E/(R*T))"));
    }
    Ok(value)
}

fn finite_or_overflow(value: f64, what: &str) -> Result<f64, KineticsError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(KineticsError::overflow(what))
    }
}
