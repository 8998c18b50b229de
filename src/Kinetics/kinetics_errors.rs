use thiserror::Error;

/// errors of the rate/equilibrium engine
///
/// `SpeciesTemperatureOutOfRange` is the only recoverable case: the temperature pipeline
/// replaces it with `BackwardCoefficients::NotDefined` for the temperature point at hand.
/// Everything else propagates unmodified.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum KineticsError {
    /// physically nonsensical input: negative coefficient, negative concentration, non-finite exponent...
    #[error("invalid parameter {what} = {value}: {reason}")]
    InvalidParameter {
        what: String,
        value: f64,
        reason: String,
    },
    /// exponential term over/underflows f64
    #[error("numeric overflow while computing {what}: the result is too large/small")]
    NumericOverflow { what: String },
    /// arrays of incompatible shape
    #[error("dimension mismatch in {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: String,
        expected: String,
        found: String,
    },
    /// thermodynamic polynomial of the species is not valid at T in the chosen regime
    #[error("no thermodynamic coefficients for species {species} at T = {temperature} K ({regime} regime)")]
    SpeciesTemperatureOutOfRange {
        species: String,
        temperature: f64,
        regime: String,
    },
    /// reaction record names a species that is not part of the species set
    #[error("reaction {reaction} refers to unknown species {species}")]
    UnknownSpecies { reaction: String, species: String },
    /// the ODE primitive cannot continue
    #[error("integration failed at t = {t}: {reason}")]
    IntegrationFailure { t: f64, reason: String },
}

impl KineticsError {
    pub fn invalid(what: &str, value: f64, reason: &str) -> Self {
        KineticsError::InvalidParameter {
            what: what.to_owned(),
            value,
            reason: reason.to_owned(),
        }
    }

    pub fn overflow(what: &str) -> Self {
        KineticsError::NumericOverflow {
            what: what.to_owned(),
        }
    }

    pub fn dimensions(what: &str, expected: impl ToString, found: impl ToString) -> Self {
        KineticsError::DimensionMismatch {
            what: what.to_owned(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// true for the one error the temperature pipeline is allowed to swallow
    pub fn is_recoverable(&self) -> bool {
        matches!(self, KineticsError::SpeciesTemperatureOutOfRange { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let e = KineticsError::invalid("k", -1.0, "negative rate coefficients are prohibited");
        assert_eq!(
            e.to_string(),
            "invalid parameter k = -1: negative rate coefficients are prohibited"
        );
        let e = KineticsError::dimensions("reactant stoichiometry", "2x3", "2x4");
        assert!(e.to_string().contains("expected 2x3, found 2x4"));
    }

    #[test]
    fn test_only_range_error_is_recoverable() {
        let range = KineticsError::SpeciesTemperatureOutOfRange {
            species: "H2".to_string(),
            temperature: 5000.0,
            regime: "high".to_string(),
        };
        assert!(range.is_recoverable());
        assert!(!KineticsError::overflow("exp").is_recoverable());
        assert!(!KineticsError::invalid("x", -1.0, "").is_recoverable());
    }
}
