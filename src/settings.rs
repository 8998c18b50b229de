//! # Settings Module
//!
//! ## Purpose
//! Numerical settings of the rate/equilibrium engine in one serializable place: physical
//! constants, thermodynamic regime switch, equilibrium thresholds of the integrator and
//! tolerances of the ODE solver.
//!
//! ## Architecture
//! - **EngineConfig**: serializable configuration structure, `Default` gives the standard values
//! - **SolverConfig**: error tolerances of the Dormand-Prince solver
//! - **ConfigManager**: loads, validates and persists the configuration (engine_config.json)
//!
//! ## Configuration Format
//! ```json
//! {
//!   "gas_constant": 8.314,
//!   "reference_pressure": 1000000.0,
//!   "regime_switch_temperature": 1000.0,
//!   "species_equilibrium_threshold": 1e-5,
//!   "system_equilibrium_threshold": 0.01,
//!   "max_time": 100.0,
//!   "solver": { "rtol": 1e-6, "atol": 1e-10 }
//! }
//! ```
//! Missing fields take their default values.
//!
//! ## Usage
//! ```rust
//! use KinEq::settings::{ConfigManager, EngineConfig};
//! let manager = ConfigManager::with_config_file("no_such_config.json").unwrap();
//! assert_eq!(manager.get_config(), &EngineConfig::default());
//! ```
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read/write configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to (de)serialize configuration: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("invalid configuration value {field} = {value}: {reason}")]
    InvalidValue {
        field: String,
        value: f64,
        reason: String,
    },
}

/// local error tolerances of the ODE solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub rtol: f64,
    pub atol: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-10,
        }
    }
}

/// Settings of the whole engine.
///
/// # Fields
/// * `gas_constant` - ideal gas constant R, J/(mol·K)
/// * `reference_pressure` - p0 of the equilibrium constant, `Ke = (p0/(R*T))^γ * exp(ΔS/R - ΔH/RT)`
/// * `regime_switch_temperature` - NASA7 high regime is used for T >= this value
/// * `species_equilibrium_threshold` - reaction j is at equilibrium when |wb_j - wf_j| is below it
/// * `system_equilibrium_threshold` - the system is at equilibrium when ‖wb - wf‖ is below it
/// * `max_time` - time grid points beyond it are not integrated
/// * `solver` - tolerances of the ODE solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub gas_constant: f64,
    pub reference_pressure: f64,
    pub regime_switch_temperature: f64,
    pub species_equilibrium_threshold: f64,
    pub system_equilibrium_threshold: f64,
    pub max_time: f64,
    pub solver: SolverConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gas_constant: 8.314,
            reference_pressure: 1e6,
            regime_switch_temperature: 1000.0,
            species_equilibrium_threshold: 1e-5,
            system_equilibrium_threshold: 1e-2,
            max_time: 100.0,
            solver: SolverConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Checks that every value is usable.
    ///
    /// # Returns
    /// * `Ok(())` - all thresholds, tolerances and constants are positive and finite
    /// * `Err(ConfigError::InvalidValue)` - naming the first offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("gas_constant", self.gas_constant),
            ("reference_pressure", self.reference_pressure),
            ("regime_switch_temperature", self.regime_switch_temperature),
            (
                "species_equilibrium_threshold",
                self.species_equilibrium_threshold,
            ),
            (
                "system_equilibrium_threshold",
                self.system_equilibrium_threshold,
            ),
            ("max_time", self.max_time),
            ("solver.rtol", self.solver.rtol),
            ("solver.atol", self.solver.atol),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    value,
                    reason: "must be positive and finite".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Loads, validates and persists an [`EngineConfig`].
///
/// # Fields
/// * `config` - current configuration
/// * `config_file` - path used by [`ConfigManager::save_config`]
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: EngineConfig,
    config_file: PathBuf,
}

impl ConfigManager {
    /// Manager bound to "engine_config.json" in the current directory.
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_config_file("engine_config.json")
    }

    /// Creates a manager with a custom configuration file path.
    ///
    /// # Arguments
    /// * `config_file` - path to the configuration file
    ///
    /// # Returns
    /// * `Ok(ConfigManager)` - with the loaded configuration, or the defaults if the file does not exist
    /// * `Err(ConfigError)` - the file exists but cannot be read, parsed or validated
    pub fn with_config_file<P: AsRef<Path>>(config_file: P) -> Result<Self, ConfigError> {
        let config = Self::load_config(config_file.as_ref())?;
        Ok(Self {
            config,
            config_file: config_file.as_ref().to_path_buf(),
        })
    }

    fn load_config(config_file: &Path) -> Result<EngineConfig, ConfigError> {
        if config_file.exists() {
            let content = fs::read_to_string(config_file)?;
            let config: EngineConfig = serde_json::from_str(&content)?;
            config.validate()?;
            info!("engine configuration loaded from {}", config_file.display());
            Ok(config)
        } else {
            Ok(EngineConfig::default())
        }
    }

    /// Serializes the current configuration to JSON and writes it to the config file.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(&self.config)?;
        fs::write(&self.config_file, content)?;
        Ok(())
    }

    pub fn get_config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    /// Replaces the configuration after validation and saves it.
    pub fn set_config(&mut self, config: EngineConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        self.save_config()
    }

    /// Restores the default configuration and saves it.
    pub fn reset_to_defaults(&mut self) -> Result<(), ConfigError> {
        self.config = EngineConfig::default();
        self.save_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.reference_pressure, 1e6);
        assert_eq!(config.gas_constant, 8.314);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_config_file(dir.path().join("engine_config.json")).unwrap();
        assert_eq!(manager.get_config(), &EngineConfig::default());
    }

    #[test]
    fn test_partial_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"reference_pressure": 1e5, "solver": {"rtol": 1e-8}}"#)
            .unwrap();
        let manager = ConfigManager::with_config_file(file.path()).unwrap();
        let config = manager.get_config();
        assert_eq!(config.reference_pressure, 1e5);
        assert_eq!(config.solver.rtol, 1e-8);
        assert_eq!(config.solver.atol, SolverConfig::default().atol);
        assert_eq!(config.max_time, 100.0);
    }

    #[test]
    fn test_invalid_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"system_equilibrium_threshold": -1.0}"#)
            .unwrap();
        assert!(matches!(
            ConfigManager::with_config_file(file.path()),
            Err(ConfigError::InvalidValue { .. })
        ));

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        assert!(matches!(
            ConfigManager::with_config_file(file.path()),
            Err(ConfigError::SerdeError(_))
        ));
    }

    #[test]
    fn test_set_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine_config.json");
        let mut manager = ConfigManager::with_config_file(&path).unwrap();
        let mut config = EngineConfig::default();
        config.max_time = 5.0;
        manager.set_config(config.clone()).unwrap();

        let reloaded = ConfigManager::with_config_file(&path).unwrap();
        assert_eq!(reloaded.get_config(), &config);

        let mut bad = config.clone();
        bad.solver.rtol = 0.0;
        assert!(manager.set_config(bad).is_err());
        assert_eq!(manager.get_config().max_time, 5.0);

        manager.reset_to_defaults().unwrap();
        let reloaded = ConfigManager::with_config_file(&path).unwrap();
        assert_eq!(reloaded.get_config(), &EngineConfig::default());
    }
}
