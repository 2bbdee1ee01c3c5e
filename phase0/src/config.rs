use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Image quality (arcsec) below which a request can only be met with AO.
pub const AO_IMAGE_QUALITY_THRESHOLD: f64 = 0.2;

/// Wavelength (microns) above which second-order contamination matters.
pub const SECOND_ORDER_WAVELENGTH: f64 = 0.65;

/// Bonus weights added by the scoring stage.
///
/// The proximity terms always contribute at most 1.0 each; these are the
/// fixed bonuses that sit alongside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Credit for an imaging mode matching the configuration at all
    pub configuration: f64,
    /// Imaging preference for modes without AO
    pub imaging_non_ao: f64,
    /// Spectroscopy preference for modes without AO when seeing is relaxed
    pub spectroscopy_non_ao: f64,
    /// Spectroscopy preference for a real order-blocking filter at long wavelengths
    pub order_blocking_filter: f64,
    /// Credit for IFU / multi-object setups in place of the slit width match
    pub extended_fpu: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            configuration: 1.0,
            imaging_non_ao: 1.0,
            spectroscopy_non_ao: 0.5,
            order_blocking_filter: 0.5,
            extended_fpu: 1.0,
        }
    }
}

/// Configuration for one matching run
///
/// Passed explicitly into [`crate::recommend`]; the engine keeps no state
/// between calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Requests with image quality strictly below this need an AO mode
    pub ao_image_quality_threshold: f64,
    /// Wavelength above which a blocking filter earns a bonus
    pub second_order_wavelength: f64,
    /// Scoring bonuses
    pub weights: ScoreWeights,
    /// Drop recommendations whose score is not strictly positive
    pub drop_non_positive: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            ao_image_quality_threshold: AO_IMAGE_QUALITY_THRESHOLD,
            second_order_wavelength: SECOND_ORDER_WAVELENGTH,
            weights: ScoreWeights::default(),
            drop_non_positive: true,
        }
    }
}

impl MatchConfig {
    /// Reject NaN or infinite thresholds and negative weights.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let values = [
            ("ao_image_quality_threshold", self.ao_image_quality_threshold),
            ("second_order_wavelength", self.second_order_wavelength),
            ("weights.configuration", self.weights.configuration),
            ("weights.imaging_non_ao", self.weights.imaging_non_ao),
            ("weights.spectroscopy_non_ao", self.weights.spectroscopy_non_ao),
            ("weights.order_blocking_filter", self.weights.order_blocking_filter),
            ("weights.extended_fpu", self.weights.extended_fpu),
        ];

        for (name, value) in values {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Save to JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from JSON file; missing keys take their default values
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}
