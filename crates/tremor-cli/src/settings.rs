//! Layered settings: defaults, optional file, TREMOR_* environment, flags

use crate::TuningArgs;
use baseline_model::{BaselineConfig, ModelError, NormalRegionPolicy};
use config::{Config, Environment, File};
use feature_engine::ExtractorConfig;
use serde::{Deserialize, Serialize};
use signal_window::{WindowConfig, WindowError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Environment variable prefix; nested keys use `__` (TREMOR_MODEL__EPS)
pub const ENV_PREFIX: &str = "TREMOR";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error(transparent)]
    Window(#[from] WindowError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Everything the command-line tool needs to run a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub window: WindowConfig,
    pub extractor: ExtractorConfig,
    pub model: BaselineConfig,
    /// Session used when a command gets no --session
    pub session_path: PathBuf,
    /// Model file used when a command gets no --model
    pub model_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            extractor: ExtractorConfig::default(),
            model: BaselineConfig::default(),
            session_path: PathBuf::from("gameplay_session.csv"),
            model_path: PathBuf::from("baseline_model.bin"),
        }
    }
}

impl Settings {
    /// Defaults overlaid with `file` (if any) and then the environment.
    /// Not validated; see [`Settings::resolve`].
    pub fn load(file: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            debug!("Reading settings from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Load, apply command-line overrides, validate
    pub fn resolve(file: Option<&Path>, tuning: &TuningArgs) -> Result<Self, SettingsError> {
        let mut settings = Self::load(file)?;
        settings.apply(tuning);
        settings.validate()?;
        Ok(settings)
    }

    pub fn apply(&mut self, tuning: &TuningArgs) {
        if let Some(eps) = tuning.eps {
            self.model.eps = eps;
        }
        if let Some(min_samples) = tuning.min_samples {
            self.model.min_samples = Some(min_samples);
        }
        if let Some(rate) = tuning.sample_rate {
            self.window.sample_rate_hz = rate;
        }
        if let Some(size) = tuning.window_size {
            self.window.window_size_sec = size;
        }
        if let Some(overlap) = tuning.overlap {
            self.window.overlap = overlap;
        }
        if tuning.largest_cluster {
            self.model.normal_region = NormalRegionPolicy::LargestCluster;
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.window.validate()?;
        self.model.validate()?;
        if !self.extractor.band.is_valid() {
            return Err(SettingsError::Invalid(format!(
                "tremor band must satisfy 0 <= min_hz < max_hz, got {}..{}",
                self.extractor.band.min_hz, self.extractor.band.max_hz
            )));
        }
        let threshold = self.extractor.flatness_threshold;
        if !(threshold.is_finite() && threshold >= 0.0) {
            return Err(SettingsError::Invalid(format!(
                "flatness_threshold must be non-negative, got {}",
                threshold
            )));
        }
        Ok(())
    }
}
