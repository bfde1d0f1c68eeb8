// src/config/mod.rs
//! Configuration for the feature extraction pipeline
//!
//! Every tunable the feature sets use is an explicit field here; nothing is
//! hardcoded in the extractors. Missing TOML keys fall back to the values in
//! [`constants`].

pub mod constants;
pub mod loader;
pub mod processing_config;

pub use constants::*;
pub use loader::{ConfigLoader, ConfigError};
pub use processing_config::*;

use serde::{Deserialize, Serialize};

use crate::error::EmgResult;

/// Complete feature extraction configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct FeatureConfig {
    #[serde(default)]
    pub feature_set: FeatureSetKind,

    #[serde(default)]
    pub signal: SignalConfig,

    #[serde(default)]
    pub windowing: WindowingConfig,

    #[serde(default)]
    pub time_domain: TimeDomainConfig,

    #[serde(default)]
    pub cepstral: CepstralConfig,

    #[serde(default)]
    pub envelope: EnvelopeConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl FeatureConfig {
    /// Validate every section, stopping at the first offending parameter
    pub fn validate(&self) -> EmgResult<()> {
        self.signal.validate()?;
        self.windowing.validate()?;
        self.time_domain.validate()?;
        self.cepstral.validate()?;
        self.envelope.validate(self.signal.channel_count)?;
        Ok(())
    }

    /// Window duration in seconds
    pub fn window_duration_s(&self) -> f32 {
        self.windowing.length as f32 / self.signal.sample_rate_hz
    }

    /// Get configuration summary
    pub fn get_summary(&self) -> ConfigSummary {
        ConfigSummary {
            feature_set: self.feature_set,
            channel_count: self.signal.channel_count,
            sample_rate_hz: self.signal.sample_rate_hz,
            window_length: self.windowing.length,
            window_stride: self.windowing.stride,
        }
    }
}

/// Configuration summary for display/logging
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub feature_set: FeatureSetKind,
    pub channel_count: usize,
    pub sample_rate_hz: f32,
    pub window_length: usize,
    pub window_stride: usize,
}
