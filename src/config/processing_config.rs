// src/config/processing_config.rs
//! Feature extraction configuration sections

use serde::{Deserialize, Serialize};

use crate::error::{EmgErrorBuilder, EmgResult};

/// Signal layout supplied by the caller alongside the raw array
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SignalConfig {
    #[serde(default = "defaults::channel_count")]
    pub channel_count: usize,

    #[serde(default = "defaults::sample_rate_hz")]
    pub sample_rate_hz: f32,
}

/// Sliding window layout
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WindowingConfig {
    /// Samples per window
    #[serde(default = "defaults::window_length")]
    pub length: usize,

    /// Samples between consecutive window starts
    #[serde(default = "defaults::window_stride")]
    pub stride: usize,

    #[serde(default = "defaults::max_window_elements")]
    pub max_window_elements: usize,
}

/// Time-domain feature parameters
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TimeDomainConfig {
    /// Moving average width used by the baseline/residual feature set
    #[serde(default = "defaults::smoothing_width")]
    pub smoothing_width: usize,

    /// Minimum step for a zero crossing or slope sign change to count
    #[serde(default = "defaults::transition_threshold")]
    pub transition_threshold: f32,
}

/// Cepstral transform parameters
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CepstralConfig {
    #[serde(default = "defaults::n_mfcc")]
    pub n_mfcc: usize,

    #[serde(default = "defaults::n_mels")]
    pub n_mels: usize,

    #[serde(default = "defaults::hop_length")]
    pub hop_length: usize,

    /// Dynamic range kept below the loudest mel bin; `None` keeps everything
    ///
    /// Written as a number of dB, or `false` to disable the floor.
    #[serde(default = "defaults::top_db", with = "top_db_format")]
    pub top_db: Option<f32>,

    /// Frames spanned by the derivative filter
    #[serde(default = "defaults::delta_width")]
    pub delta_width: usize,

    /// Append velocity and acceleration blocks to the derivative feature set
    #[serde(default = "defaults::include_deltas")]
    pub include_deltas: bool,
}

/// Moving RMS envelope parameters
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EnvelopeConfig {
    #[serde(default = "defaults::rms_window_size")]
    pub window_size: usize,

    #[serde(default = "defaults::activity_channels")]
    pub activity_channels: usize,
}

/// Signal conditioning applied before feature extraction
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct PipelineConfig {
    #[serde(default)]
    pub remove_mean: bool,

    #[serde(default)]
    pub remove_common_mode: bool,
}

/// Feature family produced by the extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSetKind {
    /// `[mav, wl, zc, ssc]` per channel
    Primitives,
    /// Mean-removed, double-smoothed baseline and residual statistics
    BaselineResidual,
    /// mav, wl and per-window cepstral coefficients
    Cepstral,
    /// Cepstral coefficients over the whole signal with derivatives
    CepstralDelta,
}

impl FeatureSetKind {
    pub fn name(&self) -> &'static str {
        match self {
            FeatureSetKind::Primitives => "primitives",
            FeatureSetKind::BaselineResidual => "baseline_residual",
            FeatureSetKind::Cepstral => "cepstral",
            FeatureSetKind::CepstralDelta => "cepstral_delta",
        }
    }
}

impl std::str::FromStr for FeatureSetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primitives" => Ok(FeatureSetKind::Primitives),
            "baseline_residual" | "f1" => Ok(FeatureSetKind::BaselineResidual),
            "cepstral" | "f2" => Ok(FeatureSetKind::Cepstral),
            "cepstral_delta" | "f3" => Ok(FeatureSetKind::CepstralDelta),
            other => Err(format!("unknown feature set '{}'", other)),
        }
    }
}

/// TOML form of the dynamic range floor: a number, or `false` for none
mod top_db_format {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    #[serde(untagged)]
    enum TopDb {
        Enabled(bool),
        Range(f32),
    }

    pub fn serialize<S: Serializer>(value: &Option<f32>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(range) => TopDb::Range(*range),
            None => TopDb::Enabled(false),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f32>, D::Error> {
        Ok(match TopDb::deserialize(deserializer)? {
            TopDb::Range(range) => Some(range),
            TopDb::Enabled(true) => super::defaults::top_db(),
            TopDb::Enabled(false) => None,
        })
    }
}

/// Default value providers using constants
pub(crate) mod defaults {
    use crate::config::constants::*;

    pub fn channel_count() -> usize { signal::DEFAULT_CHANNEL_COUNT }
    pub fn sample_rate_hz() -> f32 { signal::DEFAULT_SAMPLE_RATE_HZ }

    pub fn window_length() -> usize { windowing::DEFAULT_WINDOW_LENGTH }
    pub fn window_stride() -> usize { windowing::DEFAULT_WINDOW_STRIDE }
    pub fn max_window_elements() -> usize { windowing::DEFAULT_MAX_WINDOW_ELEMENTS }

    pub fn smoothing_width() -> usize { time_domain::DEFAULT_SMOOTHING_WIDTH }
    pub fn transition_threshold() -> f32 { time_domain::DEFAULT_TRANSITION_THRESHOLD }

    pub fn n_mfcc() -> usize { cepstral::DEFAULT_N_MFCC }
    pub fn n_mels() -> usize { cepstral::DEFAULT_N_MELS }
    pub fn hop_length() -> usize { cepstral::DEFAULT_HOP_LENGTH }
    pub fn top_db() -> Option<f32> { Some(cepstral::DEFAULT_TOP_DB) }
    pub fn delta_width() -> usize { cepstral::DEFAULT_DELTA_WIDTH }
    pub fn include_deltas() -> bool { true }

    pub fn rms_window_size() -> usize { envelope::DEFAULT_RMS_WINDOW_SIZE }
    pub fn activity_channels() -> usize { envelope::DEFAULT_ACTIVITY_CHANNELS }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            channel_count: defaults::channel_count(),
            sample_rate_hz: defaults::sample_rate_hz(),
        }
    }
}

impl Default for WindowingConfig {
    fn default() -> Self {
        Self {
            length: defaults::window_length(),
            stride: defaults::window_stride(),
            max_window_elements: defaults::max_window_elements(),
        }
    }
}

impl Default for TimeDomainConfig {
    fn default() -> Self {
        Self {
            smoothing_width: defaults::smoothing_width(),
            transition_threshold: defaults::transition_threshold(),
        }
    }
}

impl Default for CepstralConfig {
    fn default() -> Self {
        Self {
            n_mfcc: defaults::n_mfcc(),
            n_mels: defaults::n_mels(),
            hop_length: defaults::hop_length(),
            top_db: defaults::top_db(),
            delta_width: defaults::delta_width(),
            include_deltas: defaults::include_deltas(),
        }
    }
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            window_size: defaults::rms_window_size(),
            activity_channels: defaults::activity_channels(),
        }
    }
}

impl Default for FeatureSetKind {
    fn default() -> Self {
        FeatureSetKind::BaselineResidual
    }
}

fn err(operation: &str) -> EmgErrorBuilder {
    EmgErrorBuilder::new("config", operation)
}

impl SignalConfig {
    pub fn validate(&self) -> EmgResult<()> {
        use crate::config::constants::signal::MAX_CHANNEL_COUNT;

        if self.channel_count == 0 || self.channel_count > MAX_CHANNEL_COUNT {
            return Err(err("validate_signal").invalid_parameter(
                "signal.channel_count",
                self.channel_count,
                &format!("must be between 1 and {}", MAX_CHANNEL_COUNT),
            ));
        }
        if !(self.sample_rate_hz.is_finite() && self.sample_rate_hz > 0.0) {
            return Err(err("validate_signal").invalid_parameter(
                "signal.sample_rate_hz",
                self.sample_rate_hz,
                "must be a positive finite number",
            ));
        }
        Ok(())
    }
}

impl WindowingConfig {
    pub fn validate(&self) -> EmgResult<()> {
        if self.length == 0 {
            return Err(err("validate_windowing").invalid_parameter("windowing.length", self.length, "must be at least 1"));
        }
        if self.stride == 0 {
            return Err(err("validate_windowing").invalid_parameter("windowing.stride", self.stride, "must be at least 1"));
        }
        if self.max_window_elements == 0 {
            return Err(err("validate_windowing").invalid_parameter(
                "windowing.max_window_elements",
                self.max_window_elements,
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

impl TimeDomainConfig {
    pub fn validate(&self) -> EmgResult<()> {
        if self.smoothing_width == 0 || self.smoothing_width % 2 == 0 {
            return Err(err("validate_time_domain").invalid_parameter(
                "time_domain.smoothing_width",
                self.smoothing_width,
                "must be odd so the smoothed signal keeps the window length",
            ));
        }
        if !(self.transition_threshold.is_finite() && self.transition_threshold >= 0.0) {
            return Err(err("validate_time_domain").invalid_parameter(
                "time_domain.transition_threshold",
                self.transition_threshold,
                "must be a non-negative finite number",
            ));
        }
        Ok(())
    }
}

impl CepstralConfig {
    pub fn validate(&self) -> EmgResult<()> {
        if self.n_mels == 0 {
            return Err(err("validate_cepstral").invalid_parameter("cepstral.n_mels", self.n_mels, "must be at least 1"));
        }
        if self.n_mfcc == 0 || self.n_mfcc > self.n_mels {
            return Err(err("validate_cepstral").invalid_parameter(
                "cepstral.n_mfcc",
                self.n_mfcc,
                &format!("must be between 1 and n_mels ({})", self.n_mels),
            ));
        }
        if self.hop_length == 0 {
            return Err(err("validate_cepstral").invalid_parameter("cepstral.hop_length", self.hop_length, "must be at least 1"));
        }
        if let Some(top_db) = self.top_db {
            if !(top_db.is_finite() && top_db >= 0.0) {
                return Err(err("validate_cepstral").invalid_parameter(
                    "cepstral.top_db",
                    top_db,
                    "must be a non-negative finite number",
                ));
            }
        }
        if self.include_deltas && (self.delta_width < 3 || self.delta_width % 2 == 0) {
            return Err(err("validate_cepstral").invalid_parameter(
                "cepstral.delta_width",
                self.delta_width,
                "must be an odd number of at least 3",
            ));
        }
        Ok(())
    }
}

impl EnvelopeConfig {
    pub fn validate(&self, channel_count: usize) -> EmgResult<()> {
        if self.window_size == 0 {
            return Err(err("validate_envelope").invalid_parameter("envelope.window_size", self.window_size, "must be at least 1"));
        }
        if self.activity_channels == 0 || self.activity_channels > channel_count {
            return Err(err("validate_envelope").invalid_parameter(
                "envelope.activity_channels",
                self.activity_channels,
                &format!("must be between 1 and signal.channel_count ({})", channel_count),
            ));
        }
        Ok(())
    }
}
