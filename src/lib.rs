//! EMG-Features: windowing and feature extraction for multi-channel surface EMG
//!
//! Recordings are `(samples, channels)` arrays of `f32`. The library provides:
//!
//! - Sliding-window segmentation into `(windows, length, channels)` tensors
//! - Classic time domain descriptors (MAV, WL, ZC, SSC)
//! - A baseline/residual feature set built on double moving-average smoothing
//! - Mel-frequency cepstral features, windowed or frame-wise with derivatives
//! - Moving RMS envelopes and a muscle activity trace
//! - TOML configuration with validated defaults
//!
//! # Quick Start
//!
//! ```rust
//! use emg_features::config::{FeatureConfig, FeatureSetKind};
//! use emg_features::processing::FeaturePipeline;
//! use ndarray::Array2;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FeatureConfig {
//!     feature_set: FeatureSetKind::BaselineResidual,
//!     ..FeatureConfig::default()
//! };
//! let pipeline = FeaturePipeline::new(config)?;
//!
//! let signal = Array2::from_shape_fn((1000, 8), |(t, c)| ((t + c) as f32 * 0.1).sin());
//! let output = pipeline.run(signal.view())?;
//! assert_eq!(output.features.dim(), (7, 40));
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod error;
pub mod processing;

// Re-export commonly used types for convenience
pub use config::{ConfigLoader, FeatureConfig, FeatureSetKind};
pub use error::{EmgError, EmgResult};
pub use processing::{
    FeatureExtractor, FeatureOutput, FeaturePipeline, FeatureSet, Windower,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: "Windowing and feature extraction for multi-channel surface EMG".to_string(),
        feature_sets: [
            FeatureSetKind::Primitives,
            FeatureSetKind::BaselineResidual,
            FeatureSetKind::Cepstral,
            FeatureSetKind::CepstralDelta,
        ]
        .iter()
        .map(|kind| kind.name().to_string())
        .collect(),
    }
}

/// Library version information
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// Library name
    pub name: String,
    /// Version string
    pub version: String,
    /// Description
    pub description: String,
    /// Available feature sets
    pub feature_sets: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        let info = version_info();
        assert_eq!(info.name, NAME);
        assert_eq!(info.version, VERSION);
        assert_eq!(info.feature_sets.len(), 4);
        assert!(info.feature_sets.contains(&"cepstral_delta".to_string()));
    }

    #[test]
    fn test_constants() {
        assert!(!VERSION.is_empty());
        assert!(!NAME.is_empty());
    }
}
