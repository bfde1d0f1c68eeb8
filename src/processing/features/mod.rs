//! EMG feature extraction
//!
//! Four families share one interface:
//! - Primitives: `[mav, wl, zc, ssc]` per window
//! - Baseline/residual (F1): smoothed baseline and rectified residual statistics
//! - Cepstral (F2): `[mav, wl]` plus per-window cepstral coefficients
//! - Cepstral delta (F3): frame-wise cepstral coefficients with derivatives

pub mod baseline_residual;
pub mod cepstral;
pub mod cepstral_delta;
pub mod mfcc;
pub mod savgol;
pub mod time_domain;

use ndarray::{Array2, ArrayView2};

use crate::config::{FeatureConfig, FeatureSetKind};
use crate::error::{EmgErrorBuilder, EmgResult};

pub use baseline_residual::BaselineResidualExtractor;
pub use cepstral::CepstralExtractor;
pub use cepstral_delta::CepstralDeltaExtractor;
pub use mfcc::{Mfcc, MfccParams};
pub use savgol::SavitzkyGolay;
pub use time_domain::{PrimitiveFeatureSet, TimeDomainExtractor, TimeDomainFeatures};

/// A family of features computed from a `(T, C)` signal
pub trait FeatureSet: Send + Sync + std::fmt::Debug {
    fn kind(&self) -> FeatureSetKind;

    /// Columns produced for `channels` input channels
    fn feature_count(&self, channels: usize) -> usize;

    /// Column names, in output order
    fn feature_names(&self, channels: usize) -> Vec<String>;

    /// Feature matrix, one row per window (or frame) and one column per feature
    fn extract(&self, signal: ArrayView2<f32>) -> EmgResult<Array2<f32>>;
}

/// Build the feature set selected by `config.feature_set`
///
/// The configuration is not validated here; see [`FeatureExtractor::new`].
pub fn build_feature_set(config: &FeatureConfig) -> EmgResult<Box<dyn FeatureSet>> {
    Ok(match config.feature_set {
        FeatureSetKind::Primitives => Box::new(PrimitiveFeatureSet::from_config(config)?),
        FeatureSetKind::BaselineResidual => Box::new(BaselineResidualExtractor::from_config(config)?),
        FeatureSetKind::Cepstral => Box::new(CepstralExtractor::from_config(config)?),
        FeatureSetKind::CepstralDelta => Box::new(CepstralDeltaExtractor::from_config(config)?),
    })
}

/// Main feature extractor: validated configuration plus the selected feature set
#[derive(Debug)]
pub struct FeatureExtractor {
    config: FeatureConfig,
    feature_set: Box<dyn FeatureSet>,
}

impl FeatureExtractor {
    pub fn new(config: &FeatureConfig) -> EmgResult<Self> {
        config.validate()?;
        let feature_set = build_feature_set(config)?;
        Ok(Self {
            config: config.clone(),
            feature_set,
        })
    }

    /// Extract features from a `(T, C)` signal with the configured channel count
    pub fn extract(&self, signal: ArrayView2<f32>) -> EmgResult<Array2<f32>> {
        let expected = self.config.signal.channel_count;
        if signal.ncols() != expected {
            return Err(EmgErrorBuilder::new("feature_extractor", "extract").shape_mismatch(
                "signal",
                "channel count does not match configuration",
                expected,
                signal.ncols(),
            ));
        }
        self.feature_set.extract(signal)
    }

    pub fn kind(&self) -> FeatureSetKind {
        self.feature_set.kind()
    }

    /// Columns produced for the configured channel count
    pub fn feature_count(&self) -> usize {
        self.feature_set.feature_count(self.config.signal.channel_count)
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.feature_set.feature_names(self.config.signal.channel_count)
    }

    pub fn feature_set(&self) -> &dyn FeatureSet {
        self.feature_set.as_ref()
    }

    /// Get the current configuration
    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }
}
