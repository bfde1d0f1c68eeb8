// src/processing/pipeline.rs
//! Offline feature pipeline
//!
//! Stages run in a fixed order: channel mean removal, common-mode removal
//! (each gated by [`PipelineConfig`]), then the configured feature set. The
//! pipeline holds configuration only, so runs on identical input produce
//! identical output.

use ndarray::{Array1, Array2, ArrayView2};
use tracing::{debug, info, warn};

use super::features::FeatureExtractor;
use super::preprocess::{activity_signal, remove_common_mode, remove_mean};
use crate::config::{FeatureConfig, FeatureSetKind, PipelineConfig};
use crate::error::EmgResult;

/// Feature matrix together with its column names
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureOutput {
    pub features: Array2<f32>,
    pub feature_names: Vec<String>,
}

impl FeatureOutput {
    /// Number of rows (windows or frames)
    pub fn rows(&self) -> usize {
        self.features.nrows()
    }

    /// Column for a named feature
    pub fn column(&self, name: &str) -> Option<Array1<f32>> {
        self.feature_names
            .iter()
            .position(|n| n == name)
            .map(|i| self.features.column(i).to_owned())
    }

    /// Row-major copy for serialization
    pub fn to_rows(&self) -> Vec<Vec<f32>> {
        self.features.outer_iter().map(|row| row.to_vec()).collect()
    }
}

/// Preprocessing followed by feature extraction
#[derive(Debug)]
pub struct FeaturePipeline {
    config: FeatureConfig,
    extractor: FeatureExtractor,
}

impl FeaturePipeline {
    pub fn new(config: FeatureConfig) -> EmgResult<Self> {
        let extractor = FeatureExtractor::new(&config)?;
        info!(
            feature_set = config.feature_set.name(),
            channels = config.signal.channel_count,
            window_length = config.windowing.length,
            window_stride = config.windowing.stride,
            "feature pipeline ready"
        );
        Ok(Self { config, extractor })
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    pub fn pipeline_config(&self) -> &PipelineConfig {
        &self.config.pipeline
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Apply the enabled preprocessing steps
    pub fn preprocess(&self, signal: ArrayView2<f32>) -> Array2<f32> {
        let mut current = signal.to_owned();
        if self.config.pipeline.remove_mean {
            current = remove_mean(current.view());
        }
        if self.config.pipeline.remove_common_mode {
            current = remove_common_mode(current.view());
        }
        current
    }

    /// Run preprocessing and feature extraction on a `(T, C)` signal
    pub fn run(&self, signal: ArrayView2<f32>) -> EmgResult<FeatureOutput> {
        let prepared = self.preprocess(signal);
        self.report_coverage(prepared.nrows());

        let features = self.extractor.extract(prepared.view())?;
        let feature_names = self.extractor.feature_names();
        debug!(rows = features.nrows(), features = features.ncols(), "pipeline run complete");

        Ok(FeatureOutput { features, feature_names })
    }

    /// Activity trace over the configured leading channels
    pub fn activity(&self, signal: ArrayView2<f32>) -> EmgResult<Array1<f32>> {
        let prepared = self.preprocess(signal);
        activity_signal(
            prepared.view(),
            0..self.config.envelope.activity_channels,
            self.config.envelope.window_size,
        )
    }

    fn report_coverage(&self, samples: usize) {
        // Frame-wise cepstral features cover the whole recording
        if self.config.feature_set == FeatureSetKind::CepstralDelta {
            return;
        }
        let length = self.config.windowing.length;
        let stride = self.config.windowing.stride;
        if samples < length {
            return;
        }
        let count = (samples - length) / stride + 1;
        let dropped = samples - ((count - 1) * stride + length);
        if dropped > 0 {
            warn!(samples, dropped, "trailing samples do not fill a window and are ignored");
        }
    }
}
