//! Windowed cepstral feature set
//!
//! Each window contributes its mean absolute value and waveform length per
//! channel followed by the flattened cepstral coefficients of that window.

use ndarray::{s, Array2, ArrayView2, ArrayView3, Axis};
use tracing::debug;

use super::mfcc::{Mfcc, MfccParams};
use super::time_domain::{mav, wl};
use super::FeatureSet;
use crate::config::{FeatureConfig, FeatureSetKind};
use crate::error::EmgResult;
use crate::processing::windowing::Windower;

/// `[mav, wl, mfcc]` per window, the cepstral transform taken with `n_fft`
/// equal to the window length
#[derive(Debug, Clone)]
pub struct CepstralExtractor {
    windower: Windower,
    mfcc: Mfcc,
}

impl CepstralExtractor {
    pub fn new(windower: Windower, params: MfccParams) -> EmgResult<Self> {
        windower.validate()?;
        let params = MfccParams { n_fft: windower.length(), ..params };
        let mfcc = Mfcc::new(params)?;
        Ok(Self { windower, mfcc })
    }

    pub fn from_config(config: &FeatureConfig) -> EmgResult<Self> {
        let windower = Windower::from_config(&config.windowing);
        let params = MfccParams::from_config(&config.cepstral, config.signal.sample_rate_hz, windower.length());
        Self::new(windower, params)
    }

    /// Cepstral frames per window
    pub fn frames_per_window(&self) -> usize {
        self.mfcc.frame_count(self.windower.length())
    }

    pub fn mfcc(&self) -> &Mfcc {
        &self.mfcc
    }

    /// Features for a `(W, L, C)` window tensor
    pub fn extract_windows(&self, windows: ArrayView3<f32>) -> Array2<f32> {
        let (count, length, channels) = windows.dim();
        let n_mfcc = self.mfcc.params().n_mfcc;
        let frames = self.mfcc.frame_count(length);
        let mut features = Array2::<f32>::zeros((count, channels * (2 + n_mfcc * frames)));

        features.slice_mut(s![.., 0..channels]).assign(&mav(windows));
        features.slice_mut(s![.., channels..2 * channels]).assign(&wl(windows));

        for (w, window) in windows.axis_iter(Axis(0)).enumerate() {
            // (C, n_mfcc, frames) -> coefficient, frame, channel
            let coefficients = self.mfcc.compute(window);
            let permuted = coefficients.view().permuted_axes([1, 2, 0]);
            let mut row = features.row_mut(w);
            for (slot, value) in row.slice_mut(s![2 * channels..]).iter_mut().zip(permuted.iter()) {
                *slot = *value;
            }
        }

        features
    }
}

impl FeatureSet for CepstralExtractor {
    fn kind(&self) -> FeatureSetKind {
        FeatureSetKind::Cepstral
    }

    fn feature_count(&self, channels: usize) -> usize {
        channels * (2 + self.mfcc.params().n_mfcc * self.frames_per_window())
    }

    fn feature_names(&self, channels: usize) -> Vec<String> {
        let mut names = Vec::with_capacity(self.feature_count(channels));
        names.extend((0..channels).map(|c| format!("mav_ch{}", c)));
        names.extend((0..channels).map(|c| format!("wl_ch{}", c)));
        for k in 0..self.mfcc.params().n_mfcc {
            for f in 0..self.frames_per_window() {
                names.extend((0..channels).map(|c| format!("mfcc{}_f{}_ch{}", k, f, c)));
            }
        }
        names
    }

    fn extract(&self, signal: ArrayView2<f32>) -> EmgResult<Array2<f32>> {
        let windows = self.windower.windows(signal)?;
        let features = self.extract_windows(windows.view());
        debug!(
            windows = features.nrows(),
            channels = signal.ncols(),
            features = features.ncols(),
            "extracted cepstral features"
        );
        Ok(features)
    }
}
