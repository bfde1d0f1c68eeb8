//! Cepstral coefficients with velocity and acceleration
//!
//! Unlike the windowed sets, rows are cepstral analysis frames over the
//! whole recording: the transform runs once with `n_fft` equal to the window
//! length and hops by `hop_length`.

use ndarray::{Array2, Array3, ArrayView2, Axis};
use tracing::debug;

use super::mfcc::{Mfcc, MfccParams};
use super::savgol::SavitzkyGolay;
use super::FeatureSet;
use crate::config::{FeatureConfig, FeatureSetKind};
use crate::error::{EmgErrorBuilder, EmgResult};

const BLOCK_PREFIXES: [&str; 3] = ["mfcc", "delta1_mfcc", "delta2_mfcc"];

/// Cepstral coefficients per frame, optionally followed by first and second
/// Savitzky-Golay derivatives along the frame axis
#[derive(Debug, Clone)]
pub struct CepstralDeltaExtractor {
    mfcc: Mfcc,
    /// Velocity and acceleration filters when deltas are enabled
    deltas: Option<(SavitzkyGolay, SavitzkyGolay)>,
}

impl CepstralDeltaExtractor {
    pub fn new(params: MfccParams, delta_width: usize, include_deltas: bool) -> EmgResult<Self> {
        let mfcc = Mfcc::new(params)?;
        let deltas = if include_deltas {
            Some((SavitzkyGolay::delta(delta_width, 1)?, SavitzkyGolay::delta(delta_width, 2)?))
        } else {
            None
        };
        Ok(Self { mfcc, deltas })
    }

    pub fn from_config(config: &FeatureConfig) -> EmgResult<Self> {
        let params = MfccParams::from_config(&config.cepstral, config.signal.sample_rate_hz, config.windowing.length);
        Self::new(params, config.cepstral.delta_width, config.cepstral.include_deltas)
    }

    pub fn includes_deltas(&self) -> bool {
        self.deltas.is_some()
    }

    pub fn mfcc(&self) -> &Mfcc {
        &self.mfcc
    }

    fn blocks(&self) -> usize {
        if self.includes_deltas() { 3 } else { 1 }
    }

    /// Base, velocity and acceleration as `(C, n_mfcc, frames)` arrays
    pub fn compute_blocks(&self, signal: ArrayView2<f32>) -> EmgResult<Vec<Array3<f32>>> {
        let base = self.mfcc.compute(signal);
        let Some((velocity, acceleration)) = &self.deltas else {
            return Ok(vec![base]);
        };

        let frames = base.len_of(Axis(2));
        if frames < velocity.width() {
            return Err(EmgErrorBuilder::new("cepstral_delta", "compute_blocks").invalid_parameter(
                "delta_width",
                velocity.width(),
                &format!("exceeds the {} cepstral frames available", frames),
            ));
        }

        let first = velocity.apply(base.view(), Axis(2))?;
        let second = acceleration.apply(base.view(), Axis(2))?;
        Ok(vec![base, first, second])
    }
}

impl FeatureSet for CepstralDeltaExtractor {
    fn kind(&self) -> FeatureSetKind {
        FeatureSetKind::CepstralDelta
    }

    fn feature_count(&self, channels: usize) -> usize {
        self.blocks() * self.mfcc.params().n_mfcc * channels
    }

    fn feature_names(&self, channels: usize) -> Vec<String> {
        let n_mfcc = self.mfcc.params().n_mfcc;
        BLOCK_PREFIXES[..self.blocks()]
            .iter()
            .flat_map(|prefix| {
                (0..n_mfcc).flat_map(move |k| (0..channels).map(move |c| format!("{}{}_ch{}", prefix, k, c)))
            })
            .collect()
    }

    /// One row per cepstral frame, `[base, velocity, acceleration]` with each
    /// block laid out coefficient-major then channel
    fn extract(&self, signal: ArrayView2<f32>) -> EmgResult<Array2<f32>> {
        let blocks = self.compute_blocks(signal)?;
        let channels = signal.ncols();
        let n_mfcc = self.mfcc.params().n_mfcc;
        let frames = self.mfcc.frame_count(signal.nrows());
        let block_width = n_mfcc * channels;

        let mut features = Array2::<f32>::zeros((frames, blocks.len() * block_width));
        for (b, block) in blocks.iter().enumerate() {
            for ((c, k, f), &value) in block.indexed_iter() {
                features[[f, b * block_width + k * channels + c]] = value;
            }
        }

        debug!(
            frames,
            channels,
            features = features.ncols(),
            deltas = self.includes_deltas(),
            "extracted cepstral delta features"
        );
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::s;

    fn noise(samples: usize, channels: usize) -> Array2<f32> {
        use rand::{rngs::StdRng, Rng, SeedableRng};
        let mut rng = StdRng::seed_from_u64(7);
        Array2::from_shape_fn((samples, channels), |_| rng.gen_range(-50.0..50.0))
    }

    fn config(hop_length: usize, include_deltas: bool) -> FeatureConfig {
        let mut config = FeatureConfig::default();
        config.cepstral.hop_length = hop_length;
        config.cepstral.include_deltas = include_deltas;
        config
    }

    #[test]
    fn test_shape_with_deltas() {
        let extractor = CepstralDeltaExtractor::from_config(&config(125, true)).unwrap();
        // 2000 + 250 padded samples: 1 + (2250 - 250) / 125 = 17 frames
        let features = extractor.extract(noise(2000, 8).view()).unwrap();
        assert_eq!(features.dim(), (17, 3 * 6 * 8));
        assert_eq!(extractor.feature_names(8).len(), 144);
        assert_eq!(extractor.feature_names(8)[48], "delta1_mfcc0_ch0");
    }

    #[test]
    fn test_shape_without_deltas() {
        let extractor = CepstralDeltaExtractor::from_config(&config(512, false)).unwrap();
        let features = extractor.extract(noise(1000, 8).view()).unwrap();
        assert_eq!(features.dim(), (2, 6 * 8));
        assert!(features.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_base_block_matches_transform() {
        let extractor = CepstralDeltaExtractor::from_config(&config(125, true)).unwrap();
        let signal = noise(1500, 2);
        let features = extractor.extract(signal.view()).unwrap();
        let coefficients = extractor.mfcc().compute(signal.view());
        assert_eq!(features[[3, 1]], coefficients[[1, 0, 3]]);
        assert_eq!(features[[5, 2 * 4 + 1]], coefficients[[1, 4, 5]]);
    }

    #[test]
    fn test_too_few_frames_for_deltas() {
        let extractor = CepstralDeltaExtractor::from_config(&config(512, true)).unwrap();
        let err = extractor.extract(noise(1000, 8).view()).unwrap_err();
        assert!(err.is_configuration());
        assert!(format!("{}", err).contains("2 cepstral frames"));
    }

    #[test]
    fn test_silence_has_zero_deltas() {
        let extractor = CepstralDeltaExtractor::from_config(&config(125, true)).unwrap();
        let features = extractor.extract(Array2::<f32>::zeros((2000, 4)).view()).unwrap();
        assert!(features.iter().all(|v| v.is_finite()));
        assert!(features.slice(s![.., 24..]).iter().all(|v| v.abs() < 1e-2));
    }

    #[test]
    fn test_even_delta_width_rejected() {
        let params = MfccParams::from_config(&Default::default(), 250.0, 250);
        assert!(CepstralDeltaExtractor::new(params.clone(), 8, true).is_err());
        assert!(CepstralDeltaExtractor::new(params, 8, false).is_ok());
    }
}
