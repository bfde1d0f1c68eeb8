//! Baseline/residual time-domain feature set
//!
//! Each window is mean-removed and smoothed twice with a centred moving
//! average. The smoothed signal is the low-frequency baseline `w`; the
//! rectified difference `r = |x - w|` carries the high-frequency activity.
//! Per channel the set emits `[x̄, w̄, r̄, P_w, P_r]`, each block spanning
//! all channels, where powers are normalized by the window duration in
//! seconds so they do not depend on the sample rate.

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, ArrayView3, Axis};
use tracing::debug;

use super::FeatureSet;
use crate::config::{FeatureConfig, FeatureSetKind};
use crate::error::{EmgErrorBuilder, EmgResult};
use crate::processing::windowing::Windower;

/// Statistics emitted per channel, in output order
pub const BASELINE_RESIDUAL_STATISTICS: [&str; 5] = ["x_bar", "w_bar", "r_bar", "p_w", "p_r"];

/// Centred moving average of odd width `n`, zero-padded by `n / 2` at each end
///
/// The output keeps the input length; near the edges the missing samples
/// count as zeros.
pub fn moving_average(x: ArrayView1<f32>, n: usize) -> Array1<f32> {
    let half = n / 2;
    let len = x.len();

    // cumulative[i] = sum of padded[0..i]
    let mut cumulative = Vec::with_capacity(len + 2 * half + 1);
    cumulative.push(0.0f64);
    let padded = std::iter::repeat(0.0f32)
        .take(half)
        .chain(x.iter().copied())
        .chain(std::iter::repeat(0.0f32).take(half));
    let mut running = 0.0f64;
    for value in padded {
        running += value as f64;
        cumulative.push(running);
    }

    (0..len)
        .map(|i| ((cumulative[i + n] - cumulative[i]) / n as f64) as f32)
        .collect()
}

/// Double moving average baseline and rectified residual statistics
#[derive(Debug, Clone)]
pub struct BaselineResidualExtractor {
    windower: Windower,
    smoothing_width: usize,
    sample_rate_hz: f32,
}

impl BaselineResidualExtractor {
    pub fn new(windower: Windower, smoothing_width: usize, sample_rate_hz: f32) -> EmgResult<Self> {
        windower.validate()?;
        let err = || EmgErrorBuilder::new("baseline_residual", "new");
        if smoothing_width == 0 || smoothing_width % 2 == 0 {
            return Err(err().invalid_parameter(
                "smoothing_width",
                smoothing_width,
                "must be odd so the smoothed signal keeps the window length",
            ));
        }
        if !(sample_rate_hz.is_finite() && sample_rate_hz > 0.0) {
            return Err(err().invalid_parameter("sample_rate_hz", sample_rate_hz, "must be a positive finite number"));
        }

        Ok(Self {
            windower,
            smoothing_width,
            sample_rate_hz,
        })
    }

    pub fn from_config(config: &FeatureConfig) -> EmgResult<Self> {
        Self::new(
            Windower::from_config(&config.windowing),
            config.time_domain.smoothing_width,
            config.signal.sample_rate_hz,
        )
    }

    /// Features for a `(W, L, C)` window tensor, shape `(W, 5·C)`
    pub fn extract_windows(&self, windows: ArrayView3<f32>) -> Array2<f32> {
        let (count, length, channels) = windows.dim();
        let mut features = Array2::<f32>::zeros((count, 5 * channels));
        if length == 0 {
            return features;
        }

        let duration_s = length as f32 / self.sample_rate_hz;
        for (w, window) in windows.axis_iter(Axis(0)).enumerate() {
            for (c, lane) in window.axis_iter(Axis(1)).enumerate() {
                let stats = self.channel_statistics(lane, duration_s);
                for (k, value) in stats.iter().enumerate() {
                    features[[w, k * channels + c]] = *value;
                }
            }
        }

        features
    }

    fn channel_statistics(&self, lane: ArrayView1<f32>, duration_s: f32) -> [f32; 5] {
        let n = lane.len() as f32;
        let mean = lane.sum() / n;
        let centered = lane.mapv(|v| v - mean);

        let smoothed = moving_average(centered.view(), self.smoothing_width);
        let baseline = moving_average(smoothed.view(), self.smoothing_width);
        let rectified = (&centered - &baseline).mapv(f32::abs);

        let x_bar = centered.sum() / n;
        let w_bar = baseline.sum() / n;
        let r_bar = rectified.sum() / n;
        let p_w = baseline.iter().map(|v| v * v).sum::<f32>() / duration_s;
        let p_r = rectified.iter().map(|v| v * v).sum::<f32>() / duration_s;

        [x_bar, w_bar, r_bar, p_w, p_r]
    }
}

impl FeatureSet for BaselineResidualExtractor {
    fn kind(&self) -> FeatureSetKind {
        FeatureSetKind::BaselineResidual
    }

    fn feature_count(&self, channels: usize) -> usize {
        BASELINE_RESIDUAL_STATISTICS.len() * channels
    }

    fn feature_names(&self, channels: usize) -> Vec<String> {
        BASELINE_RESIDUAL_STATISTICS
            .iter()
            .flat_map(|name| (0..channels).map(move |c| format!("{}_ch{}", name, c)))
            .collect()
    }

    fn extract(&self, signal: ArrayView2<f32>) -> EmgResult<Array2<f32>> {
        let windows = self.windower.windows(signal)?;
        let features = self.extract_windows(windows.view());
        debug!(
            windows = features.nrows(),
            channels = signal.ncols(),
            features = features.ncols(),
            "extracted baseline/residual features"
        );
        Ok(features)
    }
}

/// Convenience view of one statistic block, `(W, C)`
pub fn statistic_block(features: ArrayView2<f32>, statistic: usize, channels: usize) -> ArrayView2<f32> {
    features.slice_move(s![.., statistic * channels..(statistic + 1) * channels])
}
