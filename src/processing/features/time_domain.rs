//! Time domain feature extraction for EMG signals
//!
//! Every descriptor reduces a `(W, L, C)` window tensor along the sample
//! axis to a `(W, C)` array.

use ndarray::{s, Array2, Array3, ArrayView1, ArrayView2, ArrayView3, Axis};
use tracing::debug;

use super::FeatureSet;
use crate::config::{FeatureConfig, FeatureSetKind};
use crate::error::{EmgErrorBuilder, EmgResult};
use crate::processing::windowing::Windower;

/// Sign as -1, 0 or 1; unlike `f32::signum`, zero maps to zero
#[inline]
fn sign(x: f32) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

/// Mean absolute value
pub fn mav(windows: ArrayView3<f32>) -> Array2<f32> {
    windows.map_axis(Axis(1), |lane| {
        if lane.is_empty() {
            0.0
        } else {
            lane.iter().map(|x| x.abs()).sum::<f32>() / lane.len() as f32
        }
    })
}

/// Waveform length: total absolute first difference
pub fn wl(windows: ArrayView3<f32>) -> Array2<f32> {
    windows.map_axis(Axis(1), |lane| waveform_length(lane))
}

/// Zero crossings with `|Δx| >= threshold` and a sign change of `x`
pub fn zc(windows: ArrayView3<f32>, threshold: f32) -> Array2<u32> {
    windows.map_axis(Axis(1), |lane| zero_crossings(lane, threshold))
}

/// Slope sign changes with `|Δ²x| >= threshold` and a sign change of `Δx`
pub fn ssc(windows: ArrayView3<f32>, threshold: f32) -> Array2<u32> {
    windows.map_axis(Axis(1), |lane| slope_sign_changes(lane, threshold))
}

fn waveform_length(lane: ArrayView1<f32>) -> f32 {
    lane.iter()
        .zip(lane.iter().skip(1))
        .map(|(&prev, &next)| (next - prev).abs())
        .sum()
}

fn zero_crossings(lane: ArrayView1<f32>, threshold: f32) -> u32 {
    lane.iter()
        .zip(lane.iter().skip(1))
        .filter(|&(&prev, &next)| (next - prev).abs() >= threshold && sign(next) != sign(prev))
        .count() as u32
}

fn slope_sign_changes(lane: ArrayView1<f32>, threshold: f32) -> u32 {
    let slopes: Vec<f32> = lane.iter()
        .zip(lane.iter().skip(1))
        .map(|(&prev, &next)| next - prev)
        .collect();

    slopes.windows(2)
        .filter(|pair| (pair[1] - pair[0]).abs() >= threshold && sign(pair[1]) != sign(pair[0]))
        .count() as u32
}

/// Classic EMG descriptors for every window and channel
#[derive(Debug, Clone, PartialEq)]
pub struct TimeDomainFeatures {
    pub mean_absolute_value: Array2<f32>,
    pub waveform_length: Array2<f32>,
    pub zero_crossings: Array2<u32>,
    pub slope_sign_changes: Array2<u32>,
}

impl TimeDomainFeatures {
    /// `(W, 4·C)` matrix laid out as `[mav, wl, zc, ssc]`, C columns each
    pub fn to_matrix(&self) -> Array2<f32> {
        let (rows, channels) = self.mean_absolute_value.dim();
        let mut matrix = Array2::<f32>::zeros((rows, 4 * channels));

        matrix.slice_mut(s![.., 0..channels]).assign(&self.mean_absolute_value);
        matrix.slice_mut(s![.., channels..2 * channels]).assign(&self.waveform_length);
        matrix.slice_mut(s![.., 2 * channels..3 * channels])
            .assign(&self.zero_crossings.mapv(|v| v as f32));
        matrix.slice_mut(s![.., 3 * channels..4 * channels])
            .assign(&self.slope_sign_changes.mapv(|v| v as f32));
        matrix
    }
}

/// Time domain feature extractor
#[derive(Debug, Clone)]
pub struct TimeDomainExtractor {
    threshold: f32,  // Noise gate for zero crossings and slope sign changes
}

impl TimeDomainExtractor {
    pub fn new(threshold: f32) -> EmgResult<Self> {
        if !(threshold.is_finite() && threshold >= 0.0) {
            return Err(EmgErrorBuilder::new("time_domain", "new").invalid_parameter(
                "transition_threshold",
                threshold,
                "must be a non-negative finite number",
            ));
        }
        Ok(Self { threshold })
    }

    pub fn from_config(config: &FeatureConfig) -> EmgResult<Self> {
        Self::new(config.time_domain.transition_threshold)
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Extract time domain features from a window tensor
    pub fn extract(&self, windows: ArrayView3<f32>) -> TimeDomainFeatures {
        TimeDomainFeatures {
            mean_absolute_value: mav(windows),
            waveform_length: wl(windows),
            zero_crossings: zc(windows, self.threshold),
            slope_sign_changes: ssc(windows, self.threshold),
        }
    }
}

/// `[mav, wl, zc, ssc]` over sliding windows
#[derive(Debug, Clone)]
pub struct PrimitiveFeatureSet {
    windower: Windower,
    extractor: TimeDomainExtractor,
}

impl PrimitiveFeatureSet {
    pub fn new(windower: Windower, extractor: TimeDomainExtractor) -> EmgResult<Self> {
        windower.validate()?;
        Ok(Self { windower, extractor })
    }

    pub fn from_config(config: &FeatureConfig) -> EmgResult<Self> {
        Self::new(
            Windower::from_config(&config.windowing),
            TimeDomainExtractor::from_config(config)?,
        )
    }

    pub fn extract_windows(&self, windows: ArrayView3<f32>) -> Array2<f32> {
        self.extractor.extract(windows).to_matrix()
    }
}

impl FeatureSet for PrimitiveFeatureSet {
    fn kind(&self) -> FeatureSetKind {
        FeatureSetKind::Primitives
    }

    fn feature_count(&self, channels: usize) -> usize {
        4 * channels
    }

    fn feature_names(&self, channels: usize) -> Vec<String> {
        ["mav", "wl", "zc", "ssc"]
            .iter()
            .flat_map(|name| (0..channels).map(move |c| format!("{}_ch{}", name, c)))
            .collect()
    }

    fn extract(&self, signal: ArrayView2<f32>) -> EmgResult<Array2<f32>> {
        let windows: Array3<f32> = self.windower.windows(signal)?;
        let features = self.extract_windows(windows.view());
        debug!(windows = windows.len_of(Axis(0)), features = features.ncols(), "extracted primitive features");
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array3};

    fn single_lane(values: &[f32]) -> Array3<f32> {
        Array3::from_shape_vec((1, values.len(), 1), values.to_vec()).unwrap()
    }

    #[test]
    fn test_mav_and_wl() {
        let windows = single_lane(&[1.0, -2.0, 3.0, -4.0]);
        assert!((mav(windows.view())[[0, 0]] - 2.5).abs() < 1e-6);
        assert!((wl(windows.view())[[0, 0]] - 15.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_crossing_gate() {
        // Steps of 30, 30, 5 (below gate), 40
        let windows = single_lane(&[15.0, -15.0, 15.0, 10.0, -30.0]);
        assert_eq!(zc(windows.view(), 20.0)[[0, 0]], 3);
        assert_eq!(zc(windows.view(), 35.0)[[0, 0]], 1);
    }

    #[test]
    fn test_zero_is_its_own_sign() {
        let windows = single_lane(&[0.0, 50.0, 0.0]);
        // 0 -> + and + -> 0 both change sign
        assert_eq!(zc(windows.view(), 20.0)[[0, 0]], 2);
    }

    #[test]
    fn test_slope_sign_changes() {
        // Slopes: +30, -30, +30; second differences: -60, +60
        let windows = single_lane(&[0.0, 30.0, 0.0, 30.0]);
        assert_eq!(ssc(windows.view(), 20.0)[[0, 0]], 2);
        assert_eq!(ssc(windows.view(), 61.0)[[0, 0]], 0);
    }

    #[test]
    fn test_short_windows() {
        let windows = single_lane(&[5.0]);
        assert_eq!(wl(windows.view())[[0, 0]], 0.0);
        assert_eq!(zc(windows.view(), 0.0)[[0, 0]], 0);
        assert_eq!(ssc(windows.view(), 0.0)[[0, 0]], 0);
    }

    #[test]
    fn test_shapes() {
        let windows = Array3::<f32>::ones((7, 250, 8));
        let features = TimeDomainExtractor::new(20.0).unwrap().extract(windows.view());
        assert_eq!(features.mean_absolute_value.dim(), (7, 8));
        assert_eq!(features.waveform_length.dim(), (7, 8));
        assert_eq!(features.zero_crossings.dim(), (7, 8));
        assert_eq!(features.slope_sign_changes.dim(), (7, 8));
        assert_eq!(features.to_matrix().dim(), (7, 32));
    }

    #[test]
    fn test_matrix_layout() {
        let lane = Array1::from(vec![0.0f32, 40.0, -40.0, 40.0]);
        let mut windows = Array3::<f32>::zeros((1, 4, 2));
        windows.index_axis_mut(Axis(2), 1).row_mut(0).assign(&lane);

        let matrix = TimeDomainExtractor::new(20.0).unwrap().extract(windows.view()).to_matrix();
        assert_eq!(matrix[[0, 0]], 0.0); // mav ch0
        assert_eq!(matrix[[0, 1]], 30.0); // mav ch1
        assert_eq!(matrix[[0, 3]], 200.0); // wl ch1
        assert_eq!(matrix[[0, 5]], 3.0); // zc ch1
        assert_eq!(matrix[[0, 7]], 2.0); // ssc ch1
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(TimeDomainExtractor::new(-1.0).is_err());
        assert!(TimeDomainExtractor::new(f32::NAN).is_err());
    }

    #[test]
    fn test_feature_names() {
        let set = PrimitiveFeatureSet::from_config(&FeatureConfig::default()).unwrap();
        let names = set.feature_names(2);
        assert_eq!(names, vec!["mav_ch0", "mav_ch1", "wl_ch0", "wl_ch1", "zc_ch0", "zc_ch1", "ssc_ch0", "ssc_ch1"]);
    }
}
