// src/processing/preprocess.rs
//! Whole-recording preprocessing steps
//!
//! All functions take a `(T, C)` signal and return a new array.

use std::ops::Range;

use ndarray::{s, Array1, Array2, ArrayView2, Axis};
use tracing::trace;

use super::envelope::rms_envelope;
use crate::error::{EmgErrorBuilder, EmgResult};

/// Subtract each channel's mean over the whole recording
pub fn remove_mean(signal: ArrayView2<f32>) -> Array2<f32> {
    match signal.mean_axis(Axis(0)) {
        Some(means) => &signal - &means,
        None => signal.to_owned(),
    }
}

/// Subtract the per-sample mean across channels
pub fn remove_common_mode(signal: ArrayView2<f32>) -> Array2<f32> {
    match signal.mean_axis(Axis(1)) {
        Some(common) => &signal - &common.insert_axis(Axis(1)),
        None => signal.to_owned(),
    }
}

/// Muscle activity trace: first difference of the summed RMS envelopes of
/// `channels`
///
/// The result has `T - 1` samples and is empty for recordings shorter than
/// two samples.
pub fn activity_signal(signal: ArrayView2<f32>, channels: Range<usize>, window_size: usize) -> EmgResult<Array1<f32>> {
    if channels.is_empty() || channels.end > signal.ncols() {
        return Err(EmgErrorBuilder::new("preprocess", "activity_signal").shape_mismatch(
            "channel range",
            "must be a non-empty range within the signal's channels",
            format!("within 0..{}", signal.ncols()),
            format!("{:?}", channels),
        ));
    }

    let envelope = rms_envelope(signal.slice(s![.., channels.clone()]), window_size)?;
    let summed = envelope.sum_axis(Axis(1));
    let activity: Array1<f32> = summed
        .iter()
        .zip(summed.iter().skip(1))
        .map(|(&prev, &next)| next - prev)
        .collect();

    trace!(samples = signal.nrows(), channels = ?channels, window_size, "computed activity signal");
    Ok(activity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_remove_mean() {
        let signal = array![[1.0f32, 10.0], [3.0, 20.0], [5.0, 30.0]];
        let centered = remove_mean(signal.view());
        assert_eq!(centered, array![[-2.0f32, -10.0], [0.0, 0.0], [2.0, 10.0]]);
    }

    #[test]
    fn test_remove_common_mode() {
        let signal = array![[1.0f32, 3.0], [10.0, 20.0]];
        let cleaned = remove_common_mode(signal.view());
        assert_eq!(cleaned, array![[-1.0f32, 1.0], [-5.0, 5.0]]);
    }

    #[test]
    fn test_empty_signal_passes_through() {
        let signal = Array2::<f32>::zeros((0, 8));
        assert_eq!(remove_mean(signal.view()).dim(), (0, 8));
        assert_eq!(remove_common_mode(signal.view()).dim(), (0, 8));
    }

    #[test]
    fn test_activity_signal_length() {
        let signal = Array2::from_shape_fn((100, 8), |(t, c)| ((t * (c + 1)) as f32 * 0.2).sin());
        let activity = activity_signal(signal.view(), 0..4, 5).unwrap();
        assert_eq!(activity.len(), 99);

        let single = Array2::<f32>::ones((1, 8));
        assert!(activity_signal(single.view(), 0..4, 5).unwrap().is_empty());
    }

    #[test]
    fn test_activity_of_constant_is_flat_inside() {
        let signal = Array2::<f32>::from_elem((50, 4), 2.0);
        let activity = activity_signal(signal.view(), 0..4, 5).unwrap();
        for t in 3..45 {
            assert!(activity[t].abs() < 1e-5);
        }
        // Rising edge while the envelope window fills
        assert!(activity[0] > 0.0);
    }

    #[test]
    fn test_activity_channel_range_checked() {
        let signal = Array2::<f32>::zeros((10, 4));
        assert!(activity_signal(signal.view(), 2..6, 5).is_err());
        assert!(activity_signal(signal.view(), 2..2, 5).is_err());
    }
}
