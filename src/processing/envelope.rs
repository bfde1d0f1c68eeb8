// src/processing/envelope.rs
//! Moving RMS energy envelope

use ndarray::{Array2, ArrayView2, Axis};
use tracing::trace;

use crate::error::{EmgErrorBuilder, EmgResult};

/// Moving RMS of each channel, aligned sample-for-sample with the input
///
/// Equivalent to convolving the squared signal with a uniform kernel of
/// `window_size` taps along time only, keeping the centred "same"-size part
/// of the full convolution (zero padding outside the signal), then taking the
/// square root. Output sample `i` averages inputs
/// `i + k/2 - (k - 1) ..= i + k/2`; the divisor is always `k`.
pub fn rms_envelope(signal: ArrayView2<f32>, window_size: usize) -> EmgResult<Array2<f32>> {
    if window_size == 0 {
        return Err(EmgErrorBuilder::new("envelope", "rms_envelope")
            .invalid_parameter("window_size", window_size, "must be at least 1"));
    }

    let (samples, channels) = signal.dim();
    let mut envelope = Array2::<f32>::zeros((samples, channels));
    let ahead = window_size / 2;
    let behind = window_size - 1 - ahead;

    let mut prefix = vec![0.0f64; samples + 1];
    for (channel, mut out) in signal.axis_iter(Axis(1)).zip(envelope.axis_iter_mut(Axis(1))) {
        for (t, &x) in channel.iter().enumerate() {
            prefix[t + 1] = prefix[t] + (x as f64) * (x as f64);
        }
        for (i, value) in out.iter_mut().enumerate() {
            let lo = i.saturating_sub(behind);
            let hi = (i + ahead + 1).min(samples);
            let energy = (prefix[hi] - prefix[lo]).max(0.0);
            *value = (energy / window_size as f64).sqrt() as f32;
        }
    }

    trace!(samples, channels, window_size, "computed rms envelope");
    Ok(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_constant_signal_interior() {
        let signal = Array2::from_elem((20, 8), -3.0f32);
        let envelope = rms_envelope(signal.view(), 5).unwrap();

        assert_eq!(envelope.dim(), (20, 8));
        for t in 2..18 {
            for c in 0..8 {
                assert!((envelope[[t, c]] - 3.0).abs() < 1e-5);
            }
        }
        // Zero padding pulls the edges down: 3 of 5 taps are inside at t = 0
        assert!((envelope[[0, 0]] - (9.0f32 * 3.0 / 5.0).sqrt()).abs() < 1e-5);
    }

    #[test]
    fn test_channels_are_independent() {
        let mut signal = Array2::<f32>::zeros((10, 2));
        signal[[5, 0]] = 10.0;
        let envelope = rms_envelope(signal.view(), 3).unwrap();

        assert!(envelope.column(1).iter().all(|&v| v == 0.0));
        assert!((envelope[[4, 0]] - (100.0f32 / 3.0).sqrt()).abs() < 1e-4);
        assert!((envelope[[6, 0]] - (100.0f32 / 3.0).sqrt()).abs() < 1e-4);
        assert_eq!(envelope[[7, 0]], 0.0);
    }

    #[test]
    fn test_even_window_alignment() {
        let mut signal = Array2::<f32>::zeros((10, 1));
        signal[[5, 0]] = 2.0;
        let envelope = rms_envelope(signal.view(), 4).unwrap();

        // Window for output i covers i-1 ..= i+2
        assert_eq!(envelope[[2, 0]], 0.0);
        assert!(envelope[[3, 0]] > 0.0);
        assert!(envelope[[6, 0]] > 0.0);
        assert_eq!(envelope[[7, 0]], 0.0);
    }

    #[test]
    fn test_zero_window_rejected() {
        let signal = Array2::<f32>::zeros((10, 8));
        assert!(rms_envelope(signal.view(), 0).is_err());
    }
}
