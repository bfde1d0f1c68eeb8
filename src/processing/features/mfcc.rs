//! Mel-frequency cepstral coefficients
//!
//! Pipeline per channel: centred framing with zero padding, periodic Hann
//! window, power spectrum via `rustfft`, Slaney-style mel filter bank,
//! log compression with a dynamic range floor, orthonormal DCT-II.
//! All channels of one call share the same dB reference, so the top-dB floor
//! is relative to the loudest mel bin anywhere in the input.

use std::f64::consts::PI;
use std::sync::Arc;

use ndarray::{Array2, Array3, ArrayView2, Axis};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use tracing::trace;

use crate::config::constants::cepstral::{
    MEL_LINEAR_STEP_HZ, MEL_LOG_BREAK_HZ, MEL_LOG_STEP_COUNT, MEL_LOG_STEP_RATIO, POWER_FLOOR,
};
use crate::config::CepstralConfig;
use crate::error::{EmgErrorBuilder, EmgResult};

/// Parameters of the cepstral transform
#[derive(Debug, Clone, PartialEq)]
pub struct MfccParams {
    pub sample_rate_hz: f32,
    /// Frame length and FFT size
    pub n_fft: usize,
    pub hop_length: usize,
    pub n_mfcc: usize,
    pub n_mels: usize,
    pub top_db: Option<f32>,
}

impl MfccParams {
    pub fn from_config(config: &CepstralConfig, sample_rate_hz: f32, n_fft: usize) -> Self {
        Self {
            sample_rate_hz,
            n_fft,
            hop_length: config.hop_length,
            n_mfcc: config.n_mfcc,
            n_mels: config.n_mels,
            top_db: config.top_db,
        }
    }

    /// Frames produced for `samples` input samples with centred framing
    pub fn frame_count(&self, samples: usize) -> usize {
        let padded = samples + 2 * (self.n_fft / 2);
        if padded < self.n_fft || self.hop_length == 0 {
            return 0;
        }
        1 + (padded - self.n_fft) / self.hop_length
    }
}

/// Slaney mel scale: linear below 1 kHz, logarithmic above
pub fn hz_to_mel(hz: f64) -> f64 {
    let min_log_mel = MEL_LOG_BREAK_HZ / MEL_LINEAR_STEP_HZ;
    let log_step = MEL_LOG_STEP_RATIO.ln() / MEL_LOG_STEP_COUNT;
    if hz >= MEL_LOG_BREAK_HZ {
        min_log_mel + (hz / MEL_LOG_BREAK_HZ).ln() / log_step
    } else {
        hz / MEL_LINEAR_STEP_HZ
    }
}

/// Inverse of [`hz_to_mel`]
pub fn mel_to_hz(mel: f64) -> f64 {
    let min_log_mel = MEL_LOG_BREAK_HZ / MEL_LINEAR_STEP_HZ;
    let log_step = MEL_LOG_STEP_RATIO.ln() / MEL_LOG_STEP_COUNT;
    if mel >= min_log_mel {
        MEL_LOG_BREAK_HZ * (log_step * (mel - min_log_mel)).exp()
    } else {
        MEL_LINEAR_STEP_HZ * mel
    }
}

/// Triangular, area-normalized mel filters over `n_fft / 2 + 1` bins
///
/// Filters span 0 Hz to Nyquist; shape `(n_mels, n_fft / 2 + 1)`.
pub fn mel_filterbank(sample_rate_hz: f32, n_fft: usize, n_mels: usize) -> Array2<f32> {
    let bins = n_fft / 2 + 1;
    let sr = sample_rate_hz as f64;
    let fft_freqs: Vec<f64> = (0..bins).map(|k| k as f64 * sr / n_fft as f64).collect();

    let mel_max = hz_to_mel(sr / 2.0);
    let mel_points: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_max * i as f64 / (n_mels + 1) as f64))
        .collect();

    let mut weights = Array2::<f32>::zeros((n_mels, bins));
    for m in 0..n_mels {
        let (lower, center, upper) = (mel_points[m], mel_points[m + 1], mel_points[m + 2]);
        let area_norm = 2.0 / (upper - lower);
        for (k, &freq) in fft_freqs.iter().enumerate() {
            let rising = (freq - lower) / (center - lower);
            let falling = (upper - freq) / (upper - center);
            weights[[m, k]] = (rising.min(falling).max(0.0) * area_norm) as f32;
        }
    }
    weights
}

/// Orthonormal DCT-II basis truncated to the first `n_out` rows, `(n_out, n_in)`
pub fn dct_basis(n_out: usize, n_in: usize) -> Array2<f32> {
    let n = n_in as f64;
    Array2::from_shape_fn((n_out, n_in), |(k, i)| {
        let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
        (scale * (PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n)).cos()) as f32
    })
}

/// Periodic Hann window
fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| (0.5 - 0.5 * (2.0 * PI * i as f64 / size as f64).cos()) as f32)
        .collect()
}

/// Cepstral transform with a precomputed FFT plan, window, filter bank and DCT
#[derive(Clone)]
pub struct Mfcc {
    params: MfccParams,
    window: Vec<f32>,
    filterbank: Array2<f32>,
    dct: Array2<f32>,
    fft: Arc<dyn Fft<f32>>,
}

impl std::fmt::Debug for Mfcc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mfcc").field("params", &self.params).finish()
    }
}

impl Mfcc {
    /// Validate parameters and precompute the transform
    ///
    /// Fails when the frame is too short to give every mel band at least one
    /// FFT bin.
    pub fn new(params: MfccParams) -> EmgResult<Self> {
        let err = || EmgErrorBuilder::new("mfcc", "new");

        if !(params.sample_rate_hz.is_finite() && params.sample_rate_hz > 0.0) {
            return Err(err().invalid_parameter("sample_rate_hz", params.sample_rate_hz, "must be a positive finite number"));
        }
        if params.n_fft < 2 {
            return Err(err().invalid_parameter("n_fft", params.n_fft, "must be at least 2"));
        }
        if params.hop_length == 0 {
            return Err(err().invalid_parameter("hop_length", params.hop_length, "must be at least 1"));
        }
        if params.n_mels == 0 {
            return Err(err().invalid_parameter("n_mels", params.n_mels, "must be at least 1"));
        }
        if params.n_mfcc == 0 || params.n_mfcc > params.n_mels {
            return Err(err().invalid_parameter(
                "n_mfcc",
                params.n_mfcc,
                &format!("must be between 1 and n_mels ({})", params.n_mels),
            ));
        }

        let filterbank = mel_filterbank(params.sample_rate_hz, params.n_fft, params.n_mels);
        if let Some(band) = filterbank
            .axis_iter(Axis(0))
            .position(|row| row.iter().all(|&w| w <= 0.0))
        {
            return Err(err().invalid_parameter(
                "n_fft",
                params.n_fft,
                &format!(
                    "is too short for {} mel bands: band {} covers no FFT bin at {} Hz",
                    params.n_mels, band, params.sample_rate_hz
                ),
            ));
        }

        let fft = FftPlanner::<f32>::new().plan_fft_forward(params.n_fft);
        Ok(Self {
            window: hann_window(params.n_fft),
            dct: dct_basis(params.n_mfcc, params.n_mels),
            filterbank,
            fft,
            params,
        })
    }

    pub fn params(&self) -> &MfccParams {
        &self.params
    }

    pub fn filterbank(&self) -> &Array2<f32> {
        &self.filterbank
    }

    /// Frames produced for `samples` input samples
    pub fn frame_count(&self, samples: usize) -> usize {
        self.params.frame_count(samples)
    }

    /// Mel power spectrogram of one channel, shape `(n_mels, frames)`
    fn mel_power(&self, channel: ndarray::ArrayView1<f32>) -> Array2<f32> {
        let n_fft = self.params.n_fft;
        let half = n_fft / 2;
        let bins = half + 1;
        let samples = channel.len();
        let frames = self.frame_count(samples);

        let mut power = Array2::<f32>::zeros((bins, frames));
        let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];
        for f in 0..frames {
            let start = f * self.params.hop_length;
            for (j, slot) in buffer.iter_mut().enumerate() {
                // Padded index start + j maps to input sample start + j - half
                let sample = (start + j)
                    .checked_sub(half)
                    .filter(|&t| t < samples)
                    .map_or(0.0, |t| channel[t]);
                *slot = Complex::new(sample * self.window[j], 0.0);
            }
            self.fft.process(&mut buffer);
            for (k, value) in buffer.iter().take(bins).enumerate() {
                power[[k, f]] = value.norm_sqr();
            }
        }

        self.filterbank.dot(&power)
    }

    /// Coefficients for a `(T, C)` signal, shape `(C, n_mfcc, frames)`
    pub fn compute(&self, signal: ArrayView2<f32>) -> Array3<f32> {
        let (samples, channels) = signal.dim();
        let frames = self.frame_count(samples);

        let mut log_mel = Array3::<f32>::zeros((channels, self.params.n_mels, frames));
        for (c, channel) in signal.axis_iter(Axis(1)).enumerate() {
            let mel = self.mel_power(channel);
            log_mel
                .index_axis_mut(Axis(0), c)
                .assign(&mel.mapv(|p| 10.0 * p.max(POWER_FLOOR).log10()));
        }

        if let Some(top_db) = self.params.top_db {
            let peak = log_mel.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            if peak.is_finite() {
                let floor = peak - top_db;
                log_mel.mapv_inplace(|v| v.max(floor));
            }
        }

        let mut coefficients = Array3::<f32>::zeros((channels, self.params.n_mfcc, frames));
        for (c, mel) in log_mel.axis_iter(Axis(0)).enumerate() {
            coefficients.index_axis_mut(Axis(0), c).assign(&self.dct.dot(&mel));
        }

        trace!(samples, channels, frames, n_mfcc = self.params.n_mfcc, "computed cepstral coefficients");
        coefficients
    }
}
