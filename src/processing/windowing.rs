// src/processing/windowing.rs
//! Sliding-window segmentation of multi-channel signals
//!
//! A `(T, C)` signal becomes a `(W, L, C)` tensor with
//! `W = floor((T - L) / stride) + 1`. Windows are built by selecting the rows
//! of an index matrix whose row `w` holds `w·stride .. w·stride + L`, so the
//! cost is a single pass over the output. Trailing samples that do not fill a whole
//! window are dropped; a signal shorter than one window yields zero windows.

use ndarray::{s, Array1, Array2, Array3, ArrayView2, Axis};
use tracing::{debug, warn};

use crate::config::WindowingConfig;
use crate::error::{EmgErrorBuilder, EmgResult, ProcessingStage, ResourceType};

/// Number of full windows that fit in `samples`
pub fn window_count(samples: usize, length: usize, stride: usize) -> usize {
    if length == 0 || stride == 0 || samples < length {
        return 0;
    }
    (samples - length) / stride + 1
}

/// Index matrix of shape `(W, length)`; row `w` is `[w·stride, ..., w·stride + length - 1]`
pub fn window_index_matrix(samples: usize, length: usize, stride: usize) -> Array2<usize> {
    let count = window_count(samples, length, stride);
    let starts: Array1<usize> = (0..count).map(|w| w * stride).collect();
    let offsets: Array1<usize> = (0..length).collect();

    &starts.insert_axis(Axis(1)) + &offsets.insert_axis(Axis(0))
}

/// Window a `(T, C)` signal into a `(W, length, C)` tensor
pub fn window(signal: ArrayView2<f32>, length: usize, stride: usize) -> EmgResult<Array3<f32>> {
    Windower::new(length, stride).windows(signal)
}

/// Borrowed views over each window, in temporal order
///
/// Peak memory is that of a single view instead of the full tensor.
pub fn window_views<'a>(
    signal: ArrayView2<'a, f32>,
    length: usize,
    stride: usize,
) -> impl Iterator<Item = ArrayView2<'a, f32>> + 'a {
    let count = window_count(signal.nrows(), length, stride);
    (0..count).map(move |w| {
        let start = w * stride;
        signal.slice_move(s![start..start + length, ..])
    })
}

/// Window segmentation with a bound on the materialized tensor size
#[derive(Debug, Clone)]
pub struct Windower {
    length: usize,
    stride: usize,
    max_elements: usize,
}

impl Windower {
    pub fn new(length: usize, stride: usize) -> Self {
        Self {
            length,
            stride,
            max_elements: crate::config::windowing::DEFAULT_MAX_WINDOW_ELEMENTS,
        }
    }

    /// Create windower from configuration
    pub fn from_config(config: &WindowingConfig) -> Self {
        Self {
            length: config.length,
            stride: config.stride,
            max_elements: config.max_window_elements,
        }
    }

    pub fn with_max_elements(mut self, max_elements: usize) -> Self {
        self.max_elements = max_elements;
        self
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of windows produced for a signal of `samples` samples
    pub fn count(&self, samples: usize) -> usize {
        window_count(samples, self.length, self.stride)
    }

    /// Reject zero length or stride before touching any data
    pub fn validate(&self) -> EmgResult<()> {
        let err = || EmgErrorBuilder::new("windowing", "validate");
        if self.length == 0 {
            return Err(err().invalid_parameter("length", self.length, "must be at least 1"));
        }
        if self.stride == 0 {
            return Err(err().invalid_parameter("stride", self.stride, "must be at least 1"));
        }
        Ok(())
    }

    /// Gather all windows of `signal` into a `(W, L, C)` tensor
    pub fn windows(&self, signal: ArrayView2<f32>) -> EmgResult<Array3<f32>> {
        self.validate()?;

        let (samples, channels) = signal.dim();
        let count = self.count(samples);
        let requested = count
            .checked_mul(self.length)
            .and_then(|n| n.checked_mul(channels))
            .unwrap_or(usize::MAX);
        if requested > self.max_elements {
            return Err(EmgErrorBuilder::new("windowing", "windows")
                .resource_exhausted(ResourceType::Memory, self.max_elements, requested));
        }

        if count == 0 {
            warn!(samples, length = self.length, "signal shorter than one window, no windows produced");
            return Ok(Array3::zeros((0, self.length, channels)));
        }

        let index = window_index_matrix(samples, self.length, self.stride);
        let rows: Vec<usize> = index.iter().copied().collect();
        let windows = signal
            .select(Axis(0), &rows)
            .into_shape((count, self.length, channels))
            .map_err(|e| {
                EmgErrorBuilder::new("windowing", "windows")
                    .processing(ProcessingStage::Windowing, &e.to_string())
            })?;

        debug!(
            windows = count,
            length = self.length,
            stride = self.stride,
            channels,
            dropped = samples - ((count - 1) * self.stride + self.length),
            "windowed signal"
        );
        Ok(windows)
    }
}
