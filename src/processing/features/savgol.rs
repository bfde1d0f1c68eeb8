//! Savitzky-Golay derivative filter
//!
//! Each output sample is the derivative of a polynomial fitted by least
//! squares to `width` neighbouring samples. Interior samples use the window
//! centred on them; the first and last `width / 2` samples reuse the fit over
//! the first or last full window, evaluated at their own position.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array, Array2, ArrayView, ArrayView1, ArrayViewMut1, Axis, Dimension, Zip};

use crate::error::{EmgErrorBuilder, EmgResult, ProcessingStage};

/// Derivative filter of a given order over an odd window
#[derive(Debug, Clone)]
pub struct SavitzkyGolay {
    width: usize,
    polyorder: usize,
    deriv: usize,
    /// Row `t` holds the weights giving the derivative at window position `t`
    weights: Array2<f64>,
}

impl SavitzkyGolay {
    pub fn new(width: usize, polyorder: usize, deriv: usize) -> EmgResult<Self> {
        let err = || EmgErrorBuilder::new("savgol", "new");
        if width < 3 || width % 2 == 0 {
            return Err(err().invalid_parameter("width", width, "must be an odd number of at least 3"));
        }
        if polyorder >= width {
            return Err(err().invalid_parameter("polyorder", polyorder, &format!("must be less than width ({})", width)));
        }
        if deriv > polyorder {
            return Err(err().invalid_parameter("deriv", deriv, &format!("must not exceed polyorder ({})", polyorder)));
        }

        let weights = Self::fit_weights(width, polyorder, deriv)?;
        Ok(Self { width, polyorder, deriv, weights })
    }

    /// Delta filter: derivative `order` of a polynomial of the same order
    pub fn delta(width: usize, order: usize) -> EmgResult<Self> {
        Self::new(width, order, order)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn polyorder(&self) -> usize {
        self.polyorder
    }

    pub fn deriv(&self) -> usize {
        self.deriv
    }

    fn fit_weights(width: usize, polyorder: usize, deriv: usize) -> EmgResult<Array2<f64>> {
        let half = (width / 2) as f64;
        let terms = polyorder + 1;

        // Vandermonde matrix on centred positions for conditioning
        let vander = DMatrix::<f64>::from_fn(width, terms, |j, i| (j as f64 - half).powi(i as i32));
        let normal = (vander.transpose() * &vander).cholesky().ok_or_else(|| {
            EmgErrorBuilder::new("savgol", "fit_weights")
                .processing(ProcessingStage::FeatureExtraction, "singular least-squares system")
        })?;

        let mut weights = Array2::<f64>::zeros((width, width));
        for t in 0..width {
            let x = t as f64 - half;
            let basis_deriv = DVector::<f64>::from_fn(terms, |i, _| {
                if i < deriv {
                    0.0
                } else {
                    let falling: f64 = ((i - deriv + 1)..=i).map(|k| k as f64).product();
                    falling * x.powi((i - deriv) as i32)
                }
            });

            let row = &vander * normal.solve(&basis_deriv);
            for (slot, value) in weights.row_mut(t).iter_mut().zip(row.iter()) {
                *slot = *value;
            }
        }
        Ok(weights)
    }

    fn filter_lane(&self, input: ArrayView1<f32>, mut output: ArrayViewMut1<f32>) {
        let n = input.len();
        let half = self.width / 2;
        for i in 0..n {
            let (start, position) = if i < half {
                (0, i)
            } else if i + half >= n {
                (n - self.width, i + self.width - n)
            } else {
                (i - half, half)
            };
            let value: f64 = self
                .weights
                .row(position)
                .iter()
                .enumerate()
                .map(|(j, &h)| h * input[start + j] as f64)
                .sum();
            output[i] = value as f32;
        }
    }

    /// Filter every lane of `data` along `axis`
    ///
    /// The axis must hold at least `width` samples.
    pub fn apply<D: Dimension>(&self, data: ArrayView<f32, D>, axis: Axis) -> EmgResult<Array<f32, D>> {
        let len = data.len_of(axis);
        if len < self.width {
            return Err(EmgErrorBuilder::new("savgol", "apply").invalid_parameter(
                "width",
                self.width,
                &format!("exceeds the {} samples available along the filtered axis", len),
            ));
        }

        let mut output = Array::<f32, D>::zeros(data.raw_dim());
        Zip::from(output.lanes_mut(axis))
            .and(data.lanes(axis))
            .for_each(|out, lane| self.filter_lane(lane, out));
        Ok(output)
    }
}
