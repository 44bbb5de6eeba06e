use ndarray::Array2;
use num_traits::AsPrimitive;
use shrinkwraprs::Shrinkwrap;

use crate::errors::Result;

/// Samples of a single band, row-major `(rows, cols)`.
///
/// Derefs to the underlying [Array2].
#[derive(Shrinkwrap, Debug, Clone, PartialEq)]
pub struct Band(Array2<f64>);

impl From<Array2<f64>> for Band {
    fn from(value: Array2<f64>) -> Self {
        Self(value)
    }
}

impl Band {
    /// Band with every sample set to `value`.
    pub fn filled(shape: (usize, usize), value: f64) -> Self {
        Self(Array2::from_elem(shape, value))
    }

    pub fn from_shape_vec(shape: (usize, usize), samples: Vec<f64>) -> Result<Self> {
        Ok(Self(Array2::from_shape_vec(shape, samples)?))
    }

    /// Converts integer (or any primitive) samples, e.g. raw digital numbers.
    pub fn from_samples<T: AsPrimitive<f64>>(samples: &Array2<T>) -> Self {
        Self(samples.mapv(|sample| sample.as_()))
    }

    /// `sample * multiplier + offset` for every sample.
    ///
    /// Multiply and add are separate operations (no fused multiply-add),
    /// NaN and infinities propagate.
    pub fn scaled(&self, multiplier: f64, offset: f64) -> Self {
        Self(self.0.mapv(|sample| sample * multiplier + offset))
    }

    /// 1 where sample is greater than `threshold`, 0 otherwise (NaN is 0).
    pub fn gt(&self, threshold: f64) -> Self {
        Self(self.0.mapv(|sample| f64::from(u8::from(sample > threshold))))
    }

    pub fn into_inner(self) -> Array2<f64> {
        self.0
    }
}
