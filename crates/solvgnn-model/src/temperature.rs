//! Temperature normalisation.

use candle_core::{DType, Tensor};
use serde::{Deserialize, Serialize};

pub const KELVIN_OFFSET: f64 = 273.15;

/// Calibration bounds for mapping temperatures onto [0, 1].
///
/// Values outside the bounds are not clamped and map outside [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureScale {
    /// Lower bound in degrees Celsius (default: -60)
    #[serde(default = "default_t_min")]
    pub t_min_celsius: f64,

    /// Upper bound in degrees Celsius (default: 289.3)
    #[serde(default = "default_t_max")]
    pub t_max_celsius: f64,
}

fn default_t_min() -> f64 { -60.0 }
fn default_t_max() -> f64 { 289.3 }

impl Default for TemperatureScale {
    fn default() -> Self {
        Self {
            t_min_celsius: default_t_min(),
            t_max_celsius: default_t_max(),
        }
    }
}

impl TemperatureScale {
    pub fn t_min_kelvin(&self) -> f64 {
        self.t_min_celsius + KELVIN_OFFSET
    }

    pub fn t_max_kelvin(&self) -> f64 {
        self.t_max_celsius + KELVIN_OFFSET
    }

    /// Normalise Celsius temperatures, one per batch element.
    ///
    /// # Returns
    /// f32 tensor of shape (batch_size, 1)
    pub fn normalize(&self, celsius: &Tensor) -> candle_core::Result<Tensor> {
        let n = celsius.elem_count();
        let kelvin = (celsius.to_dtype(DType::F32)?.reshape((n, 1))? + KELVIN_OFFSET)?;
        let range = self.t_max_kelvin() - self.t_min_kelvin();
        kelvin.affine(1.0 / range, -self.t_min_kelvin() / range)
    }

    pub fn normalize_scalar(&self, celsius: f64) -> f64 {
        (celsius + KELVIN_OFFSET - self.t_min_kelvin()) / (self.t_max_kelvin() - self.t_min_kelvin())
    }
}
