//! Property regressor head.

use candle_core::Tensor;
use candle_nn::{linear, Linear, Module, VarBuilder};

/// Three-layer perceptron `2h+1 -> 2h -> h -> 1`, ReLU after the first two.
///
/// The output is an unconstrained score; interpreting it (e.g. as ln γ) is
/// left to the caller.
pub struct PropertyRegressor {
    mlp1: Linear,
    mlp2: Linear,
    mlp3: Linear,
}

impl PropertyRegressor {
    pub fn new(hidden_dim: usize, vb: VarBuilder) -> candle_core::Result<Self> {
        Ok(Self {
            mlp1: linear(2 * hidden_dim + 1, 2 * hidden_dim, vb.pp("mlp1"))?,
            mlp2: linear(2 * hidden_dim, hidden_dim, vb.pp("mlp2"))?,
            mlp3: linear(hidden_dim, 1, vb.pp("mlp3"))?,
        })
    }
}

impl Module for PropertyRegressor {
    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        let h = self.mlp1.forward(xs)?.relu()?;
        let h = self.mlp2.forward(&h)?.relu()?;
        self.mlp3.forward(&h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParameterStore;
    use candle_core::Device;

    #[test]
    fn test_output_shape() {
        let store = ParameterStore::new(Device::Cpu);
        let head = PropertyRegressor::new(3, store.var_builder()).unwrap();

        let x = Tensor::ones((5, 7), candle_core::DType::F32, &Device::Cpu).unwrap();
        assert_eq!(head.forward(&x).unwrap().dims(), &[5, 1]);
    }

    #[test]
    fn test_output_can_be_negative() {
        let device = Device::Cpu;
        let store = ParameterStore::new(device.clone());
        let head = PropertyRegressor::new(1, store.var_builder()).unwrap();

        // Pass a constant 1 through the hidden layers, then a negative readout
        store.set("mlp1.weight", &Tensor::zeros((2, 3), candle_core::DType::F32, &device).unwrap()).unwrap();
        store.set("mlp1.bias", &Tensor::new(&[1.0f32, 1.0], &device).unwrap()).unwrap();
        store.set("mlp2.weight", &Tensor::new(&[[1.0f32, 0.0]], &device).unwrap()).unwrap();
        store.set("mlp2.bias", &Tensor::new(&[0.0f32], &device).unwrap()).unwrap();
        store.set("mlp3.weight", &Tensor::new(&[[-2.0f32]], &device).unwrap()).unwrap();
        store.set("mlp3.bias", &Tensor::new(&[-0.5f32], &device).unwrap()).unwrap();

        let x = Tensor::new(&[[0.3f32, -0.7, 0.2]], &device).unwrap();
        let y = head.forward(&x).unwrap().to_vec2::<f32>().unwrap();
        assert!((y[0][0] + 2.5).abs() < 1e-6);
    }
}
