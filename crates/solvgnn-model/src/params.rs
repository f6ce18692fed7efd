//! Trainable parameter storage.

use std::collections::HashMap;

use candle_core::{DType, Device, Tensor, Var};
use candle_nn::{VarBuilder, VarMap};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use solvgnn_common::{GnnError, Result};
use tracing::debug;

/// Owns every trainable tensor of a model.
///
/// Layers built from [`ParameterStore::var_builder`] share storage with the
/// store, so updates made here (reseeding, an optimiser step) are seen by
/// the layers without rebuilding them.
pub struct ParameterStore {
    varmap: VarMap,
    device: Device,
    dtype: DType,
}

impl ParameterStore {
    pub fn new(device: Device) -> Self {
        Self {
            varmap: VarMap::new(),
            device,
            dtype: DType::F32,
        }
    }

    pub fn var_builder(&self) -> VarBuilder<'_> {
        VarBuilder::from_varmap(&self.varmap, self.dtype, &self.device)
    }

    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Overwrite every parameter with deterministic values.
    ///
    /// Each tensor is drawn from `U(-1/sqrt(fan_in), 1/sqrt(fan_in))`, visiting
    /// parameters in name order so the result depends only on `seed`.
    pub fn reseed(&self, seed: u64) -> Result<()> {
        let mut rng = StdRng::seed_from_u64(seed);
        let vars = self.lock()?;

        let mut names: Vec<&String> = vars.keys().collect();
        names.sort();

        for name in names {
            let var = &vars[name];
            let bound = 1.0 / (fan_in(name, var, &vars).max(1) as f32).sqrt();
            let values: Vec<f32> = (0..var.elem_count())
                .map(|_| rng.gen_range(-bound..bound))
                .collect();
            var.set(&Tensor::from_vec(values, var.dims().to_vec(), &self.device)?)?;
        }

        debug!("Reseeded {} parameter tensors with seed {}", vars.len(), seed);
        Ok(())
    }

    /// Count of trainable scalars.
    pub fn num_parameters(&self) -> usize {
        self.varmap.all_vars().iter().map(|v| v.elem_count()).sum()
    }

    /// Parameter names in sorted order.
    pub fn names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.lock()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    pub fn get(&self, name: &str) -> Result<Tensor> {
        self.lock()?
            .get(name)
            .map(|v| v.as_tensor().clone())
            .ok_or_else(|| GnnError::MissingField(name.to_string()))
    }

    /// Replace the values of one parameter; the shape must match.
    pub fn set(&self, name: &str, value: &Tensor) -> Result<()> {
        let vars = self.lock()?;
        let var = vars
            .get(name)
            .ok_or_else(|| GnnError::MissingField(name.to_string()))?;
        var.set(value)?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Var>>> {
        self.varmap
            .data()
            .lock()
            .map_err(|e| GnnError::Tensor(format!("parameter store poisoned: {}", e)))
    }
}

/// Input width feeding a parameter: the second dimension of a weight matrix,
/// or of the matching weight for a bias.
fn fan_in(name: &str, var: &Var, vars: &HashMap<String, Var>) -> usize {
    if let [_, fan_in] = var.dims() {
        return *fan_in;
    }
    vars.get(&name.replace("bias", "weight"))
        .and_then(|w| match w.dims() {
            [_, fan_in] => Some(*fan_in),
            _ => None,
        })
        .unwrap_or_else(|| var.elem_count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_nn::linear;

    fn store_with_linear(seed: u64) -> ParameterStore {
        let store = ParameterStore::new(Device::Cpu);
        linear(4, 3, store.var_builder().pp("mlp")).unwrap();
        store.reseed(seed).unwrap();
        store
    }

    #[test]
    fn test_num_parameters() {
        let store = store_with_linear(1);
        assert_eq!(store.num_parameters(), 4 * 3 + 3);
        assert_eq!(store.names().unwrap(), vec!["mlp.bias", "mlp.weight"]);
    }

    #[test]
    fn test_reseed_is_deterministic() {
        let a = store_with_linear(7).get("mlp.weight").unwrap().to_vec2::<f32>().unwrap();
        let b = store_with_linear(7).get("mlp.weight").unwrap().to_vec2::<f32>().unwrap();
        let c = store_with_linear(8).get("mlp.weight").unwrap().to_vec2::<f32>().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_reseed_respects_fan_in_bound() {
        let store = store_with_linear(3);
        let bound = 1.0 / 4f32.sqrt();
        for name in ["mlp.weight", "mlp.bias"] {
            let values = store.get(name).unwrap().flatten_all().unwrap().to_vec1::<f32>().unwrap();
            assert!(values.iter().all(|v| v.abs() <= bound));
        }
    }

    #[test]
    fn test_set_updates_layer_view() {
        let store = ParameterStore::new(Device::Cpu);
        let layer = linear(2, 1, store.var_builder().pp("lin")).unwrap();
        store.set("lin.weight", &Tensor::new(&[[2.0f32, 3.0]], &Device::Cpu).unwrap()).unwrap();
        store.set("lin.bias", &Tensor::new(&[1.0f32], &Device::Cpu).unwrap()).unwrap();

        use candle_nn::Module;
        let x = Tensor::new(&[[1.0f32, 1.0]], &Device::Cpu).unwrap();
        let y = layer.forward(&x).unwrap().to_vec2::<f32>().unwrap();
        assert_eq!(y, vec![vec![6.0]]);
    }

    #[test]
    fn test_unknown_parameter() {
        let store = store_with_linear(1);
        assert!(matches!(store.get("missing.weight"), Err(GnnError::MissingField(_))));
    }
}
