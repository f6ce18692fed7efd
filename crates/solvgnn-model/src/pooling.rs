//! Graph-level pooling of per-atom representations.

use candle_core::Tensor;
use serde::{Deserialize, Serialize};

/// Pooling strategy for reducing atom embeddings to molecule embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PoolingStrategy {
    /// Mean over the atoms of each molecule
    #[default]
    Mean,

    /// Sum over the atoms of each molecule
    Sum,
}

impl PoolingStrategy {
    /// Apply pooling to a merged batch graph.
    ///
    /// # Arguments
    /// * `x` - Tensor of shape (num_atoms, hidden_dim)
    /// * `batch` - Molecule index of every atom, (num_atoms,) u32
    /// * `num_graphs` - Number of molecules in the batch
    ///
    /// # Returns
    /// Tensor of shape (num_graphs, hidden_dim)
    pub fn apply(&self, x: &Tensor, batch: &Tensor, num_graphs: usize) -> candle_core::Result<Tensor> {
        match self {
            PoolingStrategy::Mean => global_mean_pool(x, batch, num_graphs),
            PoolingStrategy::Sum => global_add_pool(x, batch, num_graphs),
        }
    }
}

/// Sum atom rows into their molecule's row.
pub fn global_add_pool(x: &Tensor, batch: &Tensor, num_graphs: usize) -> candle_core::Result<Tensor> {
    let hidden = x.dim(1)?;
    Tensor::zeros((num_graphs, hidden), x.dtype(), x.device())?.index_add(batch, x, 0)
}

/// Mean over the atoms of each molecule.
///
/// Only real atoms are counted, so molecules of different sizes are not
/// biased towards zero. A molecule with no atoms yields non-finite values.
pub fn global_mean_pool(x: &Tensor, batch: &Tensor, num_graphs: usize) -> candle_core::Result<Tensor> {
    let sums = global_add_pool(x, batch, num_graphs)?;

    let ones = Tensor::ones(x.dim(0)?, x.dtype(), x.device())?;
    let counts = Tensor::zeros(num_graphs, x.dtype(), x.device())?.index_add(batch, &ones, 0)?;

    sums.broadcast_div(&counts.unsqueeze(1)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn test_mean_pool_single_molecule() {
        let device = Device::Cpu;
        let x = Tensor::new(&[[1.0f32, 2.0], [3.0, 4.0]], &device).unwrap();
        let batch = Tensor::new(&[0u32, 0], &device).unwrap();

        let pooled = global_mean_pool(&x, &batch, 1).unwrap().to_vec2::<f32>().unwrap();
        assert_eq!(pooled, vec![vec![2.0, 3.0]]);
    }

    #[test]
    fn test_mean_pool_variable_sizes() {
        let device = Device::Cpu;

        // Molecule 0: three atoms, molecule 1: one atom
        let x = Tensor::new(
            &[[1.0f32, 2.0], [2.0, 3.0], [3.0, 4.0], [10.0, 10.0]],
            &device,
        )
        .unwrap();
        let batch = Tensor::new(&[0u32, 0, 0, 1], &device).unwrap();

        let pooled = global_mean_pool(&x, &batch, 2).unwrap().to_vec2::<f32>().unwrap();
        assert!((pooled[0][0] - 2.0).abs() < 1e-6);
        assert!((pooled[0][1] - 3.0).abs() < 1e-6);
        assert_eq!(pooled[1], vec![10.0, 10.0]);
    }

    #[test]
    fn test_mean_pool_interleaved_membership() {
        let device = Device::Cpu;
        let x = Tensor::new(&[[1.0f32], [5.0], [3.0], [7.0]], &device).unwrap();
        let batch = Tensor::new(&[0u32, 1, 0, 1], &device).unwrap();

        let pooled = PoolingStrategy::Mean.apply(&x, &batch, 2).unwrap().to_vec2::<f32>().unwrap();
        assert_eq!(pooled, vec![vec![2.0], vec![6.0]]);
    }

    #[test]
    fn test_sum_pool() {
        let device = Device::Cpu;
        let x = Tensor::new(&[[1.0f32, 2.0], [3.0, 4.0], [5.0, 6.0]], &device).unwrap();
        let batch = Tensor::new(&[0u32, 0, 1], &device).unwrap();

        let pooled = PoolingStrategy::Sum.apply(&x, &batch, 2).unwrap().to_vec2::<f32>().unwrap();
        assert_eq!(pooled, vec![vec![4.0, 6.0], vec![5.0, 6.0]]);
    }
}
