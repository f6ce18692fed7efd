//! Molecular encoder: two stacked graph convolutions.

use candle_core::Tensor;
use candle_nn::{init, Init, Linear, Module, VarBuilder};

/// Graph Convolutional Network layer.
///
/// Implements `H' = D^{-1/2} (A + I) D^{-1/2} H W + b` over an edge list,
/// with self-loops added for every node. Input bond lists are expected to
/// carry no self-loops of their own.
pub struct GcnConv {
    linear: Linear,
    bias: Tensor,
}

impl GcnConv {
    pub fn new(in_dim: usize, out_dim: usize, vb: VarBuilder) -> candle_core::Result<Self> {
        let weight = vb.get_with_hints((out_dim, in_dim), "weight", init::DEFAULT_KAIMING_NORMAL)?;
        let bias = vb.get_with_hints(out_dim, "bias", Init::Const(0.0))?;
        Ok(Self {
            linear: Linear::new(weight, None),
            bias,
        })
    }

    /// Forward pass.
    ///
    /// # Arguments
    /// * `x` - Node features (N, in_dim)
    /// * `edge_index` - Directed edges as (2, E) u32 `[src; dst]`
    ///
    /// # Returns
    /// Node embeddings (N, out_dim)
    pub fn forward(&self, x: &Tensor, edge_index: &Tensor) -> candle_core::Result<Tensor> {
        let n = x.dim(0)?;
        let loops = Tensor::arange(0u32, n as u32, x.device())?;
        let src = Tensor::cat(&[&edge_index.get(0)?, &loops], 0)?;
        let dst = Tensor::cat(&[&edge_index.get(1)?, &loops], 0)?;

        // In-degree including the self-loop, so never zero
        let ones = Tensor::ones(dst.dim(0)?, x.dtype(), x.device())?;
        let deg = Tensor::zeros(n, x.dtype(), x.device())?.index_add(&dst, &ones, 0)?;
        let deg_inv_sqrt = deg.powf(-0.5)?;
        let norm = (deg_inv_sqrt.index_select(&src, 0)? * deg_inv_sqrt.index_select(&dst, 0)?)?;

        let h = self.linear.forward(x)?;
        let messages = h.index_select(&src, 0)?.broadcast_mul(&norm.unsqueeze(1)?)?;
        let out = h.zeros_like()?.index_add(&dst, &messages, 0)?;
        out.broadcast_add(&self.bias)
    }
}

/// Per-atom encoder shared by both molecules of a mixture.
pub struct MolecularEncoder {
    conv1: GcnConv,
    conv2: GcnConv,
}

impl MolecularEncoder {
    pub fn new(in_dim: usize, hidden_dim: usize, vb: VarBuilder) -> candle_core::Result<Self> {
        Ok(Self {
            conv1: GcnConv::new(in_dim, hidden_dim, vb.pp("conv1"))?,
            conv2: GcnConv::new(hidden_dim, hidden_dim, vb.pp("conv2"))?,
        })
    }

    /// Encode a merged batch graph into (num_atoms, hidden_dim).
    pub fn forward(&self, x: &Tensor, edge_index: &Tensor) -> candle_core::Result<Tensor> {
        let h = self.conv1.forward(x, edge_index)?.relu()?;
        self.conv2.forward(&h, edge_index)?.relu()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    fn identity_conv(dim: usize, device: &Device) -> GcnConv {
        GcnConv {
            linear: Linear::new(Tensor::eye(dim, DType::F32, device).unwrap(), None),
            bias: Tensor::zeros(dim, DType::F32, device).unwrap(),
        }
    }

    #[test]
    fn test_gcn_isolated_nodes_keep_features() {
        // Without bonds each node only sees itself with weight 1
        let device = Device::Cpu;
        let conv = identity_conv(2, &device);
        let x = Tensor::new(&[[1.0f32, 2.0], [3.0, 4.0]], &device).unwrap();
        let edges = Tensor::zeros((2, 0), DType::U32, &device).unwrap();

        let out = conv.forward(&x, &edges).unwrap().to_vec2::<f32>().unwrap();
        assert_eq!(out, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn test_gcn_symmetric_normalisation() {
        // Two bonded atoms: degree 2 each, every coefficient is 1/2
        let device = Device::Cpu;
        let conv = identity_conv(1, &device);
        let x = Tensor::new(&[[2.0f32], [4.0]], &device).unwrap();
        let edges = Tensor::new(&[[0u32, 1], [1, 0]], &device).unwrap();

        let out = conv.forward(&x, &edges).unwrap().to_vec2::<f32>().unwrap();
        assert!((out[0][0] - 3.0).abs() < 1e-6);
        assert!((out[1][0] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_gcn_path_graph_degrees() {
        // 0-1-2: deg = [2, 3, 2]
        let device = Device::Cpu;
        let conv = identity_conv(1, &device);
        let x = Tensor::new(&[[1.0f32], [0.0], [0.0]], &device).unwrap();
        let edges = Tensor::new(&[[0u32, 1, 1, 2], [1, 0, 2, 1]], &device).unwrap();

        let out = conv.forward(&x, &edges).unwrap().to_vec2::<f32>().unwrap();
        assert!((out[0][0] - 0.5).abs() < 1e-6);
        assert!((out[1][0] - 1.0 / 6.0f32.sqrt()).abs() < 1e-6);
        assert!(out[2][0].abs() < 1e-6);
    }

    #[test]
    fn test_encoder_output_is_non_negative() {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let encoder = MolecularEncoder::new(3, 5, vb).unwrap();

        let x = Tensor::new(&[[1.0f32, -1.0, 0.5], [0.0, 2.0, -3.0]], &device).unwrap();
        let edges = Tensor::new(&[[0u32, 1], [1, 0]], &device).unwrap();
        let out = encoder.forward(&x, &edges).unwrap();

        assert_eq!(out.dims(), &[2, 5]);
        for row in out.to_vec2::<f32>().unwrap() {
            assert!(row.iter().all(|v| *v >= 0.0));
        }
    }
}
