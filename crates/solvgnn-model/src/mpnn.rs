//! Edge-conditioned message passing over the system graph.

use candle_core::Tensor;
use candle_nn::rnn::{gru, GRUConfig, GRUState, GRU, RNN};
use candle_nn::{linear, Linear, Module, VarBuilder};

use crate::SystemGraph;

/// Maps each edge feature vector to a flattened `in_dim x out_dim` matrix.
struct EdgeNetwork {
    hidden: Linear,
    out: Linear,
}

impl EdgeNetwork {
    fn new(edge_dim: usize, hidden_dim: usize, out_dim: usize, vb: VarBuilder) -> candle_core::Result<Self> {
        Ok(Self {
            hidden: linear(edge_dim, hidden_dim, vb.pp("lin1"))?,
            out: linear(hidden_dim, out_dim, vb.pp("lin2"))?,
        })
    }
}

impl Module for EdgeNetwork {
    fn forward(&self, edge_attr: &Tensor) -> candle_core::Result<Tensor> {
        self.out.forward(&self.hidden.forward(edge_attr)?.relu()?)
    }
}

/// Edge-conditioned convolution with sum aggregation.
///
/// `x_i' = W_root x_i + b + sum_{j -> i} x_j Θ(e_ji)`, where `Θ` is the
/// edge network reshaped to (in_dim, out_dim) per edge.
pub struct NnConv {
    edge_network: EdgeNetwork,
    root: Linear,
    in_dim: usize,
    out_dim: usize,
}

impl NnConv {
    pub fn new(
        in_dim: usize,
        out_dim: usize,
        edge_dim: usize,
        edge_hidden_dim: usize,
        vb: VarBuilder,
    ) -> candle_core::Result<Self> {
        Ok(Self {
            edge_network: EdgeNetwork::new(edge_dim, edge_hidden_dim, in_dim * out_dim, vb.pp("edge_network"))?,
            root: linear(in_dim, out_dim, vb.pp("root"))?,
            in_dim,
            out_dim,
        })
    }

    /// Forward pass.
    ///
    /// # Arguments
    /// * `x` - Node features (N, in_dim)
    /// * `edge_index` - (2, E) u32 `[src; dst]`
    /// * `edge_attr` - (E, edge_dim)
    ///
    /// # Returns
    /// Node features (N, out_dim)
    pub fn forward(&self, x: &Tensor, edge_index: &Tensor, edge_attr: &Tensor) -> candle_core::Result<Tensor> {
        let num_edges = edge_attr.dim(0)?;
        let weights = self
            .edge_network
            .forward(edge_attr)?
            .reshape((num_edges, self.in_dim, self.out_dim))?;

        let src = edge_index.get(0)?;
        let dst = edge_index.get(1)?;

        // (E, 1, in) x (E, in, out) -> (E, out)
        let x_j = x.index_select(&src, 0)?.unsqueeze(1)?;
        let messages = x_j.matmul(&weights)?.squeeze(1)?;

        let aggregated = Tensor::zeros((x.dim(0)?, self.out_dim), x.dtype(), x.device())?
            .index_add(&dst, &messages, 0)?;
        aggregated + self.root.forward(x)?
    }
}

/// Interaction block producing one fingerprint row per molecule in the pair.
pub struct InteractionMpnn {
    project: Linear,
    conv: NnConv,
    gru: GRU,
    num_steps: usize,
}

impl InteractionMpnn {
    pub fn new(
        node_in_dim: usize,
        edge_in_dim: usize,
        hidden_dim: usize,
        edge_hidden_dim: usize,
        num_steps: usize,
        vb: VarBuilder,
    ) -> candle_core::Result<Self> {
        Ok(Self {
            project: linear(node_in_dim, hidden_dim, vb.pp("project_node_feats"))?,
            conv: NnConv::new(hidden_dim, hidden_dim, edge_in_dim, edge_hidden_dim, vb.pp("gnn_layer"))?,
            gru: gru(hidden_dim, hidden_dim, GRUConfig::default(), vb.pp("gru"))?,
            num_steps,
        })
    }

    /// Run the message-passing rounds and return per-node features (2B, hidden_dim).
    ///
    /// The recurrent state starts from the projected node features and lives
    /// only for the duration of this call.
    pub fn forward(&self, graph: &SystemGraph) -> candle_core::Result<Tensor> {
        let mut node_feats = self.project.forward(&graph.x)?.relu()?;
        let mut state = GRUState {
            h: node_feats.clone(),
        };

        for _ in 0..self.num_steps {
            let messages = self
                .conv
                .forward(&node_feats, &graph.edge_index, &graph.edge_attr)?
                .relu()?;
            state = self.gru.step(&messages, &state)?;
            node_feats = state.h().clone();
        }

        Ok(node_feats)
    }

    /// Per-mixture interaction fingerprint `[solvent | solute]`, (B, 2 * hidden_dim).
    pub fn fingerprint(&self, graph: &SystemGraph) -> candle_core::Result<Tensor> {
        let node_feats = self.forward(graph)?;
        graph.pair_rows(&node_feats)
    }
}
