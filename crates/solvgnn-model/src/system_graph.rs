//! System graph: the two molecules of every mixture as nodes of one small graph.
//!
//! For a batch of `B` mixtures the graph has `2B` nodes. Rows `[0, B)` hold
//! the solvent of each mixture, rows `[B, 2B)` the solute. Edges are
//!
//! ```text
//! pair edges   i -> B+i  and  B+i -> i      for i in [0, B)
//! self loops   j -> j                        for j in [0, 2B)
//! ```
//!
//! giving `4B` edges whose scalar features are, in edge order,
//! `[inter_hb, inter_hb, intra_hb_solvent, intra_hb_solute]`.

use candle_core::Tensor;
use solvgnn_common::{GnnError, Result};
use tracing::debug;

/// Source and destination index arrays for a batch of `batch_size` mixtures.
pub fn system_edge_index(batch_size: usize) -> (Vec<u32>, Vec<u32>) {
    let b = batch_size as u32;
    let solvent = 0..b;
    let solute = b..2 * b;
    let all = 0..2 * b;

    let one_way = solvent
        .clone()
        .chain(solute.clone())
        .chain(all.clone())
        .collect();
    let other_way = solute.chain(solvent).chain(all).collect();
    (one_way, other_way)
}

/// Ephemeral graph built once per forward pass.
#[derive(Debug, Clone)]
pub struct SystemGraph {
    /// Node features, (2B, h + 3)
    pub x: Tensor,

    /// Edges, (2, 4B) u32
    pub edge_index: Tensor,

    /// Edge features, (4B, 1)
    pub edge_attr: Tensor,

    batch_size: usize,
}

impl SystemGraph {
    /// Assemble the system graph for one batch.
    ///
    /// # Arguments
    /// * `solvent_nodes` / `solute_nodes` - (B, h + 3) augmented features
    /// * `inter_hb` - (B,) intermolecular hydrogen-bond term of each pair
    /// * `intra_hb_solvent` / `intra_hb_solute` - (B,) per-molecule terms
    pub fn build(
        solvent_nodes: &Tensor,
        solute_nodes: &Tensor,
        inter_hb: &Tensor,
        intra_hb_solvent: &Tensor,
        intra_hb_solute: &Tensor,
    ) -> Result<Self> {
        let batch_size = solvent_nodes.dim(0)?;
        if solute_nodes.dim(0)? != batch_size {
            return Err(GnnError::InvalidInput(format!(
                "shape mismatch: {} solvent rows vs {} solute rows",
                batch_size,
                solute_nodes.dim(0)?
            )));
        }

        let x = Tensor::cat(&[solvent_nodes, solute_nodes], 0)?;

        let inter_hb = inter_hb.flatten_all()?;
        let edge_attr = Tensor::cat(
            &[
                &inter_hb,
                &inter_hb,
                &intra_hb_solvent.flatten_all()?,
                &intra_hb_solute.flatten_all()?,
            ],
            0,
        )?
        .unsqueeze(1)?;
        if edge_attr.dim(0)? != 4 * batch_size {
            return Err(GnnError::InvalidInput(format!(
                "shape mismatch: {} edge features for {} edges",
                edge_attr.dim(0)?,
                4 * batch_size
            )));
        }

        let (src, dst) = system_edge_index(batch_size);
        let num_edges = src.len();
        let mut indices = src;
        indices.extend(dst);
        let edge_index = Tensor::from_vec(indices, (2, num_edges), x.device())?;

        debug!(
            "System graph: {} nodes, {} edges, node width {}",
            2 * batch_size,
            num_edges,
            x.dim(1)?
        );

        Ok(Self {
            x,
            edge_index,
            edge_attr,
            batch_size,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn num_nodes(&self) -> usize {
        2 * self.batch_size
    }

    pub fn num_edges(&self) -> usize {
        4 * self.batch_size
    }

    /// Join per-node outputs (2B, h) into per-mixture rows `[solvent | solute]` (B, 2h).
    pub fn pair_rows(&self, node_feats: &Tensor) -> candle_core::Result<Tensor> {
        let solvent = node_feats.narrow(0, 0, self.batch_size)?;
        let solute = node_feats.narrow(0, self.batch_size, self.batch_size)?;
        Tensor::cat(&[&solvent, &solute], 1)
    }
}
