//! Descriptor assembly: pooled embeddings joined with physicochemical descriptors.

use candle_core::Tensor;
use solvgnn_common::{MoleculeBatch, Result};

/// Atomic polarizability, bond polarizability, topological polar surface area.
pub const NUM_DESCRIPTORS: usize = 3;

/// Concatenate pooled embeddings (B, h) with descriptors (B, 3) into (B, h + 3).
pub fn assemble(pooled: &Tensor, descriptors: &Tensor) -> candle_core::Result<Tensor> {
    Tensor::cat(&[pooled, descriptors], 1)
}

/// Augmented node features for one role, using that role's own descriptors.
pub fn augmented_node_features(pooled: &Tensor, molecules: &MoleculeBatch) -> Result<Tensor> {
    let descriptors = molecules.descriptors()?;
    Ok(assemble(pooled, &descriptors)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;
    use solvgnn_common::{MolecularDescriptors, MolecularGraph};

    #[test]
    fn test_assemble_appends_descriptor_columns() {
        let device = Device::Cpu;
        let molecules = MoleculeBatch::collate(
            &[
                MolecularGraph::new(vec![vec![1.0]], MolecularDescriptors::new(1.0, 2.0, 3.0, 0.0)),
                MolecularGraph::new(vec![vec![1.0]], MolecularDescriptors::new(4.0, 5.0, 6.0, 0.0)),
            ],
            &device,
        )
        .unwrap();
        let pooled = Tensor::new(&[[0.1f32, 0.2], [0.3, 0.4]], &device).unwrap();

        let nodes = augmented_node_features(&pooled, &molecules).unwrap();
        assert_eq!(nodes.dims(), &[2, 2 + NUM_DESCRIPTORS]);
        assert_eq!(
            nodes.to_vec2::<f32>().unwrap(),
            vec![vec![0.1, 0.2, 1.0, 2.0, 3.0], vec![0.3, 0.4, 4.0, 5.0, 6.0]]
        );
    }

    #[test]
    fn test_assemble_row_mismatch_fails() {
        let device = Device::Cpu;
        let pooled = Tensor::new(&[[0.1f32, 0.2]], &device).unwrap();
        let descriptors = Tensor::new(&[[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]], &device).unwrap();
        assert!(assemble(&pooled, &descriptors).is_err());
    }
}
