//! Run a seeded SolvGNN on a toy solvent/solute batch

use solvgnn_common::{MolecularDescriptors, MolecularGraph, MoleculeBatch, TemperatureBatch};
use solvgnn_model::{ModelConfig, SolvGnnModel};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("solvgnn_model=debug,info")),
        )
        .init();

    // Fall back to a small seeded model when no solvgnn.toml is around
    let config = ModelConfig::load_from_env()
        .unwrap_or_else(|_| ModelConfig::cpu().with_dims(3, 16).with_seed(42));
    let model = SolvGnnModel::new(config)?;
    info!("Model has {} trainable parameters", model.num_parameters());

    // Water-like and ethanol-like skeletons; features: [is_O, is_C, n_H / 4]
    let water = MolecularGraph::new(
        vec![vec![1.0, 0.0, 0.5]],
        MolecularDescriptors::new(1.5, 0.0, 31.5, 2.0),
    );
    let ethanol = MolecularGraph::new(
        vec![vec![0.0, 1.0, 0.75], vec![0.0, 1.0, 0.5], vec![1.0, 0.0, 0.25]],
        MolecularDescriptors::new(5.1, 2.3, 20.2, 1.0),
    )
    .with_bond(0, 1)
    .with_bond(1, 2);

    let device = model.device().clone();
    let solvent = MoleculeBatch::collate(&[water.clone(), ethanol.clone()], &device)?;
    let solute = MoleculeBatch::collate(&[ethanol, water], &device)?;
    let temperature = TemperatureBatch::from_celsius(&[25.0, 60.0], &device)?;

    let prediction = model.forward(&solvent, &solute, &temperature)?;
    for (i, row) in prediction.to_vec2::<f32>()?.iter().enumerate() {
        println!("mixture {}: {:.4}", i, row[0]);
    }

    Ok(())
}
