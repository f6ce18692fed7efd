//! SolvGNN mixture property model
//!
//! Pure Rust graph neural network for binary mixtures using Candle.
//! Two molecules are encoded with a shared GCN, mean-pooled, augmented with
//! physicochemical descriptors and fused into a small system graph whose
//! edges carry hydrogen-bonding terms. An edge-conditioned MPNN with a GRU
//! update turns that graph into a pairwise fingerprint which, together with
//! the normalised temperature, is regressed to one scalar per mixture.
//!
//! # Example
//! ```rust,no_run
//! use candle_core::Device;
//! use solvgnn_common::{MolecularDescriptors, MolecularGraph, MoleculeBatch, TemperatureBatch};
//! use solvgnn_model::{ModelConfig, SolvGnnModel};
//!
//! fn main() -> solvgnn_common::Result<()> {
//!     let config = ModelConfig::cpu().with_dims(2, 8).with_seed(7);
//!     let model = SolvGnnModel::new(config)?;
//!
//!     let molecule = MolecularGraph::new(
//!         vec![vec![1.0, 0.0], vec![0.0, 1.0]],
//!         MolecularDescriptors::new(3.2, 1.1, 20.2, 1.0),
//!     )
//!     .with_bond(0, 1);
//!
//!     let solvent = MoleculeBatch::collate(&[molecule.clone()], &Device::Cpu)?;
//!     let solute = MoleculeBatch::collate(&[molecule], &Device::Cpu)?;
//!     let t = TemperatureBatch::from_celsius(&[25.0], &Device::Cpu)?;
//!
//!     let prediction = model.forward(&solvent, &solute, &t)?;
//!     println!("{:?}", prediction.to_vec2::<f32>()?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod params;
pub mod encoder;
pub mod pooling;
pub mod descriptors;
pub mod system_graph;
pub mod mpnn;
pub mod temperature;
pub mod regressor;
pub mod model;

pub use config::ModelConfig;
pub use encoder::{GcnConv, MolecularEncoder};
pub use model::{SolvGnn, SolvGnnModel};
pub use mpnn::{InteractionMpnn, NnConv};
pub use params::ParameterStore;
pub use pooling::PoolingStrategy;
pub use regressor::PropertyRegressor;
pub use system_graph::SystemGraph;
pub use temperature::TemperatureScale;
