//! solvgnn-common — Molecular graph records, batched graphs and the shared
//! error type used across the SolvGNN crates.
//!
//! The featuriser hands molecules over either as [`MolecularGraph`] records
//! (collated here into a merged batch graph) or as named tensors, e.g. a
//! safetensors file written next to the dataset.

pub mod error;
pub mod graph;
pub mod batch;

pub use error::{GnnError, Result};
pub use graph::{MolecularDescriptors, MolecularGraph};
pub use batch::{MoleculeBatch, TemperatureBatch};
