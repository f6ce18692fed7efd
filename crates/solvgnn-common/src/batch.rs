//! Batched molecular graphs.
//!
//! A batch merges many molecules into one disconnected graph: atom rows are
//! stacked, bond indices are shifted by the running atom count, and a
//! membership vector maps every atom back to its molecule.

use std::collections::HashMap;
use std::path::Path;

use candle_core::{DType, Device, Tensor};
use tracing::debug;

use crate::{GnnError, MolecularGraph, Result};

/// One role (solvent or solute) of a batch of mixtures.
#[derive(Debug, Clone)]
pub struct MoleculeBatch {
    /// Atom features, (num_atoms, feature_dim)
    pub x: Tensor,

    /// Directed bonds, (2, num_edges) u32
    pub edge_index: Tensor,

    /// Molecule index of every atom, (num_atoms,) u32
    pub batch: Tensor,

    /// Atomic polarizability, (batch_size,)
    pub ap: Tensor,

    /// Bond polarizability, (batch_size,)
    pub bp: Tensor,

    /// Topological polar surface area, (batch_size,)
    pub topopsa: Tensor,

    /// Hydrogen-bond term, (batch_size,)
    pub inter_hb: Tensor,

    /// Labels, (batch_size, 1). Only the leading dimension is read.
    pub y: Tensor,
}

impl MoleculeBatch {
    /// Merge single-molecule records into one batch graph.
    pub fn collate(graphs: &[MolecularGraph], device: &Device) -> Result<Self> {
        if graphs.is_empty() {
            return Err(GnnError::InvalidInput("cannot collate an empty batch".to_string()));
        }

        let width = graphs
            .iter()
            .find_map(MolecularGraph::feature_dim)
            .ok_or_else(|| GnnError::InvalidInput("batch contains no atoms".to_string()))?;

        let mut features = Vec::new();
        let mut src = Vec::new();
        let mut dst = Vec::new();
        let mut membership = Vec::new();
        let mut offset = 0u32;

        for (i, graph) in graphs.iter().enumerate() {
            graph.validate()?;
            if let Some(w) = graph.feature_dim() {
                if w != width {
                    return Err(GnnError::InvalidInput(format!(
                        "molecule {} has feature width {}, expected {}",
                        i, w, width
                    )));
                }
            }

            for row in &graph.atom_features {
                features.extend_from_slice(row);
            }
            for &(s, d) in &graph.bonds {
                src.push(s + offset);
                dst.push(d + offset);
            }
            membership.extend(std::iter::repeat_n(i as u32, graph.num_atoms()));
            offset += graph.num_atoms() as u32;
        }

        let num_atoms = offset as usize;
        let num_edges = src.len();
        let batch_size = graphs.len();
        debug!(
            "Collated {} molecules: {} atoms, {} directed bonds",
            batch_size, num_atoms, num_edges
        );

        let column = |f: fn(&MolecularGraph) -> f32| -> Result<Tensor> {
            let values: Vec<f32> = graphs.iter().map(f).collect();
            Ok(Tensor::from_vec(values, batch_size, device)?)
        };

        src.extend(dst);

        Ok(Self {
            x: Tensor::from_vec(features, (num_atoms, width), device)?,
            edge_index: Tensor::from_vec(src, (2, num_edges), device)?,
            batch: Tensor::from_vec(membership, num_atoms, device)?,
            ap: column(|g| g.descriptors.ap)?,
            bp: column(|g| g.descriptors.bp)?,
            topopsa: column(|g| g.descriptors.topopsa)?,
            inter_hb: column(|g| g.descriptors.inter_hb)?,
            y: column(|g| g.y.unwrap_or(f32::NAN))?.reshape((batch_size, 1))?,
        })
    }

    /// Build a batch from featuriser tensors keyed `{prefix}.{field}`
    /// (or bare `{field}` when `prefix` is empty).
    pub fn from_named_tensors(tensors: &HashMap<String, Tensor>, prefix: &str) -> Result<Self> {
        let fetch = |field: &str| -> Result<Tensor> {
            let key = if prefix.is_empty() {
                field.to_string()
            } else {
                format!("{}.{}", prefix, field)
            };
            tensors.get(&key).cloned().ok_or(GnnError::MissingField(key))
        };
        let scalar = |field: &str| -> Result<Tensor> {
            Ok(fetch(field)?.to_dtype(DType::F32)?.flatten_all()?)
        };

        let y = fetch("y")?.to_dtype(DType::F32)?;
        let y = if y.rank() == 1 {
            let n = y.dim(0)?;
            y.reshape((n, 1))?
        } else {
            y
        };

        Ok(Self {
            x: fetch("x")?.to_dtype(DType::F32)?,
            edge_index: fetch("edge_index")?.to_dtype(DType::U32)?,
            batch: fetch("batch")?.to_dtype(DType::U32)?.flatten_all()?,
            ap: scalar("ap")?,
            bp: scalar("bp")?,
            topopsa: scalar("topopsa")?,
            inter_hb: scalar("inter_hb")?,
            y,
        })
    }

    /// Load a batch from a safetensors file.
    pub fn from_safetensors(path: impl AsRef<Path>, prefix: &str, device: &Device) -> Result<Self> {
        let tensors = candle_core::safetensors::load(path.as_ref(), device)?;
        debug!("Loaded {} tensors from {:?}", tensors.len(), path.as_ref());
        Self::from_named_tensors(&tensors, prefix)
    }

    /// Number of molecules, read from the label tensor.
    pub fn batch_size(&self) -> Result<usize> {
        Ok(self.y.dim(0)?)
    }

    pub fn num_atoms(&self) -> Result<usize> {
        Ok(self.x.dim(0)?)
    }

    /// `[ap, bp, topopsa]` as a (batch_size, 3) block.
    pub fn descriptors(&self) -> Result<Tensor> {
        Ok(Tensor::stack(&[&self.ap, &self.bp, &self.topopsa], 1)?)
    }

    pub fn device(&self) -> &Device {
        self.x.device()
    }
}

/// Mixture temperatures in degrees Celsius.
#[derive(Debug, Clone)]
pub struct TemperatureBatch {
    /// One value per batch element
    pub x: Tensor,
}

impl TemperatureBatch {
    /// Wrap featuriser temperatures, flattened to one f32 per batch element.
    pub fn new(x: Tensor) -> Result<Self> {
        Ok(Self {
            x: x.to_dtype(DType::F32)?.flatten_all()?,
        })
    }

    pub fn from_celsius(values: &[f32], device: &Device) -> Result<Self> {
        Ok(Self {
            x: Tensor::from_slice(values, values.len(), device)?,
        })
    }

    /// Read temperatures keyed `{prefix}.x` (or bare `x` when `prefix` is empty).
    pub fn from_named_tensors(tensors: &HashMap<String, Tensor>, prefix: &str) -> Result<Self> {
        let key = if prefix.is_empty() {
            "x".to_string()
        } else {
            format!("{}.x", prefix)
        };
        let x = tensors.get(&key).cloned().ok_or(GnnError::MissingField(key))?;
        Self::new(x)
    }

    pub fn from_safetensors(path: impl AsRef<Path>, prefix: &str, device: &Device) -> Result<Self> {
        let tensors = candle_core::safetensors::load(path.as_ref(), device)?;
        Self::from_named_tensors(&tensors, prefix)
    }

    pub fn len(&self) -> usize {
        self.x.elem_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
