//! Single-molecule graph records as produced by the featuriser.

use serde::{Deserialize, Serialize};

use crate::{GnnError, Result};

/// Per-molecule physicochemical descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct MolecularDescriptors {
    /// Atomic polarizability
    pub ap: f32,

    /// Bond polarizability
    pub bp: f32,

    /// Topological polar surface area
    pub topopsa: f32,

    /// Hydrogen-bond term
    pub inter_hb: f32,
}

impl MolecularDescriptors {
    pub fn new(ap: f32, bp: f32, topopsa: f32, inter_hb: f32) -> Self {
        Self { ap, bp, topopsa, inter_hb }
    }
}

/// One molecule: atom feature rows plus a directed bond list.
///
/// Bonds are stored as directed `(src, dst)` pairs local to the molecule,
/// so an undirected bond appears twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MolecularGraph {
    pub atom_features: Vec<Vec<f32>>,

    #[serde(default)]
    pub bonds: Vec<(u32, u32)>,

    pub descriptors: MolecularDescriptors,

    /// Target value of the mixture this molecule belongs to, if labelled.
    #[serde(default)]
    pub y: Option<f32>,
}

impl MolecularGraph {
    pub fn new(atom_features: Vec<Vec<f32>>, descriptors: MolecularDescriptors) -> Self {
        Self {
            atom_features,
            bonds: Vec::new(),
            descriptors,
            y: None,
        }
    }

    /// Add an undirected bond (both directions).
    pub fn with_bond(mut self, a: u32, b: u32) -> Self {
        self.bonds.push((a, b));
        self.bonds.push((b, a));
        self
    }

    pub fn with_label(mut self, y: f32) -> Self {
        self.y = Some(y);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let graph: Self = serde_json::from_str(json)?;
        graph.validate()?;
        Ok(graph)
    }

    pub fn num_atoms(&self) -> usize {
        self.atom_features.len()
    }

    /// Width of the atom feature rows, `None` for an empty molecule.
    pub fn feature_dim(&self) -> Option<usize> {
        self.atom_features.first().map(Vec::len)
    }

    /// Check row widths and bond endpoints.
    pub fn validate(&self) -> Result<()> {
        if let Some(width) = self.feature_dim() {
            if let Some(row) = self.atom_features.iter().position(|r| r.len() != width) {
                return Err(GnnError::InvalidInput(format!(
                    "atom {} has {} features, expected {}",
                    row,
                    self.atom_features[row].len(),
                    width
                )));
            }
        }

        let n = self.num_atoms() as u32;
        if let Some(&(src, dst)) = self.bonds.iter().find(|(s, d)| *s >= n || *d >= n) {
            return Err(GnnError::InvalidInput(format!(
                "bond ({}, {}) out of range for {} atoms",
                src, dst, n
            )));
        }
        Ok(())
    }
}
