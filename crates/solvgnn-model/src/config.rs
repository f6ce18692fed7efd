//! Configuration for the SolvGNN model.
//! Reads solvgnn.toml from the current directory or the path in SOLVGNN_CONFIG.

use std::path::Path;

use serde::{Deserialize, Serialize};
use solvgnn_common::{GnnError, Result};

use crate::{PoolingStrategy, TemperatureScale};

/// Architecture and runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Width of the atom feature rows
    #[serde(default = "default_in_dim")]
    pub in_dim: usize,

    /// Hidden width shared by the encoder and the interaction block
    #[serde(default = "default_hidden_dim")]
    pub hidden_dim: usize,

    /// Hidden width of the edge network (default: 32)
    #[serde(default = "default_edge_hidden_dim")]
    pub edge_hidden_dim: usize,

    /// Message-passing rounds over the system graph (default: 1)
    #[serde(default = "default_num_steps")]
    pub num_step_message_passing: usize,

    /// Pooling strategy (default: mean)
    #[serde(default)]
    pub pooling: PoolingStrategy,

    /// Temperature calibration bounds
    #[serde(default)]
    pub temperature: TemperatureScale,

    /// Use GPU if available (default: false)
    #[serde(default)]
    pub use_gpu: bool,

    /// Deterministic parameter initialisation
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_in_dim() -> usize { 37 }
fn default_hidden_dim() -> usize { 64 }
fn default_edge_hidden_dim() -> usize { 32 }
fn default_num_steps() -> usize { 1 }

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            in_dim: default_in_dim(),
            hidden_dim: default_hidden_dim(),
            edge_hidden_dim: default_edge_hidden_dim(),
            num_step_message_passing: default_num_steps(),
            pooling: PoolingStrategy::Mean,
            temperature: TemperatureScale::default(),
            use_gpu: false,
            seed: None,
        }
    }
}

impl ModelConfig {
    /// Create config for CPU-only inference.
    pub fn cpu() -> Self {
        Self {
            use_gpu: false,
            ..Default::default()
        }
    }

    /// Create config for GPU inference.
    pub fn gpu() -> Self {
        Self {
            use_gpu: true,
            ..Default::default()
        }
    }

    /// Set atom feature and hidden widths.
    pub fn with_dims(mut self, in_dim: usize, hidden_dim: usize) -> Self {
        self.in_dim = in_dim;
        self.hidden_dim = hidden_dim;
        self
    }

    pub fn with_message_passing_steps(mut self, steps: usize) -> Self {
        self.num_step_message_passing = steps;
        self
    }

    pub fn with_pooling(mut self, pooling: PoolingStrategy) -> Self {
        self.pooling = pooling;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| GnnError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.toml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GnnError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => {
                let config: Self = serde_json::from_str(&content)?;
                config.validate()?;
                Ok(config)
            }
            _ => Self::from_toml_str(&content),
        }
    }

    /// Load configuration.
    /// Checks SOLVGNN_CONFIG env var first, then solvgnn.toml in the current directory.
    pub fn load_from_env() -> Result<Self> {
        let path = std::env::var("SOLVGNN_CONFIG").unwrap_or_else(|_| "solvgnn.toml".to_string());
        Self::load(path)
    }

    pub fn validate(&self) -> Result<()> {
        if self.in_dim == 0 || self.hidden_dim == 0 || self.edge_hidden_dim == 0 {
            return Err(GnnError::Config(format!(
                "dimensions must be positive (in_dim={}, hidden_dim={}, edge_hidden_dim={})",
                self.in_dim, self.hidden_dim, self.edge_hidden_dim
            )));
        }
        if self.num_step_message_passing == 0 {
            return Err(GnnError::Config(
                "num_step_message_passing must be at least 1".to_string(),
            ));
        }
        if self.temperature.t_max_celsius <= self.temperature.t_min_celsius {
            return Err(GnnError::Config(format!(
                "empty temperature range [{}, {}]",
                self.temperature.t_min_celsius, self.temperature.t_max_celsius
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ModelConfig::default();
        assert_eq!(config.edge_hidden_dim, 32);
        assert_eq!(config.num_step_message_passing, 1);
        assert_eq!(config.pooling, PoolingStrategy::Mean);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = ModelConfig::from_toml_str(
            r#"
            in_dim = 9
            hidden_dim = 16
            seed = 42

            [temperature]
            t_max_celsius = 150.0
            "#,
        )
        .unwrap();

        assert_eq!(config.in_dim, 9);
        assert_eq!(config.hidden_dim, 16);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.edge_hidden_dim, 32);
        assert_eq!(config.temperature.t_min_celsius, -60.0);
        assert_eq!(config.temperature.t_max_celsius, 150.0);
    }

    #[test]
    fn test_rejects_zero_steps() {
        let result = ModelConfig::from_toml_str("num_step_message_passing = 0");
        assert!(matches!(result, Err(GnnError::Config(_))));
    }

    #[test]
    fn test_rejects_inverted_temperature_range() {
        let mut config = ModelConfig::default();
        config.temperature.t_max_celsius = -100.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_toml_and_json() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("solvgnn.toml");
        let mut f = std::fs::File::create(&toml_path).unwrap();
        writeln!(f, "hidden_dim = 12\npooling = \"Sum\"").unwrap();
        let from_toml = ModelConfig::load(&toml_path).unwrap();
        assert_eq!(from_toml.hidden_dim, 12);
        assert_eq!(from_toml.pooling, PoolingStrategy::Sum);

        let json_path = dir.path().join("solvgnn.json");
        std::fs::write(&json_path, serde_json::to_string(&from_toml).unwrap()).unwrap();
        let from_json = ModelConfig::load(&json_path).unwrap();
        assert_eq!(from_json, from_toml);
    }

    #[test]
    fn test_missing_file() {
        let result = ModelConfig::load("/nonexistent/solvgnn.toml");
        assert!(matches!(result, Err(GnnError::Config(_))));
    }
}
