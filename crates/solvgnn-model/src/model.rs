//! The assembled SolvGNN model.

use std::time::Instant;

use candle_core::{Device, Tensor};
use candle_nn::{Module, VarBuilder};
use solvgnn_common::{GnnError, MoleculeBatch, Result, TemperatureBatch};
use tracing::{debug, info};

use crate::descriptors::{augmented_node_features, NUM_DESCRIPTORS};
use crate::{
    InteractionMpnn, ModelConfig, MolecularEncoder, ParameterStore, PoolingStrategy,
    PropertyRegressor, SystemGraph, TemperatureScale,
};

/// Width of the system graph edge features.
const EDGE_FEATURES: usize = 1;

/// Network graph of the model, independent of where its parameters live.
pub struct SolvGnn {
    encoder: MolecularEncoder,
    pooling: PoolingStrategy,
    interaction: InteractionMpnn,
    regressor: PropertyRegressor,
    temperature: TemperatureScale,
}

impl SolvGnn {
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        let h = config.hidden_dim;
        Ok(Self {
            encoder: MolecularEncoder::new(config.in_dim, h, vb.pp("encoder"))?,
            pooling: config.pooling,
            interaction: InteractionMpnn::new(
                h + NUM_DESCRIPTORS,
                EDGE_FEATURES,
                h,
                config.edge_hidden_dim,
                config.num_step_message_passing,
                vb.pp("interaction"),
            )?,
            regressor: PropertyRegressor::new(h, vb.pp("regressor"))?,
            temperature: config.temperature,
        })
    }

    /// Per-atom hidden vectors, (num_atoms, hidden_dim).
    pub fn encode(&self, molecules: &MoleculeBatch) -> Result<Tensor> {
        Ok(self.encoder.forward(&molecules.x, &molecules.edge_index)?)
    }

    /// Pooled embedding joined with the role's descriptors, (B, hidden_dim + 3).
    pub fn embed(&self, molecules: &MoleculeBatch) -> Result<Tensor> {
        let atoms = self.encode(molecules)?;
        let pooled = self
            .pooling
            .apply(&atoms, &molecules.batch, molecules.batch_size()?)?;
        augmented_node_features(&pooled, molecules)
    }

    /// Build the system graph for a batch of mixtures.
    ///
    /// The pair edges carry the solvent batch's hydrogen-bond term; each
    /// self-loop carries its own molecule's term.
    pub fn system_graph(&self, solvent: &MoleculeBatch, solute: &MoleculeBatch) -> Result<SystemGraph> {
        let solvent_nodes = self.embed(solvent)?;
        let solute_nodes = self.embed(solute)?;
        SystemGraph::build(
            &solvent_nodes,
            &solute_nodes,
            &solvent.inter_hb,
            &solvent.inter_hb,
            &solute.inter_hb,
        )
    }

    /// Pairwise interaction fingerprint `[solvent | solute]`, (B, 2 * hidden_dim).
    pub fn interaction_fingerprint(&self, solvent: &MoleculeBatch, solute: &MoleculeBatch) -> Result<Tensor> {
        let graph = self.system_graph(solvent, solute)?;
        Ok(self.interaction.fingerprint(&graph)?)
    }

    /// Predict one scalar per mixture, (B, 1).
    pub fn forward(
        &self,
        solvent: &MoleculeBatch,
        solute: &MoleculeBatch,
        temperature: &TemperatureBatch,
    ) -> Result<Tensor> {
        let fingerprint = self.interaction_fingerprint(solvent, solute)?;
        let t_norm = self.temperature.normalize(&temperature.x)?;
        let features = Tensor::cat(&[&fingerprint, &t_norm], 1)?;
        debug!("Regressor input: {:?}", features.shape());
        Ok(self.regressor.forward(&features)?)
    }
}

/// SolvGNN with its parameters and device.
pub struct SolvGnnModel {
    net: SolvGnn,
    params: ParameterStore,
    device: Device,
    config: ModelConfig,
}

impl SolvGnnModel {
    /// Build a model with freshly initialised parameters.
    ///
    /// With `config.seed` set, initialisation is deterministic.
    pub fn new(config: ModelConfig) -> Result<Self> {
        let start = Instant::now();
        config.validate()?;

        let device = Self::select_device(&config)?;
        debug!("Using device: {:?}", device);

        let params = ParameterStore::new(device.clone());
        let net = SolvGnn::new(&config, params.var_builder())?;
        if let Some(seed) = config.seed {
            params.reseed(seed)?;
        }

        info!(
            "SolvGNN built in {:.2}ms: in_dim={}, hidden_dim={}, {} parameters",
            start.elapsed().as_secs_f32() * 1000.0,
            config.in_dim,
            config.hidden_dim,
            params.num_parameters()
        );
        debug!(
            "Temperature scale [{}, {}] C; 25 C maps to {:.4}",
            config.temperature.t_min_celsius,
            config.temperature.t_max_celsius,
            config.temperature.normalize_scalar(25.0)
        );

        Ok(Self {
            net,
            params,
            device,
            config,
        })
    }

    /// Select the best available device.
    ///
    /// Falls back to CPU when a compiled-in backend has no device; asking for
    /// a GPU in a CPU-only build is a `Device` error.
    fn select_device(config: &ModelConfig) -> Result<Device> {
        if !config.use_gpu {
            return Ok(Device::Cpu);
        }

        #[cfg(feature = "cuda")]
        {
            match Device::new_cuda(0) {
                Ok(device) => {
                    info!("CUDA device available");
                    return Ok(device);
                }
                Err(e) => {
                    debug!("CUDA not available: {}, falling back to CPU", e);
                }
            }
        }

        #[cfg(feature = "metal")]
        {
            match Device::new_metal(0) {
                Ok(device) => {
                    info!("Metal device available");
                    return Ok(device);
                }
                Err(e) => {
                    debug!("Metal not available: {}, falling back to CPU", e);
                }
            }
        }

        if cfg!(any(feature = "cuda", feature = "metal")) {
            Ok(Device::Cpu)
        } else {
            Err(GnnError::Device(
                "use_gpu is set but no cuda or metal backend was compiled in".to_string(),
            ))
        }
    }

    pub fn forward(
        &self,
        solvent: &MoleculeBatch,
        solute: &MoleculeBatch,
        temperature: &TemperatureBatch,
    ) -> Result<Tensor> {
        self.net.forward(solvent, solute, temperature)
    }

    pub fn net(&self) -> &SolvGnn {
        &self.net
    }

    pub fn parameters(&self) -> &ParameterStore {
        &self.params
    }

    /// Count of trainable scalar parameters.
    pub fn num_parameters(&self) -> usize {
        self.params.num_parameters()
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Check if GPU is being used.
    pub fn is_gpu(&self) -> bool {
        matches!(self.device, Device::Cuda(_) | Device::Metal(_))
    }
}
