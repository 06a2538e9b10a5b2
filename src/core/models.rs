// Copyright (c) 2024 tomoDRGN developers
// Licensed under the GNU General Public License v3.0
// ----------------------------

//! Serialization of the configuration a training run leaves in its workdir.
//!
//! Key names match what `train_vae` writes, including the upper-case and
//! mixed-case ones (`D`, `B`, `qlayersA`, `ignore_DC`).

use chrono::{DateTime, NaiveDateTime};
use serde::{de, Deserialize, Deserializer, Serialize};

use super::error::TomodrgnError;

/// Full configuration of a training job.
///
/// Field order matters for TOML output: plain values must come before tables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Random seed used for the run.
    pub seed: u64,
    pub dataset_args: DatasetArgs,
    pub lattice_args: LatticeArgs,
    pub model_args: ModelArgs,
    pub training_args: TrainingArgs,
    /// Provenance of the run. Shown separately by `view_config`, so it is
    /// never part of the serialized config body.
    #[serde(default, skip_serializing)]
    pub meta: Option<JobMeta>,
}

/// How the particle dataset was loaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetArgs {
    /// Input particles (.mrcs, .star, .cs, or .txt).
    pub particles: String,
    /// Data normalization as (shift, 1/scale).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub norm: Option<[f64; 2]>,
    /// Number of tilts sampled per particle during training.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ntilts: Option<usize>,
    pub invert_data: bool,
    /// Index file used to filter the particle stack.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ind: Option<String>,
    pub window: bool,
    pub window_r: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datadir: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatticeArgs {
    /// Lattice size, i.e. box size + 1.
    #[serde(rename = "D")]
    pub d: usize,
    pub extent: f64,
    #[serde(rename = "ignore_DC")]
    pub ignore_dc: bool,
}

impl LatticeArgs {
    /// Box size of the particle images in pixels.
    pub fn box_size(&self) -> usize {
        self.d.saturating_sub(1)
    }
}

/// Encoder/decoder architecture.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelArgs {
    pub in_dim: usize,
    #[serde(rename = "qlayersA")]
    pub qlayers_a: usize,
    #[serde(rename = "qdimA")]
    pub qdim_a: usize,
    #[serde(rename = "qlayersB")]
    pub qlayers_b: usize,
    #[serde(rename = "qdimB")]
    pub qdim_b: usize,
    #[serde(rename = "out_dimA")]
    pub out_dim_a: usize,
    pub players: usize,
    pub pdim: usize,
    /// Dimension of the latent variable.
    pub zdim: usize,
    /// Circular encoder mask radius; -1 disables masking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enc_mask: Option<i64>,
    pub pe_type: String,
    pub feat_sigma: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pe_dim: Option<usize>,
    pub domain: String,
    pub activation: String,
    #[serde(default)]
    pub l_dose_mask: bool,
    #[serde(default)]
    pub use_decoder_symmetry: bool,
}

/// Optimizer and bookkeeping settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingArgs {
    /// Number of epochs.
    pub n: usize,
    /// Minibatch size.
    #[serde(rename = "B")]
    pub b: usize,
    pub wd: f64,
    pub lr: f64,
    /// Beta schedule name or constant KLD weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta_control: Option<f64>,
    pub amp: bool,
    pub multigpu: bool,
    pub lazy: bool,
    pub recon_dose_weight: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dose_override: Option<f64>,
    pub recon_tilt_weight: bool,
    pub verbose: bool,
    pub log_interval: usize,
    /// Checkpointing interval in epochs.
    pub checkpoint: usize,
    pub outdir: String,
}

/// When, with what version, and by which command a job was launched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobMeta {
    /// Accepts an RFC 3339 string or a native TOML datetime.
    #[serde(deserialize_with = "deserialize_time")]
    pub time: NaiveDateTime,
    pub version: String,
    pub cmd: Vec<String>,
}

/// A launch time as either config format can hold it.
#[derive(Deserialize)]
#[serde(untagged)]
enum TimeValue {
    Text(String),
    Toml(toml::value::Datetime),
}

fn deserialize_time<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match TimeValue::deserialize(deserializer)? {
        TimeValue::Text(text) => text,
        TimeValue::Toml(datetime) => datetime.to_string(),
    };
    // Offsets are dropped, the recorded wall-clock time is what gets shown
    text.parse::<NaiveDateTime>()
        .or_else(|_| DateTime::parse_from_rfc3339(&text).map(|t| t.naive_local()))
        .map_err(|e| de::Error::custom(format!("invalid launch time {:?}: {}", text, e)))
}

impl TrainingConfig {
    /// Checks the invariants other tools rely on when reloading a model.
    ///
    /// # Errors
    ///
    /// Returns [TomodrgnError::InvalidConfig] if the latent dimension is zero
    /// or the lattice size does not correspond to an even box size.
    pub fn validate(&self) -> Result<(), TomodrgnError> {
        if self.model_args.zdim == 0 {
            return Err(TomodrgnError::InvalidConfig(
                "model_args.zdim must be at least 1".to_owned(),
            ));
        }
        let d = self.lattice_args.d;
        if d < 3 || d % 2 == 0 {
            return Err(TomodrgnError::InvalidConfig(format!(
                "lattice_args.D must be an odd number >= 3 (box size + 1), got {}",
                d
            )));
        }
        Ok(())
    }
}
