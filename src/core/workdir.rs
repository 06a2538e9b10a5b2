// Copyright (c) 2024 tomoDRGN developers
// Licensed under the GNU General Public License v3.0
// ----------------------------

//! Locate and read the artifacts a training run leaves in its output
//! directory.

use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use walkdir::WalkDir;

use super::error::TomodrgnError;
use super::models::TrainingConfig;

/// Config file names tried in order.
const CONFIG_FILENAMES: [&str; 2] = ["config.toml", "config.json"];

/// A training output directory.
#[derive(Clone, Debug)]
pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    /// Opens an existing workdir.
    ///
    /// # Errors
    ///
    /// Returns [TomodrgnError::NotADirectory] if the path does not exist or is
    /// a regular file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TomodrgnError> {
        let root = path.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(TomodrgnError::NotADirectory(root));
        }
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Path of the first config file present in the workdir.
    pub fn config_path(&self) -> Result<PathBuf, TomodrgnError> {
        CONFIG_FILENAMES
            .iter()
            .map(|name| self.root.join(name))
            .find(|p| p.is_file())
            .ok_or_else(|| TomodrgnError::ConfigNotFound(self.root.clone()))
    }

    /// Reads and validates the job configuration.
    pub fn load_config(&self) -> Result<TrainingConfig> {
        let path = self.config_path()?;
        load_config_file(&path)
    }

    /// Epochs for which a `weights.<epoch>.pkl` checkpoint exists, ascending.
    pub fn checkpoints(&self) -> Result<Vec<usize>> {
        let mut epochs = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(epoch) = entry.file_name().to_str().and_then(checkpoint_epoch) {
                epochs.push(epoch);
            }
        }
        epochs.sort_unstable();
        debug!("checkpoints in {:?}: {:?}", self.root, epochs);
        Ok(epochs)
    }

    /// Most recent checkpoint, if training wrote any.
    pub fn latest_checkpoint(&self) -> Result<Option<(usize, PathBuf)>> {
        Ok(self
            .checkpoints()?
            .last()
            .map(|&epoch| (epoch, self.root.join(format!("weights.{}.pkl", epoch)))))
    }
}

/// Parses `weights.<epoch>.pkl` file names.
fn checkpoint_epoch(file_name: &str) -> Option<usize> {
    file_name
        .strip_prefix("weights.")?
        .strip_suffix(".pkl")?
        .parse()
        .ok()
}

/// Reads a config file, choosing the parser from its extension.
///
/// # Errors
///
/// Returns an error if the file is unreadable, has an unknown extension, is
/// malformed, or fails [TrainingConfig::validate].
pub fn load_config_file(path: &Path) -> Result<TrainingConfig> {
    let contents =
        read_to_string(path).with_context(|| format!("Failed to read config {:?}", path))?;
    let config: TrainingConfig = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&contents)
            .with_context(|| format!("Config {:?} is not valid TOML", path))?,
        Some("json") => serde_json::from_str(&contents)
            .with_context(|| format!("Config {:?} is not valid JSON", path))?,
        _ => return Err(TomodrgnError::UnsupportedConfigFormat(path.to_path_buf()).into()),
    };
    config.validate()?;
    debug!("loaded config from {:?}", path);
    Ok(config)
}
