// Copyright (c) 2024 tomoDRGN developers
// Licensed under the GNU General Public License v3.0
// ----------------------------

use std::path::PathBuf;

use thiserror::Error;

/// Error conditions raised by the workdir, embeddings and graph modules.
///
/// Command plumbing wraps these in [anyhow::Error] with file context, so
/// callers that care about the kind can still `downcast_ref` to this type.
#[derive(Debug, Error)]
pub enum TomodrgnError {
    #[error("{0:?} is not a directory")]
    NotADirectory(PathBuf),

    #[error("No config.toml or config.json found in {0:?}. Is this a tomoDRGN training output directory?")]
    ConfigNotFound(PathBuf),

    #[error("Unsupported config format {0:?} (expected .toml or .json)")]
    UnsupportedConfigFormat(PathBuf),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Malformed embeddings: {0}")]
    MalformedEmbeddings(String),

    #[error("Invalid graph arguments: {0}")]
    InvalidGraphArgs(String),
}
