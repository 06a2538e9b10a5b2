// Copyright (c) 2024 tomoDRGN developers
// Licensed under the GNU General Public License v3.0
// ----------------------------

use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use strum::VariantNames;
use strum_macros::{AsRefStr, Display, EnumString, EnumVariantNames};

/// Settings file used when `--config` is not given. Optional.
pub const DEFAULT_SETTINGS_PATH: &str = "~/.config/tomodrgn/tomodrgn.toml";

/// Environment overrides look like `TOMODRGN_VIEW_CONFIG__FORMAT=json`
/// (note the double underscore between section and key).
pub const ENV_PREFIX: &str = "TOMODRGN";

/// Output formats for a job configuration.
#[derive(AsRefStr, Display, EnumVariantNames, EnumString, Clone, Copy, Debug, PartialEq)]
pub enum ConfigFormat {
    #[strum(serialize = "toml")]
    Toml,
    #[strum(serialize = "json")]
    Json,
}

impl Default for ConfigFormat {
    fn default() -> Self {
        ConfigFormat::Toml
    }
}

/// All tool settings, as shown by the `config` subcommand.
#[derive(Debug, Deserialize, Serialize)]
pub struct AppConfig {
    pub view_config: ViewConfigSettings,
    pub graph_traversal: GraphTraversalSettings,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ViewConfigSettings {
    /// Default output format, one of [ConfigFormat::VARIANTS].
    pub format: String,
    /// Print version, creation time and command before the config.
    pub show_meta: bool,
}

impl ViewConfigSettings {
    pub fn format(&self) -> Result<ConfigFormat> {
        ConfigFormat::from_str(&self.format).map_err(|_| {
            anyhow!(
                "view_config.format {:?} is not one of {:?}",
                self.format,
                ConfigFormat::VARIANTS
            )
        })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GraphTraversalSettings {
    /// Default for `--max-neighbors`.
    pub max_neighbors: usize,
}

/// Built-in defaults, before any file or environment overrides.
pub fn default_settings() -> Result<config::Config> {
    let mut settings = config::Config::default();
    settings.set_default("view_config.format", ConfigFormat::default().as_ref())?;
    settings.set_default("view_config.show_meta", true)?;
    settings.set_default("graph_traversal.max_neighbors", 10_i64)?;
    Ok(settings)
}

/// Layers defaults, the settings file and environment variables.
///
/// An explicitly given settings file must exist; the default one is used
/// only if present.
pub fn load_settings(settings_file: Option<&str>) -> Result<config::Config> {
    let mut settings = default_settings()?;
    match settings_file {
        Some(path) => settings.merge(config::File::with_name(path))?,
        None => settings.merge(
            config::File::with_name(&shellexpand::tilde(DEFAULT_SETTINGS_PATH)).required(false),
        )?,
    };

    settings.merge(config::Environment::with_prefix(ENV_PREFIX).separator("__"))?;
    Ok(settings)
}
