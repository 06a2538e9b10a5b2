// Copyright (c) 2024 tomoDRGN developers
// Licensed under the GNU General Public License v3.0
// ----------------------------

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};

use super::api_reference::{self, ReferenceFormat};
use super::graph::{check_anchors, LatentGraph, Traversal};
use super::latent::Embeddings;
use super::models::TrainingConfig;
use super::workdir::WorkDir;
use crate::app_config::{AppConfig, ConfigFormat};

/// Output file with one particle index per line along the traversal.
pub const PATH_INDICES_FILENAME: &str = "path_particle_indices.txt";
/// Output file with the embeddings of the particles along the traversal.
pub const PATH_EMBEDDINGS_FILENAME: &str = "path_particle_embeddings.txt";

/// Print the configuration of a training job.
pub fn view_config(workdir: &Path, format: ConfigFormat, show_meta: bool) -> Result<()> {
    let workdir = WorkDir::open(workdir)?;
    let config = workdir.load_config()?;

    match workdir.latest_checkpoint()? {
        Some((epoch, path)) => info!("Latest checkpoint: epoch {} ({:?})", epoch, path),
        None => info!("No checkpoints found in {:?}", workdir.path()),
    }

    print!("{}", render_config(&config, format, show_meta)?);
    Ok(())
}

/// Formats a job configuration, optionally preceded by how the job was run.
pub fn render_config(config: &TrainingConfig, format: ConfigFormat, show_meta: bool) -> Result<String> {
    let mut out = String::new();
    if show_meta {
        if let Some(meta) = &config.meta {
            out.push_str(&format!("Version: {}\n", meta.version));
            out.push_str(&format!("Creation time: {}\n", meta.time));
            out.push_str("Command:\n");
            out.push_str(&meta.cmd.join(" "));
            out.push('\n');
        }
    }
    out.push_str("Config:\n");
    let body = match format {
        ConfigFormat::Toml => toml::to_string(config)?,
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
    };
    out.push_str(&body);
    if !body.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

/// Render the API reference index.
pub fn api_reference(format: ReferenceFormat) -> String {
    api_reference::render(format)
}

/// Inputs for [graph_traversal].
#[derive(Debug)]
pub struct GraphTraversalArgs {
    /// Latent embeddings text file.
    pub z: PathBuf,
    pub anchors: Vec<usize>,
    pub outdir: PathBuf,
    pub max_neighbors: usize,
    pub avg_neighbors: Option<f64>,
}

/// Find the shortest path through latent space connecting the anchors and
/// save the particles along it.
pub fn graph_traversal(args: &GraphTraversalArgs) -> Result<Traversal> {
    info!("{:?}", args);
    let data = Embeddings::load(&args.z)?;
    info!(
        "Loaded {} particles with {}-dimensional embeddings",
        data.len(),
        data.zdim()
    );
    check_anchors(&args.anchors, data.len())
        .with_context(|| format!("Invalid anchors for {:?}", args.z))?;

    fs::create_dir_all(&args.outdir)
        .with_context(|| format!("Failed to create output directory {:?}", args.outdir))?;

    let graph = LatentGraph::from_embeddings(&data, args.max_neighbors, args.avg_neighbors)?;
    let traversal = graph.traverse(&data, &args.anchors)?;
    if traversal.path.is_empty() {
        warn!("No path connects any pair of consecutive anchors");
    }

    let indices_path = args.outdir.join(PATH_INDICES_FILENAME);
    let indices: String = traversal
        .path
        .iter()
        .map(|i| format!("{}\n", i))
        .collect();
    fs::write(&indices_path, indices)
        .with_context(|| format!("Failed to write {:?}", indices_path))?;

    data.select(&traversal.path)
        .write(args.outdir.join(PATH_EMBEDDINGS_FILENAME))?;
    info!("Wrote path of {} particles to {:?}", traversal.path.len(), args.outdir);

    Ok(traversal)
}

/// Show the tool settings with all overrides applied
pub fn print_config(settings: config::Config) -> Result<()> {
    let app_config: AppConfig = settings.try_into()?;
    println!("{}", toml::to_string(&app_config)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::core::workdir::load_config_file;

    fn fixture_config() -> TrainingConfig {
        load_config_file(Path::new("fixtures/workdir_toml/config.toml")).unwrap()
    }

    #[test]
    fn meta_precedes_config() {
        let out = render_config(&fixture_config(), ConfigFormat::Toml, true).unwrap();
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("Version: 0.2.2"));
        assert_eq!(lines.next(), Some("Creation time: 2023-05-01 12:30:00"));
        assert_eq!(lines.next(), Some("Command:"));
        assert_eq!(
            lines.next(),
            Some("tomodrgn train_vae /data/sim/particles_imageseries.star -o output/vae_both_sim_zdim8 --zdim 8")
        );
        assert_eq!(lines.next(), Some("Config:"));
        assert_eq!(lines.next(), Some("seed = 42"));
    }

    #[test]
    fn meta_can_be_hidden() {
        let out = render_config(&fixture_config(), ConfigFormat::Toml, false).unwrap();
        assert!(out.starts_with("Config:\n"));
        assert!(!out.contains("Version:"));
    }

    #[test]
    fn json_body_is_parseable() {
        let config = fixture_config();
        let out = render_config(&config, ConfigFormat::Json, false).unwrap();
        let body = out.strip_prefix("Config:\n").unwrap();
        let reparsed: TrainingConfig = serde_json::from_str(body).unwrap();
        assert_eq!(reparsed.model_args, config.model_args);
        assert!(reparsed.meta.is_none());
    }

    #[test]
    fn traversal_writes_outputs() {
        let outdir = TempDir::new().unwrap();
        let args = GraphTraversalArgs {
            z: PathBuf::from("fixtures/embeddings_line.txt"),
            anchors: vec![0, 5],
            outdir: outdir.path().join("traversal"),
            max_neighbors: 2,
            avg_neighbors: Some(2.0),
        };
        let traversal = graph_traversal(&args).unwrap();
        assert_eq!(traversal.path, vec![0, 1, 2, 3, 4, 5]);

        let indices = fs::read_to_string(args.outdir.join(PATH_INDICES_FILENAME)).unwrap();
        assert_eq!(indices, "0\n1\n2\n3\n4\n5\n");
        let z = Embeddings::load(args.outdir.join(PATH_EMBEDDINGS_FILENAME)).unwrap();
        assert_eq!(z.len(), 6);
        assert_eq!(z.row(5), &[3.0, 2.0]);
    }

    #[test]
    fn bad_anchor_fails_before_writing() {
        let outdir = TempDir::new().unwrap();
        let args = GraphTraversalArgs {
            z: PathBuf::from("fixtures/embeddings_line.txt"),
            anchors: vec![0, 99],
            outdir: outdir.path().join("traversal"),
            max_neighbors: 2,
            avg_neighbors: None,
        };
        let e = graph_traversal(&args).unwrap_err();
        assert!(format!("{:#}", e).contains("Anchor 99"));
        assert!(!args.outdir.exists());
    }
}
