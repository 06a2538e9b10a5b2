// Copyright (c) 2024 tomoDRGN developers
// Licensed under the GNU General Public License v3.0
// ----------------------------

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use clap::{crate_authors, crate_description, crate_version};
use clap::{Arg, ArgMatches, Command};
use strum::VariantNames;

use crate::app_config::{AppConfig, ConfigFormat};
use crate::core::api_reference::ReferenceFormat;
use crate::core::commands;

/// Match commands
pub fn cli_match(settings: config::Config, cli_matches: ArgMatches) -> Result<()> {
    // Handle config subcommand first, it is the tool for debugging bad settings
    if let Some(("config", _config_matches)) = cli_matches.subcommand() {
        commands::print_config(settings)?;
        return Ok(());
    }

    let app_config: AppConfig = settings.try_into()?;

    match cli_matches.subcommand() {
        Some(("view_config", view_matches)) => {
            // Required arguments, clap reports their absence before we get here
            let workdir: PathBuf = view_matches
                .value_of_t("workdir")
                .unwrap_or_else(|e| e.exit());
            let format = match view_matches.value_of("format") {
                Some(format) => ConfigFormat::from_str(format)?,
                None => app_config.view_config.format()?,
            };
            commands::view_config(&workdir, format, app_config.view_config.show_meta)?;
        }
        Some(("api_reference", reference_matches)) => {
            let format = match reference_matches.value_of("format") {
                Some(format) => ReferenceFormat::from_str(format)?,
                None => ReferenceFormat::default(),
            };
            print!("{}", commands::api_reference(format));
        }
        Some(("graph_traversal", traversal_matches)) => {
            let max_neighbors = if traversal_matches.is_present("max_neighbors") {
                traversal_matches
                    .value_of_t("max_neighbors")
                    .unwrap_or_else(|e| e.exit())
            } else {
                app_config.graph_traversal.max_neighbors
            };
            let avg_neighbors = if traversal_matches.is_present("avg_neighbors") {
                Some(
                    traversal_matches
                        .value_of_t("avg_neighbors")
                        .unwrap_or_else(|e| e.exit()),
                )
            } else {
                None
            };
            let args = commands::GraphTraversalArgs {
                z: traversal_matches.value_of_t("z").unwrap_or_else(|e| e.exit()),
                anchors: traversal_matches
                    .values_of_t("anchors")
                    .unwrap_or_else(|e| e.exit()),
                outdir: traversal_matches
                    .value_of_t("outdir")
                    .unwrap_or_else(|e| e.exit()),
                max_neighbors,
                avg_neighbors,
            };
            commands::graph_traversal(&args)?;
        }
        _ => {
            // Arguments are required by default (in Clap).
            // This section should never execute.
            unreachable!("No matching subcommand!");
        }
    }
    Ok(())
}

/// Configure Clap
pub fn build_cli() -> Command<'static> {
    Command::new("tomodrgn")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .version(crate_version!())
        .about(crate_description!())
        .author(crate_authors!("\n"))
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Set a custom settings file")
                .takes_value(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase verbosity")
                .global(true),
        )
        .subcommand(
            Command::new("view_config")
                .about("Display config information of a tomoDRGN job")
                .arg(
                    Arg::new("workdir")
                        .required(true)
                        .value_name("WORKDIR")
                        .help("Directory with tomoDRGN results")
                        .takes_value(true),
                )
                .arg(
                    Arg::new("format")
                        .short('f')
                        .long("format")
                        .value_name("FORMAT")
                        .help("Output format [default: from settings, toml]")
                        .possible_values(ConfigFormat::VARIANTS.iter().copied())
                        .takes_value(true),
                ),
        )
        .subcommand(
            Command::new("api_reference")
                .about("Print the API reference index")
                .arg(
                    Arg::new("format")
                        .short('f')
                        .long("format")
                        .value_name("FORMAT")
                        .help("Rendering of the index")
                        .default_value("rst")
                        .possible_values(ReferenceFormat::VARIANTS.iter().copied())
                        .takes_value(true),
                ),
        )
        .subcommand(
            Command::new("graph_traversal")
                .about("Sample latent embeddings along the shortest path through the latent space nearest neighbor graph which connects specified anchor points")
                .arg(
                    Arg::new("z")
                        .required(true)
                        .value_name("Z")
                        .help("Input latent embeddings text file, one particle per row")
                        .takes_value(true),
                )
                .arg(
                    Arg::new("anchors")
                        .long("anchors")
                        .value_name("INDEX")
                        .help("Indices of anchor points along desired trajectory. At least 2 points must be specified.")
                        .required(true)
                        .takes_value(true)
                        .multiple_values(true),
                )
                .arg(
                    Arg::new("outdir")
                        .short('o')
                        .long("outdir")
                        .value_name("DIR")
                        .help("Directory in which to store output .txt files of path indices and latent embeddings")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::new("max_neighbors")
                        .long("max-neighbors")
                        .value_name("N")
                        .help("The maximum number of neighbors to initially calculate distances for from each latent embedding [default: from settings, 10]")
                        .takes_value(true),
                )
                .arg(
                    Arg::new("avg_neighbors")
                        .long("avg-neighbors")
                        .value_name("N")
                        .help("Used to set a cutoff distance defining connected neighbors such that each embedding will have this many connected neighbors on average")
                        .takes_value(true),
                ),
        )
        .subcommand(Command::new("config").about("Show tool settings"))
}

/// Parse the process arguments, exiting with usage on error
pub fn cli_config() -> Result<ArgMatches> {
    let cli_matches = build_cli().get_matches();

    Ok(cli_matches)
}
