//! tomodrgn is a Command Line Interface (CLI) companion for tomoDRGN, the
//! cryo-electron tomography deep generative modeling toolkit.
//!
//! It inspects the output directories that training leaves behind, prints the
//! toolkit's API reference index for the documentation build, and traces
//! paths through the latent space learned by a model.
//!
//! # Usage
//!
//! View CLI help with `tomodrgn help` or `tomodrgn help <subcommand>`.
//!
//! ## Settings
//!
//! No settings file is required. Defaults can be changed by either:
//!
//! - Placing a settings file at `~/.config/tomodrgn/tomodrgn.toml`
//! - Using the `--config path/to/tomodrgn.toml` flag
//!
//! Any setting may be overridden from the environment, e.g.
//! `TOMODRGN_VIEW_CONFIG__FORMAT=json` (note the double underscore between
//! section and key).
//!
//! ```toml
//! [view_config]
//! format = "toml"
//! show_meta = true
//!
//! [graph_traversal]
//! max_neighbors = 10
//! ```
//!
//! ## Commands
//!
//! ```tomodrgn view_config <workdir>```
//!
//! Prints the configuration of a training job. `<workdir>` is the output
//! directory given to `train_vae` with `-o`; it must contain a `config.toml`
//! or `config.json`. If the job recorded how it was launched, the tomoDRGN
//! version, creation time and full command are printed first. Use `--format
//! json` for machine-readable output.
//!
//! <br>
//!
//! ---
//!
//! ```tomodrgn api_reference [--format rst|tree|list]```
//!
//! Prints the API reference index: the documented modules under the "TomoDRGN
//! core" and "TomoDRGN commands" captions. The default `rst` rendering is the
//! page Sphinx expands into per-module documentation.
//!
//! <br>
//!
//! ---
//!
//! ```tomodrgn graph_traversal <z> --anchors <index>... -o <outdir>```
//!
//! Connects each particle to its nearest neighbours in latent space, then
//! finds the shortest path through that graph visiting the anchor particles in
//! order. The particle indices along the path and their embeddings are written
//! to `path_particle_indices.txt` and `path_particle_embeddings.txt` in
//! `<outdir>`. `<z>` is a text file of embeddings, one particle per row.
//!
//! <br>
//!
//! ---
//!
//! ```tomodrgn config```
//!
//! Echoes current settings (with any overrides applied) and exits.
//!
//! ## Examples
//!
//! ```shell
//! tomodrgn view_config output/vae_both_sim_zdim2
//! tomodrgn view_config output/vae_warptools_70S_zdim2
//!
//! # Write the API reference page for the docs build
//! tomodrgn api_reference > docs/api_reference.rst
//!
//! # Path from particle 12 through 480 to 77, with on average 5 neighbours per
//! # particle
//! tomodrgn graph_traversal z.txt --anchors 12 480 77 --avg-neighbors 5 -o traversal
//! ```
//!
//! # Troubleshooting
//!
//! | Error                                  | Resolution                                                                                   |
//! |-                                       |-                                                                                             |
//! | No config.toml or config.json found    | Pass the directory given to `train_vae -o`, not a file inside it.                            |
//! | Invalid config: lattice_args.D ...     | The config was edited by hand or truncated; `D` is the box size + 1 and must be odd.         |
//! | At least 2 anchors ... required        | `--anchors` needs a start and an end particle.                                               |
//! | Could not find path between ...        | The anchors sit in disconnected parts of the graph; raise `--max-neighbors` or `--avg-neighbors`. |
//!
//! Set `RUST_LOG=debug` or pass `-v` for more detail.

#[cfg(not(debug_assertions))]
use human_panic::setup_panic;

pub mod app_config;
mod cli;
pub mod core;

use anyhow::Result;

#[doc(hidden)]
/// Main entrypoint
pub fn run() -> Result<()> {
    // Human Panic. Only enabled when *not* debugging.
    #[cfg(not(debug_assertions))]
    {
        setup_panic!();
    }

    // Better Panic. Only enabled *when* debugging.
    #[cfg(debug_assertions)]
    {
        better_panic::Settings::debug()
            .most_recent_first(false)
            .lineno_suffix(true)
            .verbosity(better_panic::Verbosity::Full)
            .install();
    }

    // Get CLI arguments and flags (one may have provided the settings file to use)
    let cli_matches = cli::cli_config()?;

    // Logs go to stderr so command output on stdout stays clean. RUST_LOG
    // still takes precedence over -v.
    let default_level = if cli_matches.is_present("verbose") {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let settings = app_config::load_settings(cli_matches.value_of("config"))?;

    // Match against CLI subcommands, which delegate to functions
    cli::cli_match(settings, cli_matches)
}
