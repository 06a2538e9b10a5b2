// Copyright (c) 2024 tomoDRGN developers
// Licensed under the GNU General Public License v3.0
// ----------------------------

//! The API reference index: which modules the documentation covers, grouped
//! under the captions the docs site shows.

use strum_macros::{AsRefStr, Display, EnumString, EnumVariantNames};

/// Available renderings of the index.
#[derive(AsRefStr, Display, EnumString, EnumVariantNames, Clone, Copy, Debug, PartialEq)]
pub enum ReferenceFormat {
    /// Sphinx page with one autosummary block per caption
    #[strum(serialize = "rst")]
    Rst,
    /// ASCII tree of captions and modules
    #[strum(serialize = "tree")]
    Tree,
    /// Fully-qualified module names, one per line
    #[strum(serialize = "list")]
    List,
}

impl Default for ReferenceFormat {
    fn default() -> Self {
        ReferenceFormat::Rst
    }
}

/// A documented module.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModuleEntry {
    pub name: &'static str,
    pub summary: &'static str,
}

/// A captioned group of modules sharing a Python namespace.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Section {
    pub caption: &'static str,
    /// Dotted prefix of the modules in this section.
    pub namespace: &'static str,
    pub modules: &'static [ModuleEntry],
}

impl Section {
    pub fn qualified_name(&self, entry: &ModuleEntry) -> String {
        format!("{}.{}", self.namespace, entry.name)
    }
}

const fn entry(name: &'static str, summary: &'static str) -> ModuleEntry {
    ModuleEntry { name, summary }
}

const CORE_MODULES: &[ModuleEntry] = &[
    entry("analysis", "Helpers for analyzing latent embeddings and volumes"),
    entry("beta_schedule", "KL divergence weighting schedules"),
    entry("config", "Loading and updating saved job configuration"),
    entry("ctf", "Contrast transfer function computation"),
    entry("dataset", "Tilt series particle datasets"),
    entry("dose", "Dose and tilt weighting"),
    entry("fft", "Fourier and Hartley transform utilities"),
    entry("lattice", "Fourier space lattice coordinates and masks"),
    entry("lie_tools", "Rotation parameterizations"),
    entry("losses", "Training loss terms"),
    entry("models", "Encoder and decoder network definitions"),
    entry("mrc", "MRC file reading and writing"),
    entry("pose", "Particle pose tracking"),
    entry("so3_grid", "Sampling grids on SO(3)"),
    entry("starfile", "STAR file parsing and writing"),
    entry("utils", "Logging and file utilities"),
];

const COMMAND_MODULES: &[ModuleEntry] = &[
    entry("analyze", "Visualize latent space and generate volumes"),
    entry("analyze_volumes", "Analyze an ensemble of volumes"),
    entry(
        "backproject_voxel",
        "Backproject 2-D images to form 3-D reconstruction with optional filtering and weighting",
    ),
    entry("cleanup", "Remove intermediate training outputs"),
    entry("convergence_nn", "Assess convergence of a homogeneous decoder"),
    entry("convergence_vae", "Assess convergence of a VAE"),
    entry("downsample", "Downsample an image stack by Fourier cropping"),
    entry("eval_images", "Evaluate a trained VAE on particle images"),
    entry("eval_vol", "Evaluate the decoder at specified values of z"),
    entry("filter_star", "Filter a STAR file by selected particle indices"),
    entry(
        "graph_traversal",
        "Sample latent embeddings along the shortest path through the latent space nearest neighbor graph which connects specified anchor points",
    ),
    entry("pc_traversal", "Sample latent embeddings along principal components"),
    entry("subtomo2chimerax", "Map volumes back into tomogram context for ChimeraX"),
    entry("train_nn", "Train a decoder for homogeneous reconstruction"),
    entry(
        "train_vae",
        "Train a VAE for heterogeneous reconstruction with known pose for tomography data",
    ),
    entry("view_config", "Display config information of a tomoDRGN job"),
];

/// Sections in the order the documentation lists them.
pub static SECTIONS: [Section; 2] = [
    Section {
        caption: "TomoDRGN core",
        namespace: "tomodrgn",
        modules: CORE_MODULES,
    },
    Section {
        caption: "TomoDRGN commands",
        namespace: "tomodrgn.commands",
        modules: COMMAND_MODULES,
    },
];

/// Finds a module by short or fully-qualified name.
pub fn lookup(name: &str) -> Option<(&'static Section, &'static ModuleEntry)> {
    SECTIONS.iter().find_map(|section| {
        section
            .modules
            .iter()
            .find(|m| m.name == name || section.qualified_name(m) == name)
            .map(|m| (section, m))
    })
}

pub fn render(format: ReferenceFormat) -> String {
    match format {
        ReferenceFormat::Rst => render_rst(),
        ReferenceFormat::Tree => render_tree(),
        ReferenceFormat::List => render_list(),
    }
}

/// Renders the page a Sphinx build expands into per-module documentation.
pub fn render_rst() -> String {
    let title = "API Reference";
    let mut out = format!("{}\n{}\n", title, "=".repeat(title.len()));
    for section in SECTIONS.iter() {
        out.push_str("\n.. autosummary::\n");
        out.push_str("   :toctree: _autosummary\n");
        out.push_str(&format!("   :caption: {}\n", section.caption));
        out.push_str("   :recursive:\n\n");
        for m in section.modules {
            out.push_str(&format!("   {}\n", section.qualified_name(m)));
        }
    }
    out
}

/// Renders captions as roots with their modules as branches.
///
/// ```text
/// TomoDRGN core
/// ├── analysis: Helpers for analyzing latent embeddings and volumes
/// ...
/// └── utils: Logging and file utilities
/// ```
pub fn render_tree() -> String {
    let mut out = String::new();
    for section in SECTIONS.iter() {
        out.push_str(section.caption);
        out.push('\n');
        for (i, m) in section.modules.iter().enumerate() {
            let branch = if i == section.modules.len() - 1 {
                "└── "
            } else {
                "├── "
            };
            out.push_str(&format!("{}{}: {}\n", branch, m.name, m.summary));
        }
    }
    out
}

pub fn render_list() -> String {
    SECTIONS
        .iter()
        .flat_map(|s| s.modules.iter().map(move |m| s.qualified_name(m)))
        .map(|name| name + "\n")
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::str::FromStr;

    use super::*;

    #[test]
    fn two_captions_in_order() {
        let captions: Vec<_> = SECTIONS.iter().map(|s| s.caption).collect();
        assert_eq!(captions, vec!["TomoDRGN core", "TomoDRGN commands"]);
    }

    #[test]
    fn modules_are_unique_and_sorted() {
        for section in SECTIONS.iter() {
            let names: Vec<_> = section.modules.iter().map(|m| m.name).collect();
            let mut sorted = names.clone();
            sorted.sort_unstable();
            assert_eq!(names, sorted, "{} is not sorted", section.caption);
            let unique: HashSet<_> = names.iter().collect();
            assert_eq!(unique.len(), names.len(), "{} has duplicates", section.caption);
        }
    }

    #[test]
    fn lookup_by_short_and_qualified_name() {
        let (section, m) = lookup("view_config").unwrap();
        assert_eq!(section.caption, "TomoDRGN commands");
        assert_eq!(m.summary, "Display config information of a tomoDRGN job");

        let (section, m) = lookup("tomodrgn.starfile").unwrap();
        assert_eq!(section.caption, "TomoDRGN core");
        assert_eq!(m.name, "starfile");

        assert!(lookup("tomodrgn.commands.starfile").is_none());
        assert!(lookup("nope").is_none());
    }

    #[test]
    fn rst_has_one_block_per_caption() {
        let rst = render_rst();
        assert!(rst.starts_with("API Reference\n=============\n"));
        assert_eq!(rst.matches(".. autosummary::").count(), 2);
        assert!(rst.contains("   :caption: TomoDRGN core\n"));
        assert!(rst.contains("   :caption: TomoDRGN commands\n"));
        assert!(rst.contains("   tomodrgn.mrc\n"));
        assert!(rst.contains("   tomodrgn.commands.view_config\n"));
        // core modules come before the commands caption
        assert!(rst.find("tomodrgn.mrc").unwrap() < rst.find("TomoDRGN commands").unwrap());
    }

    #[test]
    fn tree_ends_each_section_with_a_corner() {
        let tree = render_tree();
        assert!(tree.contains("└── utils: "));
        assert!(tree.contains("└── view_config: "));
        assert!(tree.contains("├── train_vae: "));
    }

    #[test]
    fn list_has_every_module() {
        let total: usize = SECTIONS.iter().map(|s| s.modules.len()).sum();
        assert_eq!(render_list().lines().count(), total);
    }

    #[test]
    fn format_names() {
        assert_eq!(ReferenceFormat::from_str("tree").unwrap(), ReferenceFormat::Tree);
        assert_eq!(ReferenceFormat::default().as_ref(), "rst");
        ReferenceFormat::from_str("html").unwrap_err();
    }
}
