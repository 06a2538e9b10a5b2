//! Reading training output, the API reference index, and latent space
//! traversal.

pub mod api_reference;
pub mod commands;
pub mod error;
pub mod graph;
pub mod latent;
pub mod models;
pub mod workdir;
