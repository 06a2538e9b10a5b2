// Copyright (c) 2024 tomoDRGN developers
// Licensed under the GNU General Public License v3.0
// ----------------------------

//! Latent embeddings stored as plain text, one particle per row.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::error::TomodrgnError;

/// Per-particle latent embeddings, `n` rows by `zdim` columns.
#[derive(Clone, Debug, PartialEq)]
pub struct Embeddings {
    zdim: usize,
    values: Vec<f64>,
}

impl Embeddings {
    /// Builds embeddings from rows, which must all have the same non-zero
    /// length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, TomodrgnError> {
        let zdim = rows
            .first()
            .map(Vec::len)
            .ok_or_else(|| TomodrgnError::MalformedEmbeddings("no rows".to_owned()))?;
        if zdim == 0 {
            return Err(TomodrgnError::MalformedEmbeddings(
                "rows have no columns".to_owned(),
            ));
        }
        let mut values = Vec::with_capacity(rows.len() * zdim);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != zdim {
                return Err(TomodrgnError::MalformedEmbeddings(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    zdim
                )));
            }
            values.extend(row);
        }
        Ok(Self { zdim, values })
    }

    /// Parses whitespace-separated text. Blank lines and `#` comments are
    /// skipped; errors name the 1-based line.
    pub fn parse(text: &str) -> Result<Self, TomodrgnError> {
        let mut rows: Vec<Vec<f64>> = Vec::new();
        let mut zdim = None;
        for (lineno, line) in text.lines().enumerate().map(|(i, l)| (i + 1, l)) {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let row = line
                .split_whitespace()
                .map(|w| {
                    w.parse::<f64>().map_err(|_| {
                        TomodrgnError::MalformedEmbeddings(format!(
                            "line {}: {:?} is not a number",
                            lineno, w
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            match zdim {
                None => zdim = Some(row.len()),
                Some(expected) if expected != row.len() => {
                    return Err(TomodrgnError::MalformedEmbeddings(format!(
                        "line {}: uneven number of columns ({} != {})",
                        lineno,
                        row.len(),
                        expected
                    )));
                }
                Some(_) => {}
            }
            rows.push(row);
        }
        Self::from_rows(rows)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read embeddings {:?}", path))?;
        let embeddings =
            Self::parse(&text).with_context(|| format!("Failed to parse embeddings {:?}", path))?;
        Ok(embeddings)
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.values.len() / self.zdim
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn zdim(&self) -> usize {
        self.zdim
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.zdim..(i + 1) * self.zdim]
    }

    /// Euclidean distance between particles `i` and `j`.
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.row(i)
            .iter()
            .zip(self.row(j))
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }

    /// Embeddings of the given particles, in order.
    pub fn select(&self, indices: &[usize]) -> Self {
        let mut values = Vec::with_capacity(indices.len() * self.zdim);
        for &i in indices {
            values.extend_from_slice(self.row(i));
        }
        Self {
            zdim: self.zdim,
            values,
        }
    }

    pub fn to_text(&self) -> String {
        (0..self.len())
            .map(|i| {
                let mut line = self
                    .row(i)
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                line.push('\n');
                line
            })
            .collect()
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_text())
            .with_context(|| format!("Failed to write embeddings {:?}", path))
    }
}
