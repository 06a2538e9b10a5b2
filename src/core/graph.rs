// Copyright (c) 2024 tomoDRGN developers
// Licensed under the GNU General Public License v3.0
// ----------------------------

//! Nearest-neighbour graph over latent embeddings and shortest paths through
//! it.
//!
//! Particles are nodes; each particle gets a directed edge to each of its
//! closest neighbours in latent space, weighted by Euclidean distance. Paths
//! found with Dijkstra's algorithm trace a continuous route of real particles
//! between chosen anchor points.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};

use super::error::TomodrgnError;
use super::latent::Embeddings;

/// Directed, weighted graph of connected latent embeddings.
#[derive(Debug)]
pub struct LatentGraph {
    /// Outgoing `(neighbour, length)` edges of each particle.
    edges: Vec<Vec<(usize, f64)>>,
    /// Whether the particle appears in any edge.
    is_node: Vec<bool>,
}

/// One anchor-to-anchor leg of a traversal.
#[derive(Clone, Debug, PartialEq)]
pub struct PathSegment {
    pub src: usize,
    pub dest: usize,
    /// Particles visited from `src` to `dest`, inclusive.
    pub path: Vec<usize>,
    /// Summed edge length along `path`.
    pub total_distance: f64,
    /// Length of each hop along `path`.
    pub step_distances: Vec<f64>,
    /// Straight-line distance between the two anchors.
    pub direct_distance: f64,
}

/// Result of connecting a sequence of anchors.
#[derive(Clone, Debug, PartialEq)]
pub struct Traversal {
    /// Concatenated path through all reachable segments.
    pub path: Vec<usize>,
    pub segments: Vec<PathSegment>,
}

/// Heap entry ordered so that `BinaryHeap` pops the shortest distance first.
#[derive(Copy, Clone, Debug, PartialEq)]
struct Candidate {
    dist: f64,
    node: usize,
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl LatentGraph {
    /// Builds a graph from `(src, dest, length)` edges over `n` particles.
    ///
    /// # Errors
    ///
    /// Returns [TomodrgnError::InvalidGraphArgs] if an edge names a particle
    /// outside `0..n`.
    pub fn from_edges(
        n: usize,
        edge_list: &[(usize, usize, f64)],
    ) -> Result<Self, TomodrgnError> {
        let mut edges: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        let mut is_node = vec![false; n];
        for &(src, dest, length) in edge_list {
            if src >= n || dest >= n {
                return Err(TomodrgnError::InvalidGraphArgs(format!(
                    "Edge {} -> {} is out of range for {} particles",
                    src, dest, n
                )));
            }
            if !edges[src].iter().any(|&(d, _)| d == dest) {
                edges[src].push((dest, length));
            }
            is_node[src] = true;
            is_node[dest] = true;
        }
        Ok(Self { edges, is_node })
    }

    /// Connects each particle to its `max_neighbors` nearest neighbours.
    ///
    /// If `avg_neighbors` is given, only edges shorter than a cutoff are kept,
    /// where the cutoff is chosen so that particles have that many neighbours
    /// on average.
    ///
    /// # Errors
    ///
    /// Returns [TomodrgnError::InvalidGraphArgs] for fewer than two particles,
    /// `max_neighbors == 0`, or an `avg_neighbors` that selects no candidate
    /// edges or more than exist.
    pub fn from_embeddings(
        data: &Embeddings,
        max_neighbors: usize,
        avg_neighbors: Option<f64>,
    ) -> Result<Self, TomodrgnError> {
        let n = data.len();
        if n < 2 {
            return Err(TomodrgnError::InvalidGraphArgs(format!(
                "need at least 2 particles to build a graph, got {}",
                n
            )));
        }
        if max_neighbors == 0 {
            return Err(TomodrgnError::InvalidGraphArgs(
                "max_neighbors must be at least 1".to_owned(),
            ));
        }
        let k = max_neighbors.min(n - 1);
        if k < max_neighbors {
            warn!(
                "max_neighbors {} exceeds the {} other particles; using {}",
                max_neighbors,
                n - 1,
                k
            );
        }

        let progress = ProgressBar::new(n as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40}] {pos}/{len} particles ({eta})")
                .progress_chars("=> "),
        );
        progress.set_message("Finding nearest neighbors");

        // (particle, neighbour, distance) for the k nearest of every particle
        let mut candidates = Vec::with_capacity(n * k);
        for i in 0..n {
            let mut dists: Vec<(usize, f64)> = (0..n)
                .filter(|&j| j != i)
                .map(|j| (j, data.distance(i, j)))
                .collect();
            dists.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
            candidates.extend(dists.into_iter().take(k).map(|(j, d)| (i, j, d)));
            progress.inc(1);
        }
        progress.finish_and_clear();

        let max_dist = match avg_neighbors {
            Some(avg) => Some(neighbor_cutoff(&candidates, n, avg)?),
            None => None,
        };
        info!(
            "Constructing graph of neighbor particles within distance {:?} (to enforce average of {:?} neighbors)",
            max_dist, avg_neighbors
        );

        let edge_list: Vec<_> = candidates
            .into_iter()
            .filter(|&(_, _, d)| max_dist.map_or(true, |max| d < max))
            .collect();
        debug!("graph has {} edges", edge_list.len());
        Self::from_edges(n, &edge_list)
    }

    /// Number of particles the graph was built over.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(Vec::len).sum()
    }

    /// Outgoing edges of a particle.
    pub fn neighbors(&self, node: usize) -> &[(usize, f64)] {
        &self.edges[node]
    }

    /// Shortest path from `src` to `dest` with Dijkstra's algorithm.
    ///
    /// Returns the visited particles (both ends included) and the total path
    /// length, or `None` if `dest` cannot be reached.
    pub fn find_path(&self, src: usize, dest: usize) -> Option<(Vec<usize>, f64)> {
        let n = self.edges.len();
        if src >= n || dest >= n {
            return None;
        }
        let mut visited = vec![false; n];
        let mut distances = vec![f64::INFINITY; n];
        let mut predecessors: Vec<Option<usize>> = vec![None; n];
        let mut unvisited = BinaryHeap::new();

        distances[src] = 0.0;
        unvisited.push(Candidate { dist: 0.0, node: src });

        while let Some(Candidate { dist, node }) = unvisited.pop() {
            if visited[node] || !self.is_node[node] {
                continue;
            }
            visited[node] = true;
            if node == dest {
                let mut path = vec![node];
                let mut pred = predecessors[node];
                while let Some(p) = pred {
                    path.push(p);
                    pred = predecessors[p];
                }
                path.reverse();
                return Some((path, dist));
            }
            for &(neighbor, length) in &self.edges[node] {
                if visited[neighbor] {
                    continue;
                }
                let new_distance = dist + length;
                if new_distance < distances[neighbor] {
                    distances[neighbor] = new_distance;
                    predecessors[neighbor] = Some(node);
                    unvisited.push(Candidate {
                        dist: new_distance,
                        node: neighbor,
                    });
                }
            }
        }
        None
    }

    /// Connects consecutive anchors with shortest paths.
    ///
    /// Unreachable legs are logged and left out. Consecutive legs that meet at
    /// a shared anchor list it only once in the combined path.
    ///
    /// # Errors
    ///
    /// Returns [TomodrgnError::InvalidGraphArgs] for fewer than two anchors or
    /// an anchor outside the embeddings.
    pub fn traverse(
        &self,
        data: &Embeddings,
        anchors: &[usize],
    ) -> Result<Traversal, TomodrgnError> {
        check_anchors(anchors, data.len())?;

        let mut full_path: Vec<usize> = Vec::new();
        let mut segments = Vec::new();
        for pair in anchors.windows(2) {
            let (src, dest) = (pair[0], pair[1]);
            info!(
                "Searching for shortest path between anchor points {} and {}",
                src, dest
            );
            let (path, total_distance) = match self.find_path(src, dest) {
                Some(found) => found,
                None => {
                    warn!("Could not find path between {} and {}!", src, dest);
                    continue;
                }
            };
            let step_distances: Vec<f64> = path
                .windows(2)
                .map(|hop| data.distance(hop[0], hop[1]))
                .collect();
            let direct_distance = data.distance(src, dest);

            info!("Found shortest path: {}", join(&path));
            info!("Total path distance: {}", total_distance);
            info!(
                "Distances between each neighbor along path: {}",
                join(&step_distances)
            );
            info!(
                "Direct distance between source and destination anchor points: {}",
                direct_distance
            );

            if full_path.last() == path.first() {
                full_path.extend_from_slice(&path[1..]);
            } else {
                full_path.extend_from_slice(&path);
            }
            segments.push(PathSegment {
                src,
                dest,
                path,
                total_distance,
                step_distances,
                direct_distance,
            });
        }
        Ok(Traversal {
            path: full_path,
            segments,
        })
    }
}

/// Validates traversal anchors against the number of particles.
pub fn check_anchors(anchors: &[usize], n: usize) -> Result<(), TomodrgnError> {
    if anchors.len() < 2 {
        return Err(TomodrgnError::InvalidGraphArgs(
            "At least 2 anchors (beginning and ending particles) required to initialize path search"
                .to_owned(),
        ));
    }
    if let Some(bad) = anchors.iter().find(|&&a| a >= n) {
        return Err(TomodrgnError::InvalidGraphArgs(format!(
            "Anchor {} exceeds the number of particles: {}",
            bad, n
        )));
    }
    Ok(())
}

/// Distance below which edges are kept so that each of the `n` particles has
/// `avg_neighbors` neighbours on average.
fn neighbor_cutoff(
    candidates: &[(usize, usize, f64)],
    n: usize,
    avg_neighbors: f64,
) -> Result<f64, TomodrgnError> {
    let total = (n as f64 * avg_neighbors).floor();
    if !(total >= 1.0 && total <= candidates.len() as f64) {
        return Err(TomodrgnError::InvalidGraphArgs(format!(
            "avg_neighbors {} must select between 1 and {} candidate edges over {} particles",
            avg_neighbors,
            candidates.len(),
            n
        )));
    }
    let mut dists: Vec<f64> = candidates.iter().map(|&(_, _, d)| d).collect();
    dists.sort_by(f64::total_cmp);
    Ok(dists[total as usize - 1])
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
