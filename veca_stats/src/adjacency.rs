use crate::{euclidean, Point};
use rayon::prelude::*;
use std::cmp::Ordering;
use veca_utils::median;

/// Symmetric, unweighted adjacency between samples of an embedding.
///
/// Used as the spatial weight matrix for Moran's I. Neighbour lists are sorted
/// and never contain the sample itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleGraph {
    neighbors: Vec<Vec<usize>>,
}

impl SampleGraph {
    /// Build from undirected edges over `n_samples` samples. Self loops,
    /// duplicates, and out-of-range indices are dropped.
    pub fn from_edges<I>(n_samples: usize, edges: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut neighbors = vec![Vec::new(); n_samples];
        for (i, j) in edges {
            if i != j && i < n_samples && j < n_samples {
                neighbors[i].push(j);
                neighbors[j].push(i);
            }
        }
        for ns in neighbors.iter_mut() {
            ns.sort_unstable();
            ns.dedup();
        }
        Self { neighbors }
    }

    /// Connect every pair of samples closer than `radius`
    pub fn radius_neighbors(points: &[Point], radius: f64) -> Self {
        let neighbors = points
            .par_iter()
            .enumerate()
            .map(|(i, p)| {
                points
                    .iter()
                    .enumerate()
                    .filter(|&(j, q)| j != i && euclidean(p, q) <= radius)
                    .map(|(j, _)| j)
                    .collect()
            })
            .collect();
        Self { neighbors }
    }

    /// Connect every sample to its `k` nearest neighbours, then symmetrize
    pub fn knn(points: &[Point], k: usize) -> Self {
        let directed: Vec<Vec<usize>> = points
            .par_iter()
            .enumerate()
            .map(|(i, p)| {
                nearest(points, i, p)
                    .into_iter()
                    .take(k)
                    .map(|(j, _)| j)
                    .collect()
            })
            .collect();
        let edges = directed
            .iter()
            .enumerate()
            .flat_map(|(i, ns)| ns.iter().map(move |&j| (i, j)));
        Self::from_edges(points.len(), edges)
    }

    #[inline]
    pub fn n_samples(&self) -> usize {
        self.neighbors.len()
    }

    #[inline]
    pub fn neighbors(&self, ix: usize) -> &[usize] {
        &self.neighbors[ix]
    }

    /// Sum of all weights, i.e. twice the number of undirected edges
    pub fn total_weight(&self) -> usize {
        self.neighbors.iter().map(|ns| ns.len()).sum()
    }
}

/// Other samples sorted by distance to `p`, ties by index
fn nearest(points: &[Point], ix: usize, p: &Point) -> Vec<(usize, f64)> {
    let mut dists: Vec<(usize, f64)> = points
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != ix)
        .map(|(j, q)| (j, euclidean(p, q)))
        .collect();
    dists.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    dists
}

/// Median over all samples of the distance to their `k`-th nearest
/// neighbour. A data-driven length scale for radius graphs and bandwidths.
/// Returns `None` if there are not more than `k` samples or `k` is zero.
pub fn kth_median_distance(points: &[Point], k: usize) -> Option<f64> {
    if k == 0 || points.len() <= k {
        return None;
    }
    let kth: Vec<f64> = points
        .par_iter()
        .enumerate()
        .map(|(i, p)| nearest(points, i, p)[k - 1].1)
        .collect();
    median(&kth)
}
