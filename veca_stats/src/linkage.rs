//! Agglomerative hierarchical clustering with complete linkage.
//!
//! The distance between two clusters is the largest distance between any of
//! their members, so cutting the tree at distance `t` yields flat clusters
//! whose members are all pairwise within `t` of each other.
use itertools::Itertools;

/// One agglomeration step. `left` and `right` index clusters as in scipy's
/// linkage matrix: `0..n` are the singletons and `n + k` is the cluster formed
/// at step `k`.
#[derive(Clone, Debug, PartialEq)]
pub struct Merge {
    pub left: usize,
    pub right: usize,
    pub distance: f64,
    pub size: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Dendrogram {
    n_leaves: usize,
    merges: Vec<Merge>,
}

impl Dendrogram {
    #[inline]
    pub fn n_leaves(&self) -> usize {
        self.n_leaves
    }

    #[inline]
    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// Flat cluster labels obtained by cutting the tree at `threshold`: all
    /// merges at a distance of at most `threshold` are applied. Labels are
    /// `0..k` in order of first appearance over the leaves.
    pub fn cut(&self, threshold: f64) -> Vec<usize> {
        let n = self.n_leaves;
        let mut members: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
        let mut root: Vec<usize> = (0..n).collect();
        for (step, merge) in self.merges.iter().enumerate() {
            let mut joined = members[merge.left].clone();
            joined.extend_from_slice(&members[merge.right]);
            if merge.distance <= threshold {
                joined.iter().for_each(|&leaf| root[leaf] = n + step);
            }
            members.push(joined);
        }

        let mut labels = vec![0; n];
        let mut seen: Vec<usize> = Vec::new();
        for leaf in 0..n {
            let label = match seen.iter().position(|&r| r == root[leaf]) {
                Some(ix) => ix,
                None => {
                    seen.push(root[leaf]);
                    seen.len() - 1
                }
            };
            labels[leaf] = label;
        }
        labels
    }
}

/// Complete-linkage clustering over `n` items given a pairwise distance
/// function. Ties are broken by the lowest cluster ids. O(n^3), intended for
/// the tens to low hundreds of regions produced by annotation.
pub fn complete_linkage<F>(n: usize, dist: F) -> Dendrogram
where
    F: Fn(usize, usize) -> f64,
{
    let mut d: Vec<Vec<f64>> = vec![vec![0.0; n]; n];
    for (i, j) in (0..n).tuple_combinations() {
        let dij = dist(i, j);
        d[i][j] = dij;
        d[j][i] = dij;
    }

    // (cluster id, leaves)
    let mut active: Vec<(usize, Vec<usize>)> =
        (0..n).map(|i| (i, vec![i])).collect();
    let mut merges = Vec::with_capacity(n.saturating_sub(1));

    while active.len() > 1 {
        let mut best: Option<(usize, usize, f64)> = None;
        for (a, b) in (0..active.len()).tuple_combinations() {
            let linkage = active[a]
                .1
                .iter()
                .cartesian_product(active[b].1.iter())
                .map(|(&i, &j)| d[i][j])
                .fold(f64::NEG_INFINITY, f64::max);
            if best.map_or(true, |(_, _, dist)| linkage < dist) {
                best = Some((a, b, linkage));
            }
        }
        let Some((a, b, distance)) = best else { break };

        // b > a, so removing b first keeps a's position valid
        let (right_id, right) = active.remove(b);
        let (left_id, mut left) = active.remove(a);
        left.extend(right);
        merges.push(Merge {
            left: left_id.min(right_id),
            right: left_id.max(right_id),
            distance,
            size: left.len(),
        });
        active.push((n + merges.len() - 1, left));
    }

    Dendrogram {
        n_leaves: n,
        merges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::*;

    fn points_dist(xs: &[f64]) -> impl Fn(usize, usize) -> f64 + '_ {
        move |i, j| (xs[i] - xs[j]).abs()
    }

    #[test]
    fn merges_closest_first() {
        let xs = [0.0, 0.1, 5.0, 5.3];
        let tree = complete_linkage(xs.len(), points_dist(&xs));
        assert_eq!(tree.merges().len(), 3);
        assert_eq!(tree.merges()[0].left, 0);
        assert_eq!(tree.merges()[0].right, 1);
        assert_relative_eq!(tree.merges()[0].distance, 0.1);
        assert_relative_eq!(tree.merges()[1].distance, 0.3, epsilon = 1e-12);
        // complete linkage: farthest pair across the two groups
        assert_relative_eq!(tree.merges()[2].distance, 5.3);
        assert_eq!(tree.merges()[2].size, 4);
    }

    #[test]
    fn cut_respects_threshold() {
        let xs = [0.0, 0.1, 5.0, 5.3, 20.0];
        let tree = complete_linkage(xs.len(), points_dist(&xs));
        assert_eq!(tree.cut(0.5), vec![0, 0, 1, 1, 2]);
        assert_eq!(tree.cut(0.05), vec![0, 1, 2, 3, 4]);
        assert_eq!(tree.cut(100.0), vec![0, 0, 0, 0, 0]);
    }

    #[test]
    fn complete_linkage_bounds_cluster_diameter() {
        // single linkage would chain these together at t = 1
        let xs = [0.0, 1.0, 2.0, 3.0];
        let tree = complete_linkage(xs.len(), points_dist(&xs));
        let labels = tree.cut(1.0);
        for i in 0..xs.len() {
            for j in 0..xs.len() {
                if labels[i] == labels[j] {
                    assert!((xs[i] - xs[j]).abs() <= 1.0);
                }
            }
        }
    }

    #[test]
    fn empty_and_singleton() {
        assert!(complete_linkage(0, |_, _| 0.0).cut(1.0).is_empty());
        assert_eq!(complete_linkage(1, |_, _| 0.0).cut(1.0), vec![0]);
    }
}
