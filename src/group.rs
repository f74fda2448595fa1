//! Grouping redundant regions into named clusters
use crate::config::ClusterMethod;
use crate::error::Error;
use crate::graph::{connected_components, max_cliques, similarities_to_graph};
use crate::metrics::{iou_distance, pairwise, OverlapMetric};
use crate::region::{CompositeRegion, Region};
use indexmap::IndexMap;
use log::debug;
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;
use veca_stats::complete_linkage;
use veca_utils::bincount;

/// Named clusters of keys and the composite region of each cluster. Names are
/// `Cluster 1`, `Cluster 2`, ... in cluster order.
#[derive(Clone, Debug)]
pub struct Grouping<K> {
    pub clusters: IndexMap<String, Vec<K>>,
    pub regions: IndexMap<String, CompositeRegion>,
}

impl<K> Grouping<K> {
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

fn cluster_name(ix: usize) -> String {
    format!("Cluster {}", ix + 1)
}

/// The regions of `features`, in the order of `regions`
fn subset<'a, K>(
    features: &[K],
    regions: &'a IndexMap<K, Arc<Region>>,
) -> Vec<(&'a K, &'a Arc<Region>)>
where
    K: Hash + Eq,
{
    let wanted: HashSet<&K> = features.iter().collect();
    regions.iter().filter(|(k, _)| wanted.contains(k)).collect()
}

fn materialize<K: Clone>(
    members: &[(&K, &Arc<Region>)],
    groups: Vec<Vec<usize>>,
) -> Result<Grouping<K>, Error> {
    let mut clusters = IndexMap::with_capacity(groups.len());
    let mut regions = IndexMap::with_capacity(groups.len());
    for (ix, group) in groups.into_iter().enumerate() {
        let name = cluster_name(ix);
        let keys = group.iter().map(|&m| members[m].0.clone()).collect();
        let composite = CompositeRegion::new(
            group.iter().map(|&m| Arc::clone(members[m].1)).collect(),
        )?;
        clusters.insert(name.clone(), keys);
        regions.insert(name, composite);
    }
    Ok(Grouping { clusters, regions })
}

/// Cluster the regions of `features` whose IoU is at least `threshold`.
///
/// With `MaxCliques` a region may belong to several clusters; the other
/// methods partition the regions. `Hierarchical` cuts the complete-linkage
/// tree at an IoU distance of `1 - threshold`.
pub fn group_similar_features<K>(
    features: &[K],
    regions: &IndexMap<K, Arc<Region>>,
    threshold: f64,
    method: ClusterMethod,
) -> Result<Grouping<K>, Error>
where
    K: Clone + Hash + Eq,
{
    if method == ClusterMethod::Hierarchical {
        return group_similar_features_dendrogram(
            features,
            regions,
            1.0 - threshold,
        );
    }

    let members = subset(features, regions);
    let shapes: Vec<&Arc<Region>> = members.iter().map(|(_, r)| *r).collect();
    let scores = pairwise(&shapes, OverlapMetric::IntersectionOverUnion);
    let graph = similarities_to_graph(&scores, threshold);

    let groups = match method {
        ClusterMethod::MaxCliques => max_cliques(&graph),
        _ => connected_components(&graph),
    };
    debug!(
        "Grouped {} regions into {} clusters ({method})",
        members.len(),
        groups.len()
    );
    materialize(&members, groups)
}

/// Complete-linkage clustering of the regions of `features` on IoU distance,
/// cut at `distance_threshold`. Clusters are ordered by decreasing size, ties
/// by first member.
pub fn group_similar_features_dendrogram<K>(
    features: &[K],
    regions: &IndexMap<K, Arc<Region>>,
    distance_threshold: f64,
) -> Result<Grouping<K>, Error>
where
    K: Clone + Hash + Eq,
{
    let members = subset(features, regions);
    let tree = complete_linkage(members.len(), |i, j| {
        iou_distance(members[i].1, members[j].1)
    });
    let labels = tree.cut(distance_threshold);
    let n_clusters = labels.iter().max().map_or(0, |&k| k + 1);
    let counts = bincount(&labels, n_clusters);

    let mut order: Vec<usize> = (0..n_clusters).collect();
    order.sort_by(|&a, &b| counts[b].cmp(&counts[a]));

    let groups: Vec<Vec<usize>> = order
        .iter()
        .map(|&label| {
            labels
                .iter()
                .enumerate()
                .filter(|&(_, &l)| l == label)
                .map(|(ix, _)| ix)
                .collect()
        })
        .collect();
    debug!(
        "Cut dendrogram of {} regions at {} into {} clusters",
        members.len(),
        distance_threshold,
        groups.len()
    );
    materialize(&members, groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::Density;
    use veca_stats::Point;

    fn square(lo: usize, hi: usize) -> Arc<Region> {
        let n = 24;
        let grid: Vec<Point> = (0..n)
            .flat_map(|i| (0..n).map(move |j| [i as f64, j as f64]))
            .collect();
        let values = (0..n)
            .flat_map(|i| (0..n).map(move |j| (i, j)))
            .map(|(i, j)| {
                if (lo..=hi).contains(&i) && (lo..=hi).contains(&j) {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();
        let density = Density::new(grid, values).unwrap();
        Arc::new(Region::from_density(density, 0.5))
    }

    fn regions() -> IndexMap<&'static str, Arc<Region>> {
        let mut regions = IndexMap::new();
        regions.insert("a", square(2, 10));
        regions.insert("b", square(2, 10));
        regions.insert("c", square(14, 20));
        regions
    }

    #[test]
    fn identical_regions_share_a_clique() {
        let grouping = group_similar_features(
            &["a", "b", "c"],
            &regions(),
            0.9,
            ClusterMethod::MaxCliques,
        )
        .unwrap();
        assert_eq!(grouping.len(), 2);
        assert_eq!(grouping.clusters["Cluster 1"], vec!["a", "b"]);
        assert_eq!(grouping.clusters["Cluster 2"], vec!["c"]);
        assert_eq!(grouping.regions["Cluster 1"].base_regions().len(), 2);
    }

    #[test]
    fn features_restrict_the_regions() {
        let grouping = group_similar_features(
            &["c", "a"],
            &regions(),
            0.9,
            ClusterMethod::ConnectedComponents,
        )
        .unwrap();
        assert_eq!(grouping.clusters["Cluster 1"], vec!["a"]);
        assert_eq!(grouping.clusters["Cluster 2"], vec!["c"]);
    }

    #[test]
    fn empty_subset_gives_no_clusters() {
        let grouping = group_similar_features(
            &["zzz"],
            &regions(),
            0.9,
            ClusterMethod::MaxCliques,
        )
        .unwrap();
        assert!(grouping.is_empty());
        assert!(grouping.regions.is_empty());
    }

    #[test]
    fn dendrogram_orders_clusters_by_size() {
        let mut regions = IndexMap::new();
        regions.insert("c", square(14, 20));
        regions.insert("a", square(2, 10));
        regions.insert("b", square(2, 10));
        let grouping =
            group_similar_features_dendrogram(&["a", "b", "c"], &regions, 0.1)
                .unwrap();
        assert_eq!(grouping.clusters["Cluster 1"], vec!["a", "b"]);
        assert_eq!(grouping.clusters["Cluster 2"], vec!["c"]);
    }

    #[test]
    fn hierarchical_method_cuts_at_one_minus_threshold() {
        let grouping = group_similar_features(
            &["a", "b", "c"],
            &regions(),
            0.9,
            ClusterMethod::Hierarchical,
        )
        .unwrap();
        assert_eq!(grouping.len(), 2);
        assert_eq!(grouping.clusters["Cluster 1"], vec!["a", "b"]);
    }
}
