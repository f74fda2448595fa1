use approx::*;
use indexmap::IndexMap;
use std::sync::Arc;
use veca::metrics::{intersection_over_union, overlap_fraction};
use veca::stats::Point;
use veca::{
    group_similar_features, group_similar_features_dendrogram,
    optimize_layout, ClusterMethod, Density, Region, Shape,
};

const N: usize = 40;

/// Region of the grid nodes in `[x0, x1] x [y0, y1]` on a 0..N integer grid
fn rect(x0: usize, x1: usize, y0: usize, y1: usize) -> Arc<Region> {
    let grid: Vec<Point> = (0..N)
        .flat_map(|i| (0..N).map(move |j| [i as f64, j as f64]))
        .collect();
    let values = (0..N)
        .flat_map(|i| (0..N).map(move |j| (i, j)))
        .map(|(i, j)| {
            if (x0..=x1).contains(&i) && (y0..=y1).contains(&j) {
                1.0
            } else {
                0.0
            }
        })
        .collect();
    let density = Density::new(grid, values).unwrap();
    Arc::new(Region::from_density(density, 0.5))
}

/// Two regions with an IoU of about 0.95 and one far away
fn near_duplicates() -> IndexMap<String, Arc<Region>> {
    let mut regions = IndexMap::new();
    regions.insert("a".to_owned(), rect(5, 24, 5, 24));
    regions.insert("b".to_owned(), rect(5, 24, 6, 24));
    regions.insert("c".to_owned(), rect(30, 35, 30, 35));
    regions
}

fn keys(regions: &IndexMap<String, Arc<Region>>) -> Vec<String> {
    regions.keys().cloned().collect()
}

#[test]
fn near_duplicates_have_high_iou() {
    let regions = near_duplicates();
    let iou = intersection_over_union(&regions["a"], &regions["b"]);
    assert_relative_eq!(iou, 379.5 / 399.5, epsilon = 1e-6);
}

#[test]
fn high_iou_pair_is_grouped() {
    let regions = near_duplicates();
    let methods =
        [ClusterMethod::MaxCliques, ClusterMethod::ConnectedComponents];
    for method in methods {
        let grouping =
            group_similar_features(&keys(&regions), &regions, 0.9, method)
                .unwrap();
        assert_eq!(grouping.len(), 2);
        assert_eq!(grouping.clusters["Cluster 1"], vec!["a", "b"]);
        assert_eq!(grouping.clusters["Cluster 2"], vec!["c"]);
    }
}

#[test]
fn strict_threshold_keeps_pair_apart() {
    let regions = near_duplicates();
    let grouping = group_similar_features(
        &keys(&regions),
        &regions,
        0.99,
        ClusterMethod::MaxCliques,
    )
    .unwrap();
    assert_eq!(grouping.len(), 3);
    assert_eq!(grouping.clusters["Cluster 1"], vec!["a"]);
    assert_eq!(grouping.clusters["Cluster 2"], vec!["b"]);
    assert_eq!(grouping.clusters["Cluster 3"], vec!["c"]);
}

#[test]
fn cluster_region_is_the_union() {
    let regions = near_duplicates();
    let grouping = group_similar_features(
        &keys(&regions),
        &regions,
        0.9,
        ClusterMethod::MaxCliques,
    )
    .unwrap();
    let union = &grouping.regions["Cluster 1"];
    assert_relative_eq!(union.area(), regions["a"].area(), epsilon = 1e-6);
    assert_eq!(union.base_regions().len(), 2);
    assert_eq!(union.num_parts(), 1);
}

#[test]
fn dendrogram_matches_threshold_grouping() {
    let regions = near_duplicates();
    let grouping =
        group_similar_features_dendrogram(&keys(&regions), &regions, 0.1)
            .unwrap();
    assert_eq!(grouping.clusters["Cluster 1"], vec!["a", "b"]);
    assert_eq!(grouping.clusters["Cluster 2"], vec!["c"]);

    let grouping =
        group_similar_features_dendrogram(&keys(&regions), &regions, 0.01)
            .unwrap();
    assert_eq!(grouping.len(), 3);
}

#[test]
fn layout_layers_are_independent_and_cover_everything() {
    let mut regions = IndexMap::new();
    regions.insert("left", rect(2, 12, 2, 12));
    regions.insert("middle", rect(8, 20, 2, 12));
    regions.insert("right", rect(16, 28, 2, 12));
    regions.insert("top", rect(2, 28, 30, 36));

    let max_overlap = 0.05;
    let layers = optimize_layout(&regions, max_overlap);

    let mut seen: Vec<&str> = layers.iter().flatten().copied().collect();
    seen.sort_unstable();
    assert_eq!(seen, vec!["left", "middle", "right", "top"]);

    for layer in layers.iter() {
        for a in layer.iter() {
            for b in layer.iter().filter(|b| *b != a) {
                let overlap = overlap_fraction(&regions[a], &regions[b]);
                assert!(overlap < max_overlap);
            }
        }
    }
    // the middle region overlaps both of its neighbours
    assert_eq!(layers.len(), 2);
}
