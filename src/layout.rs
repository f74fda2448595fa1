use crate::graph::{independent_sets, label_nodes, similarities_to_graph};
use crate::metrics::{pairwise, OverlapMetric};
use crate::region::Shape;
use indexmap::IndexMap;
use log::debug;

/// Split regions into layers that can be drawn together.
///
/// Two regions whose overlap fraction is at least `max_overlap` never share a
/// layer. Every region lands in exactly one layer. The number of layers is
/// small but not necessarily minimal.
pub fn optimize_layout<K, R>(
    regions: &IndexMap<K, R>,
    max_overlap: f64,
) -> Vec<Vec<K>>
where
    K: Clone,
    R: Shape + Sync,
{
    let shapes: Vec<&R> = regions.values().collect();
    let keys: Vec<K> = regions.keys().cloned().collect();
    let scores = pairwise(&shapes, OverlapMetric::OverlapFraction);
    let graph = similarities_to_graph(&scores, max_overlap);
    let Some(graph) = label_nodes(&graph, &keys) else {
        return Vec::new();
    };
    let layers = independent_sets(&graph);
    debug!(
        "Laid out {} regions on {} layers",
        keys.len(),
        layers.len()
    );
    layers
}
