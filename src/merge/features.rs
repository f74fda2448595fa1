//! Merging indicator columns whose union is more spatially coherent than the
//! parts
use super::fixpoint::{merge_candidates, merge_to_fixpoint, MergeStrategy};
use crate::config::Aggregation;
use crate::error::{Error, ShapeMismatchError};
use indexmap::IndexMap;
use log::info;
use std::collections::HashMap;
use veca_data::{FeatureTable, Variable};
use veca_stats::{morans_i, morans_i_many, SampleGraph};

/// Scores a pair by the relative Moran's I gain of merging it:
/// `I(merged) / (I(a) + I(b)) - 1`
pub struct MoranGain<'a> {
    graph: &'a SampleGraph,
    aggregation: Aggregation,
}

impl<'a> MoranGain<'a> {
    pub fn new(graph: &'a SampleGraph, aggregation: Aggregation) -> Self {
        Self { graph, aggregation }
    }
}

impl<'a> MergeStrategy<Variable, Vec<f64>> for MoranGain<'a> {
    type Round = HashMap<Variable, f64>;

    fn prepare(
        &self,
        items: &IndexMap<Variable, Vec<f64>>,
    ) -> Result<Self::Round, Error> {
        let columns: Vec<&[f64]> =
            items.values().map(|xs| xs.as_slice()).collect();
        let scores = morans_i_many(&columns, self.graph)?;
        Ok(items.keys().cloned().zip(scores).collect())
    }

    fn eligible(&self, a: &Variable, b: &Variable) -> bool {
        a.can_merge_with(b)
    }

    fn score(
        &self,
        round: &Self::Round,
        a: (&Variable, &Vec<f64>),
        b: (&Variable, &Vec<f64>),
    ) -> Result<f64, Error> {
        let (Some(ia), Some(ib)) = (round.get(a.0), round.get(b.0)) else {
            return Ok(f64::NAN);
        };
        let merged = self.aggregation.combine(a.1, b.1);
        let im = morans_i(&merged, self.graph)?;
        Ok(im / (ia + ib) - 1.0)
    }

    fn merge(
        &self,
        a: (&Variable, &Vec<f64>),
        b: (&Variable, &Vec<f64>),
    ) -> Result<(Variable, Vec<f64>), Error> {
        let variable = a.0.merge_with(b.0)?;
        Ok((variable, self.aggregation.combine(a.1, b.1)))
    }
}

fn check_graph(
    features: &FeatureTable,
    graph: &SampleGraph,
) -> Result<(), ShapeMismatchError> {
    if features.n_samples() != graph.n_samples() {
        return Err(ShapeMismatchError::AdjacencyLength {
            n_nodes: graph.n_samples(),
            n_values: features.n_samples(),
        });
    }
    Ok(())
}

/// The merges a single round would make, as `(a, b, gain)`, best first
pub fn feature_merge_candidates(
    features: &FeatureTable,
    graph: &SampleGraph,
    merge_threshold: f64,
    aggregation: Aggregation,
) -> Result<Vec<(Variable, Variable, f64)>, Error> {
    check_graph(features, graph)?;
    let strategy = MoranGain::new(graph, aggregation);
    let columns = features.columns();
    let candidates = merge_candidates(columns, &strategy, merge_threshold)?;
    Ok(candidates
        .into_iter()
        .filter_map(|c| {
            let (a, _) = columns.get_index(c.first)?;
            let (b, _) = columns.get_index(c.second)?;
            Some((a.clone(), b.clone(), c.score))
        })
        .collect())
}

/// Merge compatible columns until no pair gains at least `merge_threshold`
/// in Moran's I. Merged columns replace their parts.
///
/// A merged variable that equals another column already in the table, e.g.
/// `[0, 1)` and `[1, 2)` merging into an existing `[0, 2)`, overwrites that
/// column. A warning is logged when this happens.
pub fn merge_features(
    features: FeatureTable,
    graph: &SampleGraph,
    merge_threshold: f64,
    aggregation: Aggregation,
) -> Result<FeatureTable, Error> {
    check_graph(&features, graph)?;
    let n_samples = features.n_samples();
    let n_before = features.n_features();

    let strategy = MoranGain::new(graph, aggregation);
    let merged =
        merge_to_fixpoint(features.into_columns(), &strategy, merge_threshold)?;

    info!(
        "Feature merge: {} columns -> {} columns",
        n_before,
        merged.len()
    );

    let mut table = FeatureTable::new(n_samples);
    for (variable, values) in merged {
        table.insert(variable, values)?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::*;
    use veca_data::Rule;

    fn bin(lo: f64, hi: f64) -> Variable {
        Variable::derived("x", Rule::between(lo, hi).unwrap())
    }

    fn chain(n: usize) -> SampleGraph {
        SampleGraph::from_edges(n, (1..n).map(|i| (i - 1, i)))
    }

    // Adjacent bins covering neighbouring runs of samples on a chain
    fn adjacent_bins() -> FeatureTable {
        FeatureTable::from_columns(vec![
            (bin(0.0, 1.0), vec![1., 1., 1., 0., 0., 0., 0., 0., 0., 0.]),
            (bin(1.0, 2.0), vec![0., 0., 0., 1., 1., 1., 0., 0., 0., 0.]),
        ])
        .unwrap()
    }

    #[test]
    fn gain_formula() {
        let table = adjacent_bins();
        let graph = chain(10);
        let cands = feature_merge_candidates(
            &table,
            &graph,
            f64::NEG_INFINITY,
            Aggregation::Max,
        )
        .unwrap();
        assert_eq!(cands.len(), 1);

        let a = morans_i(table.get(&bin(0.0, 1.0)).unwrap(), &graph).unwrap();
        let b = morans_i(table.get(&bin(1.0, 2.0)).unwrap(), &graph).unwrap();
        let merged = vec![1., 1., 1., 1., 1., 1., 0., 0., 0., 0.];
        let m = morans_i(&merged, &graph).unwrap();
        assert_relative_eq!(cands[0].2, m / (a + b) - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn spatially_coherent_union_is_merged() {
        let table = adjacent_bins();
        let merged =
            merge_features(table, &chain(10), -1.0, Aggregation::Max).unwrap();
        assert_eq!(merged.n_features(), 1);
        let variable = merged.variables().next().unwrap();
        assert_eq!(variable, &bin(0.0, 2.0));
        assert_eq!(
            merged.get(variable).unwrap(),
            &[1., 1., 1., 1., 1., 1., 0., 0., 0., 0.]
        );
    }

    #[test]
    fn high_threshold_merges_nothing() {
        let table = adjacent_bins();
        let merged =
            merge_features(table.clone(), &chain(10), 1e6, Aggregation::Max)
                .unwrap();
        assert_eq!(merged, table);
    }

    #[test]
    fn incompatible_variables_never_merge() {
        let table = FeatureTable::from_columns(vec![
            (Variable::new("a"), vec![1., 1., 0., 0.]),
            (Variable::new("b"), vec![0., 0., 1., 1.]),
        ])
        .unwrap();
        let merged = merge_features(
            table,
            &chain(4),
            f64::NEG_INFINITY,
            Aggregation::Max,
        )
        .unwrap();
        assert_eq!(merged.n_features(), 2);
    }

    #[test]
    fn graph_size_must_match() {
        let table = adjacent_bins();
        assert!(matches!(
            merge_features(table, &chain(3), 0.0, Aggregation::Max),
            Err(Error::ShapeMismatch(
                ShapeMismatchError::AdjacencyLength { .. }
            ))
        ));
    }
}
