//! Stage 1: merging regions of compatible variables that cover the same area
use super::fixpoint::{
    merge_candidates, merge_keys, merge_to_fixpoint, MergeStrategy,
};
use crate::density::CompositeDensity;
use crate::error::Error;
use crate::metrics::overlap_fraction;
use crate::region::Region;
use indexmap::IndexMap;
use log::info;
use std::sync::Arc;
use veca_data::Variable;

/// Scores a pair of regions by their overlap fraction. A merged region
/// thresholds the summed density of its parts at the first part's level.
pub struct OverlapMerge;

impl MergeStrategy<Variable, Arc<Region>> for OverlapMerge {
    type Round = ();

    fn prepare(
        &self,
        _items: &IndexMap<Variable, Arc<Region>>,
    ) -> Result<(), Error> {
        Ok(())
    }

    fn eligible(&self, a: &Variable, b: &Variable) -> bool {
        a.can_merge_with(b)
    }

    fn score(
        &self,
        _round: &(),
        a: (&Variable, &Arc<Region>),
        b: (&Variable, &Arc<Region>),
    ) -> Result<f64, Error> {
        Ok(overlap_fraction(a.1, b.1))
    }

    fn merge(
        &self,
        a: (&Variable, &Arc<Region>),
        b: (&Variable, &Arc<Region>),
    ) -> Result<(Variable, Arc<Region>), Error> {
        let variable = a.0.merge_with(b.0)?;
        let density = CompositeDensity::new(vec![
            Arc::clone(a.1.shared_density()),
            Arc::clone(b.1.shared_density()),
        ])?;
        let region = Region::from_density(density.into_density(), a.1.level());
        Ok((variable, Arc::new(region)))
    }
}

/// The merges a single round would make, as `(a, b, overlap)`, best first
pub fn region_merge_candidates(
    regions: &IndexMap<Variable, Arc<Region>>,
    overlap_threshold: f64,
) -> Result<Vec<(Variable, Variable, f64)>, Error> {
    let candidates =
        merge_candidates(regions, &OverlapMerge, overlap_threshold)?;
    Ok(candidates
        .into_iter()
        .filter_map(|c| {
            let (a, _) = regions.get_index(c.first)?;
            let (b, _) = regions.get_index(c.second)?;
            Some((a.clone(), b.clone(), c.score))
        })
        .collect())
}

/// Merge overlapping regions of compatible variables until no pair overlaps
/// by at least `overlap_threshold`.
///
/// A merged variable that equals another variable already in `regions`, e.g.
/// `[0, 1)` and `[1, 2)` merging into an existing `[0, 2)`, replaces that
/// entry's region. A warning is logged when this happens.
pub fn merge_overlapping_regions(
    regions: IndexMap<Variable, Arc<Region>>,
    overlap_threshold: f64,
) -> Result<IndexMap<Variable, Arc<Region>>, Error> {
    let n_before = regions.len();
    let merged = merge_to_fixpoint(regions, &OverlapMerge, overlap_threshold)?;
    info!(
        "Region merge: {} regions -> {} regions",
        n_before,
        merged.len()
    );
    Ok(merged)
}

/// Apply the given merges in one step, without scoring. Pairs naming a
/// missing or already merged variable are skipped. A merged variable that is
/// already present replaces that entry, as in [`merge_overlapping_regions`].
pub fn merge_regions_with(
    regions: IndexMap<Variable, Arc<Region>>,
    pairs: &[(Variable, Variable)],
) -> Result<IndexMap<Variable, Arc<Region>>, Error> {
    merge_keys(regions, pairs, &OverlapMerge)
}
