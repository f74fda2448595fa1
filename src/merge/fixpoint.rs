use crate::error::Error;
use indexmap::IndexMap;
use log::{debug, trace, warn};
use rayon::prelude::*;
use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;
use veca_utils::unordered_pairs;

/// How to score and combine pairs of entries in a merge pass
pub trait MergeStrategy<K, V>: Sync {
    /// Data computed once per round and shared by every pair score
    type Round: Sync;

    fn prepare(&self, items: &IndexMap<K, V>) -> Result<Self::Round, Error>;

    /// Whether two keys may be merged at all. Checked before scoring.
    fn eligible(&self, a: &K, b: &K) -> bool;

    fn score(
        &self,
        round: &Self::Round,
        a: (&K, &V),
        b: (&K, &V),
    ) -> Result<f64, Error>;

    fn merge(&self, a: (&K, &V), b: (&K, &V)) -> Result<(K, V), Error>;
}

/// An accepted merge of the entries at positions `first` and `second`
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub first: usize,
    pub second: usize,
    pub score: f64,
}

/// Non-conflicting merges for the current state.
///
/// Every eligible pair is scored; pairs with a finite score of at least
/// `threshold` are taken in order of decreasing score (ties keep pair order),
/// skipping any pair that shares an entry with a pair already taken.
pub fn merge_candidates<K, V, S>(
    items: &IndexMap<K, V>,
    strategy: &S,
    threshold: f64,
) -> Result<Vec<Candidate>, Error>
where
    K: Sync,
    V: Sync,
    S: MergeStrategy<K, V>,
{
    let round = strategy.prepare(items)?;

    let pairs: Vec<(usize, usize, (&K, &V), (&K, &V))> =
        unordered_pairs(items.len())
            .into_iter()
            .filter_map(|(i, j)| {
                let a = items.get_index(i)?;
                let b = items.get_index(j)?;
                strategy.eligible(a.0, b.0).then_some((i, j, a, b))
            })
            .collect();

    let scored = pairs
        .par_iter()
        .map(|&(first, second, a, b)| {
            strategy.score(&round, a, b).map(|score| Candidate {
                first,
                second,
                score,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let mut scored: Vec<Candidate> = scored
        .into_iter()
        .filter(|c| c.score.is_finite() && c.score >= threshold)
        .collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut used = vec![false; items.len()];
    Ok(scored
        .into_iter()
        .filter(|c| {
            if used[c.first] || used[c.second] {
                false
            } else {
                used[c.first] = true;
                used[c.second] = true;
                true
            }
        })
        .collect())
}

/// Replace every pair of positions in `pairs` with its merge.
///
/// All merges are computed from the current state before any entry is
/// removed. Untouched entries keep their order and merged entries are
/// appended. A position may take part in at most one pair. A merged key equal
/// to an untouched key overwrites that entry in place.
pub fn apply_merges<K, V, S>(
    items: IndexMap<K, V>,
    pairs: &[(usize, usize)],
    strategy: &S,
) -> Result<IndexMap<K, V>, Error>
where
    K: Hash + Eq + Display,
    S: MergeStrategy<K, V>,
{
    let merged = pairs
        .iter()
        .filter_map(|&(i, j)| {
            let a = items.get_index(i)?;
            let b = items.get_index(j)?;
            trace!("Merging `{}` and `{}`", a.0, b.0);
            Some(strategy.merge(a, b))
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let used: HashSet<usize> =
        pairs.iter().flat_map(|&(i, j)| [i, j]).collect();

    let mut out: IndexMap<K, V> = items
        .into_iter()
        .enumerate()
        .filter(|(ix, _)| !used.contains(ix))
        .map(|(_, entry)| entry)
        .collect();

    for (key, value) in merged {
        if out.contains_key(&key) {
            warn!("Merged entry `{key}` replaces an existing entry");
        }
        out.insert(key, value);
    }
    Ok(out)
}

/// Merge greedily until no pair scores at least `threshold`.
///
/// Each round removes two entries per accepted merge and adds back at most
/// one, so the loop terminates.
pub fn merge_to_fixpoint<K, V, S>(
    mut items: IndexMap<K, V>,
    strategy: &S,
    threshold: f64,
) -> Result<IndexMap<K, V>, Error>
where
    K: Hash + Eq + Display + Sync,
    V: Sync,
    S: MergeStrategy<K, V>,
{
    let mut round = 0_usize;
    loop {
        let candidates = merge_candidates(&items, strategy, threshold)?;
        debug!(
            "Merge round {round}: {} entries, {} merges",
            items.len(),
            candidates.len()
        );
        if candidates.is_empty() {
            return Ok(items);
        }
        let pairs: Vec<(usize, usize)> =
            candidates.iter().map(|c| (c.first, c.second)).collect();
        items = apply_merges(items, &pairs, strategy)?;
        round += 1;
    }
}

/// Apply caller-chosen merges by key in one step.
///
/// Pairs naming a missing key, or a key already merged earlier in `pairs`,
/// are skipped.
pub fn merge_keys<K, V, S>(
    items: IndexMap<K, V>,
    pairs: &[(K, K)],
    strategy: &S,
) -> Result<IndexMap<K, V>, Error>
where
    K: Hash + Eq + Display,
    S: MergeStrategy<K, V>,
{
    let mut used = HashSet::new();
    let mut positions = Vec::with_capacity(pairs.len());
    for (a, b) in pairs {
        match (items.get_index_of(a), items.get_index_of(b)) {
            (Some(i), Some(j))
                if i != j && !used.contains(&i) && !used.contains(&j) =>
            {
                used.insert(i);
                used.insert(j);
                positions.push((i, j));
            }
            _ => warn!("Skipping merge of `{a}` and `{b}`"),
        }
    }
    apply_merges(items, &positions, strategy)
}
