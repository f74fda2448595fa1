//! Greedy pairwise merging to a fixpoint, for feature columns and for regions
mod features;
mod fixpoint;
mod regions;

pub use features::{feature_merge_candidates, merge_features, MoranGain};
pub use fixpoint::{
    apply_merges, merge_candidates, merge_keys, merge_to_fixpoint, Candidate,
    MergeStrategy,
};
pub use regions::{
    merge_overlapping_regions, merge_regions_with, region_merge_candidates,
    OverlapMerge,
};
