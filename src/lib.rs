//! Annotate 2D embeddings with interpretable feature regions.
//!
//! Every feature column is smoothed into a density over the embedding, the
//! density is thresholded into a region, and regions are then merged, grouped
//! into clusters of redundant regions, and laid out for display.
//!
//! # Example
//!
//! Features are usually indicators derived from an original variable by a
//! rule, e.g. binned ages. Adjacent bins can merge into one.
//!
//! ```rust
//! use veca::data::{Rule, Variable};
//!
//! let young = Variable::derived("age", Rule::between(0.0, 5.0).unwrap());
//! let older = Variable::derived("age", Rule::between(5.0, 10.0).unwrap());
//!
//! assert!(young.can_merge_with(&older));
//! let merged = young.merge_with(&older).unwrap();
//! assert_eq!(merged.name(), "0 <= age < 10");
//! ```
//!
//! The whole pipeline is driven by an [`Annotator`].
//!
//! ```rust
//! use veca::{AnnotationConfig, Annotator, ClusterMethod, KdeConfig};
//!
//! let config = AnnotationConfig::new()
//!     .kde(KdeConfig::new().n_grid_points(50).bandwidth(0.5))
//!     .level(0.3)
//!     .cluster_method(ClusterMethod::ConnectedComponents);
//!
//! let annotator = Annotator::new(config).unwrap();
//! assert_eq!(annotator.config().level, 0.3);
//! ```
#![warn(unused_extern_crates)]
#![warn(
    clippy::all,
    clippy::imprecise_flops,
    clippy::suboptimal_flops,
    clippy::unseparated_literal_suffix,
    clippy::unreadable_literal,
    clippy::option_option,
    clippy::implicit_clone,
    clippy::perf
)]

mod annotate;
pub mod config;
pub mod contour;
pub mod density;
pub mod error;
pub mod graph;
pub mod group;
pub mod layout;
pub mod merge;
pub mod metrics;
pub mod region;

pub use annotate::{Annotation, Annotator};
pub use config::{Aggregation, AnnotationConfig, ClusterMethod, KdeConfig};
pub use density::{estimate_feature_densities, CompositeDensity, Density};
pub use error::{
    ConfigurationError, Error, IncompatibleRuleError, ShapeMismatchError,
};
pub use group::{
    group_similar_features, group_similar_features_dendrogram, Grouping,
};
pub use layout::optimize_layout;
pub use region::{find_regions, CompositeRegion, Region, Shape};

pub mod data {
    pub use veca_data::*;
}

pub mod stats {
    pub use veca_stats::*;
}

pub mod utils {
    pub use veca_utils::*;
}
