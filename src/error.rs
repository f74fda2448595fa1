use thiserror::Error;
use veca_stats::UnknownKernelError;

pub use veca_data::{IncompatibleRuleError, ShapeMismatchError};

/// Invalid settings passed to an annotation entry point
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error(
        "unknown clustering method `{0}`. Options are `max-cliques`, \
         `connected-components`, and `hierarchical`."
    )]
    UnknownClusterMethod(String),
    #[error("unknown aggregation `{0}`. Options are `max` and `sum`.")]
    UnknownAggregation(String),
    #[error(transparent)]
    UnknownKernel(#[from] UnknownKernelError),
    /// Contour levels are compared against a field scaled to a max of 1
    #[error("contour level must be in (0, 1), got {0}")]
    InvalidLevel(f64),
    #[error("`{name}` must be in [0, 1], got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
    #[error("bandwidth must be positive and finite, got {0}")]
    InvalidBandwidth(f64),
    #[error("the density grid needs at least 2 points per side, got {0}")]
    InvalidGridSize(usize),
    #[error("YamlError: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Any failure raised by the annotation pipeline. Every variant aborts the
/// enclosing merge round.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    IncompatibleRule(#[from] IncompatibleRuleError),
    #[error(transparent)]
    ShapeMismatch(#[from] ShapeMismatchError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
