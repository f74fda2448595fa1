use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use veca_stats::Kernel;

/// How regions are grouped into redundancy clusters
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Eq, PartialEq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ClusterMethod {
    /// Every maximal clique of the IoU graph is a cluster. Exponential in the
    /// worst case; prefer the alternatives for large region sets.
    MaxCliques,
    /// Every connected component of the IoU graph is a cluster
    ConnectedComponents,
    /// Complete-linkage clustering on IoU distance, cut at `1 - threshold`
    Hierarchical,
}

impl fmt::Display for ClusterMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::MaxCliques => "max-cliques",
            Self::ConnectedComponents => "connected-components",
            Self::Hierarchical => "hierarchical",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ClusterMethod {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "max-cliques" => Ok(ClusterMethod::MaxCliques),
            "connected-components" => Ok(ClusterMethod::ConnectedComponents),
            "hierarchical" => Ok(ClusterMethod::Hierarchical),
            _ => Err(ConfigurationError::UnknownClusterMethod(s.to_owned())),
        }
    }
}

/// How two indicator columns are combined when their features merge
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Element-wise maximum (logical or for one-hot columns)
    Max,
    /// Element-wise sum
    Sum,
}

impl Aggregation {
    pub fn combine(&self, xs: &[f64], ys: &[f64]) -> Vec<f64> {
        let op: fn(f64, f64) -> f64 = match self {
            Self::Max => f64::max,
            Self::Sum => |x, y| x + y,
        };
        xs.iter().zip(ys.iter()).map(|(&x, &y)| op(x, y)).collect()
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Self::Max => "max",
            Self::Sum => "sum",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Aggregation {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "max" => Ok(Aggregation::Max),
            "sum" => Ok(Aggregation::Sum),
            _ => Err(ConfigurationError::UnknownAggregation(s.to_owned())),
        }
    }
}

/// Settings for kernel density estimation over the embedding
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct KdeConfig {
    /// Points per side of the square evaluation grid
    pub n_grid_points: usize,
    pub kernel: Kernel,
    pub bandwidth: f64,
    /// Apply `ln(1 + x)` to feature values before using them as weights
    #[serde(default)]
    pub log_transform: bool,
}

impl KdeConfig {
    pub fn new() -> Self {
        Self {
            n_grid_points: 100,
            kernel: Kernel::Gaussian,
            bandwidth: 1.0,
            log_transform: false,
        }
    }

    pub fn n_grid_points(mut self, n_grid_points: usize) -> Self {
        self.n_grid_points = n_grid_points;
        self
    }

    pub fn kernel(mut self, kernel: Kernel) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn bandwidth(mut self, bandwidth: f64) -> Self {
        self.bandwidth = bandwidth;
        self
    }

    pub fn log_transform(mut self, log_transform: bool) -> Self {
        self.log_transform = log_transform;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.n_grid_points < 2 {
            return Err(ConfigurationError::InvalidGridSize(self.n_grid_points));
        }
        if !(self.bandwidth.is_finite() && self.bandwidth > 0.0) {
            return Err(ConfigurationError::InvalidBandwidth(self.bandwidth));
        }
        Ok(())
    }
}

impl Default for KdeConfig {
    fn default() -> Self {
        KdeConfig::new()
    }
}

/// Configuration for `Annotator::annotate`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AnnotationConfig {
    #[serde(default)]
    pub kde: KdeConfig,
    /// Contour level on the max-scaled density
    pub level: f64,
    /// Minimum Moran's I gain for merging two feature columns
    pub merge_threshold: f64,
    /// Minimum overlap for merging two regions in stage 1
    pub overlap_threshold: f64,
    /// Minimum IoU for two regions to be considered redundant
    pub group_threshold: f64,
    pub cluster_method: ClusterMethod,
    /// Regions overlapping at least this much are drawn on different layers
    pub max_overlap: f64,
    pub aggregation: Aggregation,
}

impl AnnotationConfig {
    pub fn new() -> Self {
        Self {
            kde: KdeConfig::new(),
            level: 0.25,
            merge_threshold: 0.05,
            overlap_threshold: 0.75,
            group_threshold: 0.9,
            cluster_method: ClusterMethod::MaxCliques,
            max_overlap: 0.05,
            aggregation: Aggregation::Max,
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigurationError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn kde(mut self, kde: KdeConfig) -> Self {
        self.kde = kde;
        self
    }

    pub fn level(mut self, level: f64) -> Self {
        self.level = level;
        self
    }

    pub fn merge_threshold(mut self, merge_threshold: f64) -> Self {
        self.merge_threshold = merge_threshold;
        self
    }

    pub fn overlap_threshold(mut self, overlap_threshold: f64) -> Self {
        self.overlap_threshold = overlap_threshold;
        self
    }

    pub fn group_threshold(mut self, group_threshold: f64) -> Self {
        self.group_threshold = group_threshold;
        self
    }

    pub fn cluster_method(mut self, cluster_method: ClusterMethod) -> Self {
        self.cluster_method = cluster_method;
        self
    }

    pub fn max_overlap(mut self, max_overlap: f64) -> Self {
        self.max_overlap = max_overlap;
        self
    }

    pub fn aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.kde.validate()?;
        if !(self.level > 0.0 && self.level < 1.0) {
            return Err(ConfigurationError::InvalidLevel(self.level));
        }
        let unit = [
            ("overlap_threshold", self.overlap_threshold),
            ("group_threshold", self.group_threshold),
            ("max_overlap", self.max_overlap),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigurationError::InvalidThreshold {
                    name,
                    value,
                });
            }
        }
        Ok(())
    }
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        AnnotationConfig::new()
    }
}
