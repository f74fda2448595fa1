//! The end-to-end annotation pipeline
use crate::config::AnnotationConfig;
use crate::density::estimate_feature_densities;
use crate::error::{ConfigurationError, Error};
use crate::group::{group_similar_features, Grouping};
use crate::layout::optimize_layout;
use crate::merge::{merge_features, merge_overlapping_regions};
use crate::region::{find_regions, CompositeRegion, Region, Shape};
use indexmap::IndexMap;
use log::info;
use std::sync::Arc;
use veca_data::{FeatureTable, Variable};
use veca_stats::{Point, SampleGraph};

/// Everything the pipeline produces
#[derive(Clone, Debug)]
pub struct Annotation {
    /// The feature table after merging spatially coherent columns
    pub features: FeatureTable,
    /// One region per variable after stage-1 merging. Empty regions are
    /// dropped.
    pub regions: IndexMap<Variable, Arc<Region>>,
    /// Variables in each redundancy cluster
    pub clusters: IndexMap<String, Vec<Variable>>,
    pub cluster_regions: IndexMap<String, CompositeRegion>,
    /// Cluster names grouped into layers that can be drawn together
    pub layout: Vec<Vec<String>>,
}

/// Runs feature merge, density estimation, region extraction, region merge,
/// grouping, and layout in order
#[derive(Clone, Debug)]
pub struct Annotator {
    config: AnnotationConfig,
}

impl Annotator {
    pub fn new(config: AnnotationConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnnotationConfig {
        &self.config
    }

    /// Annotate `embedding` with regions of the features in `features`.
    ///
    /// Feature merging runs only when an `adjacency` graph over the samples
    /// is given.
    pub fn annotate(
        &self,
        features: &FeatureTable,
        embedding: &[Point],
        adjacency: Option<&SampleGraph>,
    ) -> Result<Annotation, Error> {
        let config = &self.config;
        info!(
            "Annotating {} samples with {} features",
            embedding.len(),
            features.n_features()
        );

        let features = match adjacency {
            Some(graph) => merge_features(
                features.clone(),
                graph,
                config.merge_threshold,
                config.aggregation,
            )?,
            None => features.clone(),
        };

        let densities =
            estimate_feature_densities(&features, embedding, &config.kde)?;
        info!("Estimated {} densities", densities.len());

        let mut regions = find_regions(&densities, config.level);
        regions.retain(|variable, region| {
            if region.is_empty() {
                info!("Dropping empty region of `{variable}`");
                false
            } else {
                true
            }
        });

        let regions =
            merge_overlapping_regions(regions, config.overlap_threshold)?;

        let variables: Vec<Variable> = regions.keys().cloned().collect();
        let Grouping {
            clusters,
            regions: cluster_regions,
        } = group_similar_features(
            &variables,
            &regions,
            config.group_threshold,
            config.cluster_method,
        )?;
        info!("Found {} clusters", clusters.len());

        let layout = optimize_layout(&cluster_regions, config.max_overlap);
        info!("Laid out clusters on {} layers", layout.len());

        Ok(Annotation {
            features,
            regions,
            clusters,
            cluster_regions,
            layout,
        })
    }
}
