//! Overlap measures between region footprints
use crate::graph::PairwiseScores;
use crate::region::Shape;
use geo::{Area, BooleanOps};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use veca_utils::unordered_pairs;

pub fn intersection_area<A: Shape, B: Shape>(a: &A, b: &B) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    a.polygon().intersection(b.polygon()).unsigned_area()
}

/// Area of the intersection over area of the union. Two empty regions have
/// an IoU of 0.
pub fn intersection_over_union<A: Shape, B: Shape>(a: &A, b: &B) -> f64 {
    let inter = intersection_area(a, b);
    let union = a.area() + b.area() - inter;
    if union > 0.0 {
        (inter / union).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

pub fn iou_distance<A: Shape, B: Shape>(a: &A, b: &B) -> f64 {
    1.0 - intersection_over_union(a, b)
}

/// The larger of the fractions of `a` and of `b` covered by their
/// intersection. A small region inside a large one scores 1.
pub fn overlap_fraction<A: Shape, B: Shape>(a: &A, b: &B) -> f64 {
    let inter = intersection_area(a, b);
    let frac = |area: f64| {
        if area > 0.0 {
            (inter / area).clamp(0.0, 1.0)
        } else {
            0.0
        }
    };
    frac(a.area()).max(frac(b.area()))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapMetric {
    IntersectionArea,
    IntersectionOverUnion,
    IouDistance,
    OverlapFraction,
}

impl OverlapMetric {
    pub fn compute<A: Shape, B: Shape>(&self, a: &A, b: &B) -> f64 {
        match self {
            Self::IntersectionArea => intersection_area(a, b),
            Self::IntersectionOverUnion => intersection_over_union(a, b),
            Self::IouDistance => iou_distance(a, b),
            Self::OverlapFraction => overlap_fraction(a, b),
        }
    }
}

/// Score every unordered pair of `regions`. Node ids are positions in the
/// slice.
pub fn pairwise<R: Shape + Sync>(
    regions: &[R],
    metric: OverlapMetric,
) -> PairwiseScores {
    let scores: Vec<(usize, usize, f64)> = unordered_pairs(regions.len())
        .par_iter()
        .map(|&(i, j)| (i, j, metric.compute(&regions[i], &regions[j])))
        .collect();

    let mut out = PairwiseScores::new(regions.len());
    for (i, j, score) in scores {
        out.insert(i, j, score);
    }
    out
}
