use crate::{euclidean, Kernel, Point};
use rayon::prelude::*;
use veca_data::ShapeMismatchError;
use veca_utils::MinMax;

/// Axes of a square evaluation grid. Grid point `i * n + j` sits at
/// `(xs[i], ys[j])`.
#[derive(Clone, Debug, PartialEq)]
pub struct KdeGrid {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
}

impl KdeGrid {
    /// An `n` by `n` grid covering the points' bounding box widened by `pad`
    /// on every side
    pub fn covering(points: &[Point], n: usize, pad: f64) -> Self {
        let (xmin, xmax) =
            points.iter().map(|p| p[0]).minmax().unwrap_or((0.0, 0.0));
        let (ymin, ymax) =
            points.iter().map(|p| p[1]).minmax().unwrap_or((0.0, 0.0));
        Self {
            xs: linspace(xmin - pad, xmax + pad, n),
            ys: linspace(ymin - pad, ymax + pad, n),
        }
    }

    #[inline]
    pub fn n(&self) -> usize {
        self.xs.len()
    }

    /// All grid points in x-major order
    pub fn points(&self) -> Vec<Point> {
        self.xs
            .iter()
            .flat_map(|&x| self.ys.iter().map(move |&y| [x, y]))
            .collect()
    }
}

fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n).map(|i| (i as f64).mul_add(step, start)).collect()
        }
    }
}

/// Weighted kernel density estimate of `points` evaluated on an
/// `n_grid_points` by `n_grid_points` grid.
///
/// Returns the grid points (x-major) and the unnormalized density at each.
/// Samples with zero weight are skipped.
pub fn weighted_kde(
    points: &[Point],
    weights: &[f64],
    kernel: Kernel,
    bandwidth: f64,
    n_grid_points: usize,
) -> Result<(Vec<Point>, Vec<f64>), ShapeMismatchError> {
    if points.len() != weights.len() {
        return Err(ShapeMismatchError::WeightsLength {
            n_points: points.len(),
            n_weights: weights.len(),
        });
    }

    let reach = kernel.support() * bandwidth;
    let grid = KdeGrid::covering(points, n_grid_points, reach).points();

    let active: Vec<(Point, f64)> = points
        .iter()
        .zip(weights.iter())
        .filter(|(_, &w)| w != 0.0)
        .map(|(p, &w)| (*p, w))
        .collect();

    let values: Vec<f64> = grid
        .par_iter()
        .map(|g| {
            active.iter().fold(0.0, |acc, (p, w)| {
                let r = euclidean(g, p);
                if r > reach {
                    acc
                } else {
                    w.mul_add(kernel.weight(r / bandwidth), acc)
                }
            })
        })
        .collect();

    Ok((grid, values))
}
