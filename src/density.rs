//! Normalized densities on a square grid over the embedding
use crate::config::KdeConfig;
use crate::error::{Error, ShapeMismatchError};
use indexmap::IndexMap;
use log::debug;
use rayon::prelude::*;
use std::ops::Deref;
use std::sync::Arc;
use veca_data::{FeatureTable, Variable};
use veca_stats::{weighted_kde, Point};
use veca_utils::{allclose, MinMax};

const GRID_RTOL: f64 = 1e-5;
const GRID_ATOL: f64 = 1e-8;

/// A density evaluated on an `n` by `n` grid.
///
/// `values` sums to one and `values_scaled` peaks at one. A density that is
/// zero everywhere is kept as is; it produces an empty region.
#[derive(Clone, Debug, PartialEq)]
pub struct Density {
    grid: Arc<Vec<Point>>,
    n: usize,
    values: Vec<f64>,
    values_scaled: Vec<f64>,
}

impl Density {
    /// Build a density from grid points and the raw, non-negative density at
    /// each.
    ///
    /// Point `i * n + j` must sit at `(xs[i], ys[j])` with both axes strictly
    /// ascending, as produced by the KDE; any other order is an
    /// `UnorderedGrid` error.
    pub fn new(
        grid: Vec<Point>,
        values: Vec<f64>,
    ) -> Result<Self, ShapeMismatchError> {
        Self::with_shared_grid(Arc::new(grid), values)
    }

    pub(crate) fn with_shared_grid(
        grid: Arc<Vec<Point>>,
        values: Vec<f64>,
    ) -> Result<Self, ShapeMismatchError> {
        let n_points = grid.len();
        let n = (n_points as f64).sqrt().round() as usize;
        if n * n != n_points || n == 0 {
            return Err(ShapeMismatchError::NonSquareGrid { n_points });
        }
        if let Some(index) = first_unordered_point(&grid, n) {
            return Err(ShapeMismatchError::UnorderedGrid { index });
        }
        if values.len() != n_points {
            return Err(ShapeMismatchError::ValuesLength {
                n_points,
                n_values: values.len(),
            });
        }

        let total: f64 = values.iter().sum();
        let peak = values.iter().copied().minmax().map_or(0.0, |(_, max)| max);
        let (values, values_scaled) = if total > 0.0 && peak > 0.0 {
            (
                values.iter().map(|v| v / total).collect(),
                values.iter().map(|v| v / peak).collect(),
            )
        } else {
            (values.clone(), values)
        };

        Ok(Self {
            grid,
            n,
            values,
            values_scaled,
        })
    }

    /// Kernel density estimate of `embedding` weighted by `weights`
    pub fn from_embedding(
        embedding: &[Point],
        weights: &[f64],
        config: &KdeConfig,
    ) -> Result<Self, ShapeMismatchError> {
        let (grid, values) = if config.log_transform {
            let weights: Vec<f64> = weights.iter().map(|w| w.ln_1p()).collect();
            weighted_kde(
                embedding,
                &weights,
                config.kernel,
                config.bandwidth,
                config.n_grid_points,
            )?
        } else {
            weighted_kde(
                embedding,
                weights,
                config.kernel,
                config.bandwidth,
                config.n_grid_points,
            )?
        };
        Density::new(grid, values)
    }

    /// Points per side of the grid
    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn grid(&self) -> &[Point] {
        &self.grid
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn values_scaled(&self) -> &[f64] {
        &self.values_scaled
    }

    /// Distinct x coordinates of the grid, ascending
    pub fn xs(&self) -> Vec<f64> {
        (0..self.n).map(|i| self.grid[i * self.n][0]).collect()
    }

    /// Distinct y coordinates of the grid, ascending
    pub fn ys(&self) -> Vec<f64> {
        (0..self.n).map(|j| self.grid[j][1]).collect()
    }

    /// Scaled density at grid cell `(i, j)`, i.e. at `(xs[i], ys[j])`
    #[inline]
    pub fn scaled_at(&self, i: usize, j: usize) -> f64 {
        self.values_scaled[i * self.n + j]
    }

    /// Whether `other` is evaluated on the same grid as `self`
    pub fn shares_grid(&self, other: &Density) -> bool {
        Arc::ptr_eq(&self.grid, &other.grid)
            || (self.grid.len() == other.grid.len()
                && self.grid.iter().zip(other.grid.iter()).all(|(a, b)| {
                    allclose(a, b, GRID_RTOL, GRID_ATOL)
                }))
    }
}

/// Index of the first point of `grid` that is not at `(xs[i], ys[j])` for
/// `i * n + j`, where the axes are read off the first column and row and must
/// strictly ascend
fn first_unordered_point(grid: &[Point], n: usize) -> Option<usize> {
    if let Some(i) = (1..n).find(|&i| grid[(i - 1) * n][0] >= grid[i * n][0]) {
        return Some(i * n);
    }
    if let Some(j) = (1..n).find(|&j| grid[j - 1][1] >= grid[j][1]) {
        return Some(j);
    }
    grid.iter()
        .enumerate()
        .position(|(ix, p)| *p != [grid[(ix / n) * n][0], grid[ix % n][1]])
}

/// The sum of several densities on a common grid, renormalized. Remembers the
/// densities it was built from.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeDensity {
    density: Density,
    base_densities: Vec<Arc<Density>>,
}

impl CompositeDensity {
    pub fn new(
        base_densities: Vec<Arc<Density>>,
    ) -> Result<Self, ShapeMismatchError> {
        let first = base_densities
            .first()
            .ok_or(ShapeMismatchError::EmptyComposite)?;

        if let Some(index) = base_densities
            .iter()
            .position(|other| !first.shares_grid(other))
        {
            return Err(ShapeMismatchError::GridMismatch { index });
        }

        let mut total = vec![0.0; first.values.len()];
        for base in base_densities.iter() {
            total
                .iter_mut()
                .zip(base.values.iter())
                .for_each(|(t, v)| *t += v);
        }

        let density = Density::with_shared_grid(first.grid.clone(), total)?;
        Ok(Self {
            density,
            base_densities,
        })
    }

    pub fn base_densities(&self) -> &[Arc<Density>] {
        &self.base_densities
    }

    /// Drop provenance and keep the summed density
    pub fn into_density(self) -> Density {
        self.density
    }
}

impl Deref for CompositeDensity {
    type Target = Density;

    fn deref(&self) -> &Density {
        &self.density
    }
}

/// Estimate one density per feature column over `embedding`.
///
/// Columns are processed in parallel. The result keeps the table's column
/// order.
pub fn estimate_feature_densities(
    features: &FeatureTable,
    embedding: &[Point],
    config: &KdeConfig,
) -> Result<IndexMap<Variable, Arc<Density>>, Error> {
    config.validate()?;
    if !features.is_empty() && features.n_samples() != embedding.len() {
        return Err(ShapeMismatchError::WeightsLength {
            n_points: embedding.len(),
            n_weights: features.n_samples(),
        }
        .into());
    }
    debug!(
        "Estimating {} densities on a {}x{} grid",
        features.n_features(),
        config.n_grid_points,
        config.n_grid_points
    );

    let columns: Vec<(&Variable, &[f64])> = features.iter().collect();
    let densities = columns
        .par_iter()
        .map(|(variable, values)| {
            Density::from_embedding(embedding, values, config)
                .map(|density| ((*variable).clone(), Arc::new(density)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(densities.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::*;

    fn unit_grid(n: usize) -> Vec<Point> {
        let step = 1.0 / (n - 1) as f64;
        (0..n)
            .flat_map(|i| {
                (0..n).map(move |j| [i as f64 * step, j as f64 * step])
            })
            .collect()
    }

    #[test]
    fn normalizes_values() {
        let values: Vec<f64> = (0..10_000).map(|i| (i % 7) as f64).collect();
        let density = Density::new(unit_grid(100), values).unwrap();
        assert_eq!(density.n(), 100);
        assert_relative_eq!(
            density.values().iter().sum::<f64>(),
            1.0,
            epsilon = 1e-10
        );
        let (_, peak) =
            density.values_scaled().iter().copied().minmax().unwrap();
        assert_relative_eq!(peak, 1.0);
    }

    #[test]
    fn axes_follow_x_major_order() {
        let density = Density::new(unit_grid(3), vec![1.0; 9]).unwrap();
        assert_eq!(density.xs(), vec![0.0, 0.5, 1.0]);
        assert_eq!(density.ys(), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn non_square_grid_fails() {
        let grid = vec![[0.0, 0.0]; 5];
        assert_eq!(
            Density::new(grid, vec![1.0; 5]).unwrap_err(),
            ShapeMismatchError::NonSquareGrid { n_points: 5 }
        );
    }

    #[test]
    fn y_major_grid_fails() {
        let n = 10;
        let grid: Vec<Point> = (0..n)
            .flat_map(|j| (0..n).map(move |i| [i as f64, j as f64]))
            .collect();
        let values = grid
            .iter()
            .map(|[x, y]| {
                if (2.0..=6.0).contains(x) && (2.0..=6.0).contains(y) {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();
        assert_eq!(
            Density::new(grid, values).unwrap_err(),
            ShapeMismatchError::UnorderedGrid { index: 10 }
        );
    }

    #[test]
    fn descending_axis_fails() {
        let grid: Vec<Point> =
            unit_grid(3).iter().map(|p| [p[0], 1.0 - p[1]]).collect();
        assert_eq!(
            Density::new(grid, vec![1.0; 9]).unwrap_err(),
            ShapeMismatchError::UnorderedGrid { index: 1 }
        );
    }

    #[test]
    fn scattered_grid_point_fails() {
        let mut grid = unit_grid(3);
        grid[4] = [0.5, 0.6];
        assert_eq!(
            Density::new(grid, vec![1.0; 9]).unwrap_err(),
            ShapeMismatchError::UnorderedGrid { index: 4 }
        );
    }

    #[test]
    fn values_length_mismatch_fails() {
        assert!(matches!(
            Density::new(unit_grid(2), vec![1.0; 3]),
            Err(ShapeMismatchError::ValuesLength { .. })
        ));
    }

    #[test]
    fn all_zero_density_stays_zero() {
        let density = Density::new(unit_grid(2), vec![0.0; 4]).unwrap();
        assert!(density.values().iter().all(|&v| v == 0.0));
        assert!(density.values_scaled().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn composite_sums_and_renormalizes() {
        let a = Arc::new(
            Density::new(unit_grid(2), vec![1.0, 0.0, 0.0, 0.0]).unwrap(),
        );
        let b = Arc::new(
            Density::new(unit_grid(2), vec![0.0, 0.0, 0.0, 3.0]).unwrap(),
        );
        let composite = CompositeDensity::new(vec![a, b]).unwrap();
        assert_eq!(composite.base_densities().len(), 2);
        assert_relative_eq!(composite.values()[0], 0.5);
        assert_relative_eq!(composite.values()[3], 0.5);
        assert_relative_eq!(composite.values_scaled()[0], 1.0);
    }

    #[test]
    fn composite_on_identical_100x100_grids() {
        let ramp: Vec<f64> = (0..10_000).map(|i| (i % 5 + 1) as f64).collect();
        let bump: Vec<f64> = (0..10_000)
            .map(|i| {
                let (x, y) = ((i / 100) as f64, (i % 100) as f64);
                (-((x - 40.0).powi(2) + (y - 60.0).powi(2)) / 200.0).exp()
            })
            .collect();
        let a = Arc::new(Density::new(unit_grid(100), ramp).unwrap());
        let b = Arc::new(Density::new(unit_grid(100), bump).unwrap());
        let composite =
            CompositeDensity::new(vec![a.clone(), b.clone()]).unwrap();

        assert_relative_eq!(
            composite.values().iter().sum::<f64>(),
            1.0,
            epsilon = 1e-10
        );
        let sum: Vec<f64> = a
            .values()
            .iter()
            .zip(b.values().iter())
            .map(|(x, y)| x + y)
            .collect();
        let total: f64 = sum.iter().sum();
        for (value, expected) in composite.values().iter().zip(sum.iter()) {
            assert_relative_eq!(*value, expected / total, epsilon = 1e-12);
        }
        assert!(composite.shares_grid(&a));
        assert_eq!(composite.n(), 100);
    }

    #[test]
    fn composite_of_nothing_fails() {
        assert_eq!(
            CompositeDensity::new(vec![]).unwrap_err(),
            ShapeMismatchError::EmptyComposite
        );
    }

    #[test]
    fn composite_rejects_other_grids() {
        let a = Arc::new(Density::new(unit_grid(2), vec![1.0; 4]).unwrap());
        let shifted: Vec<Point> =
            unit_grid(2).iter().map(|p| [p[0] + 1.0, p[1]]).collect();
        let b = Arc::new(Density::new(shifted, vec![1.0; 4]).unwrap());
        assert_eq!(
            CompositeDensity::new(vec![a, b]).unwrap_err(),
            ShapeMismatchError::GridMismatch { index: 1 }
        );
    }

    #[test]
    fn kde_density_from_embedding() {
        let embedding = vec![[0.0, 0.0], [1.0, 1.0], [5.0, 5.0]];
        let config = KdeConfig::new().n_grid_points(20).bandwidth(0.5);
        let density =
            Density::from_embedding(&embedding, &[1.0, 1.0, 0.0], &config)
                .unwrap();
        assert_eq!(density.grid().len(), 400);
        assert_relative_eq!(
            density.values().iter().sum::<f64>(),
            1.0,
            epsilon = 1e-10
        );
    }

    #[test]
    fn densities_keep_column_order() {
        let embedding = vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let features = FeatureTable::from_columns(vec![
            (Variable::new("b"), vec![1.0, 0.0, 0.0]),
            (Variable::new("a"), vec![0.0, 1.0, 1.0]),
        ])
        .unwrap();
        let config = KdeConfig::new().n_grid_points(10);
        let densities =
            estimate_feature_densities(&features, &embedding, &config)
                .unwrap();
        let names: Vec<&str> = densities.keys().map(|v| v.name()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
