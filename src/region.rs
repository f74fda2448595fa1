use crate::contour::filled_contour;
use crate::density::{CompositeDensity, Density};
use crate::error::ShapeMismatchError;
use geo::{Area, BooleanOps, Contains, MultiPolygon, Point as GeoPoint, Polygon};
use indexmap::IndexMap;
use rayon::prelude::*;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use veca_stats::Point;

/// Anything with a footprint in the embedding plane
pub trait Shape {
    fn polygon(&self) -> &MultiPolygon<f64>;

    /// The disjoint parts of the region
    fn region_parts(&self) -> &[Polygon<f64>] {
        &self.polygon().0
    }

    fn num_parts(&self) -> usize {
        self.polygon().0.len()
    }

    fn area(&self) -> f64 {
        self.polygon().unsigned_area()
    }

    fn is_empty(&self) -> bool {
        self.polygon().0.is_empty()
    }

    fn contains_point(&self, point: &Point) -> bool {
        self.polygon().contains(&GeoPoint::new(point[0], point[1]))
    }

    /// Indices of the samples of `embedding` that fall inside the region
    fn contained_samples(&self, embedding: &[Point]) -> Vec<usize> {
        embedding
            .iter()
            .enumerate()
            .filter(|(_, p)| self.contains_point(p))
            .map(|(ix, _)| ix)
            .collect()
    }

    /// Mean of `values` over the samples inside the region. `None` if the
    /// region holds no samples.
    fn purity(
        &self,
        embedding: &[Point],
        values: &[f64],
    ) -> Result<Option<f64>, ShapeMismatchError> {
        if embedding.len() != values.len() {
            return Err(ShapeMismatchError::WeightsLength {
                n_points: embedding.len(),
                n_weights: values.len(),
            });
        }
        let inside = self.contained_samples(embedding);
        if inside.is_empty() {
            return Ok(None);
        }
        let total: f64 = inside.iter().map(|&ix| values[ix]).sum();
        Ok(Some(total / inside.len() as f64))
    }
}

impl Shape for MultiPolygon<f64> {
    fn polygon(&self) -> &MultiPolygon<f64> {
        self
    }
}

impl<T: Shape + ?Sized> Shape for &T {
    fn polygon(&self) -> &MultiPolygon<f64> {
        (**self).polygon()
    }
}

impl<T: Shape + ?Sized> Shape for Arc<T> {
    fn polygon(&self) -> &MultiPolygon<f64> {
        (**self).polygon()
    }
}

/// The part of the embedding where a density exceeds a level
#[derive(Clone, Debug)]
pub struct Region {
    density: Arc<Density>,
    polygon: MultiPolygon<f64>,
    level: f64,
}

impl Region {
    /// Threshold the max-scaled density at `level`. A level at or above the
    /// maximum yields an empty region.
    pub fn from_density<D: Into<Arc<Density>>>(density: D, level: f64) -> Self {
        let density = density.into();
        let polygon = filled_contour(
            &density.xs(),
            &density.ys(),
            density.values_scaled(),
            level,
        );
        Self {
            density,
            polygon,
            level,
        }
    }

    #[inline]
    pub fn density(&self) -> &Density {
        &self.density
    }

    /// The density as a shareable handle, for building composites
    #[inline]
    pub fn shared_density(&self) -> &Arc<Density> {
        &self.density
    }

    #[inline]
    pub fn level(&self) -> f64 {
        self.level
    }
}

impl Shape for Region {
    fn polygon(&self) -> &MultiPolygon<f64> {
        &self.polygon
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Region: {}", plural(self.num_parts(), "part"))
    }
}

/// The union of several regions, with their summed density
#[derive(Clone, Debug)]
pub struct CompositeRegion {
    density: CompositeDensity,
    polygon: MultiPolygon<f64>,
    base_regions: Vec<Arc<Region>>,
}

impl CompositeRegion {
    pub fn new(
        base_regions: Vec<Arc<Region>>,
    ) -> Result<Self, ShapeMismatchError> {
        let density = CompositeDensity::new(
            base_regions
                .iter()
                .map(|r| Arc::clone(r.shared_density()))
                .collect(),
        )?;
        let polygon = union_all(base_regions.iter().map(|r| r.polygon()));
        Ok(Self {
            density,
            polygon,
            base_regions,
        })
    }

    #[inline]
    pub fn density(&self) -> &CompositeDensity {
        &self.density
    }

    #[inline]
    pub fn base_regions(&self) -> &[Arc<Region>] {
        &self.base_regions
    }
}

impl Shape for CompositeRegion {
    fn polygon(&self) -> &MultiPolygon<f64> {
        &self.polygon
    }
}

impl fmt::Display for CompositeRegion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "CompositeRegion: {}, {}",
            plural(self.base_regions.len(), "region"),
            plural(self.num_parts(), "part")
        )
    }
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

/// Planar union of polygons
pub(crate) fn union_all<'a, I>(polygons: I) -> MultiPolygon<f64>
where
    I: IntoIterator<Item = &'a MultiPolygon<f64>>,
{
    polygons
        .into_iter()
        .fold(MultiPolygon::new(Vec::new()), |acc, polygon| {
            if polygon.0.is_empty() {
                acc
            } else if acc.0.is_empty() {
                polygon.clone()
            } else {
                acc.union(polygon)
            }
        })
}

/// Extract a region from every density, keeping keys and order
pub fn find_regions<K>(
    densities: &IndexMap<K, Arc<Density>>,
    level: f64,
) -> IndexMap<K, Arc<Region>>
where
    K: Clone + Hash + Eq + Send + Sync,
{
    let entries: Vec<(&K, &Arc<Density>)> = densities.iter().collect();
    entries
        .par_iter()
        .map(|(key, density)| {
            let region = Region::from_density(Arc::clone(density), level);
            ((*key).clone(), Arc::new(region))
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::*;

    /// Indicator density of the grid points inside `[lo, hi]^2` on a 0..n-1
    /// integer grid
    fn square(n: usize, lo: usize, hi: usize) -> Density {
        let grid: Vec<Point> = (0..n)
            .flat_map(|i| (0..n).map(move |j| [i as f64, j as f64]))
            .collect();
        let values = (0..n)
            .flat_map(|i| (0..n).map(move |j| (i, j)))
            .map(|(i, j)| {
                let inside = (lo..=hi).contains(&i) && (lo..=hi).contains(&j);
                if inside {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();
        Density::new(grid, values).unwrap()
    }

    #[test]
    fn region_from_indicator_density() {
        let region = Region::from_density(square(10, 2, 5), 0.5);
        assert_eq!(region.num_parts(), 1);
        assert!(!region.is_empty());
        assert!(region.contains_point(&[3.5, 3.5]));
        assert!(!region.contains_point(&[8.0, 8.0]));
        // 4x4 square with half-cell margins and clipped corners
        assert_relative_eq!(region.area(), 15.5, epsilon = 1e-9);
        assert_eq!(region.to_string(), "Region: 1 part");
    }

    #[test]
    fn level_above_max_is_empty() {
        let region = Region::from_density(square(10, 2, 5), 1.0);
        assert!(region.is_empty());
        assert_eq!(region.num_parts(), 0);
        assert_eq!(region.area(), 0.0);
    }

    #[test]
    fn zero_density_is_empty() {
        let grid: Vec<Point> =
            vec![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
        let density = Density::new(grid, vec![0.0; 4]).unwrap();
        assert!(Region::from_density(density, 0.25).is_empty());
    }

    #[test]
    fn contained_samples_and_purity() {
        let region = Region::from_density(square(10, 2, 5), 0.5);
        let embedding = vec![[3.0, 3.0], [4.0, 4.0], [9.0, 9.0]];
        assert_eq!(region.contained_samples(&embedding), vec![0, 1]);
        let purity = region.purity(&embedding, &[1.0, 0.0, 1.0]).unwrap();
        assert_relative_eq!(purity.unwrap(), 0.5);
        assert!(region.purity(&embedding, &[1.0]).is_err());
    }

    #[test]
    fn composite_unions_parts() {
        let a = Arc::new(Region::from_density(square(12, 1, 3), 0.5));
        let b = Arc::new(Region::from_density(square(12, 7, 9), 0.5));
        let composite =
            CompositeRegion::new(vec![a.clone(), b.clone()]).unwrap();
        assert_eq!(composite.num_parts(), 2);
        assert_relative_eq!(
            composite.area(),
            a.area() + b.area(),
            epsilon = 1e-6
        );
        assert_eq!(composite.base_regions().len(), 2);
        assert_eq!(composite.density().base_densities().len(), 2);
        assert_eq!(
            composite.to_string(),
            "CompositeRegion: 2 regions, 2 parts"
        );
    }

    #[test]
    fn display_counts_parts() {
        let empty = Region::from_density(square(10, 2, 5), 1.0);
        assert_eq!(empty.to_string(), "Region: 0 parts");

        let a = Arc::new(Region::from_density(square(12, 1, 3), 0.5));
        let b = Arc::new(Region::from_density(square(12, 7, 9), 0.5));
        let merged = CompositeRegion::new(vec![a.clone()]).unwrap();
        assert_eq!(merged.to_string(), "CompositeRegion: 1 region, 1 part");
        let two = Region {
            density: Arc::clone(a.shared_density()),
            polygon: union_all([a.polygon(), b.polygon()]),
            level: 0.5,
        };
        assert_eq!(two.to_string(), "Region: 2 parts");
    }

    #[test]
    fn composite_of_overlapping_regions_is_one_part() {
        let a = Arc::new(Region::from_density(square(12, 1, 5), 0.5));
        let b = Arc::new(Region::from_density(square(12, 3, 7), 0.5));
        let composite =
            CompositeRegion::new(vec![a.clone(), b.clone()]).unwrap();
        assert_eq!(composite.num_parts(), 1);
        assert!(composite.area() < a.area() + b.area());
        assert!(composite.contains_point(&[2.0, 2.0]));
        assert!(composite.contains_point(&[6.0, 6.0]));
    }

    #[test]
    fn find_regions_keeps_order() {
        let mut densities = IndexMap::new();
        densities.insert("b", Arc::new(square(8, 1, 2)));
        densities.insert("a", Arc::new(square(8, 4, 6)));
        let regions = find_regions(&densities, 0.5);
        assert_eq!(regions.keys().copied().collect::<Vec<_>>(), vec!["b", "a"]);
        assert!(regions.values().all(|r| r.num_parts() == 1));
    }
}
