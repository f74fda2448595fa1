//! Filled iso-contours of a gridded scalar field (marching squares).
//!
//! The field is padded with a ring of values below the level so every contour
//! closes, even where the region runs into the edge of the grid. A grid node
//! is inside when its value is strictly greater than the level. Saddle cells
//! are resolved by the mean of their four corners.
use geo::{Coord, LineString, MultiPolygon, Polygon};
use std::collections::{HashMap, HashSet};

const DEDUP_EPS: f64 = 1e-12;

/// A cell edge on the padded grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Edge {
    /// From node `(i, j)` to `(i + 1, j)`
    Horizontal(usize, usize),
    /// From node `(i, j)` to `(i, j + 1)`
    Vertical(usize, usize),
}

struct PaddedField<'a> {
    xs: &'a [f64],
    ys: &'a [f64],
    z: &'a [f64],
    level: f64,
}

impl<'a> PaddedField<'a> {
    #[inline]
    fn n(&self) -> usize {
        self.xs.len()
    }

    #[inline]
    fn value(&self, i: usize, j: usize) -> f64 {
        let n = self.n();
        if i == 0 || j == 0 || i > n || j > n {
            self.level - 1.0
        } else {
            self.z[(i - 1) * n + (j - 1)]
        }
    }

    #[inline]
    fn above(&self, i: usize, j: usize) -> bool {
        self.value(i, j) > self.level
    }

    // The padding sits on the boundary coordinates, so contours that leave
    // the grid are clipped to its bounding box.
    #[inline]
    fn x(&self, i: usize) -> f64 {
        self.xs[i.saturating_sub(1).min(self.n() - 1)]
    }

    #[inline]
    fn y(&self, j: usize) -> f64 {
        self.ys[j.saturating_sub(1).min(self.n() - 1)]
    }

    fn fraction(&self, a: f64, b: f64) -> f64 {
        let t = (self.level - a) / (b - a);
        if t.is_finite() {
            t.clamp(0.0, 1.0)
        } else {
            0.5
        }
    }

    fn crossing(&self, edge: Edge) -> Coord<f64> {
        match edge {
            Edge::Horizontal(i, j) => {
                let t = self.fraction(self.value(i, j), self.value(i + 1, j));
                let (x0, x1) = (self.x(i), self.x(i + 1));
                Coord {
                    x: t.mul_add(x1 - x0, x0),
                    y: self.y(j),
                }
            }
            Edge::Vertical(i, j) => {
                let t = self.fraction(self.value(i, j), self.value(i, j + 1));
                let (y0, y1) = (self.y(j), self.y(j + 1));
                Coord {
                    x: self.x(i),
                    y: t.mul_add(y1 - y0, y0),
                }
            }
        }
    }

    /// Unordered contour segments through cell `(i, j)`, whose lower left
    /// node is `(i, j)`
    fn cell_segments(&self, i: usize, j: usize, out: &mut Vec<(Edge, Edge)>) {
        let bl = self.above(i, j) as u8;
        let br = self.above(i + 1, j) as u8;
        let tr = self.above(i + 1, j + 1) as u8;
        let tl = self.above(i, j + 1) as u8;

        let b = Edge::Horizontal(i, j);
        let t = Edge::Horizontal(i, j + 1);
        let l = Edge::Vertical(i, j);
        let r = Edge::Vertical(i + 1, j);

        match bl | (br << 1) | (tr << 2) | (tl << 3) {
            0 | 15 => (),
            1 | 14 => out.push((l, b)),
            2 | 13 => out.push((b, r)),
            3 | 12 => out.push((l, r)),
            4 | 11 => out.push((r, t)),
            6 | 9 => out.push((b, t)),
            7 | 8 => out.push((l, t)),
            5 => {
                if self.centre_above(i, j) {
                    out.push((b, r));
                    out.push((l, t));
                } else {
                    out.push((l, b));
                    out.push((r, t));
                }
            }
            10 => {
                if self.centre_above(i, j) {
                    out.push((l, b));
                    out.push((r, t));
                } else {
                    out.push((b, r));
                    out.push((t, l));
                }
            }
            _ => unreachable!(),
        }
    }

    fn centre_above(&self, i: usize, j: usize) -> bool {
        let mean = (self.value(i, j)
            + self.value(i + 1, j)
            + self.value(i + 1, j + 1)
            + self.value(i, j + 1))
            / 4.0;
        mean > self.level
    }
}

/// The region where `z > level` as polygons with holes.
///
/// `z` holds `xs.len() * ys.len()` values in x-major order, so `z[i * n + j]`
/// is the value at `(xs[i], ys[j])`. Axes must be ascending. Exteriors are
/// counter-clockwise and holes clockwise. Polygons are ordered by decreasing
/// area.
pub fn filled_contour(
    xs: &[f64],
    ys: &[f64],
    z: &[f64],
    level: f64,
) -> MultiPolygon<f64> {
    let n = xs.len();
    if n == 0 || ys.len() != n || z.len() != n * n {
        return MultiPolygon::new(Vec::new());
    }
    let field = PaddedField { xs, ys, z, level };

    // padded nodes are 0..=n+1 along each axis
    let mut segments = Vec::new();
    for i in 0..=n {
        for j in 0..=n {
            field.cell_segments(i, j, &mut segments);
        }
    }

    let rings: Vec<Vec<Coord<f64>>> = link_segments(&segments)
        .into_iter()
        .map(|edges| {
            dedup_ring(edges.into_iter().map(|e| field.crossing(e)).collect())
        })
        .filter(|ring| ring.len() >= 3 && signed_area(ring) != 0.0)
        .collect();

    assemble(rings)
}

/// Chain segments into closed loops of edges
fn link_segments(segments: &[(Edge, Edge)]) -> Vec<Vec<Edge>> {
    let mut links: HashMap<Edge, Vec<Edge>> = HashMap::new();
    for &(a, b) in segments {
        links.entry(a).or_default().push(b);
        links.entry(b).or_default().push(a);
    }

    let mut visited: HashSet<Edge> = HashSet::new();
    let mut loops = Vec::new();
    for &(start, first) in segments {
        if visited.contains(&start) {
            continue;
        }
        visited.insert(start);
        let mut ring = vec![start];
        let (mut prev, mut current) = (start, first);
        while current != start && visited.insert(current) {
            ring.push(current);
            let Some(ns) = links.get(&current) else { break };
            let next = match ns.as_slice() {
                [a, b] => {
                    if *a == prev {
                        *b
                    } else {
                        *a
                    }
                }
                _ => break,
            };
            prev = current;
            current = next;
        }
        loops.push(ring);
    }
    loops
}

fn dedup_ring(mut ring: Vec<Coord<f64>>) -> Vec<Coord<f64>> {
    let same = |a: &Coord<f64>, b: &Coord<f64>| {
        (a.x - b.x).abs() <= DEDUP_EPS && (a.y - b.y).abs() <= DEDUP_EPS
    };
    ring.dedup_by(|a, b| same(a, b));
    while ring.len() > 1 && same(&ring[0], &ring[ring.len() - 1]) {
        ring.pop();
    }
    ring
}

fn signed_area(ring: &[Coord<f64>]) -> f64 {
    let n = ring.len();
    (0..n)
        .map(|k| {
            let (a, b) = (ring[k], ring[(k + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum::<f64>()
        / 2.0
}

/// Even-odd ray casting
fn ring_contains(ring: &[Coord<f64>], p: Coord<f64>) -> bool {
    let n = ring.len();
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (ring[i], ring[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Nest rings by containment. Rings at even depth are exteriors and rings at
/// odd depth are holes of their immediate parent.
fn assemble(rings: Vec<Vec<Coord<f64>>>) -> MultiPolygon<f64> {
    let areas: Vec<f64> = rings.iter().map(|r| signed_area(r)).collect();
    let mut order: Vec<usize> = (0..rings.len()).collect();
    order.sort_by(|&a, &b| areas[b].abs().total_cmp(&areas[a].abs()));

    let mut parent: Vec<Option<usize>> = vec![None; rings.len()];
    let mut depth: Vec<usize> = vec![0; rings.len()];
    for (pos, &k) in order.iter().enumerate() {
        let probe = rings[k][0];
        // later candidates are smaller, so the last hit is the tightest
        if let Some(&p) = order[..pos]
            .iter()
            .rev()
            .find(|&&p| ring_contains(&rings[p], probe))
        {
            parent[k] = Some(p);
            depth[k] = depth[p] + 1;
        }
    }

    let oriented = |k: usize, ccw: bool| -> LineString<f64> {
        let mut ring = rings[k].clone();
        if (areas[k] > 0.0) != ccw {
            ring.reverse();
        }
        LineString::new(ring)
    };

    let polygons = order
        .iter()
        .filter(|&&k| depth[k] % 2 == 0)
        .map(|&outer| {
            let holes = order
                .iter()
                .filter(|&&k| parent[k] == Some(outer) && depth[k] % 2 == 1)
                .map(|&k| oriented(k, false))
                .collect();
            Polygon::new(oriented(outer, true), holes)
        })
        .collect();

    MultiPolygon::new(polygons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::*;
    use geo::{Area, Contains, Point};

    fn axis(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    fn field<F: Fn(usize, usize) -> f64>(n: usize, f: F) -> Vec<f64> {
        (0..n)
            .flat_map(|i| (0..n).map(move |j| (i, j)))
            .map(|(i, j)| f(i, j))
            .collect()
    }

    #[test]
    fn single_peak_is_a_diamond() {
        let z = field(5, |i, j| if (i, j) == (2, 2) { 1.0 } else { 0.0 });
        let mp = filled_contour(&axis(5), &axis(5), &z, 0.5);
        assert_eq!(mp.0.len(), 1);
        assert!(mp.0[0].interiors().is_empty());
        assert_relative_eq!(mp.unsigned_area(), 0.5, epsilon = 1e-12);
        assert!(mp.contains(&Point::new(2.0, 2.0)));
        assert!(!mp.contains(&Point::new(1.0, 1.0)));
    }

    #[test]
    fn level_at_max_is_empty() {
        let z = field(4, |i, j| (i + j) as f64 / 6.0);
        assert!(filled_contour(&axis(4), &axis(4), &z, 1.0).0.is_empty());
    }

    #[test]
    fn field_above_everywhere_covers_the_grid() {
        let z = vec![1.0; 9];
        let mp = filled_contour(&axis(3), &axis(3), &z, 0.5);
        assert_eq!(mp.0.len(), 1);
        assert_relative_eq!(mp.unsigned_area(), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn annulus_has_a_hole() {
        let z = field(5, |i, j| {
            let ring = (1..=3).contains(&i) && (1..=3).contains(&j);
            if ring && (i, j) != (2, 2) {
                1.0
            } else {
                0.0
            }
        });
        let mp = filled_contour(&axis(5), &axis(5), &z, 0.5);
        assert_eq!(mp.0.len(), 1);
        assert_eq!(mp.0[0].interiors().len(), 1);
        // 3x3 square, minus four corner triangles, minus the diamond hole
        assert_relative_eq!(mp.unsigned_area(), 8.0, epsilon = 1e-12);
        assert!(mp.contains(&Point::new(1.0, 1.0)));
        assert!(!mp.contains(&Point::new(2.0, 2.0)));
    }

    #[test]
    fn exteriors_are_counter_clockwise() {
        let z = field(5, |i, j| if (i, j) == (2, 2) { 1.0 } else { 0.0 });
        let mp = filled_contour(&axis(5), &axis(5), &z, 0.5);
        assert!(mp.0[0].signed_area() > 0.0);
    }

    #[test]
    fn saddle_splits_when_centre_is_low() {
        let z = vec![1.0, 0.0, 0.0, 1.0];
        let mp = filled_contour(&axis(2), &axis(2), &z, 0.5);
        assert_eq!(mp.0.len(), 2);
    }

    #[test]
    fn saddle_joins_when_centre_is_high() {
        let z = vec![1.0, 0.6, 0.6, 1.0];
        let mp = filled_contour(&axis(2), &axis(2), &z, 0.7);
        assert_eq!(mp.0.len(), 1);
    }

    #[test]
    fn separated_peaks_give_separate_parts() {
        let z = field(7, |i, j| {
            if (i, j) == (1, 1) || (i, j) == (5, 5) {
                1.0
            } else {
                0.0
            }
        });
        let mp = filled_contour(&axis(7), &axis(7), &z, 0.5);
        assert_eq!(mp.0.len(), 2);
        assert_relative_eq!(mp.unsigned_area(), 1.0, epsilon = 1e-12);
    }
}
