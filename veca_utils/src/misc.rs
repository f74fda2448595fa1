use std::cmp::Ordering;
use std::mem::swap;

pub trait MinMax {
    type Inner: PartialOrd;
    /// Simultaneously compute the min and max of items in an Iterator. Returns
    /// `None` if the iterator is empty.
    fn minmax(&mut self) -> Option<(Self::Inner, Self::Inner)>;
}

impl<T> MinMax for T
where
    T: Iterator,
    T::Item: PartialOrd + Clone,
{
    type Inner = T::Item;
    fn minmax(&mut self) -> Option<(Self::Inner, Self::Inner)> {
        let mut min = self.next()?;

        let mut max = if let Some(item) = self.next() {
            item
        } else {
            return Some((min.clone(), min));
        };

        if min > max {
            swap(&mut min, &mut max);
        }

        for item in self {
            if item > max {
                max = item;
            } else if item < min {
                min = item;
            }
        }
        Some((min, max))
    }
}

/// Median of `xs`. The mean of the two central values is used for even
/// lengths. Returns `None` for an empty slice.
pub fn median(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    let mut sorted = xs.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        Some(sorted[n / 2])
    } else {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    }
}

/// Bins the entries in `xs` into `k` bins.
///
/// # Example
///
/// ```rust
/// # use veca_utils::bincount;
/// let xs: Vec<usize> = vec![0, 0, 1, 2, 2, 2, 3];
///
/// assert_eq!(bincount(&xs, 4), vec![2, 1, 3, 1]);
/// ```
#[inline]
pub fn bincount(xs: &[usize], k: usize) -> Vec<usize> {
    let mut counts = vec![0; k];
    xs.iter().for_each(|&ix| counts[ix] += 1);
    counts
}

/// All `(i, j)` with `i < j < n`, in row-major order.
///
/// ```rust
/// # use veca_utils::unordered_pairs;
/// assert_eq!(unordered_pairs(3), vec![(0, 1), (0, 2), (1, 2)]);
/// ```
pub fn unordered_pairs(n: usize) -> Vec<(usize, usize)> {
    let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            pairs.push((i, j));
        }
    }
    pairs
}

/// Element-wise closeness in the style of `numpy.allclose`
/// (`|a - b| <= atol + rtol * |b|`). Slices of different lengths are never
/// close.
pub fn allclose(xs: &[f64], ys: &[f64], rtol: f64, atol: f64) -> bool {
    xs.len() == ys.len()
        && xs
            .iter()
            .zip(ys.iter())
            .all(|(x, y)| (x - y).abs() <= rtol.mul_add(y.abs(), atol))
}
