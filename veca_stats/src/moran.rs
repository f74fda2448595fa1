use crate::SampleGraph;
use rayon::prelude::*;
use veca_data::ShapeMismatchError;

/// Moran's I spatial autocorrelation of `xs` under the binary weights of
/// `graph`.
///
/// ```text
///         N    sum_ij w_ij (x_i - m)(x_j - m)
///   I = ----- --------------------------------
///         W          sum_i (x_i - m)^2
/// ```
///
/// A constant variable or a graph without edges has no measurable
/// autocorrelation and yields 0.
pub fn morans_i(
    xs: &[f64],
    graph: &SampleGraph,
) -> Result<f64, ShapeMismatchError> {
    if xs.len() != graph.n_samples() {
        return Err(ShapeMismatchError::AdjacencyLength {
            n_nodes: graph.n_samples(),
            n_values: xs.len(),
        });
    }
    let n = xs.len();
    let w = graph.total_weight();
    if n == 0 || w == 0 {
        return Ok(0.0);
    }

    let mean = xs.iter().sum::<f64>() / n as f64;
    let z: Vec<f64> = xs.iter().map(|x| x - mean).collect();
    let denom: f64 = z.iter().map(|zi| zi * zi).sum();
    if denom == 0.0 {
        return Ok(0.0);
    }

    let numer: f64 = (0..n)
        .map(|i| z[i] * graph.neighbors(i).iter().map(|&j| z[j]).sum::<f64>())
        .sum();

    Ok(n as f64 / w as f64 * numer / denom)
}

/// Moran's I for many columns in parallel
pub fn morans_i_many(
    columns: &[&[f64]],
    graph: &SampleGraph,
) -> Result<Vec<f64>, ShapeMismatchError> {
    columns.par_iter().map(|xs| morans_i(xs, graph)).collect()
}
