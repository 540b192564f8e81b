//! Principal Coordinates Analysis (classical multidimensional scaling).

use super::{fix_signs, validate_distances};
use crate::error::Result;
use nalgebra::DMatrix;

/// Result of Principal Coordinates Analysis.
#[derive(Debug, Clone)]
pub struct PcoaResult {
    /// Sample coordinates. Shape: `n_samples × n_components`.
    pub coordinates: DMatrix<f64>,
    /// Leading eigenvalues, descending.
    pub eigenvalues: Vec<f64>,
    /// Fraction of positive inertia explained by each axis.
    pub proportion_explained: Vec<f64>,
}

/// Classical scaling of a distance matrix.
///
/// 1. Double-center `-½ D²`
/// 2. Symmetric eigendecomposition
/// 3. Coordinates = eigenvector × √max(λ, 0)
pub fn pcoa(distances: &DMatrix<f64>, n_components: usize) -> Result<PcoaResult> {
    let n = validate_distances(distances, n_components)?;

    let mut g = distances.map(|d| -0.5 * d * d);
    double_center(&mut g);

    let eigen = g.symmetric_eigen();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

    let total_positive: f64 = eigen.eigenvalues.iter().filter(|&&e| e > 0.0).sum();
    let eigenvalues: Vec<f64> = order[..n_components]
        .iter()
        .map(|&k| eigen.eigenvalues[k])
        .collect();
    let proportion_explained = eigenvalues
        .iter()
        .map(|&e| if total_positive > 0.0 && e > 0.0 { e / total_positive } else { 0.0 })
        .collect();

    let mut coordinates = DMatrix::from_fn(n, n_components, |i, k| {
        eigen.eigenvectors[(i, order[k])] * eigenvalues[k].max(0.0).sqrt()
    });
    fix_signs(&mut coordinates);

    Ok(PcoaResult {
        coordinates,
        eigenvalues,
        proportion_explained,
    })
}

fn double_center(m: &mut DMatrix<f64>) {
    let n = m.nrows() as f64;
    let row_means: Vec<f64> = m.row_iter().map(|r| r.sum() / n).collect();
    let col_means: Vec<f64> = m.column_iter().map(|c| c.sum() / n).collect();
    let grand_mean = row_means.iter().sum::<f64>() / n;
    for i in 0..m.nrows() {
        for j in 0..m.ncols() {
            m[(i, j)] += grand_mean - row_means[i] - col_means[j];
        }
    }
}
