//! Column standardization for samples × variables matrices.

use nalgebra::DMatrix;

/// A column-standardized matrix with the statistics used.
#[derive(Debug, Clone)]
pub struct Standardized {
    /// Standardized values (same shape as the input).
    pub data: DMatrix<f64>,
    /// Column means.
    pub means: Vec<f64>,
    /// Column standard deviations; zero for constant columns.
    pub scales: Vec<f64>,
}

/// Center each column and divide by its standard deviation.
///
/// `ddof = 0` gives the population standard deviation, `ddof = 1` the sample
/// standard deviation. Constant columns are centered but not scaled, so they
/// become all zeros.
pub fn standardize_columns(data: &DMatrix<f64>, ddof: usize) -> Standardized {
    let n = data.nrows();
    let denom = n.saturating_sub(ddof).max(1) as f64;

    let mut out = data.clone();
    let mut means = Vec::with_capacity(data.ncols());
    let mut scales = Vec::with_capacity(data.ncols());

    for (j, mut col) in out.column_iter_mut().enumerate() {
        let mean = if n == 0 { 0.0 } else { data.column(j).sum() / n as f64 };
        let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / denom;
        let sd = var.sqrt();
        let divisor = if sd > 0.0 { sd } else { 1.0 };
        for v in col.iter_mut() {
            *v = (*v - mean) / divisor;
        }
        means.push(mean);
        scales.push(if sd > 0.0 { sd } else { 0.0 });
    }

    Standardized {
        data: out,
        means,
        scales,
    }
}

/// Indices of columns that contain at least one non-zero value.
pub fn non_zero_columns(data: &DMatrix<f64>) -> Vec<usize> {
    (0..data.ncols())
        .filter(|&j| data.column(j).iter().any(|&v| v != 0.0))
        .collect()
}

/// Copy the listed columns into a new matrix.
pub fn select_columns(data: &DMatrix<f64>, columns: &[usize]) -> DMatrix<f64> {
    DMatrix::from_fn(data.nrows(), columns.len(), |i, k| data[(i, columns[k])])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_population_standardization() {
        let m = DMatrix::from_row_slice(4, 2, &[1.0, 5.0, 2.0, 5.0, 3.0, 5.0, 4.0, 5.0]);
        let s = standardize_columns(&m, 0);

        assert_relative_eq!(s.means[0], 2.5, epsilon = 1e-12);
        assert_relative_eq!(s.scales[0], 1.25f64.sqrt(), epsilon = 1e-12);
        let col: Vec<f64> = s.data.column(0).iter().copied().collect();
        assert_relative_eq!(col.iter().sum::<f64>(), 0.0, epsilon = 1e-12);
        let var = col.iter().map(|v| v * v).sum::<f64>() / 4.0;
        assert_relative_eq!(var, 1.0, epsilon = 1e-12);

        // Constant column collapses to zeros
        assert_eq!(s.scales[1], 0.0);
        assert!(s.data.column(1).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_sample_standardization() {
        let m = DMatrix::from_column_slice(3, 1, &[1.0, 2.0, 3.0]);
        let s = standardize_columns(&m, 1);
        assert_relative_eq!(s.scales[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(s.data[(0, 0)], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_column_selection() {
        let m = DMatrix::from_row_slice(2, 3, &[0.0, 1.0, 0.0, 0.0, -1.0, 2.0]);
        let keep = non_zero_columns(&m);
        assert_eq!(keep, vec![1, 2]);
        let sel = select_columns(&m, &keep);
        assert_eq!(sel.shape(), (2, 2));
        assert_eq!(sel[(1, 1)], 2.0);
    }
}
