//! Principal component analysis of standardized features.

use super::{component_names, dominant_sign};
use crate::data::{CountMatrix, SampleTable};
use crate::error::{OmicsError, Result};
use crate::normalize::standardize_columns;
use nalgebra::DMatrix;

/// Result of PCA.
#[derive(Debug, Clone)]
pub struct PcaResult {
    /// Sample scores with columns `PC1..PCn`.
    pub scores: SampleTable,
    /// Fraction of total variance captured by each component.
    pub explained_variance_ratio: Vec<f64>,
    /// Feature loadings. Shape: `n_features × n_components`.
    pub loadings: DMatrix<f64>,
}

/// PCA of a features × samples matrix.
///
/// Samples become rows; each feature is standardized (population standard
/// deviation, constant features left at zero) before the SVD. Each component
/// is oriented so its largest-magnitude loading is positive.
pub fn pca(data: &CountMatrix, n_components: usize) -> Result<PcaResult> {
    let n_samples = data.n_samples();
    let n_features = data.n_features();
    let max_components = n_samples.min(n_features);
    if n_components == 0 || n_components > max_components {
        return Err(OmicsError::InvalidParameter(format!(
            "n_components ({}) must be in [1, {}]",
            n_components, max_components
        )));
    }

    let x = standardize_columns(&data.to_dense().transpose(), 0).data;

    let svd = x.svd(true, true);
    let u = svd
        .u
        .ok_or_else(|| OmicsError::Numerical("SVD did not return U".to_string()))?;
    let v_t = svd
        .v_t
        .ok_or_else(|| OmicsError::Numerical("SVD did not return V^T".to_string()))?;
    let singular = svd.singular_values;

    let mut order: Vec<usize> = (0..singular.len()).collect();
    order.sort_by(|&a, &b| singular[b].total_cmp(&singular[a]));

    let total: f64 = singular.iter().map(|s| s * s).sum();
    if !(total > 0.0) {
        return Err(OmicsError::Numerical(
            "All features are constant; PCA is undefined".to_string(),
        ));
    }

    let mut loadings = DMatrix::from_fn(n_features, n_components, |f, k| v_t[(order[k], f)]);
    let mut scores = DMatrix::from_fn(n_samples, n_components, |i, k| {
        u[(i, order[k])] * singular[order[k]]
    });

    for k in 0..n_components {
        let sign = dominant_sign(loadings.column(k).iter().copied());
        loadings.column_mut(k).scale_mut(sign);
        scores.column_mut(k).scale_mut(sign);
    }

    let explained_variance_ratio = order[..n_components]
        .iter()
        .map(|&k| singular[k] * singular[k] / total)
        .collect();

    log::debug!("PCA on {} samples × {} features", n_samples, n_features);
    Ok(PcaResult {
        scores: SampleTable::new(data.sample_ids().to_vec(), component_names(n_components), scores)?,
        explained_variance_ratio,
        loadings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn create_data() -> CountMatrix {
        // 3 features × 5 samples; features 0 and 1 are perfectly correlated
        let rows = [
            [1.0, 2.0, 3.0, 4.0, 5.0],
            [2.0, 4.0, 6.0, 8.0, 10.0],
            [3.0, 1.0, 4.0, 1.0, 5.0],
        ];
        let dense = DMatrix::from_fn(3, 5, |i, j| rows[i][j]);
        CountMatrix::from_dense(
            &dense,
            vec!["A".into(), "B".into(), "C".into()],
            (1..=5).map(|i| format!("S{}", i)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_pca_shapes_and_ratios() {
        let result = pca(&create_data(), 2).unwrap();
        assert_eq!(result.scores.columns(), &["PC1", "PC2"]);
        assert_eq!(result.scores.n_samples(), 5);
        assert_eq!(result.loadings.shape(), (3, 2));

        let ratios = &result.explained_variance_ratio;
        assert!(ratios[0] >= ratios[1]);
        assert!(ratios.iter().sum::<f64>() <= 1.0 + 1e-12);
    }

    #[test]
    fn test_pca_all_components_explain_everything() {
        let result = pca(&create_data(), 3).unwrap();
        let total: f64 = result.explained_variance_ratio.iter().sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_pca_scores_are_centered() {
        let result = pca(&create_data(), 2).unwrap();
        for name in ["PC1", "PC2"] {
            let col = result.scores.column(name).unwrap();
            assert_relative_eq!(col.iter().sum::<f64>(), 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_pca_invalid_components() {
        assert!(pca(&create_data(), 0).is_err());
        assert!(pca(&create_data(), 4).is_err());
    }
}
