//! Low-dimensional embeddings of samples.
//!
//! - **SMACOF**: metric multidimensional scaling by stress majorization
//! - **PCoA**: classical scaling via eigendecomposition
//! - **PCA**: principal components of standardized features

pub mod pca;
pub mod pcoa;
pub mod smacof;

use crate::error::{OmicsError, Result};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

pub use pca::{pca, PcaResult};
pub use pcoa::{pcoa, PcoaResult};
pub use smacof::{smacof, SmacofResult};

/// Distance embedding algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrdinationMethod {
    /// Metric MDS (SMACOF) from a seeded random start.
    #[default]
    Smacof,
    /// Classical scaling (PCoA).
    Classical,
}

/// Parameters for embedding a distance matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrdinationConfig {
    pub method: OrdinationMethod,
    /// Output dimensionality.
    pub n_components: usize,
    /// Seed for the random initial configurations (SMACOF only).
    pub seed: u64,
    /// Number of random restarts (SMACOF only).
    pub n_init: usize,
    /// Maximum Guttman iterations per restart (SMACOF only).
    pub max_iter: usize,
    /// Relative stress improvement below which iteration stops (SMACOF only).
    pub eps: f64,
}

impl Default for OrdinationConfig {
    fn default() -> Self {
        Self {
            method: OrdinationMethod::Smacof,
            n_components: 2,
            seed: 42,
            n_init: 4,
            max_iter: 300,
            eps: 1e-3,
        }
    }
}

impl OrdinationConfig {
    /// Classical scaling with the given dimensionality.
    pub fn classical(n_components: usize) -> Self {
        Self {
            method: OrdinationMethod::Classical,
            n_components,
            ..Self::default()
        }
    }
}

/// Column labels `PC1..PCn`.
pub fn component_names(n: usize) -> Vec<String> {
    (1..=n).map(|k| format!("PC{}", k)).collect()
}

/// Embed a square distance matrix, returning `n_samples × n_components` coordinates.
pub fn embed(distances: &DMatrix<f64>, config: &OrdinationConfig) -> Result<DMatrix<f64>> {
    match config.method {
        OrdinationMethod::Smacof => Ok(smacof(distances, config)?.coordinates),
        OrdinationMethod::Classical => Ok(pcoa(distances, config.n_components)?.coordinates),
    }
}

pub(crate) fn validate_distances(distances: &DMatrix<f64>, n_components: usize) -> Result<usize> {
    let n = distances.nrows();
    if distances.ncols() != n {
        return Err(OmicsError::DimensionMismatch {
            expected: n,
            actual: distances.ncols(),
        });
    }
    if n < 2 {
        return Err(OmicsError::EmptyData(
            "At least 2 samples are required for ordination".to_string(),
        ));
    }
    if n_components == 0 || n_components > n {
        return Err(OmicsError::InvalidParameter(format!(
            "n_components ({}) must be in [1, {}]",
            n_components, n
        )));
    }
    if distances.iter().any(|d| !d.is_finite()) {
        return Err(OmicsError::Numerical(
            "Distance matrix contains non-finite values".to_string(),
        ));
    }
    Ok(n)
}

/// Sign of the largest-magnitude value, `1.0` for an all-zero input.
pub fn dominant_sign<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    let pivot = values
        .into_iter()
        .fold(0.0f64, |acc, v| if v.abs() > acc.abs() { v } else { acc });
    if pivot < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Flip each column so its largest-magnitude entry is positive.
pub(crate) fn fix_signs(columns: &mut DMatrix<f64>) {
    for mut col in columns.column_iter_mut() {
        let sign = dominant_sign(col.iter().copied());
        col *= sign;
    }
}
