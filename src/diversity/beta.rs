//! Between-sample dissimilarity and its low-dimensional embedding.

use crate::data::{CountMatrix, SampleTable};
use crate::error::{OmicsError, Result};
use crate::normalize::relative_abundance;
use crate::ordination::{component_names, embed, OrdinationConfig};
use nalgebra::DMatrix;
use rayon::prelude::*;

/// Symmetric sample × sample distance matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    pub sample_ids: Vec<String>,
    pub data: DMatrix<f64>,
}

impl DistanceMatrix {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.sample_ids.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.sample_ids.is_empty()
    }

    /// Distance between two samples by position.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[(i, j)]
    }
}

/// Bray-Curtis dissimilarity `Σ|a - b| / Σ(a + b)`.
///
/// Two all-zero profiles are at distance zero.
pub fn bray_curtis(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(OmicsError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    let (num, den) = a
        .iter()
        .zip(b)
        .fold((0.0, 0.0), |(num, den), (x, y)| (num + (x - y).abs(), den + x + y));
    Ok(if den > 0.0 { num / den } else { 0.0 })
}

/// Pairwise Bray-Curtis distances between the samples (columns) of a matrix.
///
/// Values are used as given; callers wanting compositional distances pass
/// relative abundances.
pub fn bray_curtis_matrix(abundance: &CountMatrix) -> Result<DistanceMatrix> {
    let n = abundance.n_samples();
    let columns: Vec<Vec<f64>> = (0..n).map(|j| abundance.col_dense(j)).collect();

    let rows: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| {
            (0..n)
                .map(|j| {
                    if i == j {
                        Ok(0.0)
                    } else {
                        bray_curtis(&columns[i], &columns[j])
                    }
                })
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DistanceMatrix {
        sample_ids: abundance.sample_ids().to_vec(),
        data: DMatrix::from_fn(n, n, |i, j| rows[i][j]),
    })
}

/// Bray-Curtis distances on relative abundances, embedded per `config`.
///
/// `abundance` is taxa × samples. Returns a table indexed by sample with
/// columns `PC1..PCn`.
pub fn beta_diversity(abundance: &CountMatrix, config: &OrdinationConfig) -> Result<SampleTable> {
    if abundance.n_samples() < 2 {
        return Err(OmicsError::EmptyData(
            "Beta diversity needs at least 2 samples".to_string(),
        ));
    }

    let rel = relative_abundance(abundance)?;
    let rel_matrix = CountMatrix::from_dense(&rel.data, rel.feature_ids, rel.sample_ids)?;
    let distances = bray_curtis_matrix(&rel_matrix)?;
    log::debug!(
        "Embedding {} samples with {:?} ({} components)",
        distances.len(),
        config.method,
        config.n_components
    );

    let coordinates = embed(&distances.data, config)?;
    SampleTable::new(distances.sample_ids, component_names(config.n_components), coordinates)
}
