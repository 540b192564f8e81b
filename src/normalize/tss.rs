//! Total Sum Scaling (TSS) normalization.
//!
//! TSS converts counts to relative abundances by dividing each count by the
//! total counts in that sample. With a scale factor of 1e6 this is
//! counts-per-million (CPM).

use crate::data::CountMatrix;
use crate::error::{OmicsError, Result};
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Result of TSS normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TssMatrix {
    /// The normalized data (features × samples).
    #[serde(skip)]
    pub data: DMatrix<f64>,
    /// Feature identifiers.
    pub feature_ids: Vec<String>,
    /// Sample identifiers.
    pub sample_ids: Vec<String>,
    /// Scale factor applied (1.0 for proportions, 1e6 for CPM, etc.).
    pub scale_factor: f64,
    /// Library sizes (total per sample before normalization).
    pub library_sizes: Vec<f64>,
}

impl TssMatrix {
    /// Get the normalized value for a feature and sample.
    pub fn get(&self, feature: usize, sample: usize) -> f64 {
        self.data[(feature, sample)]
    }

    /// Number of features.
    pub fn n_features(&self) -> usize {
        self.data.nrows()
    }

    /// Number of samples.
    pub fn n_samples(&self) -> usize {
        self.data.ncols()
    }

    /// Get a row (feature) as a vector.
    pub fn row(&self, feature: usize) -> Vec<f64> {
        self.data.row(feature).iter().cloned().collect()
    }

    /// Get a column (sample) as a vector.
    pub fn col(&self, sample: usize) -> Vec<f64> {
        self.data.column(sample).iter().cloned().collect()
    }

    /// Mean of each feature across samples.
    pub fn row_means(&self) -> Vec<f64> {
        let n = self.n_samples().max(1) as f64;
        (0..self.n_features())
            .map(|i| self.data.row(i).sum() / n)
            .collect()
    }
}

/// Apply Total Sum Scaling normalization to a count matrix.
///
/// # Formula
/// For sample j: TSS(x_ij) = x_ij / sum(x_j) * scale_factor
///
/// A sample whose total is zero cannot be scaled and fails with
/// [`OmicsError::Numerical`].
pub fn norm_tss(counts: &CountMatrix, scale_factor: f64) -> Result<TssMatrix> {
    let n_features = counts.n_features();
    let n_samples = counts.n_samples();

    if n_features == 0 || n_samples == 0 {
        return Err(OmicsError::EmptyData(
            "Cannot apply TSS to empty matrix".to_string(),
        ));
    }

    if scale_factor <= 0.0 {
        return Err(OmicsError::InvalidParameter(
            "Scale factor must be positive".to_string(),
        ));
    }

    let library_sizes = counts.col_sums();

    for (j, &lib_size) in library_sizes.iter().enumerate() {
        if lib_size <= 0.0 {
            return Err(OmicsError::Numerical(format!(
                "Sample {} has zero total counts, cannot normalize",
                counts.sample_ids()[j]
            )));
        }
    }

    let normalized_cols: Vec<Vec<f64>> = (0..n_samples)
        .into_par_iter()
        .map(|j| {
            let lib_size = library_sizes[j];
            counts
                .col_dense(j)
                .into_iter()
                .map(|v| (v / lib_size) * scale_factor)
                .collect()
        })
        .collect();

    let data = DMatrix::from_fn(n_features, n_samples, |i, j| normalized_cols[j][i]);

    Ok(TssMatrix {
        data,
        feature_ids: counts.feature_ids().to_vec(),
        sample_ids: counts.sample_ids().to_vec(),
        scale_factor,
        library_sizes,
    })
}

/// Relative abundance per sample (columns sum to one).
pub fn relative_abundance(counts: &CountMatrix) -> Result<TssMatrix> {
    norm_tss(counts, scale::PROPORTION)
}

/// Common scale factors for TSS normalization.
pub mod scale {
    /// Proportions (sum to 1.0 per sample).
    pub const PROPORTION: f64 = 1.0;
    /// Counts per million (CPM).
    pub const CPM: f64 = 1_000_000.0;
    /// Counts per 100 (percentages).
    pub const PERCENT: f64 = 100.0;
}
