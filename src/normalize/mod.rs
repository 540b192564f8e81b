//! Normalization methods for count and abundance data.
//!
//! - **TSS**: total sum scaling / relative abundance
//! - **log-CPM**: log2 of counts per million plus one
//! - **Standardize**: per-column z-scores for multivariate methods

pub mod log_cpm;
pub mod standardize;
pub mod tss;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

pub use log_cpm::norm_log_cpm;
pub use standardize::{standardize_columns, Standardized};
pub use tss::{norm_tss, relative_abundance, scale, TssMatrix};

/// A transformed matrix with metadata about the transformation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformedMatrix {
    /// The transformed data (features × samples).
    #[serde(skip)]
    pub data: DMatrix<f64>,
    /// Feature identifiers.
    pub feature_ids: Vec<String>,
    /// Sample identifiers.
    pub sample_ids: Vec<String>,
    /// Name of the transformation applied.
    pub transformation: String,
}

impl TransformedMatrix {
    /// Get the transformed value for a feature and sample.
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

    /// Get reference to the underlying matrix.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.data
    }
}
