//! Labeled sparse matrix for count and abundance data.

use crate::data::io::open_text;
use crate::error::{OmicsError, Result};
use nalgebra::DMatrix;
use rayon::prelude::*;
use sprs::{CsMat, TriMat};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

/// A sparse matrix of non-negative values with labeled axes.
///
/// Rows represent features (genes or taxa), columns represent samples.
/// Uses CSR (Compressed Sparse Row) format for efficient row-wise operations.
/// Every analysis function that accepts a `CountMatrix` expects this
/// orientation; use [`CountMatrix::transpose`] when samples must be rows.
#[derive(Debug, Clone)]
pub struct CountMatrix {
    /// Sparse matrix in CSR format (features × samples)
    data: CsMat<f64>,
    /// Feature identifiers (row names)
    feature_ids: Vec<String>,
    /// Sample identifiers (column names)
    sample_ids: Vec<String>,
}

impl CountMatrix {
    /// Create a new CountMatrix from a sparse matrix and identifiers.
    pub fn new(data: CsMat<f64>, feature_ids: Vec<String>, sample_ids: Vec<String>) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != feature_ids.len() {
            return Err(OmicsError::DimensionMismatch {
                expected: nrows,
                actual: feature_ids.len(),
            });
        }
        if ncols != sample_ids.len() {
            return Err(OmicsError::DimensionMismatch {
                expected: ncols,
                actual: sample_ids.len(),
            });
        }
        Ok(Self {
            data,
            feature_ids,
            sample_ids,
        })
    }

    /// Build a matrix from `(row, col, value)` triplets.
    ///
    /// Triplets addressing the same cell are summed.
    pub fn from_triplets(
        triplets: &[(usize, usize, f64)],
        feature_ids: Vec<String>,
        sample_ids: Vec<String>,
    ) -> Result<Self> {
        let shape = (feature_ids.len(), sample_ids.len());
        let mut tri_mat = TriMat::new(shape);
        for &(row, col, val) in triplets {
            if row >= shape.0 || col >= shape.1 {
                return Err(OmicsError::InvalidParameter(format!(
                    "Triplet ({}, {}) out of bounds for {}x{} matrix",
                    row, col, shape.0, shape.1
                )));
            }
            if val != 0.0 {
                tri_mat.add_triplet(row, col, val);
            }
        }
        Self::new(tri_mat.to_csr(), feature_ids, sample_ids)
    }

    /// Load a matrix from a TSV file (optionally gzip-compressed).
    ///
    /// Expected format:
    /// - First row: header with sample IDs (first column is feature ID header)
    /// - Subsequent rows: feature ID followed by non-negative values
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = open_text(path)?;
        let mut lines = reader.lines();

        // Parse header
        let header_line = lines
            .next()
            .ok_or_else(|| OmicsError::EmptyData("Empty TSV file".to_string()))??;
        let header: Vec<&str> = header_line.trim_end_matches('\r').split('\t').collect();
        if header.len() < 2 {
            return Err(OmicsError::EmptyData(
                "TSV must have at least one sample".to_string(),
            ));
        }
        let sample_ids: Vec<String> = header[1..].iter().map(|s| s.trim().to_string()).collect();
        let n_samples = sample_ids.len();

        let mut triplets: Vec<(usize, usize, f64)> = Vec::new();
        let mut feature_ids: Vec<String> = Vec::new();

        for line_result in lines {
            let line = line_result?;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let row_idx = feature_ids.len();
            feature_ids.push(fields[0].trim().to_string());

            for (col_idx, value_str) in fields[1..].iter().enumerate() {
                if col_idx >= n_samples {
                    break;
                }
                let value: f64 = value_str
                    .trim()
                    .parse()
                    .ok()
                    .filter(|v: &f64| v.is_finite() && *v >= 0.0)
                    .ok_or_else(|| OmicsError::InvalidValue {
                        value: value_str.to_string(),
                        row: row_idx,
                        col: col_idx,
                    })?;
                if value > 0.0 {
                    triplets.push((row_idx, col_idx, value));
                }
            }
        }

        if feature_ids.is_empty() {
            return Err(OmicsError::EmptyData("No features in TSV".to_string()));
        }

        log::debug!(
            "Parsed count matrix: {} features x {} samples ({} non-zero)",
            feature_ids.len(),
            n_samples,
            triplets.len()
        );
        Self::from_triplets(&triplets, feature_ids, sample_ids)
    }

    /// Write the matrix to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        write!(writer, "feature_id")?;
        for sample_id in &self.sample_ids {
            write!(writer, "\t{}", sample_id)?;
        }
        writeln!(writer)?;

        for (row_idx, feature_id) in self.feature_ids.iter().enumerate() {
            write!(writer, "{}", feature_id)?;
            for value in self.row_dense(row_idx) {
                write!(writer, "\t{}", value)?;
            }
            writeln!(writer)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Get the value at (row, col), returning 0 for missing entries.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data.get(row, col).copied().unwrap_or(0.0)
    }

    /// Number of features (rows).
    #[inline]
    pub fn n_features(&self) -> usize {
        self.data.rows()
    }

    /// Number of samples (columns).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.cols()
    }

    /// Total number of non-zero entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.data.nnz()
    }

    /// Feature identifiers.
    #[inline]
    pub fn feature_ids(&self) -> &[String] {
        &self.feature_ids
    }

    /// Sample identifiers.
    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Get the underlying sparse matrix.
    #[inline]
    pub fn data(&self) -> &CsMat<f64> {
        &self.data
    }

    /// Position of a sample by identifier.
    pub fn sample_index(&self, sample_id: &str) -> Option<usize> {
        self.sample_ids.iter().position(|s| s == sample_id)
    }

    /// Get a dense vector for a specific row (feature).
    pub fn row_dense(&self, row: usize) -> Vec<f64> {
        let mut dense = vec![0.0; self.n_samples()];
        if let Some(row_vec) = self.data.outer_view(row) {
            for (col, &val) in row_vec.iter() {
                dense[col] = val;
            }
        }
        dense
    }

    /// Get a dense vector for a specific column (sample).
    pub fn col_dense(&self, col: usize) -> Vec<f64> {
        (0..self.n_features()).map(|row| self.get(row, col)).collect()
    }

    /// Compute row sums (total per feature).
    pub fn row_sums(&self) -> Vec<f64> {
        (0..self.n_features())
            .into_par_iter()
            .map(|row| {
                self.data
                    .outer_view(row)
                    .map(|v| v.iter().map(|(_, &val)| val).sum())
                    .unwrap_or(0.0)
            })
            .collect()
    }

    /// Compute column sums (library sizes per sample).
    pub fn col_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.n_samples()];
        for row_vec in self.data.outer_iterator() {
            for (col, &val) in row_vec.iter() {
                sums[col] += val;
            }
        }
        sums
    }

    /// Subset the matrix to include only specified features (by index).
    pub fn subset_features(&self, indices: &[usize]) -> Result<Self> {
        let mut triplets = Vec::new();
        let mut new_feature_ids = Vec::with_capacity(indices.len());

        for (new_row, &old_row) in indices.iter().enumerate() {
            if old_row >= self.n_features() {
                return Err(OmicsError::InvalidParameter(format!(
                    "Feature index {} out of bounds",
                    old_row
                )));
            }
            new_feature_ids.push(self.feature_ids[old_row].clone());

            if let Some(row_vec) = self.data.outer_view(old_row) {
                for (col, &val) in row_vec.iter() {
                    triplets.push((new_row, col, val));
                }
            }
        }

        Self::from_triplets(&triplets, new_feature_ids, self.sample_ids.clone())
    }

    /// Subset the matrix to include only specified samples (by index).
    ///
    /// Columns appear in the order given by `indices`.
    pub fn subset_samples(&self, indices: &[usize]) -> Result<Self> {
        let col_map: HashMap<usize, usize> = indices
            .iter()
            .enumerate()
            .map(|(new_idx, &old_idx)| (old_idx, new_idx))
            .collect();

        let mut new_sample_ids = Vec::with_capacity(indices.len());
        for &old_col in indices {
            if old_col >= self.n_samples() {
                return Err(OmicsError::InvalidParameter(format!(
                    "Sample index {} out of bounds",
                    old_col
                )));
            }
            new_sample_ids.push(self.sample_ids[old_col].clone());
        }

        let mut triplets = Vec::new();
        for (row, row_vec) in self.data.outer_iterator().enumerate() {
            for (old_col, &val) in row_vec.iter() {
                if let Some(&new_col) = col_map.get(&old_col) {
                    triplets.push((row, new_col, val));
                }
            }
        }

        Self::from_triplets(&triplets, self.feature_ids.clone(), new_sample_ids)
    }

    /// Subset the matrix to the named samples, in the order given.
    pub fn select_samples(&self, sample_ids: &[String]) -> Result<Self> {
        let indices = sample_ids
            .iter()
            .map(|sid| {
                self.sample_index(sid).ok_or_else(|| {
                    OmicsError::SampleMismatch(format!("Sample '{}' not found in matrix", sid))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.subset_samples(&indices)
    }

    /// Swap the axes: rows become samples and columns become features.
    pub fn transpose(&self) -> Self {
        Self {
            data: self.data.transpose_view().to_csr(),
            feature_ids: self.sample_ids.clone(),
            sample_ids: self.feature_ids.clone(),
        }
    }

    /// Convert to a dense matrix (features × samples).
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut dense = DMatrix::zeros(self.n_features(), self.n_samples());
        for (row, row_vec) in self.data.outer_iterator().enumerate() {
            for (col, &val) in row_vec.iter() {
                dense[(row, col)] = val;
            }
        }
        dense
    }

    /// Create from a dense matrix.
    pub fn from_dense(
        data: &DMatrix<f64>,
        feature_ids: Vec<String>,
        sample_ids: Vec<String>,
    ) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != feature_ids.len() {
            return Err(OmicsError::DimensionMismatch {
                expected: nrows,
                actual: feature_ids.len(),
            });
        }
        if ncols != sample_ids.len() {
            return Err(OmicsError::DimensionMismatch {
                expected: ncols,
                actual: sample_ids.len(),
            });
        }

        let mut triplets = Vec::new();
        for row in 0..nrows {
            for col in 0..ncols {
                let val = data[(row, col)];
                if !val.is_finite() || val < 0.0 {
                    return Err(OmicsError::InvalidValue {
                        value: val.to_string(),
                        row,
                        col,
                    });
                }
                if val > 0.0 {
                    triplets.push((row, col, val));
                }
            }
        }

        Self::from_triplets(&triplets, feature_ids, sample_ids)
    }
}
