//! Sample-indexed and feature × taxon result tables.

use crate::error::{OmicsError, Result};
use nalgebra::DMatrix;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// A result table indexed by sample id with named numeric columns.
///
/// Rows are samples; `values` is `n_samples × n_columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTable {
    sample_ids: Vec<String>,
    columns: Vec<String>,
    values: DMatrix<f64>,
}

impl SampleTable {
    /// Create a table, validating label counts against the value matrix.
    pub fn new(sample_ids: Vec<String>, columns: Vec<String>, values: DMatrix<f64>) -> Result<Self> {
        if values.nrows() != sample_ids.len() {
            return Err(OmicsError::DimensionMismatch {
                expected: values.nrows(),
                actual: sample_ids.len(),
            });
        }
        if values.ncols() != columns.len() {
            return Err(OmicsError::DimensionMismatch {
                expected: values.ncols(),
                actual: columns.len(),
            });
        }
        Ok(Self {
            sample_ids,
            columns,
            values,
        })
    }

    /// Sample identifiers (row labels).
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Column names.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Underlying values (samples × columns).
    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Number of rows.
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Number of columns.
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Check if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.sample_ids.is_empty()
    }

    /// Values of a named column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.values.column(idx).iter().copied().collect())
    }

    /// Values of a sample row, in column order.
    pub fn row(&self, sample_id: &str) -> Option<Vec<f64>> {
        let idx = self.sample_ids.iter().position(|s| s == sample_id)?;
        Some(self.values.row(idx).iter().copied().collect())
    }

    /// Value at a sample and column.
    pub fn get(&self, sample_id: &str, column: &str) -> Option<f64> {
        let row = self.sample_ids.iter().position(|s| s == sample_id)?;
        let col = self.columns.iter().position(|c| c == column)?;
        Some(self.values[(row, col)])
    }

    /// Inner join with another table on the sample axis.
    ///
    /// Keeps samples present in both tables, in this table's order; columns
    /// of `other` are appended after this table's columns.
    pub fn inner_join(&self, other: &SampleTable) -> Result<SampleTable> {
        if let Some(dup) = other.columns.iter().find(|c| self.columns.contains(c)) {
            return Err(OmicsError::InvalidParameter(format!(
                "Column '{}' present on both sides of join",
                dup
            )));
        }

        let other_rows: HashMap<&str, usize> = other
            .sample_ids
            .iter()
            .enumerate()
            .map(|(i, s)| (s.as_str(), i))
            .collect();

        let pairs: Vec<(usize, usize)> = self
            .sample_ids
            .iter()
            .enumerate()
            .filter_map(|(i, s)| other_rows.get(s.as_str()).map(|&j| (i, j)))
            .collect();

        let n_left = self.n_columns();
        let n_cols = n_left + other.n_columns();
        let values = DMatrix::from_fn(pairs.len(), n_cols, |r, c| {
            let (i, j) = pairs[r];
            if c < n_left {
                self.values[(i, c)]
            } else {
                other.values[(j, c - n_left)]
            }
        });

        let sample_ids = pairs.iter().map(|&(i, _)| self.sample_ids[i].clone()).collect();
        let mut columns = self.columns.clone();
        columns.extend(other.columns.iter().cloned());

        SampleTable::new(sample_ids, columns, values)
    }

    /// Keep only the named samples that exist in the table, in table order.
    pub fn retain_samples(&self, keep: &[String]) -> SampleTable {
        let rows: Vec<usize> = self
            .sample_ids
            .iter()
            .enumerate()
            .filter(|(_, s)| keep.contains(s))
            .map(|(i, _)| i)
            .collect();
        let values = DMatrix::from_fn(rows.len(), self.n_columns(), |r, c| self.values[(rows[r], c)]);
        SampleTable {
            sample_ids: rows.iter().map(|&i| self.sample_ids[i].clone()).collect(),
            columns: self.columns.clone(),
            values,
        }
    }

    /// Row-oriented records: `{"Sample": id, column: value, ...}`.
    ///
    /// Non-finite values serialize as `null`.
    pub fn to_records(&self) -> Vec<Value> {
        self.sample_ids
            .iter()
            .enumerate()
            .map(|(i, sid)| {
                let mut record = Map::new();
                record.insert("Sample".to_string(), json!(sid));
                for (j, col) in self.columns.iter().enumerate() {
                    record.insert(col.clone(), json!(self.values[(i, j)]));
                }
                Value::Object(record)
            })
            .collect()
    }

    /// Write the table to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        write!(writer, "Sample")?;
        for col in &self.columns {
            write!(writer, "\t{}", col)?;
        }
        writeln!(writer)?;

        for (i, sid) in self.sample_ids.iter().enumerate() {
            write!(writer, "{}", sid)?;
            for j in 0..self.n_columns() {
                write!(writer, "\t{:.6}", self.values[(i, j)])?;
            }
            writeln!(writer)?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// Dense feature × taxon association matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    feature_ids: Vec<String>,
    taxon_ids: Vec<String>,
    values: DMatrix<f64>,
}

impl CorrelationMatrix {
    /// Create a matrix with `values` shaped `features × taxa`.
    pub fn new(feature_ids: Vec<String>, taxon_ids: Vec<String>, values: DMatrix<f64>) -> Result<Self> {
        if values.shape() != (feature_ids.len(), taxon_ids.len()) {
            return Err(OmicsError::DimensionMismatch {
                expected: feature_ids.len() * taxon_ids.len(),
                actual: values.len(),
            });
        }
        Ok(Self {
            feature_ids,
            taxon_ids,
            values,
        })
    }

    /// A matrix with no rows or columns.
    pub fn empty() -> Self {
        Self {
            feature_ids: Vec::new(),
            taxon_ids: Vec::new(),
            values: DMatrix::zeros(0, 0),
        }
    }

    /// True when no coefficients were computed.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Row labels.
    pub fn feature_ids(&self) -> &[String] {
        &self.feature_ids
    }

    /// Column labels.
    pub fn taxon_ids(&self) -> &[String] {
        &self.taxon_ids
    }

    /// Underlying values.
    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Coefficient by position.
    pub fn get(&self, feature: usize, taxon: usize) -> f64 {
        self.values[(feature, taxon)]
    }

    /// Coefficient by label.
    pub fn get_by_id(&self, feature_id: &str, taxon_id: &str) -> Option<f64> {
        let i = self.feature_ids.iter().position(|f| f == feature_id)?;
        let j = self.taxon_ids.iter().position(|t| t == taxon_id)?;
        Some(self.values[(i, j)])
    }

    /// Heatmap layout: `{"z": rows of coefficients, "x": taxa, "y": features}`.
    pub fn to_heatmap(&self) -> Value {
        let z: Vec<Vec<Value>> = (0..self.values.nrows())
            .map(|i| (0..self.values.ncols()).map(|j| json!(self.values[(i, j)])).collect())
            .collect();
        json!({
            "z": z,
            "x": self.taxon_ids,
            "y": self.feature_ids,
        })
    }

    /// Write the matrix to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        write!(writer, "feature_id")?;
        for taxon in &self.taxon_ids {
            write!(writer, "\t{}", taxon)?;
        }
        writeln!(writer)?;

        for (i, feature) in self.feature_ids.iter().enumerate() {
            write!(writer, "{}", feature)?;
            for j in 0..self.taxon_ids.len() {
                write!(writer, "\t{:.6}", self.values[(i, j)])?;
            }
            writeln!(writer)?;
        }

        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(ids: &[&str], cols: &[&str], rows: &[&[f64]]) -> SampleTable {
        let flat: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        SampleTable::new(
            ids.iter().map(|s| s.to_string()).collect(),
            cols.iter().map(|s| s.to_string()).collect(),
            DMatrix::from_row_slice(rows.len(), cols.len(), &flat),
        )
        .unwrap()
    }

    #[test]
    fn test_inner_join_keeps_common_samples_in_left_order() {
        let alpha = table(&["S1", "S2", "S3"], &["shannon"], &[&[1.0], &[2.0], &[3.0]]);
        let beta = table(&["S3", "S1", "S9"], &["PC1", "PC2"], &[&[0.3, -0.3], &[0.1, -0.1], &[9.0, 9.0]]);

        let joined = alpha.inner_join(&beta).unwrap();
        assert_eq!(joined.sample_ids(), &["S1", "S3"]);
        assert_eq!(joined.columns(), &["shannon", "PC1", "PC2"]);
        assert_eq!(joined.get("S3", "PC2"), Some(-0.3));
        assert_eq!(joined.get("S1", "shannon"), Some(1.0));
        assert_eq!(joined.get("S2", "shannon"), None);
        assert_eq!(joined.row("S1").unwrap(), vec![1.0, 0.1, -0.1]);
    }

    #[test]
    fn test_inner_join_rejects_duplicate_columns() {
        let a = table(&["S1"], &["PC1"], &[&[1.0]]);
        let b = table(&["S1"], &["PC1"], &[&[2.0]]);
        assert!(a.inner_join(&b).is_err());
    }

    #[test]
    fn test_shape_validation() {
        let result = SampleTable::new(vec!["S1".into()], vec!["a".into(), "b".into()], DMatrix::zeros(1, 1));
        assert!(result.is_err());
    }

    #[test]
    fn test_records_use_null_for_nan() {
        let t = table(&["S1"], &["x"], &[&[f64::NAN]]);
        let records = t.to_records();
        assert_eq!(records[0]["Sample"], "S1");
        assert!(records[0]["x"].is_null());
    }

    #[test]
    fn test_retain_samples() {
        let t = table(&["S1", "S2", "S3"], &["x"], &[&[1.0], &[2.0], &[3.0]]);
        let kept = t.retain_samples(&["S3".to_string(), "S1".to_string()]);
        assert_eq!(kept.sample_ids(), &["S1", "S3"]);
        assert_eq!(kept.column("x").unwrap(), vec![1.0, 3.0]);
    }

    #[test]
    fn test_correlation_matrix_heatmap() {
        let m = CorrelationMatrix::new(
            vec!["G1".into(), "G2".into()],
            vec!["Blautia".into()],
            DMatrix::from_row_slice(2, 1, &[1.0, -0.5]),
        )
        .unwrap();
        let heatmap = m.to_heatmap();
        assert_eq!(heatmap["x"][0], "Blautia");
        assert_eq!(heatmap["y"][1], "G2");
        assert_eq!(heatmap["z"][1][0], -0.5);
        assert_eq!(m.get_by_id("G2", "Blautia"), Some(-0.5));
        assert!(CorrelationMatrix::empty().is_empty());
    }
}
