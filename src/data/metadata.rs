//! Sample metadata handling.

use crate::data::io::open_text;
use crate::error::{OmicsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::io::BufRead;
use std::path::Path;

/// A variable value that can be categorical or continuous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Variable {
    /// Categorical variable with string levels.
    Categorical(String),
    /// Continuous numeric variable.
    Continuous(f64),
    /// Missing value.
    Missing,
}

impl Variable {
    /// Check if this is a missing value.
    pub fn is_missing(&self) -> bool {
        matches!(self, Variable::Missing)
    }

    /// Try to get as continuous f64.
    pub fn as_continuous(&self) -> Option<f64> {
        match self {
            Variable::Continuous(v) => Some(*v),
            _ => None,
        }
    }

    /// Render the value as a label, `None` when missing.
    pub fn label(&self) -> Option<String> {
        match self {
            Variable::Categorical(s) => Some(s.clone()),
            Variable::Continuous(v) => Some(v.to_string()),
            Variable::Missing => None,
        }
    }
}

/// Inferred type of a metadata column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableType {
    Categorical,
    Continuous,
}

/// Sample metadata keyed by sample title.
#[derive(Debug, Clone)]
pub struct Metadata {
    /// Sample IDs in order.
    sample_ids: Vec<String>,
    /// Column names.
    column_names: Vec<String>,
    /// Data stored as sample_id -> column_name -> Variable.
    data: HashMap<String, HashMap<String, Variable>>,
    /// Type of each column.
    column_types: HashMap<String, VariableType>,
}

fn is_missing_token(raw: &str) -> bool {
    raw.is_empty() || raw == "NA" || raw == "na" || raw == "NaN"
}

impl Metadata {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self {
            sample_ids: Vec::new(),
            column_names: Vec::new(),
            data: HashMap::new(),
            column_types: HashMap::new(),
        }
    }

    /// Build metadata from in-memory rows of raw string values.
    ///
    /// Column types are inferred: continuous if every non-missing value parses
    /// as a number, otherwise categorical.
    pub fn from_rows(column_names: Vec<String>, rows: Vec<(String, Vec<String>)>) -> Result<Self> {
        if rows.is_empty() {
            return Err(OmicsError::EmptyData("No samples in metadata".to_string()));
        }

        let mut column_types = HashMap::new();
        for (col_idx, col_name) in column_names.iter().enumerate() {
            let all_numeric = rows.iter().all(|(_, values)| match values.get(col_idx) {
                None => true,
                Some(v) => {
                    let v = v.trim();
                    is_missing_token(v) || v.parse::<f64>().is_ok()
                }
            });
            let var_type = if all_numeric {
                VariableType::Continuous
            } else {
                VariableType::Categorical
            };
            column_types.insert(col_name.clone(), var_type);
        }

        let mut sample_ids = Vec::new();
        let mut data = HashMap::new();

        for (sample_id, values) in rows {
            if data.contains_key(&sample_id) {
                return Err(OmicsError::SampleMismatch(format!(
                    "Duplicate sample '{}' in metadata",
                    sample_id
                )));
            }
            sample_ids.push(sample_id.clone());
            let mut sample_data = HashMap::new();

            for (col_idx, col_name) in column_names.iter().enumerate() {
                let raw = values.get(col_idx).map(|s| s.trim()).unwrap_or("");
                let var = if is_missing_token(raw) {
                    Variable::Missing
                } else {
                    match column_types.get(col_name) {
                        Some(VariableType::Continuous) => raw
                            .parse::<f64>()
                            .map(Variable::Continuous)
                            .unwrap_or(Variable::Missing),
                        Some(VariableType::Categorical) | None => {
                            Variable::Categorical(raw.to_string())
                        }
                    }
                };
                sample_data.insert(col_name.clone(), var);
            }
            data.insert(sample_id, sample_data);
        }

        Ok(Self {
            sample_ids,
            column_names,
            data,
            column_types,
        })
    }

    /// Load metadata from a TSV file (optionally gzip-compressed).
    ///
    /// Expected format:
    /// - First row: header with column names (first column is the sample title)
    /// - Subsequent rows: sample title followed by variable values
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = open_text(path)?;
        let mut lines = reader.lines();

        let header_line = lines
            .next()
            .ok_or_else(|| OmicsError::EmptyData("Empty metadata file".to_string()))??;
        let header: Vec<&str> = header_line.trim_end_matches('\r').split('\t').collect();
        if header.len() < 2 {
            return Err(OmicsError::EmptyData(
                "Metadata must have at least one variable column".to_string(),
            ));
        }
        let column_names: Vec<String> = header[1..].iter().map(|s| s.trim().to_string()).collect();

        let mut rows = Vec::new();
        for line_result in lines {
            let line = line_result?;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let sample_id = fields[0].trim().to_string();
            let values: Vec<String> = fields[1..].iter().map(|s| s.to_string()).collect();
            rows.push((sample_id, values));
        }

        Self::from_rows(column_names, rows)
    }

    /// Sample IDs in order.
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Column names.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Number of samples.
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Number of columns (variables).
    pub fn n_columns(&self) -> usize {
        self.column_names.len()
    }

    /// Get a variable value for a specific sample and column.
    pub fn get(&self, sample_id: &str, column: &str) -> Option<&Variable> {
        self.data.get(sample_id).and_then(|m| m.get(column))
    }

    /// Get all values for a column, in sample order.
    pub fn column(&self, column: &str) -> Result<Vec<&Variable>> {
        if !self.has_column(column) {
            return Err(OmicsError::MissingColumn(column.to_string()));
        }
        Ok(self
            .sample_ids
            .iter()
            .map(|sid| {
                self.data
                    .get(sid)
                    .and_then(|m| m.get(column))
                    .unwrap_or(&Variable::Missing)
            })
            .collect())
    }

    /// Get the type of a column.
    pub fn column_type(&self, column: &str) -> Option<VariableType> {
        self.column_types.get(column).copied()
    }

    /// Sorted distinct non-missing labels of a column.
    pub fn levels(&self, column: &str) -> Result<Vec<String>> {
        let values = self.column(column)?;
        let levels: BTreeSet<String> = values.iter().filter_map(|v| v.label()).collect();
        Ok(levels.into_iter().collect())
    }

    /// Sample IDs whose `column` equals `level`, in metadata order.
    pub fn samples_with_level(&self, column: &str, level: &str) -> Result<Vec<String>> {
        let values = self.column(column)?;
        Ok(self
            .sample_ids
            .iter()
            .zip(values)
            .filter(|(_, v)| v.label().as_deref() == Some(level))
            .map(|(sid, _)| sid.clone())
            .collect())
    }

    /// Subset metadata to only include specified samples.
    pub fn subset_samples(&self, sample_ids: &[String]) -> Result<Self> {
        let mut new_data = HashMap::new();
        let mut new_sample_ids = Vec::new();

        for sid in sample_ids {
            if let Some(sample_data) = self.data.get(sid) {
                new_data.insert(sid.clone(), sample_data.clone());
                new_sample_ids.push(sid.clone());
            } else {
                return Err(OmicsError::SampleMismatch(format!(
                    "Sample '{}' not found in metadata",
                    sid
                )));
            }
        }

        Ok(Self {
            sample_ids: new_sample_ids,
            column_names: self.column_names.clone(),
            data: new_data,
            column_types: self.column_types.clone(),
        })
    }

    /// Check if a column exists.
    pub fn has_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new()
    }
}
