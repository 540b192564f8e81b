//! Long-form taxonomic abundance records and pivoting to matrices.
//!
//! Metagenomic profilers typically report one row per (sample, taxon) with
//! the abundance and the full lineage spread over rank columns. Numeric
//! analysis needs a taxon × sample matrix at a chosen rank, which is what
//! [`AbundanceTable::pivot`] produces.

use crate::data::io::open_text;
use crate::data::CountMatrix;
use crate::error::{OmicsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Column holding the sample identifier.
pub const SAMPLE_COLUMN: &str = "Sample";
/// Column holding the abundance value.
pub const ABUNDANCE_COLUMN: &str = "Abundance";
/// Rank used when no rank is specified.
pub const DEFAULT_RANK: &str = "Genus";

/// One observation of a taxon in a sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbundanceRecord {
    /// Sample identifier.
    pub sample: String,
    /// Observed abundance (non-negative).
    pub abundance: f64,
    /// Lineage values, aligned with [`AbundanceTable::ranks`]. Empty strings are unassigned.
    pub lineage: Vec<String>,
}

/// Long-form abundance table: `(sample, abundance, rank columns...)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AbundanceTable {
    ranks: Vec<String>,
    records: Vec<AbundanceRecord>,
}

impl AbundanceTable {
    /// Create a table from rank names and records.
    pub fn new(ranks: Vec<String>, records: Vec<AbundanceRecord>) -> Result<Self> {
        for (i, record) in records.iter().enumerate() {
            if record.lineage.len() != ranks.len() {
                return Err(OmicsError::DimensionMismatch {
                    expected: ranks.len(),
                    actual: record.lineage.len(),
                });
            }
            if !record.abundance.is_finite() || record.abundance < 0.0 {
                return Err(OmicsError::InvalidValue {
                    value: record.abundance.to_string(),
                    row: i,
                    col: 0,
                });
            }
        }
        Ok(Self { ranks, records })
    }

    /// Load a long-form abundance CSV (optionally gzip-compressed).
    ///
    /// The header must contain `Sample` and `Abundance`; every other column is
    /// treated as a taxonomic rank.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = open_text(path)?;
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let sample_idx = headers
            .iter()
            .position(|h| h.trim() == SAMPLE_COLUMN)
            .ok_or_else(|| OmicsError::MissingColumn(SAMPLE_COLUMN.to_string()))?;
        let abundance_idx = headers
            .iter()
            .position(|h| h.trim() == ABUNDANCE_COLUMN)
            .ok_or_else(|| OmicsError::MissingColumn(ABUNDANCE_COLUMN.to_string()))?;

        let rank_columns: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != sample_idx && *i != abundance_idx)
            .map(|(i, h)| (i, h.trim().to_string()))
            .collect();

        let mut records = Vec::new();
        for (row, result) in csv_reader.records().enumerate() {
            let record = result?;
            let raw = record.get(abundance_idx).unwrap_or("").trim();
            let abundance: f64 = raw
                .parse()
                .ok()
                .filter(|v: &f64| v.is_finite() && *v >= 0.0)
                .ok_or_else(|| OmicsError::InvalidValue {
                    value: raw.to_string(),
                    row,
                    col: abundance_idx,
                })?;
            records.push(AbundanceRecord {
                sample: record.get(sample_idx).unwrap_or("").trim().to_string(),
                abundance,
                lineage: rank_columns
                    .iter()
                    .map(|(i, _)| record.get(*i).unwrap_or("").trim().to_string())
                    .collect(),
            });
        }

        if records.is_empty() {
            return Err(OmicsError::EmptyData("No records in abundance table".to_string()));
        }

        let ranks = rank_columns.into_iter().map(|(_, name)| name).collect();
        log::debug!("Parsed {} abundance records", records.len());
        Ok(Self { ranks, records })
    }

    /// Taxonomic rank names, in column order.
    pub fn ranks(&self) -> &[String] {
        &self.ranks
    }

    /// All records.
    pub fn records(&self) -> &[AbundanceRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct sample identifiers in first-seen order.
    pub fn sample_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for record in &self.records {
            if seen.insert(record.sample.as_str()) {
                ids.push(record.sample.clone());
            }
        }
        ids
    }

    fn rank_index(&self, rank: &str) -> Result<usize> {
        self.ranks
            .iter()
            .position(|r| r == rank)
            .ok_or_else(|| OmicsError::MissingColumn(rank.to_string()))
    }

    /// Pivot to a taxon × sample matrix at the given rank.
    ///
    /// Abundances of records sharing a `(taxon, sample)` pair are summed and
    /// pairs never observed are zero. Taxa and samples are sorted by name.
    /// Records with no assignment at `rank` are left out.
    pub fn pivot(&self, rank: &str) -> Result<CountMatrix> {
        let rank_idx = self.rank_index(rank)?;

        let mut taxa: Vec<&str> = Vec::new();
        let mut samples: Vec<&str> = Vec::new();
        let mut unassigned = 0usize;
        for record in &self.records {
            let taxon = record.lineage[rank_idx].as_str();
            if taxon.is_empty() {
                unassigned += 1;
                continue;
            }
            taxa.push(taxon);
            samples.push(record.sample.as_str());
        }
        if unassigned > 0 {
            log::debug!("{} records have no {} assignment and were skipped", unassigned, rank);
        }

        taxa.sort_unstable();
        taxa.dedup();
        samples.sort_unstable();
        samples.dedup();

        if taxa.is_empty() {
            return Err(OmicsError::EmptyData(format!("No records assigned at rank {}", rank)));
        }

        let taxon_pos: HashMap<&str, usize> = taxa.iter().enumerate().map(|(i, t)| (*t, i)).collect();
        let sample_pos: HashMap<&str, usize> =
            samples.iter().enumerate().map(|(i, s)| (*s, i)).collect();

        let triplets: Vec<(usize, usize, f64)> = self
            .records
            .iter()
            .filter(|r| !r.lineage[rank_idx].is_empty())
            .map(|r| {
                (
                    taxon_pos[r.lineage[rank_idx].as_str()],
                    sample_pos[r.sample.as_str()],
                    r.abundance,
                )
            })
            .collect();

        CountMatrix::from_triplets(
            &triplets,
            taxa.into_iter().map(String::from).collect(),
            samples.into_iter().map(String::from).collect(),
        )
    }
}
