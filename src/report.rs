//! Sample tables annotated with a metadata column.

use crate::data::{CountMatrix, Metadata, SampleTable};
use crate::diversity::{beta_diversity, diversity_indices};
use crate::error::{OmicsError, Result};
use crate::ordination::OrdinationConfig;
use serde_json::{json, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// A [`SampleTable`] with one categorical label per row.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedTable {
    pub table: SampleTable,
    /// Name of the metadata column the labels came from.
    pub label_column: String,
    /// Label per row; `None` when the sample has no value.
    pub labels: Vec<Option<String>>,
}

impl AnnotatedTable {
    /// Keep only samples present in `metadata` and attach their `column` value.
    pub fn inner(table: &SampleTable, metadata: &Metadata, column: &str) -> Result<Self> {
        if !metadata.has_column(column) {
            return Err(OmicsError::MissingColumn(column.to_string()));
        }
        let kept = table.retain_samples(metadata.sample_ids());
        Ok(Self::annotate(kept, metadata, column))
    }

    /// Keep every sample; samples missing from `metadata` get no label.
    pub fn left(table: &SampleTable, metadata: &Metadata, column: &str) -> Result<Self> {
        if !metadata.has_column(column) {
            return Err(OmicsError::MissingColumn(column.to_string()));
        }
        Ok(Self::annotate(table.clone(), metadata, column))
    }

    fn annotate(table: SampleTable, metadata: &Metadata, column: &str) -> Self {
        let labels = table
            .sample_ids()
            .iter()
            .map(|sid| metadata.get(sid, column).and_then(|v| v.label()))
            .collect();
        Self {
            table,
            label_column: column.to_string(),
            labels,
        }
    }

    /// Row-oriented records with the label as an extra field.
    pub fn to_records(&self) -> Vec<Value> {
        self.table
            .to_records()
            .into_iter()
            .zip(&self.labels)
            .map(|(mut record, label)| {
                if let Value::Object(map) = &mut record {
                    map.insert(self.label_column.clone(), json!(label));
                }
                record
            })
            .collect()
    }

    /// Write the table to TSV with the label as the last column.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        write!(writer, "Sample")?;
        for col in self.table.columns() {
            write!(writer, "\t{}", col)?;
        }
        writeln!(writer, "\t{}", self.label_column)?;

        let values = self.table.values();
        for (i, sid) in self.table.sample_ids().iter().enumerate() {
            write!(writer, "{}", sid)?;
            for j in 0..self.table.n_columns() {
                write!(writer, "\t{:.6}", values[(i, j)])?;
            }
            writeln!(writer, "\t{}", self.labels[i].as_deref().unwrap_or("NA"))?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// Alpha diversity, ordination coordinates and a metadata label per sample.
///
/// `abundance` is taxa × samples. Alpha and beta tables are inner-joined on
/// the sample axis and then restricted to samples present in `metadata`.
pub fn diversity_report(
    abundance: &CountMatrix,
    metadata: &Metadata,
    group_column: &str,
    config: &OrdinationConfig,
) -> Result<AnnotatedTable> {
    let alpha = diversity_indices(abundance)?;
    let beta = beta_diversity(abundance, config)?;
    let joined = alpha.inner_join(&beta)?;
    let report = AnnotatedTable::inner(&joined, metadata, group_column)?;
    log::debug!(
        "Diversity report: {} of {} samples annotated with '{}'",
        report.table.n_samples(),
        joined.n_samples(),
        group_column
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_metadata() -> Metadata {
        Metadata::from_rows(
            vec!["Disease severity".to_string()],
            vec![
                ("S1".to_string(), vec!["mild".to_string()]),
                ("S2".to_string(), vec!["severe".to_string()]),
                ("S4".to_string(), vec!["NA".to_string()]),
            ],
        )
        .unwrap()
    }

    fn create_abundance() -> CountMatrix {
        let triplets = vec![
            (0, 0, 5.0), (1, 0, 5.0),
            (0, 1, 9.0), (1, 1, 1.0),
            (0, 2, 1.0), (1, 2, 4.0),
            (0, 3, 3.0), (1, 3, 3.0),
        ];
        CountMatrix::from_triplets(
            &triplets,
            vec!["Blautia".into(), "Prevotella".into()],
            vec!["S1".into(), "S2".into(), "S3".into(), "S4".into()],
        )
        .unwrap()
    }

    #[test]
    fn test_diversity_report_inner_semantics() {
        let report = diversity_report(
            &create_abundance(),
            &create_metadata(),
            "Disease severity",
            &OrdinationConfig::classical(2),
        )
        .unwrap();

        assert_eq!(report.table.sample_ids(), &["S1", "S2", "S4"]);
        assert_eq!(report.table.columns(), &["shannon", "simpson", "PC1", "PC2"]);
        assert_eq!(report.labels, vec![Some("mild".to_string()), Some("severe".to_string()), None]);

        let records = report.to_records();
        assert_eq!(records[1]["Disease severity"], "severe");
        assert!(records[2]["Disease severity"].is_null());
    }

    #[test]
    fn test_left_keeps_unannotated_samples() {
        let alpha = diversity_indices(&create_abundance()).unwrap();
        let annotated = AnnotatedTable::left(&alpha, &create_metadata(), "Disease severity").unwrap();
        assert_eq!(annotated.table.n_samples(), 4);
        assert_eq!(annotated.labels[2], None);
    }

    #[test]
    fn test_missing_column() {
        let alpha = diversity_indices(&create_abundance()).unwrap();
        assert!(AnnotatedTable::inner(&alpha, &create_metadata(), "age").is_err());
    }

    #[test]
    fn test_to_tsv() {
        let alpha = diversity_indices(&create_abundance()).unwrap();
        let annotated = AnnotatedTable::inner(&alpha, &create_metadata(), "Disease severity").unwrap();
        let temp = tempfile::NamedTempFile::new().unwrap();
        annotated.to_tsv(temp.path()).unwrap();

        let content = std::fs::read_to_string(temp.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "Sample\tshannon\tsimpson\tDisease severity");
        assert!(lines[3].ends_with("\tNA"));
    }
}
