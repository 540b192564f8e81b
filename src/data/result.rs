//! Result types for differential expression.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Differential expression result for a single feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeResult {
    /// Feature identifier.
    #[serde(rename = "gene")]
    pub feature_id: String,
    /// mean(group1 log-CPM) - mean(group2 log-CPM).
    #[serde(rename = "logFC")]
    pub log_fc: f64,
    /// Welch t statistic.
    pub statistic: f64,
    /// Welch-Satterthwaite degrees of freedom.
    pub df: f64,
    /// Raw two-sided p-value.
    pub p_value: f64,
    /// Benjamini-Hochberg adjusted p-value.
    pub adj_p_value: f64,
}

impl DeResult {
    /// Create a new result.
    pub fn new(
        feature_id: String,
        log_fc: f64,
        statistic: f64,
        df: f64,
        p_value: f64,
        adj_p_value: f64,
    ) -> Self {
        Self {
            feature_id,
            log_fc,
            statistic,
            df,
            p_value,
            adj_p_value,
        }
    }
}

/// Collection of differential expression results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeResultSet {
    /// Comparison label, e.g. `"severe vs mild"`.
    pub comparison: String,
    /// Number of features tested before undefined statistics were dropped.
    pub n_tested: usize,
    /// Results in count-matrix feature order.
    pub results: Vec<DeResult>,
}

impl DeResultSet {
    /// Create a new result set.
    pub fn new(comparison: String, n_tested: usize, results: Vec<DeResult>) -> Self {
        Self {
            comparison,
            n_tested,
            results,
        }
    }

    /// Number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Look up a result by feature identifier.
    pub fn get(&self, feature_id: &str) -> Option<&DeResult> {
        self.results.iter().find(|r| r.feature_id == feature_id)
    }

    /// Get results sorted by p-value (ascending).
    pub fn sorted_by_pvalue(&self) -> Vec<&DeResult> {
        let mut sorted: Vec<_> = self.results.iter().collect();
        sorted.sort_by(|a, b| a.p_value.total_cmp(&b.p_value));
        sorted
    }

    /// Get significant results at a custom threshold on the adjusted p-value.
    pub fn significant(&self, alpha: f64) -> Vec<&DeResult> {
        self.results
            .iter()
            .filter(|r| r.adj_p_value < alpha)
            .collect()
    }

    /// Count significant results at various thresholds.
    pub fn summary(&self) -> ResultSummary {
        ResultSummary {
            total: self.len(),
            dropped: self.n_tested.saturating_sub(self.len()),
            significant_001: self.results.iter().filter(|r| r.adj_p_value < 0.001).count(),
            significant_01: self.results.iter().filter(|r| r.adj_p_value < 0.01).count(),
            significant_05: self.results.iter().filter(|r| r.adj_p_value < 0.05).count(),
            significant_10: self.results.iter().filter(|r| r.adj_p_value < 0.10).count(),
        }
    }

    /// Write results to TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "gene\tlogFC\tstatistic\tdf\tp_value\tadj_p_value")?;
        for r in &self.results {
            writeln!(
                writer,
                "{}\t{:.6}\t{:.4}\t{:.2}\t{:.4e}\t{:.4e}",
                r.feature_id,
                r.log_fc,
                r.statistic,
                r.df,
                r.p_value,
                r.adj_p_value
            )?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Iterate over results.
    pub fn iter(&self) -> impl Iterator<Item = &DeResult> {
        self.results.iter()
    }
}

/// Summary statistics for a result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSummary {
    pub total: usize,
    pub dropped: usize,
    pub significant_001: usize,
    pub significant_01: usize,
    pub significant_05: usize,
    pub significant_10: usize,
}

impl std::fmt::Display for ResultSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Features reported: {}", self.total)?;
        writeln!(f, "Undefined statistics dropped: {}", self.dropped)?;
        writeln!(f, "Significant at q < 0.001: {}", self.significant_001)?;
        writeln!(f, "Significant at q < 0.01:  {}", self.significant_01)?;
        writeln!(f, "Significant at q < 0.05:  {}", self.significant_05)?;
        writeln!(f, "Significant at q < 0.10:  {}", self.significant_10)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_set_summary() {
        let results = vec![
            DeResult::new("g1".into(), 2.0, 10.0, 4.0, 0.0001, 0.0005),
            DeResult::new("g2".into(), -1.0, -5.0, 4.0, 0.01, 0.02),
            DeResult::new("g3".into(), 0.2, 2.0, 4.0, 0.1, 0.15),
            DeResult::new("g4".into(), 0.1, 1.0, 4.0, 0.5, 0.6),
        ];

        let set = DeResultSet::new("a vs b".to_string(), 6, results);
        let summary = set.summary();

        assert_eq!(summary.total, 4);
        assert_eq!(summary.dropped, 2);
        assert_eq!(summary.significant_001, 1);
        assert_eq!(summary.significant_05, 2);
        assert_eq!(summary.significant_10, 2);
        assert_eq!(set.significant(0.05).len(), 2);
        assert_eq!(set.sorted_by_pvalue()[0].feature_id, "g1");
        assert_eq!(set.get("g2").unwrap().log_fc, -1.0);
    }

    #[test]
    fn test_serialized_field_names() {
        let r = DeResult::new("G1".into(), 1.5, 3.0, 4.0, 0.01, 0.02);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["gene"], "G1");
        assert_eq!(json["logFC"], 1.5);
        assert_eq!(json["adj_p_value"], 0.02);
    }

    #[test]
    fn test_to_tsv() {
        let set = DeResultSet::new(
            "a vs b".to_string(),
            1,
            vec![DeResult::new("G1".into(), 1.5, 3.0, 4.0, 0.01, 0.02)],
        );
        let temp = tempfile::NamedTempFile::new().unwrap();
        set.to_tsv(temp.path()).unwrap();
        let content = std::fs::read_to_string(temp.path()).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("gene\tlogFC\tstatistic\tdf\tp_value\tadj_p_value")
        );
        assert_eq!(lines.next().unwrap().split('\t').count(), 6);
        assert!(content.contains("G1\t1.500000"));
    }
}
