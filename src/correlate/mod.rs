//! Cross-omics rank correlation.
//!
//! Pairs the most variable features of one block with the most abundant taxa
//! of the other and reports their Spearman coefficients.

pub mod rank;
pub mod spearman;

use crate::data::{CorrelationMatrix, CountMatrix};
use crate::error::Result;
use crate::normalize::relative_abundance;
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub use rank::rank_average;
pub use spearman::{pearson, spearman};

/// Fewest shared samples for which correlations are computed.
pub const MIN_COMMON_SAMPLES: usize = 3;

/// Selection sizes for the correlation matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Number of highest-variance features kept.
    pub top_n_features: usize,
    /// Number of highest mean relative abundance taxa kept.
    pub top_n_taxa: usize,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            top_n_features: 50,
            top_n_taxa: 20,
        }
    }
}

/// Sample variance (ddof = 1).
pub fn sample_variance(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64
}

/// Indices of the `k` largest scores, descending; ties keep input order.
pub fn top_k_desc(scores: &[f64], k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        let sa = if scores[a].is_nan() { f64::NEG_INFINITY } else { scores[a] };
        let sb = if scores[b].is_nan() { f64::NEG_INFINITY } else { scores[b] };
        sb.total_cmp(&sa)
    });
    order.truncate(k);
    order
}

/// Spearman correlations between top-variance features and top-abundance taxa.
///
/// `counts` is features × samples and `abundance` taxa × samples.
///
/// 1. Features are ranked by sample variance over every column of `counts`.
/// 2. Samples shared by both matrices are taken in `counts` column order;
///    with fewer than [`MIN_COMMON_SAMPLES`] the result is empty.
/// 3. Taxa are converted to relative abundance over the shared samples and
///    ranked by their mean.
///
/// Rows follow variance order and columns abundance order. Pairs involving
/// a constant vector hold NaN.
pub fn correlation_matrix(
    counts: &CountMatrix,
    abundance: &CountMatrix,
    config: &CorrelationConfig,
) -> Result<CorrelationMatrix> {
    let common: Vec<String> = counts
        .sample_ids()
        .iter()
        .filter(|s| abundance.sample_index(s).is_some())
        .cloned()
        .collect();
    if common.len() < MIN_COMMON_SAMPLES {
        log::warn!(
            "Only {} samples shared between blocks; skipping correlation",
            common.len()
        );
        return Ok(CorrelationMatrix::empty());
    }

    let variances: Vec<f64> = (0..counts.n_features())
        .into_par_iter()
        .map(|i| sample_variance(&counts.row_dense(i)))
        .collect();
    let top_features = top_k_desc(&variances, config.top_n_features);

    let feature_block = counts.subset_features(&top_features)?.select_samples(&common)?;
    let rel = relative_abundance(&abundance.select_samples(&common)?)?;
    let top_taxa = top_k_desc(&rel.row_means(), config.top_n_taxa);

    log::debug!(
        "Correlating {} features × {} taxa over {} samples",
        top_features.len(),
        top_taxa.len(),
        common.len()
    );

    let feature_ranks: Vec<Vec<f64>> = (0..feature_block.n_features())
        .into_par_iter()
        .map(|i| rank_average(&feature_block.row_dense(i)))
        .collect();
    let taxon_ranks: Vec<Vec<f64>> = top_taxa
        .par_iter()
        .map(|&t| rank_average(&rel.row(t)))
        .collect();

    let n_taxa = taxon_ranks.len();
    let values: Vec<f64> = (0..feature_ranks.len() * n_taxa)
        .into_par_iter()
        .map(|idx| pearson(&feature_ranks[idx / n_taxa], &taxon_ranks[idx % n_taxa]))
        .collect();

    CorrelationMatrix::new(
        feature_block.feature_ids().to_vec(),
        top_taxa.iter().map(|&t| rel.feature_ids[t].clone()).collect(),
        DMatrix::from_row_slice(feature_ranks.len(), n_taxa, &values),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn matrix(rows: &[&[f64]], features: &[&str], samples: &[&str]) -> CountMatrix {
        let dense = DMatrix::from_fn(rows.len(), samples.len(), |i, j| rows[i][j]);
        CountMatrix::from_dense(
            &dense,
            features.iter().map(|s| s.to_string()).collect(),
            samples.iter().map(|s| s.to_string()).collect(),
        )
        .unwrap()
    }

    fn create_blocks() -> (CountMatrix, CountMatrix) {
        let counts = matrix(
            &[
                &[1.0, 2.0, 3.0, 4.0, 5.0],
                &[10.0, 30.0, 20.0, 50.0, 40.0],
                &[7.0, 7.0, 7.0, 7.0, 7.0],
            ],
            &["low_var", "high_var", "flat"],
            &["S1", "S2", "S3", "S4", "S5"],
        );
        // S6 is only in the abundance block
        let abundance = matrix(
            &[
                &[1.0, 2.0, 3.0, 4.0, 5.0, 9.0],
                &[9.0, 8.0, 7.0, 6.0, 5.0, 1.0],
            ],
            &["Rising", "Falling"],
            &["S1", "S2", "S3", "S4", "S5", "S6"],
        );
        (counts, abundance)
    }

    #[test]
    fn test_feature_and_taxon_order() {
        let (counts, abundance) = create_blocks();
        let corr = correlation_matrix(&counts, &abundance, &CorrelationConfig::default()).unwrap();

        assert_eq!(corr.feature_ids(), &["high_var", "low_var", "flat"]);
        // Falling dominates the relative abundance on average
        assert_eq!(corr.taxon_ids(), &["Falling", "Rising"]);
    }

    #[test]
    fn test_perfect_monotone_and_constant() {
        let (counts, abundance) = create_blocks();
        let corr = correlation_matrix(&counts, &abundance, &CorrelationConfig::default()).unwrap();

        // Rising's share increases monotonically across S1..S5
        assert_relative_eq!(corr.get_by_id("low_var", "Rising").unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(corr.get_by_id("low_var", "Falling").unwrap(), -1.0, epsilon = 1e-12);
        assert!(corr.get_by_id("flat", "Rising").unwrap().is_nan());
    }

    #[test]
    fn test_top_n_limits() {
        let (counts, abundance) = create_blocks();
        let config = CorrelationConfig {
            top_n_features: 1,
            top_n_taxa: 1,
        };
        let corr = correlation_matrix(&counts, &abundance, &config).unwrap();
        assert_eq!(corr.values().shape(), (1, 1));
        assert_eq!(corr.feature_ids(), &["high_var"]);
    }

    #[test]
    fn test_deterministic() {
        let (counts, abundance) = create_blocks();
        let config = CorrelationConfig::default();
        let a = correlation_matrix(&counts, &abundance, &config).unwrap();
        let b = correlation_matrix(&counts, &abundance, &config).unwrap();
        assert_eq!(format!("{:?}", a), format!("{:?}", b));
    }

    #[test]
    fn test_too_few_common_samples() {
        let (counts, _) = create_blocks();
        let abundance = matrix(&[&[1.0, 2.0, 3.0]], &["T"], &["S1", "S2", "X"]);
        let corr = correlation_matrix(&counts, &abundance, &CorrelationConfig::default()).unwrap();
        assert!(corr.is_empty());
    }

    #[test]
    fn test_top_k_stable() {
        assert_eq!(top_k_desc(&[1.0, 3.0, 3.0, 2.0], 3), vec![1, 2, 3]);
        assert_eq!(top_k_desc(&[f64::NAN, 1.0], 2), vec![1, 0]);
    }
}
