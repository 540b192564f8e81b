//! Within-sample diversity indices.

use crate::data::{CountMatrix, SampleTable};
use crate::error::Result;
use crate::normalize::relative_abundance;
use nalgebra::DMatrix;
use rayon::prelude::*;

/// Smoothing added inside the logarithm so zero proportions contribute zero.
pub const SHANNON_EPSILON: f64 = 1e-9;

/// Shannon entropy `-Σ p ln(p + ε)` of a vector of proportions.
pub fn shannon(proportions: &[f64]) -> f64 {
    -proportions
        .iter()
        .map(|&p| p * (p + SHANNON_EPSILON).ln())
        .sum::<f64>()
}

/// Gini-Simpson index `1 - Σ p²` of a vector of proportions.
pub fn simpson(proportions: &[f64]) -> f64 {
    1.0 - proportions.iter().map(|&p| p * p).sum::<f64>()
}

/// Shannon and Simpson indices for every sample.
///
/// `abundance` is taxa × samples. Returns a table indexed by sample with
/// columns `shannon` and `simpson`. A sample with zero total abundance fails
/// with [`OmicsError::Numerical`](crate::error::OmicsError::Numerical).
pub fn diversity_indices(abundance: &CountMatrix) -> Result<SampleTable> {
    let rel = relative_abundance(abundance)?;

    let per_sample: Vec<(f64, f64)> = (0..rel.n_samples())
        .into_par_iter()
        .map(|j| {
            let p = rel.col(j);
            (shannon(&p), simpson(&p))
        })
        .collect();

    let values = DMatrix::from_fn(per_sample.len(), 2, |i, k| {
        if k == 0 {
            per_sample[i].0
        } else {
            per_sample[i].1
        }
    });

    SampleTable::new(
        rel.sample_ids,
        vec!["shannon".to_string(), "simpson".to_string()],
        values,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_even_distribution() {
        let p = [0.25; 4];
        assert_relative_eq!(shannon(&p), 4.0f64.ln(), epsilon = 1e-6);
        assert_relative_eq!(simpson(&p), 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_single_taxon() {
        let p = [1.0, 0.0, 0.0];
        assert!(shannon(&p).abs() < 1e-6);
        assert_eq!(simpson(&p), 0.0);
    }

    #[test]
    fn test_diversity_indices_table() {
        // taxa × samples: S1 even over 4 taxa, S2 a single taxon, S3 uneven
        let triplets = vec![
            (0, 0, 5.0), (1, 0, 5.0), (2, 0, 5.0), (3, 0, 5.0),
            (2, 1, 42.0),
            (0, 2, 6.0), (1, 2, 2.0),
        ];
        let m = CountMatrix::from_triplets(
            &triplets,
            vec!["A".into(), "B".into(), "C".into(), "D".into()],
            vec!["S1".into(), "S2".into(), "S3".into()],
        )
        .unwrap();

        let table = diversity_indices(&m).unwrap();
        assert_eq!(table.columns(), &["shannon", "simpson"]);
        assert_eq!(table.sample_ids(), &["S1", "S2", "S3"]);

        assert_relative_eq!(table.get("S1", "shannon").unwrap(), 4.0f64.ln(), epsilon = 1e-6);
        assert!(table.get("S2", "shannon").unwrap().abs() < 1e-6);
        assert_relative_eq!(table.get("S3", "simpson").unwrap(), 1.0 - 0.5625 - 0.0625, epsilon = 1e-12);

        let k = 4.0f64;
        for sid in ["S1", "S2", "S3"] {
            let h = table.get(sid, "shannon").unwrap();
            let d = table.get(sid, "simpson").unwrap();
            assert!(h >= -1e-9 && h <= k.ln() + 1e-6);
            assert!((0.0..=1.0 - 1.0 / k + 1e-12).contains(&d));
        }
    }

    #[test]
    fn test_zero_total_sample_is_error() {
        let m = CountMatrix::from_triplets(
            &[(0, 0, 1.0)],
            vec!["A".into()],
            vec!["S1".into(), "S2".into()],
        )
        .unwrap();
        assert!(diversity_indices(&m).is_err());
    }
}
