//! Log counts-per-million transformation.

use super::tss::{norm_tss, scale};
use super::TransformedMatrix;
use crate::data::CountMatrix;
use crate::error::Result;

/// Apply `log2(CPM + 1)` to every entry of a count matrix.
///
/// CPM is computed per sample from the column sum over the whole matrix, so
/// the transform of one sample does not depend on any other sample and is
/// unchanged by scaling that sample's counts by a positive constant.
///
/// A sample with zero library size fails with
/// [`OmicsError::Numerical`](crate::error::OmicsError::Numerical).
pub fn norm_log_cpm(counts: &CountMatrix) -> Result<TransformedMatrix> {
    let cpm = norm_tss(counts, scale::CPM)?;
    log::debug!(
        "log-CPM over {} features × {} samples",
        cpm.n_features(),
        cpm.n_samples()
    );

    Ok(TransformedMatrix {
        data: cpm.data.map(|v| (v + 1.0).log2()),
        feature_ids: cpm.feature_ids,
        sample_ids: cpm.sample_ids,
        transformation: "log2(CPM + 1)".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn counts(triplets: &[(usize, usize, f64)]) -> CountMatrix {
        CountMatrix::from_triplets(
            triplets,
            vec!["G1".into(), "G2".into()],
            vec!["S1".into(), "S2".into()],
        )
        .unwrap()
    }

    #[test]
    fn test_log_cpm_values() {
        let m = counts(&[(0, 0, 1.0), (1, 0, 3.0), (0, 1, 5.0), (1, 1, 5.0)]);
        let lc = norm_log_cpm(&m).unwrap();

        assert_relative_eq!(lc.get(0, 0), (250_000.0f64 + 1.0).log2(), epsilon = 1e-12);
        assert_relative_eq!(lc.get(1, 0), (750_000.0f64 + 1.0).log2(), epsilon = 1e-12);
        assert_relative_eq!(lc.get(0, 1), (500_000.0f64 + 1.0).log2(), epsilon = 1e-12);
        assert_eq!(lc.transformation, "log2(CPM + 1)");
    }

    #[test]
    fn test_zero_count_maps_to_zero() {
        let m = counts(&[(0, 0, 10.0), (0, 1, 4.0), (1, 1, 4.0)]);
        let lc = norm_log_cpm(&m).unwrap();
        assert_eq!(lc.get(1, 0), 0.0);
    }

    #[test]
    fn test_invariant_to_sample_scaling() {
        let base = counts(&[(0, 0, 3.0), (1, 0, 7.0), (0, 1, 2.0), (1, 1, 8.0)]);
        let scaled = counts(&[(0, 0, 30.0), (1, 0, 70.0), (0, 1, 2.0), (1, 1, 8.0)]);

        let a = norm_log_cpm(&base).unwrap();
        let b = norm_log_cpm(&scaled).unwrap();
        for i in 0..2 {
            for j in 0..2 {
                assert_relative_eq!(a.get(i, j), b.get(i, j), epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_zero_library_is_error() {
        let m = counts(&[(0, 0, 3.0)]);
        assert!(norm_log_cpm(&m).is_err());
    }
}
