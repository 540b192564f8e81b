//! Per-sample taxonomic composition.

use crate::correlate::top_k_desc;
use crate::data::{CountMatrix, SampleTable};
use crate::error::Result;
use crate::normalize::relative_abundance;
use nalgebra::DMatrix;

/// Default number of taxa reported.
pub const DEFAULT_TOP_N: usize = 20;

/// Relative abundance of the `top_n` most abundant taxa in every sample.
///
/// `abundance` is taxa × samples. Taxa are ranked by mean relative abundance
/// across samples (descending, ties in input order). The result has one row
/// per sample and one column per selected taxon; rows need not sum to one
/// when taxa were left out.
pub fn composition(abundance: &CountMatrix, top_n: usize) -> Result<SampleTable> {
    let rel = relative_abundance(abundance)?;
    let top = top_k_desc(&rel.row_means(), top_n);

    let values = DMatrix::from_fn(rel.n_samples(), top.len(), |j, k| rel.get(top[k], j));
    SampleTable::new(
        rel.sample_ids.clone(),
        top.iter().map(|&t| rel.feature_ids[t].clone()).collect(),
        values,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn create_abundance() -> CountMatrix {
        let triplets = vec![
            (0, 0, 1.0), (1, 0, 6.0), (2, 0, 3.0),
            (0, 1, 2.0), (1, 1, 2.0), (2, 1, 6.0),
        ];
        CountMatrix::from_triplets(
            &triplets,
            vec!["Akkermansia".into(), "Blautia".into(), "Collinsella".into()],
            vec!["S1".into(), "S2".into()],
        )
        .unwrap()
    }

    #[test]
    fn test_composition_order_and_values() {
        let table = composition(&create_abundance(), DEFAULT_TOP_N).unwrap();

        // Means: Akkermansia 0.15, Blautia 0.4, Collinsella 0.45
        assert_eq!(table.columns(), &["Collinsella", "Blautia", "Akkermansia"]);
        assert_eq!(table.sample_ids(), &["S1", "S2"]);
        assert_relative_eq!(table.get("S1", "Blautia").unwrap(), 0.6, epsilon = 1e-12);
        let total: f64 = table.row("S2").unwrap().iter().sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_composition_truncates() {
        let table = composition(&create_abundance(), 1).unwrap();
        assert_eq!(table.columns(), &["Collinsella"]);
        assert_relative_eq!(table.get("S1", "Collinsella").unwrap(), 0.3, epsilon = 1e-12);
    }
}
