//! Differential expression between two sample groups.
//!
//! The procedure is log-CPM normalization of the samples in either group, a
//! per-feature Welch t-test between the groups, and Benjamini-Hochberg
//! correction over the features whose statistic is defined.

use crate::correct::correct_bh;
use crate::data::{CountMatrix, DeResult, DeResultSet, GroupAssignment, ResolvedGroups};
use crate::error::Result;
use crate::normalize::norm_log_cpm;
use crate::test::test_welch;

/// Compare two groups of samples feature by feature.
///
/// `counts` is features × samples. Group entries that are not columns of
/// `counts` are ignored; a group with no remaining samples fails with
/// [`OmicsError::EmptyGroup`](crate::error::OmicsError::EmptyGroup).
/// Columns outside both groups take no part in the test, so an empty library
/// there is not an error. An empty library inside a group fails with
/// [`OmicsError::Numerical`](crate::error::OmicsError::Numerical).
///
/// `log_fc` is mean(group1) − mean(group2) on the log-CPM scale. Features
/// whose test statistic is undefined (e.g. constant in both groups) are left
/// out of the result and of the correction. Output keeps matrix feature order.
pub fn differential_expression(counts: &CountMatrix, groups: &GroupAssignment) -> Result<DeResultSet> {
    let resolved = groups.resolve(counts.sample_ids())?;
    let n1 = resolved.group1.len();
    let columns: Vec<usize> = resolved
        .group1
        .iter()
        .chain(&resolved.group2)
        .copied()
        .collect();

    // CPM is per column, so normalizing the used columns equals slicing a
    // whole-matrix normalization.
    let log_cpm = norm_log_cpm(&counts.subset_samples(&columns)?)?;
    let local = ResolvedGroups {
        group1: (0..n1).collect(),
        group2: (n1..columns.len()).collect(),
    };
    log::debug!(
        "Testing {} features: {} ({} samples) vs {} ({} samples)",
        log_cpm.n_features(),
        groups.group1_label,
        local.group1.len(),
        groups.group2_label,
        local.group2.len()
    );

    let welch = test_welch(&log_cpm, &local);
    let n_tested = welch.len();

    let p_values: Vec<f64> = welch
        .results
        .iter()
        .map(|r| if r.stats.is_defined() { r.stats.p_value } else { f64::NAN })
        .collect();
    let q_values = correct_bh(&p_values);

    let results: Vec<DeResult> = welch
        .results
        .into_iter()
        .zip(q_values)
        .filter(|(r, _)| r.stats.is_defined())
        .map(|(r, q)| {
            DeResult::new(
                r.feature_id,
                r.stats.estimate(),
                r.stats.statistic,
                r.stats.df,
                r.stats.p_value,
                q,
            )
        })
        .collect();
    if results.len() < n_tested {
        log::debug!(
            "Dropped {} features with undefined test statistics",
            n_tested - results.len()
        );
    }

    Ok(DeResultSet::new(
        format!("{} vs {}", groups.group1_label, groups.group2_label),
        n_tested,
        results,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OmicsError;
    use approx::assert_relative_eq;

    fn ids(prefix: &str, n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("{}{}", prefix, i)).collect()
    }

    fn create_counts() -> CountMatrix {
        let rows: [[f64; 6]; 4] = [
            [10.0, 12.0, 11.0, 100.0, 110.0, 105.0],
            [200.0, 180.0, 210.0, 190.0, 205.0, 195.0],
            [50.0, 60.0, 55.0, 52.0, 58.0, 57.0],
            [0.0; 6],
        ];
        let triplets: Vec<(usize, usize, f64)> = rows
            .iter()
            .enumerate()
            .flat_map(|(i, row)| row.iter().enumerate().map(move |(j, &v)| (i, j, v)))
            .collect();
        CountMatrix::from_triplets(&triplets, ids("G", 4), ids("S", 6)).unwrap()
    }

    fn groups() -> GroupAssignment {
        GroupAssignment::new(ids("S", 3), vec!["S4".into(), "S5".into(), "S6".into()])
    }

    #[test]
    fn test_lower_in_group1_has_negative_log_fc() {
        let result = differential_expression(&create_counts(), &groups()).unwrap();

        let g1 = result.get("G1").unwrap();
        assert!(g1.log_fc < 0.0);
        assert!(g1.statistic < 0.0);
        assert!(g1.p_value < 0.05);
        assert!(g1.adj_p_value >= g1.p_value);
    }

    #[test]
    fn test_constant_feature_excluded() {
        let result = differential_expression(&create_counts(), &groups()).unwrap();

        assert!(result.get("G4").is_none());
        assert_eq!(result.len(), 3);
        assert_eq!(result.n_tested, 4);
        let order: Vec<&str> = result.iter().map(|r| r.feature_id.as_str()).collect();
        assert_eq!(order, vec!["G1", "G2", "G3"]);
    }

    #[test]
    fn test_swapping_groups_flips_sign() {
        let counts = create_counts();
        let forward = differential_expression(&counts, &groups()).unwrap();
        let g = groups();
        let reverse = differential_expression(&counts, &GroupAssignment::new(g.group2, g.group1)).unwrap();

        for (f, r) in forward.iter().zip(reverse.iter()) {
            assert_relative_eq!(f.log_fc, -r.log_fc, epsilon = 1e-12);
            assert_relative_eq!(f.p_value, r.p_value, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_unknown_samples_filtered() {
        let mut g = groups();
        g.group1.push("NOT_IN_MATRIX".into());
        let result = differential_expression(&create_counts(), &g).unwrap();
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_empty_effective_group() {
        let g = GroupAssignment::new(vec!["X1".into()], ids("S", 3)).with_labels("ghost", "real");
        let result = differential_expression(&create_counts(), &g);
        assert!(matches!(result, Err(OmicsError::EmptyGroup { group }) if group == "ghost"));
    }

    fn counts_with_empty_s7() -> CountMatrix {
        let rows: [[f64; 7]; 2] = [
            [10.0, 12.0, 11.0, 100.0, 110.0, 105.0, 0.0],
            [200.0, 180.0, 210.0, 190.0, 205.0, 195.0, 0.0],
        ];
        let triplets: Vec<(usize, usize, f64)> = rows
            .iter()
            .enumerate()
            .flat_map(|(i, row)| row.iter().enumerate().map(move |(j, &v)| (i, j, v)))
            .collect();
        CountMatrix::from_triplets(&triplets, ids("G", 2), ids("S", 7)).unwrap()
    }

    #[test]
    fn test_empty_library_outside_groups_ignored() {
        let counts = counts_with_empty_s7();
        let result = differential_expression(&counts, &groups()).unwrap();
        assert_eq!(result.n_tested, 2);
        assert!(result.get("G1").unwrap().log_fc < 0.0);

        // Same statistics as the matrix without the extra column
        let trimmed = counts.select_samples(&ids("S", 6)).unwrap();
        let expected = differential_expression(&trimmed, &groups()).unwrap();
        for (a, b) in result.iter().zip(expected.iter()) {
            assert_relative_eq!(a.log_fc, b.log_fc, epsilon = 1e-12);
            assert_relative_eq!(a.p_value, b.p_value, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_empty_library_inside_group_fails() {
        let g = GroupAssignment::new(ids("S", 3), vec!["S4".into(), "S5".into(), "S7".into()]);
        let result = differential_expression(&counts_with_empty_s7(), &g);
        assert!(matches!(result, Err(OmicsError::Numerical(_))));
    }

    #[test]
    fn test_adjusted_values_match_hand_correction() {
        let result = differential_expression(&create_counts(), &groups()).unwrap();
        let p: Vec<f64> = result.iter().map(|r| r.p_value).collect();
        let q = correct_bh(&p);
        for (r, expected) in result.iter().zip(q) {
            assert_relative_eq!(r.adj_p_value, expected, epsilon = 1e-12);
        }
    }
}
