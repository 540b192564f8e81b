//! Two-group sample assignments for group comparisons.

use crate::data::Metadata;
use crate::error::{OmicsError, Result};
use serde::{Deserialize, Serialize};

/// Two ordered, disjoint lists of sample identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupAssignment {
    /// Label of the first group (used in error messages and reports).
    pub group1_label: String,
    /// Label of the second group.
    pub group2_label: String,
    /// Sample IDs of the first group.
    pub group1: Vec<String>,
    /// Sample IDs of the second group.
    pub group2: Vec<String>,
}

/// Column positions of a group assignment within a particular matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGroups {
    pub group1: Vec<usize>,
    pub group2: Vec<usize>,
}

impl GroupAssignment {
    /// Create an assignment from two sample lists.
    pub fn new(group1: Vec<String>, group2: Vec<String>) -> Self {
        Self {
            group1_label: "group1".to_string(),
            group2_label: "group2".to_string(),
            group1,
            group2,
        }
    }

    /// Set display labels for the two groups.
    pub fn with_labels(mut self, group1_label: &str, group2_label: &str) -> Self {
        self.group1_label = group1_label.to_string();
        self.group2_label = group2_label.to_string();
        self
    }

    /// Translate two levels of a metadata column into sample lists.
    ///
    /// Fails with `EmptyGroup` when a level has no samples.
    pub fn from_metadata(metadata: &Metadata, column: &str, level1: &str, level2: &str) -> Result<Self> {
        let group1 = metadata.samples_with_level(column, level1)?;
        let group2 = metadata.samples_with_level(column, level2)?;
        if group1.is_empty() {
            return Err(OmicsError::EmptyGroup {
                group: level1.to_string(),
            });
        }
        if group2.is_empty() {
            return Err(OmicsError::EmptyGroup {
                group: level2.to_string(),
            });
        }
        Ok(Self::new(group1, group2).with_labels(level1, level2))
    }

    /// Map both groups onto the columns of `sample_ids`.
    ///
    /// Entries absent from `sample_ids` are dropped and order is preserved.
    /// A group left empty fails with `EmptyGroup`; a sample listed in both
    /// groups is rejected.
    pub fn resolve(&self, sample_ids: &[String]) -> Result<ResolvedGroups> {
        let lookup = |ids: &[String]| -> Vec<usize> {
            ids.iter()
                .filter_map(|sid| sample_ids.iter().position(|s| s == sid))
                .collect()
        };
        let group1 = lookup(self.group1.as_slice());
        let group2 = lookup(self.group2.as_slice());

        if group1.is_empty() {
            return Err(OmicsError::EmptyGroup {
                group: self.group1_label.clone(),
            });
        }
        if group2.is_empty() {
            return Err(OmicsError::EmptyGroup {
                group: self.group2_label.clone(),
            });
        }
        if let Some(shared) = group1.iter().find(|i| group2.contains(*i)) {
            return Err(OmicsError::InvalidParameter(format!(
                "Sample '{}' is assigned to both groups",
                sample_ids[*shared]
            )));
        }

        let dropped = self.group1.len() + self.group2.len() - group1.len() - group2.len();
        if dropped > 0 {
            log::debug!("{} group members are not present in the matrix and were ignored", dropped);
        }

        Ok(ResolvedGroups { group1, group2 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_filters_absent_samples() {
        let groups = GroupAssignment::new(ids(&["S3", "X", "S1"]), ids(&["S2"]));
        let resolved = groups.resolve(&ids(&["S1", "S2", "S3"])).unwrap();
        assert_eq!(resolved.group1, vec![2, 0]);
        assert_eq!(resolved.group2, vec![1]);
    }

    #[test]
    fn test_resolve_empty_group() {
        let groups = GroupAssignment::new(ids(&["S1"]), ids(&["X", "Y"])).with_labels("mild", "severe");
        let result = groups.resolve(&ids(&["S1", "S2"]));
        assert!(matches!(result, Err(OmicsError::EmptyGroup { group }) if group == "severe"));
    }

    #[test]
    fn test_resolve_overlap_rejected() {
        let groups = GroupAssignment::new(ids(&["S1", "S2"]), ids(&["S2"]));
        assert!(groups.resolve(&ids(&["S1", "S2"])).is_err());
    }

    #[test]
    fn test_from_metadata() {
        let meta = Metadata::from_rows(
            ids(&["Disease severity"]),
            vec![
                ("A".to_string(), ids(&["mild"])),
                ("B".to_string(), ids(&["severe"])),
                ("C".to_string(), ids(&["mild"])),
            ],
        )
        .unwrap();

        let groups = GroupAssignment::from_metadata(&meta, "Disease severity", "mild", "severe").unwrap();
        assert_eq!(groups.group1, ids(&["A", "C"]));
        assert_eq!(groups.group2, ids(&["B"]));
        assert_eq!(groups.group1_label, "mild");

        let missing = GroupAssignment::from_metadata(&meta, "Disease severity", "mild", "control");
        assert!(matches!(missing, Err(OmicsError::EmptyGroup { .. })));
    }
}
