//! Loaded datasets and the analyses that run against them.
//!
//! An [`OmicsContext`] owns one expression count matrix, one long-form
//! taxonomic abundance table and the sample metadata that labels both. It is
//! built once and handed by reference to whatever serves requests (the CLI,
//! a pipeline run, an embedding service). Each method resolves user-facing
//! names (metadata columns, group levels, taxonomic ranks) and delegates to
//! the corresponding engine procedure.

use crate::composition::composition;
use crate::correlate::{correlation_matrix, CorrelationConfig};
use crate::data::{
    AbundanceTable, CorrelationMatrix, CountMatrix, DeResultSet, GroupAssignment, Metadata,
    SampleTable,
};
use crate::de::differential_expression;
use crate::error::Result;
use crate::integrate::{pls_integration, IntegrationConfig, IntegrationInput, IntegrationResult};
use crate::normalize::norm_log_cpm;
use crate::ordination::{pca, OrdinationConfig, PcaResult};
use crate::profile::{profile_library_size, LibrarySizeProfile};
use crate::report::{diversity_report, AnnotatedTable};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Counts describing a loaded dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    /// Samples in the metadata.
    pub samples: usize,
    /// Features (rows) of the count matrix.
    pub features: usize,
    /// Records in the long-form abundance table.
    pub taxa: usize,
    /// Sorted distinct labels of the group column.
    pub groups: Vec<String>,
    /// Library sizes of the count matrix.
    pub library_size: LibrarySizeProfile,
}

impl std::fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Samples (metadata):    {}", self.samples)?;
        writeln!(f, "Features (counts):     {}", self.features)?;
        writeln!(f, "Abundance records:     {}", self.taxa)?;
        writeln!(f, "Groups:                {}", self.groups.join(", "))?;
        writeln!(
            f,
            "Library size:          median {:.0}, range {:.0}-{:.0}, CV {:.2}",
            self.library_size.median, self.library_size.min, self.library_size.max, self.library_size.cv
        )?;
        Ok(())
    }
}

/// The three datasets every analysis draws from.
#[derive(Debug, Clone)]
pub struct OmicsContext {
    pub metadata: Metadata,
    /// Expression counts, features × samples.
    pub counts: CountMatrix,
    pub abundance: AbundanceTable,
}

impl OmicsContext {
    pub fn new(metadata: Metadata, counts: CountMatrix, abundance: AbundanceTable) -> Self {
        Self {
            metadata,
            counts,
            abundance,
        }
    }

    /// Load metadata (TSV), counts (TSV) and abundance records (CSV).
    ///
    /// Any of the files may be gzip-compressed.
    pub fn load<P, Q, R>(metadata: P, counts: Q, abundance: R) -> Result<Self>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        R: AsRef<Path>,
    {
        let metadata = Metadata::from_tsv(metadata)?;
        let counts = CountMatrix::from_tsv(counts)?;
        let abundance = AbundanceTable::from_csv(abundance)?;
        log::info!(
            "Loaded {} metadata samples, {} x {} count matrix, {} abundance records",
            metadata.n_samples(),
            counts.n_features(),
            counts.n_samples(),
            abundance.len()
        );
        Ok(Self::new(metadata, counts, abundance))
    }

    /// Dataset sizes, group labels and library size spread.
    pub fn summary(&self, group_column: &str) -> Result<DatasetSummary> {
        Ok(DatasetSummary {
            samples: self.metadata.n_samples(),
            features: self.counts.n_features(),
            taxa: self.abundance.len(),
            groups: self.metadata.levels(group_column)?,
            library_size: profile_library_size(&self.counts),
        })
    }

    /// Compare two levels of a metadata column.
    ///
    /// `level1` is the reference numerator: a positive log fold change means
    /// higher expression in `level1`.
    pub fn differential_expression(
        &self,
        group_column: &str,
        level1: &str,
        level2: &str,
    ) -> Result<DeResultSet> {
        let groups = GroupAssignment::from_metadata(&self.metadata, group_column, level1, level2)?;
        differential_expression(&self.counts, &groups)
    }

    /// Alpha diversity and ordination at `rank`, labeled by `group_column`.
    pub fn diversity(
        &self,
        rank: &str,
        group_column: &str,
        config: &OrdinationConfig,
    ) -> Result<AnnotatedTable> {
        let taxa = self.abundance.pivot(rank)?;
        diversity_report(&taxa, &self.metadata, group_column, config)
    }

    /// Per-sample relative abundance of the `top_n` most abundant taxa at `rank`.
    pub fn composition(&self, rank: &str, top_n: usize) -> Result<SampleTable> {
        composition(&self.abundance.pivot(rank)?, top_n)
    }

    /// Spearman correlations between variable features and abundant taxa at `rank`.
    pub fn correlation(&self, rank: &str, config: &CorrelationConfig) -> Result<CorrelationMatrix> {
        correlation_matrix(&self.counts, &self.abundance.pivot(rank)?, config)
    }

    /// PLS scores for shared samples, labeled by `label_column`.
    ///
    /// Every scored sample is kept; samples without metadata get no label.
    /// Returns `None` when too few samples are shared.
    pub fn integration(
        &self,
        rank: &str,
        label_column: &str,
        config: &IntegrationConfig,
    ) -> Result<Option<AnnotatedTable>> {
        let input = IntegrationInput::Long {
            table: &self.abundance,
            rank,
        };
        match pls_integration(&self.counts, input, config)? {
            IntegrationResult::Scores(scores) => {
                Ok(Some(AnnotatedTable::left(&scores, &self.metadata, label_column)?))
            }
            IntegrationResult::NoResult { .. } => Ok(None),
        }
    }

    /// PCA of log-CPM expression.
    pub fn pca(&self, n_components: usize) -> Result<PcaResult> {
        let log_cpm = norm_log_cpm(&self.counts)?;
        let matrix = CountMatrix::from_dense(
            log_cpm.matrix(),
            log_cpm.feature_ids.clone(),
            log_cpm.sample_ids.clone(),
        )?;
        pca(&matrix, n_components)
    }
}
