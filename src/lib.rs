//! Composable Cross-Omics Analysis Library
//!
//! This library provides modular primitives for analysing host gene
//! expression counts alongside metagenomic taxonomic abundance from the same
//! samples.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Core data structures (CountMatrix, AbundanceTable, Metadata, result tables)
//! - **normalize**: Normalization methods (TSS, log-CPM, standardization)
//! - **test**: Hypothesis testing (Welch's t-test)
//! - **correct**: Multiple testing correction (Benjamini-Hochberg)
//! - **de**: Differential expression between two sample groups
//! - **diversity**: Alpha (Shannon, Simpson) and beta (Bray-Curtis) diversity
//! - **ordination**: Metric MDS (SMACOF), PCoA and PCA
//! - **correlate**: Spearman correlation between expression and abundance
//! - **integrate**: PLS-canonical integration of both blocks
//! - **composition** / **report**: Per-sample composition and annotated diversity tables
//! - **profile**: Library size profiling
//! - **context**: The loaded datasets and request-level analyses
//! - **pipeline**: Pipeline composition and execution
//!
//! # Example
//!
//! ```no_run
//! use composable_omics::prelude::*;
//!
//! let ctx = OmicsContext::load("metadata.tsv", "counts.tsv.gz", "abundance.csv.gz").unwrap();
//!
//! let report = Pipeline::new()
//!     .differential_expression("Disease severity", "severe", "mild")
//!     .diversity("Genus", "Disease severity", OrdinationConfig::default())
//!     .correlation("Genus", CorrelationConfig::default())
//!     .run(&ctx)
//!     .unwrap();
//! report.write_outputs("results").unwrap();
//! ```

pub mod composition;
pub mod context;
pub mod correct;
pub mod correlate;
pub mod data;
pub mod de;
pub mod diversity;
pub mod error;
pub mod integrate;
pub mod normalize;
pub mod ordination;
pub mod pipeline;
pub mod profile;
pub mod report;
pub mod test;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::composition::{composition, DEFAULT_TOP_N};
    pub use crate::context::{DatasetSummary, OmicsContext};
    pub use crate::correct::correct_bh;
    pub use crate::correlate::{correlation_matrix, spearman, CorrelationConfig};
    pub use crate::data::{
        AbundanceRecord, AbundanceTable, CorrelationMatrix, CountMatrix, DeResult,
        DeResultSet, GroupAssignment, Metadata, SampleTable, Variable, DEFAULT_RANK,
    };
    pub use crate::de::differential_expression;
    pub use crate::diversity::{
        beta_diversity, bray_curtis, bray_curtis_matrix, diversity_indices, shannon, simpson,
        DistanceMatrix,
    };
    pub use crate::error::{OmicsError, Result};
    pub use crate::integrate::{
        pls_canonical, pls_integration, IntegrationConfig, IntegrationInput, IntegrationResult,
    };
    pub use crate::normalize::{norm_log_cpm, norm_tss, relative_abundance, TransformedMatrix};
    pub use crate::ordination::{
        embed, pca, pcoa, smacof, OrdinationConfig, OrdinationMethod, PcaResult,
    };
    pub use crate::pipeline::{Pipeline, PipelineConfig, PipelineReport, PipelineStep, StepOutput};
    pub use crate::profile::{profile_library_size, LibrarySizeProfile};
    pub use crate::report::{diversity_report, AnnotatedTable};
    pub use crate::test::{test_welch, welch_t, WelchResult};
}
