//! Alpha and beta diversity of taxonomic abundance profiles.
//!
//! - **Alpha diversity**: Shannon and Simpson indices per sample
//! - **Beta diversity**: Bray-Curtis dissimilarity and its ordination

pub mod alpha;
pub mod beta;

pub use alpha::{diversity_indices, shannon, simpson, SHANNON_EPSILON};
pub use beta::{beta_diversity, bray_curtis, bray_curtis_matrix, DistanceMatrix};
