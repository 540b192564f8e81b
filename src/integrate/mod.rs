//! Latent-variable integration of expression and taxonomic blocks.

pub mod pls;

use crate::data::{AbundanceTable, CountMatrix, SampleTable};
use crate::error::{OmicsError, Result};
use crate::normalize::standardize::{non_zero_columns, select_columns};
use crate::normalize::standardize_columns;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

pub use pls::{pls_canonical, PlsCanonical};

/// Fewest shared samples for which integration is attempted.
pub const MIN_COMMON_SAMPLES: usize = 5;

/// The taxonomic block, either long-form records or an already pivoted matrix.
#[derive(Debug, Clone, Copy)]
pub enum IntegrationInput<'a> {
    /// Records pivoted at `rank` (duplicates summed, absent pairs zero).
    Long {
        table: &'a AbundanceTable,
        rank: &'a str,
    },
    /// Taxa × samples matrix.
    Wide(&'a CountMatrix),
}

/// Parameters for [`pls_integration`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationConfig {
    pub n_components: usize,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self { n_components: 2 }
    }
}

/// Outcome of an integration request.
#[derive(Debug, Clone, PartialEq)]
pub enum IntegrationResult {
    /// Too few shared samples to fit a model.
    NoResult { n_common: usize },
    /// Per-sample scores with columns `comp{k}_x` then `comp{k}_y`.
    Scores(SampleTable),
}

impl IntegrationResult {
    /// The score table, if a model was fitted.
    pub fn scores(&self) -> Option<&SampleTable> {
        match self {
            IntegrationResult::Scores(table) => Some(table),
            IntegrationResult::NoResult { .. } => None,
        }
    }
}

/// Score column names for `n` components: all `comp{k}_x`, then all `comp{k}_y`.
pub fn score_columns(n: usize) -> Vec<String> {
    (1..=n)
        .map(|k| format!("comp{}_x", k))
        .chain((1..=n).map(|k| format!("comp{}_y", k)))
        .collect()
}

/// Shared latent structure between expression and taxonomic abundance.
///
/// `counts` is features × samples. Samples present in both blocks are used
/// in `counts` column order; fewer than [`MIN_COMMON_SAMPLES`] yields
/// [`IntegrationResult::NoResult`]. Each block is standardized (population
/// standard deviation), constant columns are dropped, and a canonical PLS
/// model with `config.n_components` components is fitted.
pub fn pls_integration(
    counts: &CountMatrix,
    abundance: IntegrationInput<'_>,
    config: &IntegrationConfig,
) -> Result<IntegrationResult> {
    let taxa = match abundance {
        IntegrationInput::Long { table, rank } => table.pivot(rank)?,
        IntegrationInput::Wide(matrix) => matrix.clone(),
    };

    let common: Vec<String> = counts
        .sample_ids()
        .iter()
        .filter(|s| taxa.sample_index(s).is_some())
        .cloned()
        .collect();
    if common.len() < MIN_COMMON_SAMPLES {
        log::warn!(
            "Only {} samples shared between blocks; integration needs {}",
            common.len(),
            MIN_COMMON_SAMPLES
        );
        return Ok(IntegrationResult::NoResult {
            n_common: common.len(),
        });
    }

    let x = prepare_block(&counts.select_samples(&common)?, "expression")?;
    let y = prepare_block(&taxa.select_samples(&common)?, "taxonomic")?;
    log::debug!(
        "PLS on {} samples: {} expression and {} taxonomic columns",
        common.len(),
        x.ncols(),
        y.ncols()
    );

    let n = config.n_components;
    if n == 0 || n > x.ncols() || n > y.ncols() || n > common.len() {
        return Err(OmicsError::InvalidParameter(format!(
            "{} components requested but blocks have {} and {} informative columns over {} samples",
            n,
            x.ncols(),
            y.ncols(),
            common.len()
        )));
    }

    let model = pls_canonical(&x, &y, n)?;
    let values = DMatrix::from_fn(common.len(), 2 * n, |i, c| {
        if c < n {
            model.x_scores[(i, c)]
        } else {
            model.y_scores[(i, c - n)]
        }
    });

    Ok(IntegrationResult::Scores(SampleTable::new(
        common,
        score_columns(n),
        values,
    )?))
}

/// Samples × columns, standardized, without constant columns.
fn prepare_block(block: &CountMatrix, name: &str) -> Result<DMatrix<f64>> {
    let scaled = standardize_columns(&block.to_dense().transpose(), 0).data;
    if scaled.iter().any(|v| !v.is_finite()) {
        return Err(OmicsError::Numerical(format!(
            "Non-finite values in standardized {} block",
            name
        )));
    }
    let keep = non_zero_columns(&scaled);
    if keep.len() < scaled.ncols() {
        log::debug!(
            "Dropped {} constant columns from the {} block",
            scaled.ncols() - keep.len(),
            name
        );
    }
    Ok(select_columns(&scaled, &keep))
}
