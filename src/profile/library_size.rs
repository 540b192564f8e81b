//! Library size profiling for count matrices.

use crate::data::CountMatrix;
use serde::{Deserialize, Serialize};

/// Sequencing depth per sample and its spread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibrarySizeProfile {
    /// Number of samples.
    pub n_samples: usize,
    /// Column total per sample.
    pub library_sizes: Vec<f64>,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// Coefficient of variation (std_dev / mean).
    pub cv: f64,
    /// Samples whose library size is zero.
    pub n_empty: usize,
}

impl LibrarySizeProfile {
    /// Check if library sizes are highly variable (CV > 0.5).
    pub fn is_highly_variable(&self) -> bool {
        self.cv > 0.5
    }

    /// log2(max / min), infinite when some sample is empty.
    pub fn log2_fold_range(&self) -> f64 {
        if self.min > 0.0 {
            (self.max / self.min).log2()
        } else {
            f64::INFINITY
        }
    }

    /// Get indices of samples with library size below a threshold.
    pub fn samples_below(&self, threshold: f64) -> Vec<usize> {
        self.library_sizes
            .iter()
            .enumerate()
            .filter(|(_, &s)| s < threshold)
            .map(|(i, _)| i)
            .collect()
    }
}

impl std::fmt::Display for LibrarySizeProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Library Size Profile")?;
        writeln!(f, "  Samples: {}", self.n_samples)?;
        writeln!(f, "  Mean:    {:.0}", self.mean)?;
        writeln!(f, "  Median:  {:.0}", self.median)?;
        writeln!(f, "  Std Dev: {:.0}", self.std_dev)?;
        writeln!(f, "  Min:     {:.0}", self.min)?;
        writeln!(f, "  Max:     {:.0}", self.max)?;
        writeln!(f, "  CV:      {:.2}", self.cv)?;
        writeln!(f, "  Empty samples: {}", self.n_empty)?;
        Ok(())
    }
}

/// Profile library size characteristics of a count matrix.
pub fn profile_library_size(counts: &CountMatrix) -> LibrarySizeProfile {
    let library_sizes = counts.col_sums();
    let n_samples = library_sizes.len();

    if n_samples == 0 {
        return LibrarySizeProfile {
            n_samples: 0,
            library_sizes: vec![],
            mean: 0.0,
            median: 0.0,
            std_dev: 0.0,
            min: 0.0,
            max: 0.0,
            cv: 0.0,
            n_empty: 0,
        };
    }

    let mean = library_sizes.iter().sum::<f64>() / n_samples as f64;
    let variance = library_sizes
        .iter()
        .map(|&x| (x - mean).powi(2))
        .sum::<f64>()
        / n_samples as f64;
    let std_dev = variance.sqrt();

    let min = library_sizes.iter().copied().fold(f64::INFINITY, f64::min);
    let max = library_sizes.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    LibrarySizeProfile {
        n_samples,
        median: median(&library_sizes),
        mean,
        std_dev,
        min,
        max,
        cv: if mean > 0.0 { std_dev / mean } else { 0.0 },
        n_empty: library_sizes.iter().filter(|&&x| x <= 0.0).count(),
        library_sizes,
    }
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}
