//! Metric multidimensional scaling by SMACOF stress majorization.

use super::{validate_distances, OrdinationConfig};
use crate::error::{OmicsError, Result};
use nalgebra::DMatrix;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// Result of a SMACOF embedding.
#[derive(Debug, Clone)]
pub struct SmacofResult {
    /// Sample coordinates. Shape: `n_samples × n_components`.
    pub coordinates: DMatrix<f64>,
    /// Raw stress of the returned configuration.
    pub stress: f64,
    /// Iterations used by the winning restart.
    pub n_iter: usize,
}

/// Embed a distance matrix with metric MDS.
///
/// Runs `config.n_init` restarts from uniform random configurations; restart
/// `r` draws from `ChaCha8Rng` seeded with `config.seed + r`. Each restart
/// applies Guttman transforms until the normalized stress improves by less
/// than `config.eps` or `config.max_iter` is reached. The restart with the
/// lowest stress wins; ties go to the earlier restart.
pub fn smacof(distances: &DMatrix<f64>, config: &OrdinationConfig) -> Result<SmacofResult> {
    validate_distances(distances, config.n_components)?;
    if config.n_init == 0 || config.max_iter == 0 {
        return Err(OmicsError::InvalidParameter(
            "n_init and max_iter must be positive".to_string(),
        ));
    }

    let runs: Vec<SmacofResult> = (0..config.n_init)
        .into_par_iter()
        .map(|r| {
            let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(r as u64));
            smacof_single(distances, config, &mut rng)
        })
        .collect();

    let best = runs
        .into_iter()
        .reduce(|best, run| if run.stress < best.stress { run } else { best })
        .ok_or_else(|| OmicsError::Numerical("SMACOF produced no configuration".to_string()))?;

    if !best.stress.is_finite() || best.coordinates.iter().any(|v| !v.is_finite()) {
        return Err(OmicsError::Numerical(
            "SMACOF did not produce a finite configuration".to_string(),
        ));
    }

    log::debug!("SMACOF stress {:.6} after {} iterations", best.stress, best.n_iter);
    Ok(best)
}

fn pairwise_euclidean(x: &DMatrix<f64>) -> DMatrix<f64> {
    let n = x.nrows();
    DMatrix::from_fn(n, n, |i, j| (x.row(i) - x.row(j)).norm())
}

fn smacof_single(delta: &DMatrix<f64>, config: &OrdinationConfig, rng: &mut ChaCha8Rng) -> SmacofResult {
    let n = delta.nrows();
    let mut x = DMatrix::from_fn(n, config.n_components, |_, _| rng.random::<f64>());
    let mut old_stress: Option<f64> = None;
    let mut stress = f64::INFINITY;
    let mut n_iter = 0;

    for it in 0..config.max_iter {
        n_iter = it + 1;
        let dis = pairwise_euclidean(&x);
        stress = (&dis - delta).map(|v| v * v).sum() / 2.0;

        // Guttman transform: X <- B(X) X / n
        let mut b = DMatrix::from_fn(n, n, |i, j| {
            if dis[(i, j)] > 0.0 {
                -delta[(i, j)] / dis[(i, j)]
            } else {
                0.0
            }
        });
        for i in 0..n {
            let off_diagonal: f64 = b.row(i).sum() - b[(i, i)];
            b[(i, i)] = -off_diagonal;
        }
        x = (b * &x) / n as f64;

        let norm: f64 = x.row_iter().map(|r| r.norm()).sum();
        if norm <= 0.0 {
            break;
        }
        let normalized = stress / norm;
        if let Some(prev) = old_stress {
            if prev - normalized < config.eps {
                break;
            }
        }
        old_stress = Some(normalized);
    }

    SmacofResult {
        coordinates: x,
        stress,
        n_iter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square_distances() -> DMatrix<f64> {
        let pts = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.5, 2.0)];
        let n = pts.len();
        DMatrix::from_fn(n, n, |i, j| {
            let (ax, ay): (f64, f64) = pts[i];
            let (bx, by) = pts[j];
            ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
        })
    }

    #[test]
    fn test_smacof_deterministic() {
        let d = square_distances();
        let config = OrdinationConfig::default();
        let a = smacof(&d, &config).unwrap();
        let b = smacof(&d, &config).unwrap();
        assert_eq!(a.coordinates, b.coordinates);
        assert_eq!(a.stress, b.stress);
    }

    #[test]
    fn test_smacof_reproduces_planar_distances() {
        let d = square_distances();
        let config = OrdinationConfig {
            eps: 1e-10,
            max_iter: 5000,
            n_init: 8,
            ..OrdinationConfig::default()
        };
        let result = smacof(&d, &config).unwrap();
        let total = d.map(|v| v * v).sum() / 2.0;
        assert!(result.stress / total < 1e-3);

        let fitted = pairwise_euclidean(&result.coordinates);
        assert_relative_eq!(fitted[(0, 2)], d[(0, 2)], epsilon = 0.05);
    }

    #[test]
    fn test_smacof_shape_and_errors() {
        let d = square_distances();
        let config = OrdinationConfig {
            n_components: 3,
            ..OrdinationConfig::default()
        };
        assert_eq!(smacof(&d, &config).unwrap().coordinates.shape(), (5, 3));

        let bad = OrdinationConfig {
            n_init: 0,
            ..OrdinationConfig::default()
        };
        assert!(smacof(&d, &bad).is_err());
    }

    #[test]
    fn test_smacof_zero_distances() {
        let d = DMatrix::zeros(3, 3);
        let result = smacof(&d, &OrdinationConfig::default()).unwrap();
        assert!(result.coordinates.iter().all(|v| v.is_finite()));
    }
}
