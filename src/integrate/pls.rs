//! Two-block PLS in canonical mode.

use crate::error::{OmicsError, Result};
use crate::normalize::standardize_columns;
use crate::ordination::dominant_sign;
use nalgebra::{DMatrix, DVector};

/// Fitted canonical PLS model.
#[derive(Debug, Clone)]
pub struct PlsCanonical {
    /// X block weights. Shape: `n_x × n_components`.
    pub x_weights: DMatrix<f64>,
    /// Y block weights. Shape: `n_y × n_components`.
    pub y_weights: DMatrix<f64>,
    /// X block loadings. Shape: `n_x × n_components`.
    pub x_loadings: DMatrix<f64>,
    /// Y block loadings. Shape: `n_y × n_components`.
    pub y_loadings: DMatrix<f64>,
    /// X block scores. Shape: `n_samples × n_components`.
    pub x_scores: DMatrix<f64>,
    /// Y block scores. Shape: `n_samples × n_components`.
    pub y_scores: DMatrix<f64>,
}

/// Fit canonical PLS to two blocks sharing their rows (samples).
///
/// Both blocks are centered and scaled by their sample standard deviation
/// (ddof = 1, constant columns left unscaled). For each component the
/// weights are the leading singular pair of `XkᵀYk`, oriented so the
/// largest-magnitude X weight is positive; each block is then deflated by
/// its own scores.
pub fn pls_canonical(x: &DMatrix<f64>, y: &DMatrix<f64>, n_components: usize) -> Result<PlsCanonical> {
    let n = x.nrows();
    if y.nrows() != n {
        return Err(OmicsError::DimensionMismatch {
            expected: n,
            actual: y.nrows(),
        });
    }
    if n < 2 {
        return Err(OmicsError::EmptyData("PLS needs at least 2 samples".to_string()));
    }
    let max_components = n.min(x.ncols()).min(y.ncols());
    if n_components == 0 || n_components > max_components {
        return Err(OmicsError::InvalidParameter(format!(
            "n_components ({}) must be in [1, {}]",
            n_components, max_components
        )));
    }

    let mut xk = standardize_columns(x, 1).data;
    let mut yk = standardize_columns(y, 1).data;

    let mut model = PlsCanonical {
        x_weights: DMatrix::zeros(x.ncols(), n_components),
        y_weights: DMatrix::zeros(y.ncols(), n_components),
        x_loadings: DMatrix::zeros(x.ncols(), n_components),
        y_loadings: DMatrix::zeros(y.ncols(), n_components),
        x_scores: DMatrix::zeros(n, n_components),
        y_scores: DMatrix::zeros(n, n_components),
    };

    for k in 0..n_components {
        let (u, v) = leading_singular_pair(&xk.tr_mul(&yk), k)?;

        let t: DVector<f64> = &xk * &u;
        let s: DVector<f64> = &yk * &v;
        let tt = t.dot(&t);
        let ss = s.dot(&s);
        if !(tt > 0.0 && ss > 0.0) {
            return Err(OmicsError::Numerical(format!(
                "PLS component {} has zero-variance scores",
                k + 1
            )));
        }

        let p = xk.tr_mul(&t) / tt;
        let q = yk.tr_mul(&s) / ss;
        xk -= &t * p.transpose();
        yk -= &s * q.transpose();

        model.x_weights.set_column(k, &u);
        model.y_weights.set_column(k, &v);
        model.x_loadings.set_column(k, &p);
        model.y_loadings.set_column(k, &q);
        model.x_scores.set_column(k, &t);
        model.y_scores.set_column(k, &s);
    }

    Ok(model)
}

fn leading_singular_pair(cross: &DMatrix<f64>, k: usize) -> Result<(DVector<f64>, DVector<f64>)> {
    let svd = cross.clone().svd(true, true);
    let u = svd
        .u
        .ok_or_else(|| OmicsError::Numerical("SVD did not return U".to_string()))?;
    let v_t = svd
        .v_t
        .ok_or_else(|| OmicsError::Numerical("SVD did not return V^T".to_string()))?;

    let (idx, &sigma) = svd
        .singular_values
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .ok_or_else(|| OmicsError::Numerical("Empty cross-covariance matrix".to_string()))?;
    if !(sigma > f64::EPSILON) {
        return Err(OmicsError::Numerical(format!(
            "No covariance left between blocks at component {}",
            k + 1
        )));
    }

    let sign = dominant_sign(u.column(idx).iter().copied());
    let u_k = u.column(idx).into_owned() * sign;
    let v_k = v_t.row(idx).transpose() * sign;
    Ok((u_k, v_k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn blocks() -> (DMatrix<f64>, DMatrix<f64>) {
        let x = DMatrix::from_row_slice(
            6,
            3,
            &[
                1.0, 2.0, 0.5,
                2.0, 1.0, 1.5,
                3.0, 4.0, 0.2,
                4.0, 3.0, 2.5,
                5.0, 6.0, 1.0,
                6.0, 5.0, 3.0,
            ],
        );
        let y = DMatrix::from_row_slice(
            6,
            2,
            &[
                2.1, 0.3,
                3.9, 1.1,
                6.2, 0.4,
                8.1, 2.0,
                9.8, 0.9,
                12.2, 2.7,
            ],
        );
        (x, y)
    }

    #[test]
    fn test_weights_unit_norm_and_sign() {
        let (x, y) = blocks();
        let model = pls_canonical(&x, &y, 2).unwrap();
        for k in 0..2 {
            assert_relative_eq!(model.x_weights.column(k).norm(), 1.0, epsilon = 1e-10);
            assert_relative_eq!(model.y_weights.column(k).norm(), 1.0, epsilon = 1e-10);
            assert_eq!(dominant_sign(model.x_weights.column(k).iter().copied()), 1.0);
        }
    }

    #[test]
    fn test_x_scores_orthogonal() {
        let (x, y) = blocks();
        let model = pls_canonical(&x, &y, 2).unwrap();
        let t1 = model.x_scores.column(0);
        let t2 = model.x_scores.column(1);
        assert_relative_eq!(t1.dot(&t2), 0.0, epsilon = 1e-8);
        // Scores are centered
        assert_relative_eq!(t1.sum(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_first_component_correlated() {
        let (x, y) = blocks();
        let model = pls_canonical(&x, &y, 1).unwrap();
        let t: Vec<f64> = model.x_scores.column(0).iter().copied().collect();
        let s: Vec<f64> = model.y_scores.column(0).iter().copied().collect();
        assert!(crate::correlate::pearson(&t, &s) > 0.9);
    }

    #[test]
    fn test_first_component_hand_computed() {
        // Two balanced ±1 columns have the same standard deviation, so the
        // standardized cross-products with y are 8:4 and u = (2, 1) / √5.
        // Then t = Xk u is y rescaled to unit sample variance, the same as s.
        let x = DMatrix::from_row_slice(4, 2, &[-1.0, -1.0, -1.0, 1.0, 1.0, -1.0, 1.0, 1.0]);
        let y = DMatrix::from_row_slice(4, 1, &[-3.0, -1.0, 1.0, 3.0]);
        let model = pls_canonical(&x, &y, 1).unwrap();

        let root5 = 5.0f64.sqrt();
        assert_relative_eq!(model.x_weights[(0, 0)], 2.0 / root5, epsilon = 1e-10);
        assert_relative_eq!(model.x_weights[(1, 0)], 1.0 / root5, epsilon = 1e-10);
        assert_relative_eq!(model.y_weights[(0, 0)], 1.0, epsilon = 1e-10);

        let scale = (3.0f64 / 20.0).sqrt();
        for (i, yi) in [-3.0, -1.0, 1.0, 3.0].iter().enumerate() {
            assert_relative_eq!(model.x_scores[(i, 0)], yi * scale, epsilon = 1e-10);
            assert_relative_eq!(model.y_scores[(i, 0)], yi * scale, epsilon = 1e-10);
        }

        // Loadings Xkᵀt / tᵀt coincide with the weights here
        assert_relative_eq!(model.x_loadings[(0, 0)], 2.0 / root5, epsilon = 1e-10);
        assert_relative_eq!(model.x_loadings[(1, 0)], 1.0 / root5, epsilon = 1e-10);
        assert_relative_eq!(model.y_loadings[(0, 0)], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_deterministic() {
        let (x, y) = blocks();
        let a = pls_canonical(&x, &y, 2).unwrap();
        let b = pls_canonical(&x, &y, 2).unwrap();
        assert_eq!(a.x_scores, b.x_scores);
        assert_eq!(a.y_scores, b.y_scores);
    }

    #[test]
    fn test_invalid_components() {
        let (x, y) = blocks();
        assert!(matches!(pls_canonical(&x, &y, 3), Err(OmicsError::InvalidParameter(_))));
        assert!(pls_canonical(&x, &y, 0).is_err());
        assert!(pls_canonical(&x, &DMatrix::zeros(5, 2), 1).is_err());
    }
}
