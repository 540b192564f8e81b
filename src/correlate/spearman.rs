//! Pearson and Spearman correlation coefficients.

use super::rank::rank_average;

/// Pearson correlation; NaN when either vector is constant or shorter than two.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 2 {
        return f64::NAN;
    }
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        return f64::NAN;
    }
    (cov / denom).clamp(-1.0, 1.0)
}

/// Spearman rank correlation: Pearson on average ranks.
pub fn spearman(x: &[f64], y: &[f64]) -> f64 {
    pearson(&rank_average(x), &rank_average(y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_spearman_monotone() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.0, 4.0, 9.0, 16.0, 25.0];
        assert_relative_eq!(spearman(&x, &y), 1.0, epsilon = 1e-12);

        let rev = [5.0, 3.0, 2.0, 1.0, 0.5];
        assert_relative_eq!(spearman(&x, &rev), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_spearman_with_ties() {
        // ranks x: 1,2,3,4 ; ranks y: 1.5,1.5,3,4
        let r = spearman(&[1.0, 2.0, 3.0, 4.0], &[7.0, 7.0, 8.0, 9.0]);
        let expected = pearson(&[1.0, 2.0, 3.0, 4.0], &[1.5, 1.5, 3.0, 4.0]);
        assert_relative_eq!(r, expected, epsilon = 1e-12);
        assert!(r > 0.9 && r < 1.0);
    }

    #[test]
    fn test_constant_is_undefined() {
        assert!(spearman(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_nan());
        assert!(pearson(&[1.0], &[2.0]).is_nan());
    }
}
