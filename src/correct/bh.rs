//! Benjamini-Hochberg step-up adjustment.

/// Adjust `p_values` for the false discovery rate.
///
/// Output is aligned with the input. Non-finite entries stay NaN and do not
/// count towards the number of tests, so a feature whose statistic is
/// undefined never inflates the others' adjusted values.
pub fn correct_bh(p_values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..p_values.len())
        .filter(|&i| p_values[i].is_finite())
        .collect();
    order.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));

    let m = order.len() as f64;
    let mut adjusted = vec![f64::NAN; p_values.len()];
    let mut running = 1.0f64;
    for (rank, &i) in order.iter().enumerate().rev() {
        running = running.min(p_values[i] * m / (rank + 1) as f64);
        adjusted[i] = running;
    }
    adjusted
}
