//! Average ranks with tie handling.

/// Assign 1-based ranks, giving tied values the mean of their positions.
pub fn rank_average(data: &[f64]) -> Vec<f64> {
    let n = data.len();
    let mut indexed: Vec<(f64, usize)> = data.iter().copied().enumerate().map(|(i, v)| (v, i)).collect();
    indexed.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && indexed[j].0.total_cmp(&indexed[i].0).is_eq() {
            j += 1;
        }
        // Positions i+1..=j share the average rank
        let rank_val = (i + 1 + j) as f64 / 2.0;
        for item in &indexed[i..j] {
            ranks[item.1] = rank_val;
        }
        i = j;
    }

    ranks
}
