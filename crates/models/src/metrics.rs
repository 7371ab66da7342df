//! Regression accuracy metrics.

/// Mean absolute error over (actual, predicted) pairs.
///
/// An empty input yields 0.0.
pub fn mean_absolute_error(pairs: &[(f64, f64)]) -> f64 {
    if pairs.is_empty() {
        return 0.0;
    }
    let total: f64 = pairs.iter().map(|(a, p)| (a - p).abs()).sum();
    total / pairs.len() as f64
}

/// Root mean squared error over (actual, predicted) pairs:
/// `sqrt(sum((actual - predicted)^2) / n)`.
///
/// An empty input yields 0.0. The denominator is exactly the number of
/// scored pairs; callers are responsible for excluding entries they could
/// not score.
pub fn root_mean_squared_error(pairs: &[(f64, f64)]) -> f64 {
    if pairs.is_empty() {
        return 0.0;
    }
    let sse: f64 = pairs.iter().map(|(a, p)| (a - p) * (a - p)).sum();
    (sse / pairs.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mae() {
        let pairs = vec![(5.0, 4.0), (3.0, 3.5), (4.0, 4.5)];
        let mae = mean_absolute_error(&pairs);
        assert!((mae - (1.0 + 0.5 + 0.5) / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_rmse() {
        let pairs = vec![(5.0, 3.0), (1.0, 2.0)];
        let rmse = root_mean_squared_error(&pairs);
        assert!((rmse - ((4.0 + 1.0_f64) / 2.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(mean_absolute_error(&[]), 0.0);
        assert_eq!(root_mean_squared_error(&[]), 0.0);
    }

    #[test]
    fn test_perfect_predictions() {
        let pairs = vec![(4.0, 4.0), (2.0, 2.0)];
        assert_eq!(root_mean_squared_error(&pairs), 0.0);
        assert_eq!(mean_absolute_error(&pairs), 0.0);
    }
}
