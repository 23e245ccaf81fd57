//! Small statistics helpers. Empty or single-sample inputs yield 0.0 rather than NaN.

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = mean(values);
    let squared_diff_sum: f64 = values.iter().map(|x| (x - avg).powi(2)).sum();
    (squared_diff_sum / (values.len() - 1) as f64).sqrt()
}

/// Round to two decimal places, ties to even.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[4.0]), 4.0);
        assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0]), 2.5);
    }

    #[test]
    fn test_sample_std_dev() {
        assert_eq!(sample_std_dev(&[]), 0.0);
        assert_eq!(sample_std_dev(&[7.0]), 0.0);
        assert_eq!(sample_std_dev(&[5.0, 5.0, 5.0]), 0.0);
        // mean 5, squared diffs sum 32, / 7
        let sd = sample_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((sd - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.008), 0.01);
        assert_eq!(round2(12.344), 12.34);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_round2_ties_to_even() {
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(2.5), 2.5);
    }
}
