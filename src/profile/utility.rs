/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standardizes `raw` against a population mean and standard deviation.
///
/// A non-positive standard deviation yields 0.0 instead of dividing by zero.
pub fn z_score(raw: f64, mean: f64, standard_deviation: f64) -> f64 {
    if standard_deviation > 0.0 {
        (raw - mean) / standard_deviation
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_mean_values() {
        assert_eq!(mean(&[2.0, 4.0, 6.0]), 4.0);
    }

    #[test]
    fn test_z_score() {
        assert_eq!(z_score(50.0, 40.0, 10.0), 1.0);
        assert_eq!(z_score(30.0, 40.0, 5.0), -2.0);
    }

    #[test]
    fn test_z_score_zero_deviation() {
        assert_eq!(z_score(50.0, 40.0, 0.0), 0.0);
        assert_eq!(z_score(-7.5, 40.0, 0.0), 0.0);
    }
}
