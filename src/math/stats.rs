//! Column statistics and regression error metrics.
//!
//! Degenerate targets (zero variance) follow the usual convention for R² and
//! explained variance: a perfect fit scores 1, anything else scores 0.

/// Mean of the present values; `None` when every value is missing.
pub fn mean_present(values: &[Option<f64>]) -> Option<f64> {
    let mut sum = 0.0;
    let mut n = 0usize;
    for v in values.iter().flatten() {
        sum += v;
        n += 1;
    }
    (n > 0).then(|| sum / n as f64)
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divides by `n`).
pub fn variance(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return f64::NAN;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / n as f64
}

pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return f64::NAN;
    }
    actual.iter().zip(predicted).map(|(a, p)| (a - p).abs()).sum::<f64>() / n as f64
}

/// Coefficient of determination.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    let m = mean(actual);
    let ss_res: f64 = actual.iter().zip(predicted).map(|(a, p)| (a - p).powi(2)).sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - m).powi(2)).sum();
    ratio_score(ss_res, ss_tot)
}

/// `1 - Var(actual - predicted) / Var(actual)`.
pub fn explained_variance(actual: &[f64], predicted: &[f64]) -> f64 {
    let residuals: Vec<f64> = actual.iter().zip(predicted).map(|(a, p)| a - p).collect();
    ratio_score(variance(&residuals), variance(actual))
}

fn ratio_score(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        1.0 - numerator / denominator
    } else if numerator == 0.0 {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_present_skips_missing() {
        assert_eq!(mean_present(&[Some(1.0), None, Some(3.0)]), Some(2.0));
        assert_eq!(mean_present(&[None, None]), None);
    }

    #[test]
    fn metrics_on_known_values() {
        let actual = [3.0, -0.5, 2.0, 7.0];
        let predicted = [2.5, 0.0, 2.0, 8.0];

        assert!((mean_squared_error(&actual, &predicted) - 0.375).abs() < 1e-12);
        assert!((mean_absolute_error(&actual, &predicted) - 0.5).abs() < 1e-12);
        assert!((r2_score(&actual, &predicted) - 0.948_608_137_044_967_9).abs() < 1e-9);
        assert!((explained_variance(&actual, &predicted) - 0.957_173_447_537_473_2).abs() < 1e-9);
    }

    #[test]
    fn constant_target_scores() {
        let actual = [2.0, 2.0, 2.0];
        assert_eq!(r2_score(&actual, &actual), 1.0);
        assert_eq!(r2_score(&actual, &[1.0, 2.0, 3.0]), 0.0);
    }
}
