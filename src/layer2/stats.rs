// Statistics helpers shared by the indicator, sentiment and correlation layers
// All functions are NaN-aware: degenerate inputs return None rather than NaN

/// Arithmetic mean, None for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by n)
pub fn std_dev_population(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Sample standard deviation (divides by n - 1)
pub fn std_dev_sample(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Pearson correlation coefficient of two equally long series.
/// Returns None when lengths differ, fewer than 2 points, or either side has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;

    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        let dx = x - mx;
        let dy = y - my;
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }

    if vx <= f64::EPSILON || vy <= f64::EPSILON {
        return None;
    }

    let r = cov / (vx.sqrt() * vy.sqrt());
    if r.is_finite() {
        Some(r.clamp(-1.0, 1.0))
    } else {
        None
    }
}

/// Mean of the trailing `n` values (or fewer if the slice is shorter)
pub fn tail_mean(values: &[f64], n: usize) -> Option<f64> {
    let start = values.len().saturating_sub(n);
    mean(&values[start..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
        let pop = std_dev_population(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((pop - 2.0).abs() < 1e-12);
        assert_eq!(std_dev_sample(&[1.0]), None);
        let sample = std_dev_sample(&[1.0, 3.0]).unwrap();
        assert!((sample - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_perfect_and_inverse() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = [2.0, 4.0, 6.0, 8.0, 10.0];
        let zs = [5.0, 4.0, 3.0, 2.0, 1.0];
        assert!((pearson(&xs, &ys).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&xs, &zs).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_degenerate() {
        assert_eq!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(pearson(&[1.0], &[1.0]), None);
        assert_eq!(pearson(&[1.0, 2.0], &[1.0]), None);
    }

    #[test]
    fn test_tail_mean() {
        assert_eq!(tail_mean(&[1.0, 2.0, 3.0, 4.0], 2), Some(3.5));
        assert_eq!(tail_mean(&[1.0, 2.0], 10), Some(1.5));
    }
}
