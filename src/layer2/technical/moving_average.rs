// Moving averages - simple and exponential
// EMA uses alpha = 2 / (span + 1), seeded with the first value

/// Simple moving average of the last `period` values
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Full exponential moving average series, one output per input
pub fn ema_series(values: &[f64], span: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() || span == 0 {
        return out;
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut ema = values[0];
    out.push(ema);
    for v in &values[1..] {
        // Incremental form keeps a flat series exactly flat
        ema += alpha * (v - ema);
        out.push(ema);
    }
    out
}

/// Last value of the EMA series
pub fn ema(values: &[f64], span: usize) -> Option<f64> {
    ema_series(values, span).last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_window() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(sma(&values, 2), Some(4.5));
        assert_eq!(sma(&values, 5), Some(3.0));
        assert_eq!(sma(&values, 6), None);
        assert_eq!(sma(&values, 0), None);
    }

    #[test]
    fn test_ema_constant_series() {
        let values = vec![10.0; 30];
        let series = ema_series(&values, 12);
        assert_eq!(series.len(), 30);
        assert!(series.iter().all(|v| (*v - 10.0).abs() < 1e-12));
    }

    #[test]
    fn test_ema_tracks_trend() {
        let values: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let fast = ema(&values, 12).unwrap();
        let slow = ema(&values, 26).unwrap();
        // Faster average hugs a rising series more closely
        assert!(fast > slow);
        assert!(fast < 49.0);
    }
}
