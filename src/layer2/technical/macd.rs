// MACD - Moving Average Convergence Divergence (12, 26, 9)
// Line valid once the slow EMA has a full span behind it; signal needs 9 line values

use super::moving_average::ema_series;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Recent histogram zero-cross state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacdCross {
    Bullish,
    Bearish,
    None,
}

impl fmt::Display for MacdCross {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacdCross::Bullish => write!(f, "bullish"),
            MacdCross::Bearish => write!(f, "bearish"),
            MacdCross::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdValues {
    pub line: Option<f64>,
    pub signal: Option<f64>,
    pub histogram: Option<f64>,
    pub cross: MacdCross,
}

impl MacdValues {
    pub fn undefined() -> Self {
        Self { line: None, signal: None, histogram: None, cross: MacdCross::None }
    }

    /// Weighted-vote contribution in [-2, 2]; undefined parts vote 0
    pub fn vote(&self) -> i8 {
        let (line, signal) = match (self.line, self.signal) {
            (Some(l), Some(s)) if l.is_finite() && s.is_finite() => (l, s),
            _ => return 0,
        };
        let hist = self.histogram.filter(|h| h.is_finite()).unwrap_or(0.0);

        if line > signal {
            if hist > 0.0 { 2 } else { 1 }
        } else if line < signal {
            if hist < 0.0 { -2 } else { -1 }
        } else {
            0
        }
    }
}

/// Compute MACD over a close series
pub fn compute_macd(closes: &[f64], fast: usize, slow: usize, signal_span: usize) -> MacdValues {
    if fast == 0 || slow == 0 || signal_span == 0 || closes.len() < slow {
        return MacdValues::undefined();
    }

    let fast_ema = ema_series(closes, fast);
    let slow_ema = ema_series(closes, slow);

    // Discard the warm-up region of the slow EMA
    let line: Vec<f64> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .skip(slow - 1)
        .map(|(f, s)| f - s)
        .collect();

    let last_line = line.last().copied();
    if line.len() < signal_span {
        return MacdValues { line: last_line, signal: None, histogram: None, cross: MacdCross::None };
    }

    // Signal values before the ninth line value are masked out
    let signal_series = ema_series(&line, signal_span);
    let histogram: Vec<f64> = line
        .iter()
        .zip(signal_series.iter())
        .skip(signal_span - 1)
        .map(|(l, s)| l - s)
        .collect();

    MacdValues {
        line: last_line,
        signal: signal_series.last().copied(),
        histogram: histogram.last().copied(),
        cross: detect_cross(&histogram, 3),
    }
}

/// Histogram crossed zero within the last `lookback` bars and has not crossed back
pub fn detect_cross(histogram: &[f64], lookback: usize) -> MacdCross {
    let n = histogram.len();
    if n < 2 {
        return MacdCross::None;
    }
    let last = histogram[n - 1];
    let start = n.saturating_sub(lookback).max(1);

    for i in start..n {
        let prev = histogram[i - 1];
        let cur = histogram[i];
        if prev <= 0.0 && cur > 0.0 && last > 0.0 {
            return MacdCross::Bullish;
        }
        if prev >= 0.0 && cur < 0.0 && last < 0.0 {
            return MacdCross::Bearish;
        }
    }
    MacdCross::None
}
