// RSI - Wilder-smoothed Relative Strength Index
// Seeded with the simple mean of the first `period` deltas, then smoothed

use serde::{Deserialize, Serialize};

/// RSI zone used for the composite vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiZone {
    Overbought,     // >= 70
    Elevated,       // >= 60
    Neutral,        // 40-60
    Depressed,      // <= 40
    Oversold,       // <= 30
}

impl RsiZone {
    pub fn classify(rsi: f64, overbought: f64, oversold: f64) -> Self {
        if !rsi.is_finite() {
            return RsiZone::Neutral;
        }
        if rsi >= overbought {
            RsiZone::Overbought
        } else if rsi >= 60.0 {
            RsiZone::Elevated
        } else if rsi <= oversold {
            RsiZone::Oversold
        } else if rsi <= 40.0 {
            RsiZone::Depressed
        } else {
            RsiZone::Neutral
        }
    }

    /// Contrarian vote: overbought sells, oversold buys
    pub fn vote(&self) -> i8 {
        match self {
            RsiZone::Overbought => -2,
            RsiZone::Elevated => -1,
            RsiZone::Neutral => 0,
            RsiZone::Depressed => 1,
            RsiZone::Oversold => 2,
        }
    }
}

/// Wilder RSI over the whole series, None when fewer than `period + 1` closes.
/// Flat series (no gains and no losses) yield exactly 50.
pub fn wilder_rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    let mut avg_gain = deltas[..period].iter().map(|d| d.max(0.0)).sum::<f64>() / period as f64;
    let mut avg_loss = deltas[..period].iter().map(|d| (-d).max(0.0)).sum::<f64>() / period as f64;

    let p = period as f64;
    for d in &deltas[period..] {
        avg_gain = (avg_gain * (p - 1.0) + d.max(0.0)) / p;
        avg_loss = (avg_loss * (p - 1.0) + (-d).max(0.0)) / p;
    }

    Some(rsi_from_averages(avg_gain, avg_loss))
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    const EPS: f64 = 1e-12;
    if avg_gain <= EPS && avg_loss <= EPS {
        return 50.0;
    }
    if avg_loss <= EPS {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_price_is_fifty() {
        let closes = vec![100.0; 60];
        assert_eq!(wilder_rsi(&closes, 14), Some(50.0));
    }

    #[test]
    fn test_only_gains_is_hundred() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        assert_eq!(wilder_rsi(&closes, 14), Some(100.0));
    }

    #[test]
    fn test_three_to_one_gains_near_seventy_five() {
        // +3 / -1 alternating: average gain 1.5, average loss 0.5 -> RS 3 -> RSI 75
        let mut closes = vec![100.0];
        for i in 0..40 {
            let last = *closes.last().unwrap();
            closes.push(if i % 2 == 0 { last + 3.0 } else { last - 1.0 });
        }
        let rsi = wilder_rsi(&closes, 14).unwrap();
        assert!(rsi > 70.0 && rsi < 80.0, "rsi was {}", rsi);
    }

    #[test]
    fn test_insufficient_history() {
        assert_eq!(wilder_rsi(&[1.0, 2.0, 3.0], 14), None);
    }

    #[test]
    fn test_zone_votes() {
        assert_eq!(RsiZone::classify(75.0, 70.0, 30.0).vote(), -2);
        assert_eq!(RsiZone::classify(70.0, 70.0, 30.0).vote(), -2);
        assert_eq!(RsiZone::classify(65.0, 70.0, 30.0).vote(), -1);
        assert_eq!(RsiZone::classify(50.0, 70.0, 30.0).vote(), 0);
        assert_eq!(RsiZone::classify(40.0, 70.0, 30.0).vote(), 1);
        assert_eq!(RsiZone::classify(30.0, 70.0, 30.0).vote(), 2);
        assert_eq!(RsiZone::classify(f64::NAN, 70.0, 30.0).vote(), 0);
    }
}
