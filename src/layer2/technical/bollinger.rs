// Bollinger Bands - SMA(20) +/- 2 sample standard deviations

use crate::layer2::stats::std_dev_sample;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// Band width as a percentage of the middle band
    pub width: f64,
}

impl BollingerBands {
    /// Price at or above the upper band sells, at or below the lower band buys
    pub fn vote(&self, price: f64) -> i8 {
        if !price.is_finite() || !self.upper.is_finite() || !self.lower.is_finite() {
            return 0;
        }
        // Degenerate bands on a flat series carry no information
        if self.upper <= self.lower {
            return 0;
        }
        if price >= self.upper {
            -1
        } else if price <= self.lower {
            1
        } else {
            0
        }
    }

    /// Distance outside the bands divided by the band width, 0 inside
    pub fn penetration_ratio(&self, price: f64) -> f64 {
        let band = self.upper - self.lower;
        if band <= 0.0 || !band.is_finite() {
            return 0.0;
        }
        if price > self.upper {
            (price - self.upper) / band
        } else if price < self.lower {
            (self.lower - price) / band
        } else {
            0.0
        }
    }
}

pub fn compute_bollinger(closes: &[f64], period: usize, num_std: f64) -> Option<BollingerBands> {
    if period < 2 || closes.len() < period {
        return None;
    }
    let window = &closes[closes.len() - period..];
    let middle = window.iter().sum::<f64>() / period as f64;
    let sd = std_dev_sample(window)?;

    let upper = middle + num_std * sd;
    let lower = middle - num_std * sd;
    let width = if middle.abs() > f64::EPSILON {
        (upper - lower) / middle * 100.0
    } else {
        0.0
    };

    Some(BollingerBands { upper, middle, lower, width })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_series_collapses() {
        let bands = compute_bollinger(&vec![10.0; 20], 20, 2.0).unwrap();
        assert_eq!(bands.upper, 10.0);
        assert_eq!(bands.lower, 10.0);
        assert_eq!(bands.width, 0.0);
        assert_eq!(bands.vote(10.0), 0);
        assert_eq!(bands.penetration_ratio(11.0), 0.0);
    }

    #[test]
    fn test_votes_and_penetration() {
        let closes: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 99.0 } else { 101.0 }).collect();
        let bands = compute_bollinger(&closes, 20, 2.0).unwrap();
        assert!((bands.middle - 100.0).abs() < 1e-9);
        assert!(bands.upper > 101.0 && bands.lower < 99.0);
        assert_eq!(bands.vote(bands.upper + 1.0), -1);
        assert_eq!(bands.vote(bands.lower - 1.0), 1);
        assert_eq!(bands.vote(100.0), 0);

        let width = bands.upper - bands.lower;
        let ratio = bands.penetration_ratio(bands.upper + width / 2.0);
        assert!((ratio - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_insufficient() {
        assert!(compute_bollinger(&[1.0, 2.0], 20, 2.0).is_none());
    }
}
