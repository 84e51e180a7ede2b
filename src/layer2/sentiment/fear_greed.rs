// Fear/Greed - volatility-index mapping and regime shift readings

use crate::core::types::{clamp_unit, RegimePolarity};
use serde::{Deserialize, Serialize};

/// Map a volatility-index level to a 0-100 fear/greed reading (low volatility = greed)
pub fn fear_greed_from_volatility(v: f64) -> f64 {
    if !v.is_finite() {
        return 50.0;
    }
    let index = if v <= 10.0 {
        90.0 + (10.0 - v)
    } else if v <= 20.0 {
        60.0 + (20.0 - v) * 3.0
    } else if v <= 30.0 {
        40.0 + (30.0 - v) * 2.0
    } else if v <= 40.0 {
        20.0 + (40.0 - v) * 2.0
    } else {
        (20.0 - (v - 40.0)).max(0.0)
    };
    clamp_unit(index, 0.0, 100.0)
}

/// Change in the volatility index between the previous close and now
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityShift {
    pub index_symbol: String,
    pub previous: f64,
    pub current: f64,
    pub change_pct: f64,
    pub polarity: RegimePolarity,
}

impl VolatilityShift {
    pub fn between(index_symbol: &str, previous: f64, current: f64) -> Option<Self> {
        if previous.is_nan() || previous <= 0.0 || !current.is_finite() {
            return None;
        }
        let change_pct = (current - previous) / previous * 100.0;
        // Rising volatility is risk-off
        let polarity = if change_pct > 0.0 { RegimePolarity::RiskOff } else { RegimePolarity::RiskOn };
        Some(Self {
            index_symbol: index_symbol.to_string(),
            previous,
            current,
            change_pct,
            polarity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piecewise_mapping() {
        assert_eq!(fear_greed_from_volatility(5.0), 95.0);
        assert_eq!(fear_greed_from_volatility(10.0), 90.0);
        assert_eq!(fear_greed_from_volatility(18.0), 66.0);
        assert_eq!(fear_greed_from_volatility(23.0), 54.0);
        assert_eq!(fear_greed_from_volatility(35.0), 30.0);
        assert_eq!(fear_greed_from_volatility(45.0), 15.0);
        assert_eq!(fear_greed_from_volatility(80.0), 0.0);
        assert_eq!(fear_greed_from_volatility(0.0), 100.0);
        assert_eq!(fear_greed_from_volatility(f64::NAN), 50.0);
    }

    #[test]
    fn test_volatility_shift() {
        let shift = VolatilityShift::between("^VIX", 18.0, 23.0).unwrap();
        assert!((shift.change_pct - 27.777).abs() < 0.01);
        assert_eq!(shift.polarity, RegimePolarity::RiskOff);

        let shift = VolatilityShift::between("^VIX", 25.0, 15.0).unwrap();
        assert_eq!(shift.polarity, RegimePolarity::RiskOn);

        assert!(VolatilityShift::between("^VIX", 0.0, 15.0).is_none());
    }
}
