// Indicator Engine - computes the per-symbol IndicatorSet and composite vote
// Neutral below min_samples, partial below full_samples, full otherwise

use super::bollinger::compute_bollinger;
use super::macd::{compute_macd, MacdCross, MacdValues};
use super::moving_average::{ema, sma};
use super::rsi::{wilder_rsi, RsiZone};
use crate::core::config::IndicatorConfig;
use crate::core::types::{clamp_unit, PriceSeries, TechnicalSignal};
use crate::layer2::stats::mean;
use serde::{Deserialize, Serialize};
use tracing::debug;

// Vote weights
const W_RSI: f64 = 0.25;
const W_MACD: f64 = 0.25;
const W_MA_CROSS: f64 = 0.20;
const W_BOLLINGER: f64 = 0.15;
const W_VOLUME: f64 = 0.15;

/// How much history backed the indicator set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sufficiency {
    Insufficient,
    Partial,
    Full,
}

/// Per-component votes that produced the composite signal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentVotes {
    pub rsi: i8,
    pub macd: i8,
    pub ma_cross: i8,
    pub bollinger: i8,
    pub volume: i8,
}

impl ComponentVotes {
    pub fn weighted_sum(&self) -> f64 {
        self.rsi as f64 * W_RSI
            + self.macd as f64 * W_MACD
            + self.ma_cross as f64 * W_MA_CROSS
            + self.bollinger as f64 * W_BOLLINGER
            + self.volume as f64 * W_VOLUME
    }
}

/// Technical snapshot for one symbol, created fresh every pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub symbol: String,
    pub sample_count: usize,
    pub sufficiency: Sufficiency,

    pub last_close: f64,
    pub change_pct: f64,
    pub range_pct: f64,

    pub sma_20: f64,
    pub sma_50: Option<f64>,
    pub ema_12: f64,
    pub ema_26: f64,
    pub rsi: f64,

    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub macd_cross: MacdCross,

    pub bollinger_upper: f64,
    pub bollinger_middle: f64,
    pub bollinger_lower: f64,
    pub bollinger_width: f64,

    pub volume_sma: f64,
    pub volume_ratio: f64,

    pub support: f64,
    pub resistance: f64,

    pub votes: ComponentVotes,
    pub weighted_score: f64,
    pub signal: TechnicalSignal,
    pub strength: f64,
    pub description: String,
}

impl IndicatorSet {
    /// Neutral set for short histories: RSI 50, volume ratio 1, everything else flat
    pub fn neutral(series: &PriceSeries) -> Self {
        let last_close = series.last_close().unwrap_or(0.0);
        Self {
            symbol: series.symbol.clone(),
            sample_count: series.len(),
            sufficiency: Sufficiency::Insufficient,
            last_close,
            change_pct: series.change_pct(),
            range_pct: series.last().map(|b| b.range_pct()).unwrap_or(0.0),
            sma_20: 0.0,
            sma_50: None,
            ema_12: 0.0,
            ema_26: 0.0,
            rsi: 50.0,
            macd: None,
            macd_signal: None,
            macd_histogram: None,
            macd_cross: MacdCross::None,
            bollinger_upper: 0.0,
            bollinger_middle: 0.0,
            bollinger_lower: 0.0,
            bollinger_width: 0.0,
            volume_sma: 0.0,
            volume_ratio: 1.0,
            support: 0.0,
            resistance: 0.0,
            votes: ComponentVotes::default(),
            weighted_score: 0.0,
            signal: TechnicalSignal::Neutral,
            strength: 0.0,
            description: format!("Insufficient history ({} bars)", series.len()),
        }
    }

    pub fn is_sufficient(&self) -> bool {
        self.sufficiency != Sufficiency::Insufficient
    }

    pub fn macd_values(&self) -> MacdValues {
        MacdValues {
            line: self.macd,
            signal: self.macd_signal,
            histogram: self.macd_histogram,
            cross: self.macd_cross,
        }
    }
}

pub struct IndicatorEngine {
    config: IndicatorConfig,
}

impl IndicatorEngine {
    pub fn new(config: IndicatorConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, series: &PriceSeries) -> IndicatorSet {
        let cfg = &self.config;
        let n = series.len();
        if n < cfg.min_samples.max(2) {
            debug!(symbol = %series.symbol, samples = n, "Insufficient history, neutral indicators");
            return IndicatorSet::neutral(series);
        }

        let closes = series.closes();
        let volumes = series.volumes();
        let last_close = *closes.last().unwrap_or(&0.0);
        let sufficiency = if n >= cfg.full_samples { Sufficiency::Full } else { Sufficiency::Partial };

        let sma_20 = sma(&closes, cfg.sma_short).unwrap_or(last_close);
        let sma_50 = if sufficiency == Sufficiency::Full { sma(&closes, cfg.sma_long) } else { None };
        let ema_12 = ema(&closes, cfg.ema_fast).unwrap_or(last_close);
        let ema_26 = ema(&closes, cfg.ema_slow).unwrap_or(last_close);
        let rsi = wilder_rsi(&closes, cfg.rsi_period).unwrap_or(50.0);
        let macd = compute_macd(&closes, cfg.ema_fast, cfg.ema_slow, cfg.macd_signal);
        let bands = compute_bollinger(&closes, cfg.bollinger_period, cfg.bollinger_std);
        let (volume_sma, volume_ratio) = volume_ratio(&volumes, cfg.volume_period);
        let (support, resistance) = support_resistance(series, cfg.level_period);

        let votes = ComponentVotes {
            rsi: RsiZone::classify(rsi, cfg.rsi_overbought, cfg.rsi_oversold).vote(),
            macd: macd.vote(),
            ma_cross: ma_cross_vote(sma_20, sma_50),
            bollinger: bands.map(|b| b.vote(last_close)).unwrap_or(0),
            volume: volume_vote(volume_ratio),
        };
        let weighted_score = votes.weighted_sum();
        let signal = TechnicalSignal::from_weighted_sum(weighted_score);
        let strength = clamp_unit(weighted_score.abs() / 2.0, 0.0, 1.0);

        let mut set = IndicatorSet {
            symbol: series.symbol.clone(),
            sample_count: n,
            sufficiency,
            last_close,
            change_pct: series.change_pct(),
            range_pct: series.last().map(|b| b.range_pct()).unwrap_or(0.0),
            sma_20,
            sma_50,
            ema_12,
            ema_26,
            rsi,
            macd: macd.line,
            macd_signal: macd.signal,
            macd_histogram: macd.histogram,
            macd_cross: macd.cross,
            bollinger_upper: bands.map(|b| b.upper).unwrap_or(last_close),
            bollinger_middle: bands.map(|b| b.middle).unwrap_or(last_close),
            bollinger_lower: bands.map(|b| b.lower).unwrap_or(last_close),
            bollinger_width: bands.map(|b| b.width).unwrap_or(0.0),
            volume_sma,
            volume_ratio,
            support,
            resistance,
            votes,
            weighted_score,
            signal,
            strength,
            description: String::new(),
        };
        set.description = describe(&set, cfg);

        debug!(
            symbol = %set.symbol,
            samples = n,
            rsi = set.rsi,
            volume_ratio = set.volume_ratio,
            signal = %set.signal,
            strength = set.strength,
            "Indicators computed"
        );
        set
    }
}

/// Last volume vs the mean of the `period` bars before it
fn volume_ratio(volumes: &[f64], period: usize) -> (f64, f64) {
    if period == 0 || volumes.len() < period + 1 {
        return (0.0, 1.0);
    }
    let n = volumes.len();
    let avg = mean(&volumes[n - 1 - period..n - 1]).unwrap_or(0.0);
    let last = volumes[n - 1];
    if avg <= 0.0 || !avg.is_finite() || !last.is_finite() {
        return (avg.max(0.0), 1.0);
    }
    (avg, last / avg)
}

/// Pivot-based support/resistance over the last `period` bars
fn support_resistance(series: &PriceSeries, period: usize) -> (f64, f64) {
    let start = series.len().saturating_sub(period);
    let window = &series.bars[start..];
    let Some(last) = window.last() else {
        return (0.0, 0.0);
    };

    let high = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let low = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    let pivot = (high + low + last.close) / 3.0;
    let range = high - low;

    let resistance = (pivot + 0.618 * range).min(high);
    let support = (pivot - 0.618 * range).max(low);
    (support, resistance)
}

fn ma_cross_vote(sma_20: f64, sma_50: Option<f64>) -> i8 {
    let Some(long) = sma_50.filter(|v| v.is_finite() && *v > 0.0) else {
        return 0;
    };
    if !sma_20.is_finite() {
        return 0;
    }
    if sma_20 > long * 1.02 {
        2
    } else if sma_20 > long {
        1
    } else if sma_20 < long * 0.98 {
        -2
    } else if sma_20 < long {
        -1
    } else {
        0
    }
}

fn volume_vote(ratio: f64) -> i8 {
    if !ratio.is_finite() {
        0
    } else if ratio > 2.0 {
        1
    } else if ratio < 0.5 {
        -1
    } else {
        0
    }
}

fn describe(set: &IndicatorSet, cfg: &IndicatorConfig) -> String {
    let rsi_state = if set.rsi >= cfg.rsi_overbought {
        "overbought"
    } else if set.rsi <= cfg.rsi_oversold {
        "oversold"
    } else {
        "neutral"
    };
    let band_state = if set.bollinger_upper > set.bollinger_lower && set.last_close >= set.bollinger_upper {
        "above upper band"
    } else if set.bollinger_upper > set.bollinger_lower && set.last_close <= set.bollinger_lower {
        "below lower band"
    } else {
        "inside bands"
    };
    format!(
        "{}: RSI {:.1} ({}), MACD cross {}, price {}, volume {:.1}x average; signal {} (strength {:.2})",
        set.symbol, set.rsi, rsi_state, set.macd_cross, band_state, set.volume_ratio, set.signal, set.strength
    )
}
