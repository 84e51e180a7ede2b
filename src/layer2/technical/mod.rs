// Technical Indicator Engine
// Moving averages, RSI, MACD, Bollinger Bands and the composite vote

pub mod moving_average;
pub mod rsi;
pub mod macd;
pub mod bollinger;
pub mod indicator_engine;

pub use bollinger::{compute_bollinger, BollingerBands};
pub use indicator_engine::{ComponentVotes, IndicatorEngine, IndicatorSet, Sufficiency};
pub use macd::{compute_macd, MacdCross, MacdValues};
pub use moving_average::{ema, ema_series, sma};
pub use rsi::{wilder_rsi, RsiZone};
