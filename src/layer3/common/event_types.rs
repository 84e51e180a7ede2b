// Event Type Names and Rule Tags
// Centralized constants shared by the rules, the filter and the cooldown configuration

// ============================================================================
// Event types (13)
// ============================================================================

pub const PRICE_SURGE: &str = "price_surge";
pub const PRICE_DROP: &str = "price_drop";
pub const VOLATILITY_SPIKE: &str = "volatility_spike";
pub const VOLUME_SPIKE: &str = "volume_spike";
pub const TECHNICAL_BREAKOUT: &str = "technical_breakout";
pub const SENTIMENT_SHIFT: &str = "sentiment_shift";
pub const MOMENTUM_DIVERGENCE: &str = "momentum_divergence";
pub const SECTOR_ROTATION: &str = "sector_rotation";
pub const REGIME_CHANGE: &str = "regime_change";
pub const LIQUIDITY_CRISIS: &str = "liquidity_crisis";
pub const RISK_OFF: &str = "risk_off";
pub const RISK_ON: &str = "risk_on";
pub const CORRELATION_BREAK: &str = "correlation_break";

// ============================================================================
// Rule tags - part of the event id
// ============================================================================

pub const RULE_PRICE_MOVE: &str = "price_move";
pub const RULE_RSI_EXTREME: &str = "rsi_extreme";
pub const RULE_BOLLINGER_BREAK: &str = "bollinger_break";
pub const RULE_MACD_CROSS: &str = "macd_cross";
pub const RULE_PRICE_MACD_DIVERGENCE: &str = "price_macd_divergence";
pub const RULE_SENTIMENT_EXTREME: &str = "sentiment_extreme";
pub const RULE_FEAR_GREED_EXTREME: &str = "fear_greed_extreme";
pub const RULE_LIQUIDITY_CRISIS: &str = "liquidity_crisis";
pub const RULE_VOLUME_SPIKE: &str = "volume_spike";
pub const RULE_VOLATILITY_SPIKE: &str = "volatility_spike";
pub const RULE_CORRELATION_BREAK: &str = "correlation_break";
pub const RULE_SECTOR_ROTATION: &str = "sector_rotation";
pub const RULE_REGIME_CHANGE: &str = "regime_change";

/// Symbol used for market-wide correlation events
pub const MARKET_SYMBOL: &str = "MARKET";
