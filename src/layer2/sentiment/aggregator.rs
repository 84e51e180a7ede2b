// Sentiment Aggregator - per-symbol reading from text items and the volatility index
// Pure over its inputs; the engine handles fetching and provider failures

use super::fear_greed::fear_greed_from_volatility;
use super::lexicon::{extract_keywords, Lexicon};
use crate::core::config::SentimentConfig;
use crate::core::types::{clamp_unit, SentimentClass, SentimentTrend, TextItem};
use crate::layer2::stats::std_dev_population;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

const MAX_KEY_ITEMS: usize = 5;
const MAX_KEYWORDS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyItem {
    pub title: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReading {
    pub symbol: String,
    pub score: f64,
    pub news_score: f64,
    pub class: SentimentClass,
    pub confidence: f64,
    pub sample_count: usize,
    pub fear_greed_index: f64,
    pub volatility_index: Option<f64>,
    pub trend: SentimentTrend,
    pub recent_fraction: f64,
    pub key_items: Vec<KeyItem>,
    pub keywords: Vec<String>,
    pub description: String,
}

impl SentimentReading {
    /// Zero-confidence reading used when the feed fails or has nothing relevant
    pub fn neutral(symbol: &str, volatility_index: Option<f64>) -> Self {
        let fear_greed_index = volatility_index.map(fear_greed_from_volatility).unwrap_or(50.0);
        let mut reading = Self {
            symbol: symbol.to_string(),
            score: 0.0,
            news_score: 0.0,
            class: SentimentClass::Neutral,
            confidence: 0.0,
            sample_count: 0,
            fear_greed_index,
            volatility_index,
            trend: SentimentTrend::Stable,
            recent_fraction: 0.0,
            key_items: Vec::new(),
            keywords: Vec::new(),
            description: String::new(),
        };
        reading.description = reading.describe();
        reading
    }

    fn describe(&self) -> String {
        format!(
            "{} sentiment {} (score {:.2}, confidence {:.2}) from {} items, fear/greed {:.0}, trend {}",
            self.symbol,
            self.class,
            self.score,
            self.confidence,
            self.sample_count,
            self.fear_greed_index,
            self.trend
        )
    }
}

pub struct SentimentAggregator {
    lexicon: Lexicon,
    config: SentimentConfig,
}

impl SentimentAggregator {
    pub fn new(config: SentimentConfig) -> Self {
        Self { lexicon: Lexicon::from_config(&config), config }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Keep relevant items, collapse duplicate titles, newest `max_items` first
    pub fn select_items(&self, symbol: &str, items: &[TextItem]) -> Vec<TextItem> {
        let mut relevant: Vec<TextItem> = items
            .iter()
            .filter(|item| self.lexicon.is_relevant(&item.text(), symbol))
            .cloned()
            .collect();
        relevant.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.title.cmp(&b.title)));

        let mut seen = HashSet::new();
        relevant.retain(|item| seen.insert(item.title.trim().to_lowercase()));
        relevant.truncate(self.config.max_items);
        relevant
    }

    pub fn aggregate(
        &self,
        symbol: &str,
        items: &[TextItem],
        volatility_index: Option<f64>,
        now_ms: i64,
    ) -> SentimentReading {
        let selected = self.select_items(symbol, items);
        if selected.is_empty() {
            debug!(symbol = %symbol, raw_items = items.len(), "No relevant text items");
            return SentimentReading::neutral(symbol, volatility_index);
        }

        let scores: Vec<f64> = selected.iter().map(|i| self.lexicon.score_text(&i.text())).collect();

        // Time-weighted news score
        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        for (item, score) in selected.iter().zip(scores.iter()) {
            let weight = (1.0 - item.age_hours(now_ms) / self.config.decay_hours).max(0.1);
            weighted += score * weight;
            total_weight += weight;
        }
        let news_score = if total_weight > 0.0 {
            clamp_unit(weighted / total_weight, -1.0, 1.0)
        } else {
            0.0
        };

        let fear_greed_index = volatility_index.map(fear_greed_from_volatility).unwrap_or(50.0);
        let fg_component = clamp_unit((fear_greed_index - 50.0) / 50.0, -1.0, 1.0);
        let news_weight = clamp_unit(self.config.news_weight, 0.0, 1.0);
        let score = clamp_unit(news_weight * news_score + (1.0 - news_weight) * fg_component, -1.0, 1.0);

        let n = selected.len();
        let recent = selected
            .iter()
            .filter(|i| i.age_hours(now_ms) < self.config.recent_hours)
            .count();
        let recent_fraction = recent as f64 / n as f64;
        let spread = std_dev_population(&scores).unwrap_or(0.0);
        let confidence = clamp_unit(
            0.4 * (n as f64 / 10.0).min(1.0) + 0.4 * (1.0 - spread) + 0.2 * recent_fraction,
            0.0,
            1.0,
        );

        let trend = if news_score > 0.3 {
            SentimentTrend::Improving
        } else if news_score < -0.3 {
            SentimentTrend::Declining
        } else {
            SentimentTrend::Stable
        };

        let key_items = selected
            .iter()
            .zip(scores.iter())
            .take(MAX_KEY_ITEMS)
            .map(|(item, score)| KeyItem { title: item.title.clone(), score: *score })
            .collect();
        let texts: Vec<String> = selected.iter().map(|i| i.text()).collect();
        let keywords = extract_keywords(texts.iter().map(|t| t.as_str()), MAX_KEYWORDS);

        let mut reading = SentimentReading {
            symbol: symbol.to_string(),
            score,
            news_score,
            class: SentimentClass::from_score(score),
            confidence,
            sample_count: n,
            fear_greed_index,
            volatility_index,
            trend,
            recent_fraction,
            key_items,
            keywords,
            description: String::new(),
        };
        reading.description = reading.describe();

        debug!(
            symbol = %symbol,
            items = n,
            score = reading.score,
            confidence = reading.confidence,
            fear_greed = reading.fear_greed_index,
            "Sentiment aggregated"
        );
        reading
    }
}
