// Keyword lexicon - per-item scoring, relevance filtering and keyword extraction

use crate::core::config::SentimentConfig;
use crate::core::types::clamp_unit;
use std::collections::{BTreeMap, HashMap, HashSet};

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "her", "was", "one",
    "our", "out", "day", "get", "has", "him", "his", "how", "man", "new", "now", "old", "see",
    "two", "way", "who", "boy", "did", "its", "let", "put", "say", "she", "too", "use", "with",
    "that", "this", "from", "after", "over",
];

pub struct Lexicon {
    positive: HashSet<String>,
    negative: HashSet<String>,
    market: Vec<String>,
    aliases: BTreeMap<String, Vec<String>>,
}

impl Lexicon {
    pub fn from_config(config: &SentimentConfig) -> Self {
        let lower = |list: &[String]| list.iter().map(|w| w.to_lowercase()).collect::<Vec<_>>();
        Self {
            positive: lower(&config.positive_keywords).into_iter().collect(),
            negative: lower(&config.negative_keywords).into_iter().collect(),
            market: lower(&config.market_keywords),
            aliases: config
                .symbol_aliases
                .iter()
                .map(|(k, v)| (k.to_lowercase(), lower(v)))
                .collect(),
        }
    }

    /// (positive - negative) hits over whitespace word count, scaled by 10 and clamped
    pub fn score_text(&self, text: &str) -> f64 {
        let total_words = text.split_whitespace().count();
        if total_words == 0 {
            return 0.0;
        }

        let mut positive = 0usize;
        let mut negative = 0usize;
        for token in tokenize(text) {
            if self.positive.contains(&token) {
                positive += 1;
            } else if self.negative.contains(&token) {
                negative += 1;
            }
        }

        let score = (positive as f64 - negative as f64) / total_words as f64 * 10.0;
        clamp_unit(score, -1.0, 1.0)
    }

    /// Mentions the symbol or one of its aliases as whole words, or starts a word with a market keyword
    pub fn is_relevant(&self, text: &str, symbol: &str) -> bool {
        let tokens = tokenize(text);
        let symbol_lower = symbol.to_lowercase();

        if contains_phrase(&tokens, &tokenize(&symbol_lower)) {
            return true;
        }
        if let Some(aliases) = self.aliases.get(&symbol_lower) {
            if aliases.iter().any(|a| contains_phrase(&tokens, &tokenize(a))) {
                return true;
            }
        }
        self.market
            .iter()
            .any(|k| tokens.iter().any(|t| t.starts_with(k.as_str())))
    }
}

/// `phrase` appears as a run of consecutive tokens
fn contains_phrase(tokens: &[String], phrase: &[String]) -> bool {
    !phrase.is_empty() && tokens.windows(phrase.len()).any(|w| w == phrase)
}

/// Lowercased alphanumeric tokens
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Most frequent non-stop-words of at least 3 letters; ties broken alphabetically
pub fn extract_keywords<'a, I>(texts: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for text in texts {
        for token in tokenize(text) {
            if token.len() < 3 || !token.chars().all(|c| c.is_ascii_alphabetic()) {
                continue;
            }
            if STOP_WORDS.contains(&token.as_str()) {
                continue;
            }
            *counts.entry(token).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(limit).map(|(w, _)| w).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicon() -> Lexicon {
        Lexicon::from_config(&SentimentConfig::default())
    }

    #[test]
    fn test_score_text() {
        let lex = lexicon();
        // 2 positive out of 4 words -> 0.5 * 10 -> clamped to 1
        assert_eq!(lex.score_text("Shares surge on record"), 1.0);
        assert_eq!(lex.score_text("Stock crash deepens losses"), -1.0);
        assert_eq!(lex.score_text(""), 0.0);

        // 1 positive in 20 words -> 0.5
        let text = format!("gain {}", vec!["word"; 19].join(" "));
        assert!((lex.score_text(&text) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_relevance() {
        let lex = lexicon();
        assert!(lex.is_relevant("AAPL unveils new chip", "AAPL"));
        assert!(lex.is_relevant("Apple unveils new chip", "AAPL"));
        assert!(lex.is_relevant("Investor mood sours", "XYZ"));
        assert!(!lex.is_relevant("Local weather sunny", "XYZ"));
    }

    #[test]
    fn test_relevance_matches_whole_words() {
        let lex = lexicon();
        assert!(!lex.is_relevant("Climate change policy debate heats up", "GE"));
        assert!(lex.is_relevant("GE beats estimates", "GE"));
        assert!(lex.is_relevant("Shares of ge rose", "GE"));
        assert!(lex.is_relevant("Analysts like BRK.B", "BRK.B"));
        assert!(!lex.is_relevant("Supermarket chain opens store", "XYZ"));
        assert!(lex.is_relevant("Markets rally into the close", "XYZ"));
    }

    #[test]
    fn test_multi_word_alias() {
        let mut config = SentimentConfig::default();
        config.symbol_aliases.insert("xyz".to_string(), vec!["Acme Widgets".to_string()]);
        let lex = Lexicon::from_config(&config);
        assert!(lex.is_relevant("Acme widgets unveils robot", "XYZ"));
        assert!(!lex.is_relevant("Acme Corp and widgets", "XYZ"));
    }

    #[test]
    fn test_extract_keywords() {
        let texts = ["Earnings beat estimates", "Earnings growth and the outlook", "the earnings"];
        let keywords = extract_keywords(texts.iter().copied(), 10);
        assert_eq!(keywords[0], "earnings");
        assert!(!keywords.contains(&"the".to_string()));
        assert!(!keywords.contains(&"and".to_string()));
        assert!(extract_keywords(texts.iter().copied(), 2).len() <= 2);
    }
}
