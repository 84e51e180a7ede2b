// Sentiment Aggregator
// Lexical news scoring blended with a volatility-derived fear/greed index

pub mod lexicon;
pub mod fear_greed;
pub mod aggregator;

pub use aggregator::{KeyItem, SentimentAggregator, SentimentReading};
pub use fear_greed::{fear_greed_from_volatility, VolatilityShift};
pub use lexicon::{extract_keywords, tokenize, Lexicon};
