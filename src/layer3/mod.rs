// Layer 3 - Event Detection
// Turns layer 2 signals into typed events, filters them and digests each pass

// Common utilities
pub mod common;

// Typed detection rules
pub mod rules;

// Rules over one pass's signals
pub mod synthesizer;

// Thresholds, ranking, cooldown and history
pub mod filter;

// Per-pass digest
pub mod session;

// Pass orchestration
pub mod engine;

pub use engine::{DetectionEngine, DetectionResult, EngineError, EngineStats, PassCancellation, PassOutcome};
pub use filter::{AlertStore, EventFilter, FilterReport, FilterResult};
pub use rules::{EventRule, SignalSet, SymbolSignals};
pub use session::{summarize, SessionSummary};
pub use synthesizer::EventSynthesizer;
