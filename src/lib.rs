// Market Sentinel - multi-signal market event detection and alert prioritization
//
// core   - shared types, configuration, logging, the event model
// layer1 - data provider interfaces and bundled sources
// layer2 - technical, sentiment and correlation signals
// layer3 - rules, filtering, session summaries and the detection engine

pub mod core;
pub mod layer1;
pub mod layer2;
pub mod layer3;

pub use crate::core::{EngineConfig, Event, EventType};
pub use crate::layer3::{DetectionEngine, DetectionResult, EngineError, PassCancellation, PassOutcome};
