// Layer3 Common Module - Shared utilities for rules and the alert filter

pub mod time_windows;
pub mod event_types;

pub use time_windows::TimeWindow;
pub use event_types::*;
