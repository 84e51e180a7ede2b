// Event History - accepted events kept for a retention window with a hard cap

use crate::core::config::FilterConfig;
use crate::core::events::Event;
use crate::layer3::common::TimeWindow;
use parking_lot::Mutex;
use tracing::debug;

pub struct EventHistory {
    window: Mutex<TimeWindow<Event>>,
}

impl EventHistory {
    pub fn new(retention_ms: i64, capacity: usize) -> Self {
        Self { window: Mutex::new(TimeWindow::new(retention_ms, capacity)) }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(config.history_retention_ms, config.history_capacity)
    }

    /// Append accepted events, then drop anything past retention
    pub fn record(&self, events: &[Event], now_ms: i64) {
        let mut window = self.window.lock();
        let mut evicted = 0usize;
        for event in events {
            if window.add(event.created_at_ms, event.clone()).is_some() {
                evicted += 1;
            }
        }
        let expired = window.prune(now_ms);
        if evicted + expired > 0 {
            debug!(evicted = evicted, expired = expired, retained = window.len(), "History pruned");
        }
    }

    /// Events created at or after `since_ms`, oldest first
    pub fn since(&self, since_ms: i64) -> Vec<Event> {
        self.window.lock().since(since_ms).map(|(_, e)| e.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.window.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.lock().is_empty()
    }

    pub fn clear(&self) {
        self.window.lock().clear();
    }
}
