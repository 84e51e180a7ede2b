// Cooldown Registry - last accepted time per (symbol, event type)
// Sharded mutex map; check-and-stamp is atomic per key

use crate::core::events::EventType;
use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

const SHARDS: usize = 16;

type CooldownKey = (String, EventType);

pub struct CooldownRegistry {
    shards: Vec<Mutex<HashMap<CooldownKey, i64>>>,
}

impl Default for CooldownRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CooldownRegistry {
    pub fn new() -> Self {
        Self {
            shards: (0..SHARDS).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    fn shard(&self, symbol: &str, event_type: EventType) -> &Mutex<HashMap<CooldownKey, i64>> {
        let mut hasher = DefaultHasher::new();
        symbol.hash(&mut hasher);
        event_type.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % SHARDS]
    }

    /// Stamp `now_ms` and return true unless the key fired less than `cooldown_ms` ago
    pub fn try_acquire(&self, symbol: &str, event_type: EventType, now_ms: i64, cooldown_ms: i64) -> bool {
        let mut shard = self.shard(symbol, event_type).lock();
        let key = (symbol.to_string(), event_type);
        if let Some(last) = shard.get(&key) {
            if now_ms - *last < cooldown_ms {
                return false;
            }
        }
        shard.insert(key, now_ms);
        true
    }

    /// Read-only check, no stamp
    pub fn is_cooling(&self, symbol: &str, event_type: EventType, now_ms: i64, cooldown_ms: i64) -> bool {
        self.last_accepted(symbol, event_type)
            .map(|last| now_ms - last < cooldown_ms)
            .unwrap_or(false)
    }

    pub fn last_accepted(&self, symbol: &str, event_type: EventType) -> Option<i64> {
        self.shard(symbol, event_type)
            .lock()
            .get(&(symbol.to_string(), event_type))
            .copied()
    }

    /// Drop stamps older than `cutoff_ms`; returns how many went
    pub fn evict_before(&self, cutoff_ms: i64) -> usize {
        let mut evicted = 0;
        for shard in &self.shards {
            let mut shard = shard.lock();
            let before = shard.len();
            shard.retain(|_, last| *last >= cutoff_ms);
            evicted += before - shard.len();
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.lock().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        for shard in &self.shards {
            shard.lock().clear();
        }
    }
}
