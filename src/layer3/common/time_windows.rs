// Time Window Container - rolling, time-ordered retention buffer
// Age-based pruning plus a hard capacity; the oldest entry is evicted first

use std::collections::VecDeque;

/// Rolling window of (timestamp_ms, item) pairs in insertion order
#[derive(Debug, Clone)]
pub struct TimeWindow<T> {
    duration_ms: i64,
    max_capacity: usize,
    data: VecDeque<(i64, T)>,
}

impl<T> TimeWindow<T> {
    pub fn new(duration_ms: i64, max_capacity: usize) -> Self {
        Self {
            duration_ms,
            max_capacity: max_capacity.max(1),
            data: VecDeque::with_capacity(max_capacity.min(10_000)),
        }
    }

    /// Append an item; returns the evicted oldest item when at capacity
    pub fn add(&mut self, timestamp: i64, item: T) -> Option<(i64, T)> {
        let evicted = if self.data.len() >= self.max_capacity {
            self.data.pop_front()
        } else {
            None
        };
        self.data.push_back((timestamp, item));
        evicted
    }

    /// Drop entries older than `duration_ms` before `current_time`; returns how many went
    pub fn prune(&mut self, current_time: i64) -> usize {
        let cutoff = current_time - self.duration_ms;
        let before = self.data.len();
        self.data.retain(|(ts, _)| *ts >= cutoff);
        before - self.data.len()
    }

    /// Entries stamped at or after `cutoff`, oldest first
    pub fn since(&self, cutoff: i64) -> impl Iterator<Item = &(i64, T)> {
        self.data.iter().filter(move |(ts, _)| *ts >= cutoff)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(i64, T)> {
        self.data.iter()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_capacity
    }

    pub fn duration_ms(&self) -> i64 {
        self.duration_ms
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn last(&self) -> Option<&(i64, T)> {
        self.data.back()
    }

    pub fn first(&self) -> Option<&(i64, T)> {
        self.data.front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_last() {
        let mut window: TimeWindow<&str> = TimeWindow::new(1000, 10);
        assert!(window.add(100, "a").is_none());
        window.add(200, "b");
        assert_eq!(window.len(), 2);
        assert_eq!(window.last(), Some(&(200, "b")));
    }

    #[test]
    fn test_prune_by_age() {
        let mut window: TimeWindow<u32> = TimeWindow::new(100, 10);
        for (i, ts) in [0, 50, 100, 150, 200].iter().enumerate() {
            window.add(*ts, i as u32);
        }
        // Cutoff 100: entries at 0 and 50 go
        assert_eq!(window.prune(200), 2);
        assert_eq!(window.first().map(|(ts, _)| *ts), Some(100));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut window: TimeWindow<u32> = TimeWindow::new(10_000, 3);
        window.add(1, 1);
        window.add(2, 2);
        window.add(3, 3);
        assert_eq!(window.add(4, 4), Some((1, 1)));
        assert_eq!(window.len(), 3);
        assert_eq!(window.capacity(), 3);
    }

    #[test]
    fn test_since() {
        let mut window: TimeWindow<u32> = TimeWindow::new(10_000, 10);
        window.add(10, 1);
        window.add(20, 2);
        window.add(30, 3);
        let recent: Vec<u32> = window.since(20).map(|(_, v)| *v).collect();
        assert_eq!(recent, vec![2, 3]);
        window.clear();
        assert!(window.is_empty());
    }
}
