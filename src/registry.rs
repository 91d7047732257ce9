//! Per-task progress bookkeeping
//!
//! The registry is the only mutable state in this crate: one entry per live
//! task, refreshed on every report and dropped on completion, explicit
//! forget, or staleness eviction.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A task that goes this long without reporting is treated as abandoned and
/// evicted on the next recompute.
pub const STALE_AFTER: Duration = Duration::from_secs(15);

/// Opaque handle naming one tracked long-running operation.
///
/// Ids are unique for the lifetime of the process and never reused, even
/// after the task they named has been forgotten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub(crate) u32);

#[derive(Debug, Clone, Copy)]
pub(crate) struct ProgressEntry {
    pub last_update: Instant,
    /// Always in 0..=100.
    pub percent: u8,
}

/// Mapping from task id to its latest report. Insertion order is irrelevant.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    entries: HashMap<TaskId, ProgressEntry>,
}

impl Registry {
    /// Insert or overwrite the entry for `id` with the percentage derived
    /// from `value` out of `max`.
    ///
    /// Callers guarantee `max > 0` and `0 <= value <= max`; out-of-range
    /// values are clamped rather than allowed to corrupt the percentage.
    pub fn record(&mut self, id: TaskId, value: i64, max: i64, now: Instant) {
        debug_assert!(max > 0, "progress reported with non-positive max");
        debug_assert!((0..=max).contains(&value), "progress value out of range");
        // Widened so byte-scale counters near i64::MAX cannot overflow the
        // intermediate product.
        let percent = (value.clamp(0, max) as i128 * 100 / max as i128) as u8;
        self.entries.insert(
            id,
            ProgressEntry {
                last_update: now,
                percent,
            },
        );
    }

    /// Drop the entry for `id`. Idempotent: removing an absent id is fine.
    pub fn remove(&mut self, id: TaskId) {
        self.entries.remove(&id);
    }

    /// Drop every entry that has not been refreshed within [`STALE_AFTER`].
    pub fn evict_stale(&mut self, now: Instant) {
        self.entries.retain(|id, entry| {
            let age = now.saturating_duration_since(entry.last_update);
            if age < STALE_AFTER {
                true
            } else {
                log::debug!("task {}: no progress in {}s, dropping", id.0, age.as_secs());
                false
            }
        });
    }

    pub fn percents(&self) -> impl Iterator<Item = u8> + '_ {
        self.entries.values().map(|entry| entry.percent)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_computes_floor_percent() {
        let mut registry = Registry::default();
        let now = Instant::now();
        registry.record(TaskId(1), 1, 3, now);

        assert_eq!(registry.percents().collect::<Vec<_>>(), vec![33]);
    }

    #[test]
    fn test_record_overwrites_previous_report() {
        let mut registry = Registry::default();
        let now = Instant::now();
        registry.record(TaskId(1), 10, 100, now);
        registry.record(TaskId(1), 90, 100, now);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.percents().collect::<Vec<_>>(), vec![90]);
    }

    #[test]
    fn test_record_clamps_out_of_range_values() {
        let mut registry = Registry::default();
        let now = Instant::now();

        // Contract violations: clamp instead of corrupting the percentage.
        // debug_assert catches these in debug builds; release builds clamp.
        #[cfg(not(debug_assertions))]
        {
            registry.record(TaskId(1), 250, 100, now);
            registry.record(TaskId(2), -5, 100, now);
            let mut percents: Vec<_> = registry.percents().collect();
            percents.sort_unstable();
            assert_eq!(percents, vec![0, 100]);
        }

        registry.record(TaskId(3), 100, 100, now);
        assert!(registry.percents().all(|p| p <= 100));
    }

    #[test]
    fn test_record_handles_byte_scale_counters() {
        let mut registry = Registry::default();
        let now = Instant::now();

        registry.record(TaskId(1), i64::MAX - 1, i64::MAX, now);
        assert_eq!(registry.percents().collect::<Vec<_>>(), vec![99]);

        registry.record(TaskId(1), i64::MAX / 2 - 1, i64::MAX / 2, now);
        assert_eq!(registry.percents().collect::<Vec<_>>(), vec![99]);

        registry.record(TaskId(1), i64::MAX / 4, i64::MAX / 2, now);
        assert_eq!(registry.percents().collect::<Vec<_>>(), vec![49]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut registry = Registry::default();
        registry.record(TaskId(7), 50, 100, Instant::now());
        registry.remove(TaskId(7));
        registry.remove(TaskId(7));

        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_evict_stale_keeps_fresh_entries() {
        let mut registry = Registry::default();
        let start = Instant::now();
        registry.record(TaskId(1), 50, 100, start);

        registry.evict_stale(start + Duration::from_secs(14));
        assert!(registry.contains(TaskId(1)));
    }

    #[test]
    fn test_evict_stale_drops_abandoned_entries() {
        let mut registry = Registry::default();
        let start = Instant::now();
        registry.record(TaskId(1), 50, 100, start);
        registry.record(TaskId(2), 25, 100, start + Duration::from_secs(10));

        registry.evict_stale(start + Duration::from_secs(16));
        assert!(!registry.contains(TaskId(1)));
        assert!(registry.contains(TaskId(2)));
    }
}
