//! Process-wide progress manager
//!
//! Owns the registry and the id counter behind a single lock. Every
//! mutation runs the same pipeline before releasing it: evict stale tasks,
//! recombine, publish. The lock is deliberately held across the publish
//! call so the platform sink always sees a consistent, fully-evicted
//! snapshot and publishes never interleave.

use crate::aggregate::{combine, Aggregate};
use crate::publisher::{PlatformPublisher, ProgressPublisher, PublisherLatch};
use crate::registry::{Registry, TaskId};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

struct Inner<P> {
    next_id: u32,
    registry: Registry,
    publisher: PublisherLatch<P>,
}

impl<P: ProgressPublisher> Inner<P> {
    fn new() -> Self {
        Inner {
            next_id: 1,
            registry: Registry::default(),
            publisher: PublisherLatch::default(),
        }
    }

    fn acquire_id(&mut self) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        id
    }

    fn update(&mut self, id: TaskId, value: i64, max: i64, now: Instant) {
        if self.publisher.is_failed() {
            return;
        }
        debug_assert!(max > 0, "progress reported with non-positive max");
        if max <= 0 {
            return;
        }
        if value == max {
            self.registry.remove(id);
        } else {
            self.registry.record(id, value, max, now);
        }
        self.refresh(now);
    }

    fn forget(&mut self, id: TaskId, now: Instant) {
        if self.publisher.is_failed() {
            return;
        }
        self.registry.remove(id);
        self.refresh(now);
    }

    /// Evict, recombine and push the result to the platform sink. Runs under
    /// the same lock as the mutation that triggered it.
    fn refresh(&mut self, now: Instant) {
        self.registry.evict_stale(now);
        let aggregate = combine(&self.registry);
        log::debug!(
            "combined progress across {} task(s): visible={} fraction={:.3}",
            self.registry.len(),
            aggregate.visible,
            aggregate.fraction
        );
        if let Some(publisher) = self.publisher.acquire() {
            if let Err(err) = publisher.publish(aggregate) {
                log::error!("failed to publish progress: {err}");
            }
        }
    }
}

lazy_static::lazy_static! {
    static ref MANAGER: Mutex<Inner<PlatformPublisher>> = Mutex::new(Inner::new());
}

fn manager() -> MutexGuard<'static, Inner<PlatformPublisher>> {
    // A panicking caller thread must not disable progress for everyone else.
    MANAGER.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Reserve an id for one logical long-running operation.
///
/// Ids are unique for the lifetime of the process; acquire one per
/// operation, report against it with [`update`], and release it with
/// [`forget`] or a final `update(id, max, max)`.
pub fn acquire_id() -> TaskId {
    manager().acquire_id()
}

/// Report that the operation named by `id` has completed `value` of `max`
/// steps.
///
/// `max` must be positive and `value` in `0..=max`. Reporting `value == max`
/// marks the operation finished and drops it from the combined indicator.
/// Never fails: publishing problems are logged and swallowed.
pub fn update(id: TaskId, value: i64, max: i64) {
    manager().update(id, value, max, Instant::now());
}

/// Stop tracking the operation named by `id`. Idempotent.
pub fn forget(id: TaskId) {
    manager().forget(id, Instant::now());
}
