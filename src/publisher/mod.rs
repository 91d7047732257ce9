//! Platform sinks for the combined progress value
//!
//! Two backends satisfy the same contract, selected at compile time: a D-Bus
//! launcher-entry signal on Unix desktops and an `ITaskbarList3` overlay on
//! Windows. Both are fire-and-forget; nothing here ever reaches back into
//! the registry.

#[cfg(not(windows))]
mod bus;
#[cfg(windows)]
mod taskbar;

#[cfg(not(windows))]
pub(crate) use bus::BusSignalPublisher as PlatformPublisher;
#[cfg(windows)]
pub(crate) use taskbar::TaskbarOverlayPublisher as PlatformPublisher;

use crate::aggregate::Aggregate;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum PublishError {
    /// The host application's desktop identity (window handle or desktop
    /// entry name) could not be resolved at startup.
    #[error("host application identity unavailable")]
    IdentityUnavailable,

    #[cfg(not(windows))]
    #[error("session bus error: {0}")]
    Bus(#[from] zbus::Error),

    #[cfg(windows)]
    #[error("taskbar interface error: {0}")]
    Taskbar(#[from] windows::core::Error),
}

/// A sink for the combined indicator.
pub(crate) trait ProgressPublisher {
    /// One-time setup: resolve the application's desktop identity and open
    /// the platform transport.
    fn initialize() -> Result<Self, PublishError>
    where
        Self: Sized;

    /// Hand the aggregate to the host desktop. Best effort: a failure here
    /// is logged by the caller and otherwise ignored.
    fn publish(&mut self, aggregate: Aggregate) -> Result<(), PublishError>;
}

/// One-shot initialization gate for the publisher.
///
/// Setup runs on first use and the outcome sticks for the rest of the
/// process: a failed backend is never retried, it just turns every
/// subsequent publish into a no-op.
pub(crate) enum PublisherLatch<P> {
    Untried,
    Ready(P),
    Failed,
}

impl<P> Default for PublisherLatch<P> {
    fn default() -> Self {
        PublisherLatch::Untried
    }
}

impl<P: ProgressPublisher> PublisherLatch<P> {
    pub fn is_failed(&self) -> bool {
        matches!(self, PublisherLatch::Failed)
    }

    /// The backend, initializing it on first call. Returns `None` once the
    /// latch has settled on `Failed`.
    pub fn acquire(&mut self) -> Option<&mut P> {
        if matches!(self, PublisherLatch::Untried) {
            *self = match P::initialize() {
                Ok(publisher) => PublisherLatch::Ready(publisher),
                Err(err) => {
                    log::warn!("desktop progress reporting disabled: {err}");
                    PublisherLatch::Failed
                }
            };
        }
        match self {
            PublisherLatch::Ready(publisher) => Some(publisher),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysFails;

    impl ProgressPublisher for AlwaysFails {
        fn initialize() -> Result<Self, PublishError> {
            Err(PublishError::IdentityUnavailable)
        }

        fn publish(&mut self, _aggregate: Aggregate) -> Result<(), PublishError> {
            unreachable!("a failed publisher is never handed out")
        }
    }

    struct AlwaysReady;

    impl ProgressPublisher for AlwaysReady {
        fn initialize() -> Result<Self, PublishError> {
            Ok(AlwaysReady)
        }

        fn publish(&mut self, _aggregate: Aggregate) -> Result<(), PublishError> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_init_latches_permanently() {
        let mut latch: PublisherLatch<AlwaysFails> = PublisherLatch::default();
        assert!(!latch.is_failed());

        assert!(latch.acquire().is_none());
        assert!(latch.is_failed());

        // A second acquire must not re-run initialization.
        assert!(latch.acquire().is_none());
    }

    #[test]
    fn test_successful_init_stays_ready() {
        let mut latch: PublisherLatch<AlwaysReady> = PublisherLatch::default();
        assert!(latch.acquire().is_some());
        assert!(!latch.is_failed());
        assert!(latch.acquire().is_some());
    }
}
