//! Unified task-progress aggregator
//!
//! Collects progress reports from any number of concurrently running
//! operations and republishes them as a single combined indicator on the
//! host desktop's taskbar or launcher (Unity LauncherEntry signal on Unix,
//! `ITaskbarList3` overlay on Windows).
//!
//! Usage is three calls: [`acquire_id`] once per operation, [`update`] as it
//! progresses, [`forget`] (or a final `update(id, max, max)`) when done.
//! Tasks that stop reporting are evicted after [`STALE_AFTER`] so an
//! abandoned operation cannot pin the indicator forever.
//!
//! Diagnostics go through the `log` facade; the host application decides
//! where they end up. If the desktop environment cannot be identified at
//! startup the whole component degrades to a no-op instead of failing.
//!
//! The callable surface is exactly [`acquire_id`], [`update`] and
//! [`forget`]. [`Aggregate`] and [`STALE_AFTER`] never appear in those
//! signatures; they are exported to document what the desktop actually
//! receives and when abandoned tasks drop out of it.

mod aggregate;
mod manager;
mod publisher;
mod registry;

pub use aggregate::Aggregate;
pub use manager::{acquire_id, forget, update};
pub use registry::{TaskId, STALE_AFTER};
