//! Combining individual task percentages into the single published value

use crate::registry::Registry;

/// The combined indicator handed to the desktop environment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    /// Whether the host should show a progress overlay at all.
    pub visible: bool,
    /// Combined completion in [0.0, 1.0]. Always 0.0 when not visible.
    pub fraction: f64,
}

impl Aggregate {
    pub(crate) const HIDDEN: Aggregate = Aggregate {
        visible: false,
        fraction: 0.0,
    };
}

/// Unweighted arithmetic mean of all live tasks' percentages, as a fraction.
///
/// Every task contributes equally regardless of its own step count; a 2-step
/// job and a 2000-step job move the indicator by the same amount.
pub(crate) fn combine(registry: &Registry) -> Aggregate {
    let count = registry.len();
    if count == 0 {
        return Aggregate::HIDDEN;
    }
    let total: u64 = registry.percents().map(u64::from).sum();
    Aggregate {
        visible: true,
        fraction: total as f64 / (100 * count as u64) as f64,
    }
}
