//! Shared scheduling counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared between the dispatcher, the handles, and the façade.
/// All writes are relaxed; readers get a consistent-enough view for
/// monitoring and tests.
#[derive(Debug, Default)]
pub(crate) struct SchedStats {
    pub submitted: AtomicU64,
    pub dispatched: AtomicU64,
    pub retired: AtomicU64,
    pub conflicts: AtomicU64,
    pub refreshes: AtomicU64,
}

impl SchedStats {
    #[inline]
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            retired: self.retired.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            refreshes: self.refreshes.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the scheduling counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Transactions pushed into pending rings.
    pub submitted: u64,
    /// Transactions moved from pending to a puppet.
    pub dispatched: u64,
    /// Transactions retired after their done event.
    pub retired: u64,
    /// Admission refusals reported by the oracle.
    pub conflicts: u64,
    /// Completed live/shadow filter swaps.
    pub refreshes: u64,
}

impl StatsSnapshot {
    /// Transactions dispatched but not yet retired.
    #[inline]
    pub fn in_flight(&self) -> u64 {
        self.dispatched - self.retired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let stats = SchedStats::default();
        SchedStats::bump(&stats.dispatched);
        SchedStats::bump(&stats.dispatched);
        SchedStats::bump(&stats.retired);

        let snap = stats.snapshot();
        assert_eq!(snap.dispatched, 2);
        assert_eq!(snap.retired, 1);
        assert_eq!(snap.in_flight(), 1);
    }
}
