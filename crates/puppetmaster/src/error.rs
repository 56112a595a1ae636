//! Construction-time error types.
//!
//! Only configuration problems surface as errors, and only at
//! [`Scheduler::start`](crate::Scheduler::start). Data-plane invariant
//! violations are not representable as values: they panic.

use crate::config::{MAX_CLIENTS, MAX_PUPPETS};
use thiserror::Error;

/// Errors raised while starting a scheduler instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// Client count outside `1..=MAX_CLIENTS`.
    #[error("client count {got} outside 1..={max}", max = MAX_CLIENTS)]
    ClientCount { got: usize },

    /// Puppet count outside `1..=MAX_PUPPETS`.
    #[error("puppet count {got} outside 1..={max}", max = MAX_PUPPETS)]
    PuppetCount { got: usize },

    /// A ring capacity exponent larger than the rings support.
    #[error("ring capacity 2^{bits} exceeds the 2^20 slot limit")]
    RingTooLarge { bits: u8 },

    /// A one-slot ring cannot discriminate full from empty (one slot is
    /// sacrificed for exactly that).
    #[error("ring capacity 2^{bits} leaves no usable slot")]
    RingTooSmall { bits: u8 },

    /// `max_active_per_puppet` must be at least 1.
    #[error("max_active_per_puppet must be at least 1")]
    ZeroActiveCapacity,

    /// `refresh_period` must be at least 1.
    #[error("refresh_period must be at least 1")]
    ZeroRefreshPeriod,

    /// The dispatcher thread could not be spawned.
    #[error("failed to spawn dispatcher thread")]
    SpawnFailed,
}
