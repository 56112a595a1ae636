//! Configuration for a scheduler instance.

/// Hard cap on client submitters per instance.
pub const MAX_CLIENTS: usize = 64;

/// Hard cap on puppet workers per instance.
pub const MAX_PUPPETS: usize = 64;

/// Which conflict oracle the dispatcher is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleKind {
    /// Exact pairwise object comparison against every active transaction.
    Exact,
    /// Dual alternating Bloom filters with amortized shadow rebuild.
    Bloom(BloomConfig),
}

/// Geometry of one Bloom filter.
///
/// The bit array is split into [`crate::BLOOM_PARTS`] disjoint partitions
/// of `1 << part_bits` bits each; every hash touches its own partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BloomConfig {
    /// log2 of the per-partition bit count.
    pub part_bits: u32,
}

impl BloomConfig {
    /// # Panics
    ///
    /// Panics unless `part_bits` is in `1..=24`.
    pub const fn new(part_bits: u32) -> Self {
        assert!(
            part_bits >= 1 && part_bits <= 24,
            "bloom part_bits must be between 1 and 24"
        );
        Self { part_bits }
    }
}

impl Default for BloomConfig {
    /// 4 KiB partitions: 4 × 4096 bits = 2 KiB of filter state.
    fn default() -> Self {
        Self::new(12)
    }
}

/// CPU pinning policy for the threads the scheduler owns or helps spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinPolicy {
    /// Let the OS place threads.
    None,
    /// Pin the dispatcher to `scheduler_core`; worker helpers receive their
    /// core assignments from the caller.
    Pin { scheduler_core: usize },
}

/// Configuration for [`Scheduler::start`](crate::Scheduler::start).
///
/// Ring capacities are given as powers of two (`1 << bits`), matching the
/// requirement of the underlying SPSC rings; each ring stores one item
/// fewer than its slot count (the sacrificed slot that discriminates full
/// from empty). All limits are validated at start; misconfiguration is
/// fatal there, never later.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Number of client submitters (each gets a dedicated pending ring).
    pub num_clients: usize,
    /// Number of puppet workers (each gets scheduled and done rings).
    pub num_puppets: usize,
    /// log2 capacity of each per-client pending ring.
    pub pending_bits: u8,
    /// log2 capacity of each per-puppet scheduled ring.
    pub sched_bits: u8,
    /// log2 capacity of each per-puppet done ring.
    pub done_bits: u8,
    /// In-flight transactions allowed per puppet.
    pub max_active_per_puppet: usize,
    /// Scheduling decisions between Bloom refresh boundaries.
    pub refresh_period: u64,
    pub oracle: OracleKind,
    pub pinning: PinPolicy,
}

impl SchedulerConfig {
    /// Reference configuration for the given participant counts.
    pub const fn new(num_clients: usize, num_puppets: usize) -> Self {
        Self {
            num_clients,
            num_puppets,
            pending_bits: 10,
            sched_bits: 8,
            done_bits: 8,
            max_active_per_puppet: 8,
            refresh_period: 512,
            oracle: OracleKind::Bloom(BloomConfig { part_bits: 12 }),
            pinning: PinPolicy::None,
        }
    }

    pub fn with_oracle(mut self, oracle: OracleKind) -> Self {
        self.oracle = oracle;
        self
    }

    pub fn with_refresh_period(mut self, period: u64) -> Self {
        self.refresh_period = period;
        self
    }

    pub fn with_max_active_per_puppet(mut self, cap: usize) -> Self {
        self.max_active_per_puppet = cap;
        self
    }

    pub fn with_pinning(mut self, pinning: PinPolicy) -> Self {
        self.pinning = pinning;
        self
    }

    /// Capacity of each pending ring.
    #[inline]
    pub const fn pending_capacity(&self) -> usize {
        1 << self.pending_bits
    }

    /// Capacity of each scheduled ring.
    #[inline]
    pub const fn sched_capacity(&self) -> usize {
        1 << self.sched_bits
    }

    /// Capacity of each done ring.
    #[inline]
    pub const fn done_capacity(&self) -> usize {
        1 << self.done_bits
    }
}
