//! The conflict oracle capability and its exact implementation.

use crate::active::ActiveSet;
use crate::txn::Transaction;

/// Admission oracle consulted by the dispatcher for every candidate.
///
/// The contract both implementations share: a candidate that actually
/// conflicts with any active transaction must be refused (false negatives
/// are forbidden); refusing a safe candidate is allowed. `admit` for a
/// transaction happens-before any `conflicts` query that could see it;
/// trivially satisfied here because the dispatcher makes every call in
/// program order.
///
/// Refresh is split into `refresh_begin`/`refresh_step` so implementations
/// with deferred maintenance can bound their per-cycle work; the dispatcher
/// drives the pair from its state machine. Implementations without
/// maintenance return `false` from `refresh_begin` and the dispatcher never
/// leaves its steady state.
pub trait ConflictOracle {
    /// Would admitting `candidate` violate conflict-freedom against the
    /// current active set?
    fn conflicts(&self, candidate: &Transaction, active: &ActiveSet) -> bool;

    /// `candidate` was dispatched; account for it.
    fn admit(&mut self, txn: &Transaction);

    /// A previously admitted transaction retired.
    fn retire(&mut self, txn: &Transaction);

    /// Begin a refresh cycle against the current truth. Returns `false`
    /// when a refresh would change nothing.
    fn refresh_begin(&mut self, active: &ActiveSet) -> bool;

    /// Advance a bounded slice of refresh work. Returns `true` once the
    /// cycle completed (the swap, for the Bloom variant).
    fn refresh_step(&mut self) -> bool;
}

/// Exact oracle: nested scan of every active transaction's objects against
/// the candidate's, intent bit masked, short-circuiting on the first hit.
///
/// O(|active| · N_cand · N_active) per query; precise, so it never blocks a
/// safe candidate. Keeps no state of its own; the active set is the truth.
#[derive(Debug, Default)]
pub struct ExactOracle;

impl ExactOracle {
    pub fn new() -> Self {
        Self
    }
}

impl ConflictOracle for ExactOracle {
    fn conflicts(&self, candidate: &Transaction, active: &ActiveSet) -> bool {
        active.iter().any(|t| t.conflicts_with(candidate))
    }

    fn admit(&mut self, _txn: &Transaction) {}

    fn retire(&mut self, _txn: &Transaction) {}

    fn refresh_begin(&mut self, _active: &ActiveSet) -> bool {
        false
    }

    fn refresh_step(&mut self) -> bool {
        true
    }
}
