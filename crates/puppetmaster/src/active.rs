//! The set of in-flight transactions, organized per puppet.

use crate::txn::{Transaction, TxnId};
use std::collections::VecDeque;

/// Bounded FIFO lanes of dispatched-but-not-retired transactions, one lane
/// per puppet. Owned exclusively by the dispatcher; every operation is
/// single-threaded.
///
/// The per-puppet FIFO encodes that a worker completes its assignments in
/// the order received, so retirement is always a pop of the lane head, never
/// a search. A full lane only blocks its own puppet; dispatch round-robins
/// the others.
#[derive(Debug)]
pub struct ActiveSet {
    lanes: Vec<VecDeque<Transaction>>,
    lane_capacity: usize,
}

impl ActiveSet {
    pub fn new(num_puppets: usize, lane_capacity: usize) -> Self {
        Self {
            lanes: (0..num_puppets)
                .map(|_| VecDeque::with_capacity(lane_capacity))
                .collect(),
            lane_capacity,
        }
    }

    /// Append to the puppet's lane. Caller must have checked
    /// [`is_full`](Self::is_full); overflowing a lane is a dispatcher bug.
    pub fn push(&mut self, puppet: usize, txn: Transaction) {
        let lane = &mut self.lanes[puppet];
        assert!(
            lane.len() < self.lane_capacity,
            "active lane overflow on puppet {puppet}"
        );
        lane.push_back(txn);
    }

    /// Remove and return the oldest transaction on the puppet's lane.
    pub fn pop(&mut self, puppet: usize) -> Option<Transaction> {
        self.lanes[puppet].pop_front()
    }

    /// Id of the oldest transaction on the puppet's lane, if any.
    pub fn head_id(&self, puppet: usize) -> Option<TxnId> {
        self.lanes[puppet].front().map(Transaction::id)
    }

    #[inline]
    pub fn is_full(&self, puppet: usize) -> bool {
        self.lanes[puppet].len() >= self.lane_capacity
    }

    #[inline]
    pub fn num_puppets(&self) -> usize {
        self.lanes.len()
    }

    /// Total in-flight transactions across all puppets.
    pub fn len(&self) -> usize {
        self.lanes.iter().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.iter().all(VecDeque::is_empty)
    }

    /// Every currently-active transaction, all puppets. Drives the exact
    /// conflict scan and the shadow filter rebuild.
    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.lanes.iter().flat_map(VecDeque::iter)
    }
}
