//! The scheduling loop.
//!
//! One dispatcher thread owns the active set and the conflict oracle and is
//! the single consumer of every pending and done ring. Each cycle retires
//! completed transactions, advances refresh bookkeeping, and admits at most
//! one candidate per client. The dispatcher is monomorphic over the oracle
//! variant chosen at construction.

use crate::active::ActiveSet;
use crate::event::EventKind;
use crate::oracle::ConflictOracle;
use crate::scheduler::Shared;
use crate::stats::SchedStats;
use crate::txn::TxnId;
use pmring::Backoff;
use std::sync::Arc;
use tracing::debug;

/// Refresh protocol phase. `StartSwitch` arms a refresh at the next cycle;
/// `Switching` drains the shadow rebuild until the swap lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshState {
    Normal,
    StartSwitch,
    Switching,
}

pub(crate) struct Dispatcher<O: ConflictOracle> {
    shared: Arc<Shared>,
    oracle: O,
    active: ActiveSet,
    state: RefreshState,
    /// Admission decisions (commits and refusals) since the last refresh.
    decisions: u64,
    /// Last puppet that received a dispatch; round-robin resumes after it.
    last_puppet: usize,
}

impl<O: ConflictOracle> Dispatcher<O> {
    pub(crate) fn new(shared: Arc<Shared>, oracle: O) -> Self {
        let num_puppets = shared.scheduled.len();
        let lane_capacity = shared.lane_capacity;
        Self {
            shared,
            oracle,
            active: ActiveSet::new(num_puppets, lane_capacity),
            state: RefreshState::Normal,
            decisions: 0,
            last_puppet: num_puppets - 1,
        }
    }

    /// The loop proper. Exits when the shutdown flag is raised.
    pub(crate) fn run(mut self) {
        let mut idle = Backoff::new();
        while !self.shared.is_shutdown() {
            if self.cycle() {
                idle.reset();
            } else if idle.pause() {
                idle.reset();
            }
        }
        debug!(
            active = self.active.len(),
            decisions = self.decisions,
            "dispatcher exiting"
        );
    }

    /// One pass of the steady-state loop. Returns whether any transaction
    /// moved (used to pace the idle backoff).
    fn cycle(&mut self) -> bool {
        let retired = self.retire_done();
        self.refresh_tick();
        let admitted = self.admit_pass();
        retired || admitted
    }

    /// Drain every puppet's done ring and retire in completion order.
    ///
    /// Completions on a puppet arrive in dispatch order, so each done id
    /// must equal the head of that puppet's active lane. A mismatch means a
    /// memory-ordering or API-misuse bug somewhere upstream; there is no
    /// recovery from that, so it is fatal.
    fn retire_done(&mut self) -> bool {
        let mut progress = false;
        for puppet in 0..self.shared.done.len() {
            while let Some(done_id) = self.shared.done[puppet].pop() {
                let txn = self.active.pop(puppet).unwrap_or_else(|| {
                    panic!("done event {done_id} on puppet {puppet} with nothing active")
                });
                assert_eq!(
                    txn.id(),
                    done_id,
                    "done id on puppet {puppet} does not match its dispatch order"
                );
                self.oracle.retire(&txn);
                SchedStats::bump(&self.shared.stats.retired);
                self.shared
                    .recorder
                    .record(done_id, EventKind::Cleanup, puppet as u64);
                progress = true;
            }
        }
        progress
    }

    /// Advance the refresh state machine by one step.
    fn refresh_tick(&mut self) {
        match self.state {
            RefreshState::Normal => {
                if self.decisions >= self.shared.refresh_period {
                    self.state = RefreshState::StartSwitch;
                }
            }
            RefreshState::StartSwitch => {
                if self.oracle.refresh_begin(&self.active) {
                    self.state = RefreshState::Switching;
                } else {
                    // Nothing accumulated; restart the window without a swap.
                    self.decisions = 0;
                    self.state = RefreshState::Normal;
                }
            }
            RefreshState::Switching => {
                if self.oracle.refresh_step() {
                    SchedStats::bump(&self.shared.stats.refreshes);
                    debug!(active = self.active.len(), "live/shadow filters swapped");
                    self.decisions = 0;
                    self.state = RefreshState::Normal;
                }
            }
        }
    }

    /// One admission attempt per client, clients in strict round-robin
    /// starting at client 0 every cycle.
    ///
    /// A refused candidate stays at its pending head and blocks only its
    /// own client. This head-of-line blocking is intentional: it preserves
    /// per-client FIFO and keeps the pending scan bounded.
    fn admit_pass(&mut self) -> bool {
        let mut progress = false;
        for client in 0..self.shared.pending.len() {
            let candidate = match self.shared.pending[client].peek() {
                Some(txn) => *txn,
                None => continue,
            };
            // Every lane full: no admission can land anywhere this cycle.
            let Some(puppet) = self.choose_puppet() else {
                break;
            };

            self.decisions += 1;
            if self.oracle.conflicts(&candidate, &self.active) {
                SchedStats::bump(&self.shared.stats.conflicts);
                continue;
            }

            let txn = self.shared.pending[client]
                .pop()
                .expect("pending head vanished under the dispatcher");
            assert_eq!(
                txn.id(),
                candidate.id(),
                "pending ring for client {client} reordered under the dispatcher"
            );

            self.active.push(puppet, txn);
            self.oracle.admit(&txn);
            self.last_puppet = puppet;
            self.publish(puppet, txn.id());
            SchedStats::bump(&self.shared.stats.dispatched);
            self.shared
                .recorder
                .record(txn.id(), EventKind::SchedReady, puppet as u64);
            progress = true;
        }
        progress
    }

    /// Next puppet in round-robin order with a non-full lane, resuming
    /// after the last puppet that actually received a dispatch.
    fn choose_puppet(&self) -> Option<usize> {
        let n = self.active.num_puppets();
        for i in 1..=n {
            let p = (self.last_puppet + i) % n;
            if !self.active.is_full(p) {
                return Some(p);
            }
        }
        None
    }

    /// Publish a dispatch onto the puppet's scheduled ring. The ring is
    /// sized not to block in steady state; if it is momentarily full the
    /// dispatcher spins until the puppet drains it, re-checking the
    /// shutdown latch at each ladder boundary.
    fn publish(&self, puppet: usize, id: TxnId) {
        let ring = &self.shared.scheduled[puppet];
        let mut backoff = Backoff::new();
        while !ring.push(id) {
            if backoff.pause() {
                if self.shared.is_shutdown() {
                    return;
                }
                backoff.reset();
            }
        }
    }
}
