//! The owned scheduler façade: queue wiring, thread lifecycle, handles.
//!
//! Everything lives in a single owned [`Scheduler`] value, with no
//! file-scope singletons, so multiple instances can coexist (tests rely
//! on this).
//! Ownership is a tree: scheduler → rings, dispatcher → active set and
//! oracle, scheduler → dispatcher thread handle.
//!
//! Client and puppet identities are enforced by ownership rather than by
//! runtime checks: each [`ClientHandle`] and [`PuppetHandle`] is the sole
//! producer or consumer of its rings and neither type is `Clone`, so
//! submitting or reporting on someone else's id is unrepresentable.

use crate::bloom::BloomOracle;
use crate::config::{OracleKind, PinPolicy, SchedulerConfig, MAX_CLIENTS, MAX_PUPPETS};
use crate::dispatch::Dispatcher;
use crate::error::SchedulerError;
use crate::event::{EventKind, EventRecorder, NoopRecorder};
use crate::oracle::ExactOracle;
use crate::stats::{SchedStats, StatsSnapshot};
use crate::txn::{Transaction, TxnId};
use crate::workers::pin_to_core;
use pmring::{Backoff, Ring};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{info, warn};

/// State shared between the dispatcher, the handles, and the façade.
pub(crate) struct Shared {
    /// One pending ring per client: client produces, dispatcher consumes.
    pub(crate) pending: Vec<Ring<Transaction>>,
    /// One scheduled ring per puppet: dispatcher produces, puppet consumes.
    pub(crate) scheduled: Vec<Ring<TxnId>>,
    /// One done ring per puppet: puppet produces, dispatcher consumes.
    pub(crate) done: Vec<Ring<TxnId>>,
    pub(crate) shutdown: AtomicBool,
    pub(crate) stats: SchedStats,
    pub(crate) recorder: Arc<dyn EventRecorder>,
    pub(crate) lane_capacity: usize,
    pub(crate) refresh_period: u64,
}

impl Shared {
    pub(crate) fn new(config: &SchedulerConfig, recorder: Arc<dyn EventRecorder>) -> Self {
        Self {
            pending: (0..config.num_clients)
                .map(|_| Ring::new(config.pending_capacity()))
                .collect(),
            scheduled: (0..config.num_puppets)
                .map(|_| Ring::new(config.sched_capacity()))
                .collect(),
            done: (0..config.num_puppets)
                .map(|_| Ring::new(config.done_capacity()))
                .collect(),
            shutdown: AtomicBool::new(false),
            stats: SchedStats::default(),
            recorder,
            lane_capacity: config.max_active_per_puppet,
            refresh_period: config.refresh_period,
        }
    }

    /// Relaxed is enough: the flag is a latch checked in every hot loop.
    #[inline]
    pub(crate) fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

fn validate(config: &SchedulerConfig) -> Result<(), SchedulerError> {
    if config.num_clients == 0 || config.num_clients > MAX_CLIENTS {
        return Err(SchedulerError::ClientCount {
            got: config.num_clients,
        });
    }
    if config.num_puppets == 0 || config.num_puppets > MAX_PUPPETS {
        return Err(SchedulerError::PuppetCount {
            got: config.num_puppets,
        });
    }
    for bits in [config.pending_bits, config.sched_bits, config.done_bits] {
        if bits > 20 {
            return Err(SchedulerError::RingTooLarge { bits });
        }
        if bits == 0 {
            return Err(SchedulerError::RingTooSmall { bits });
        }
    }
    if config.max_active_per_puppet == 0 {
        return Err(SchedulerError::ZeroActiveCapacity);
    }
    if config.refresh_period == 0 {
        return Err(SchedulerError::ZeroRefreshPeriod);
    }
    Ok(())
}

/// A running scheduler instance.
///
/// Created by [`Scheduler::start`], which also hands out one handle per
/// client and per puppet. Dropping the scheduler (or calling
/// [`shutdown`](Scheduler::shutdown)) raises the shutdown flag and joins
/// the dispatcher; workers observe the flag through their handles and exit
/// their poll loops. Shutdown drains no pending work.
pub struct Scheduler {
    shared: Arc<Shared>,
    dispatcher: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Start with the default no-op event recorder.
    pub fn start(
        config: SchedulerConfig,
    ) -> Result<(Self, Vec<ClientHandle>, Vec<PuppetHandle>), SchedulerError> {
        Self::start_with_recorder(config, Arc::new(NoopRecorder))
    }

    /// Allocate all rings, spawn and (per policy) pin the dispatcher, and
    /// hand out the client and puppet handles.
    ///
    /// Fails fast on any misconfiguration; nothing is spawned on error.
    pub fn start_with_recorder(
        config: SchedulerConfig,
        recorder: Arc<dyn EventRecorder>,
    ) -> Result<(Self, Vec<ClientHandle>, Vec<PuppetHandle>), SchedulerError> {
        validate(&config)?;

        let shared = Arc::new(Shared::new(&config, recorder));

        let dispatcher_shared = Arc::clone(&shared);
        let oracle = config.oracle;
        let pinning = config.pinning;
        let dispatcher = thread::Builder::new()
            .name("pm-dispatcher".into())
            .spawn(move || {
                if let PinPolicy::Pin { scheduler_core } = pinning {
                    if !pin_to_core(scheduler_core) {
                        warn!(core = scheduler_core, "could not pin dispatcher");
                    }
                }
                match oracle {
                    OracleKind::Exact => {
                        Dispatcher::new(dispatcher_shared, ExactOracle::new()).run();
                    }
                    OracleKind::Bloom(bloom) => {
                        Dispatcher::new(dispatcher_shared, BloomOracle::new(bloom)).run();
                    }
                }
            })
            .map_err(|_| SchedulerError::SpawnFailed)?;

        info!(
            clients = config.num_clients,
            puppets = config.num_puppets,
            oracle = ?config.oracle,
            refresh_period = config.refresh_period,
            "scheduler started"
        );

        let clients = (0..config.num_clients)
            .map(|id| ClientHandle {
                shared: Arc::clone(&shared),
                id,
            })
            .collect();
        let puppets = (0..config.num_puppets)
            .map(|id| PuppetHandle {
                shared: Arc::clone(&shared),
                id,
            })
            .collect();

        Ok((
            Self {
                shared,
                dispatcher: Some(dispatcher),
            },
            clients,
            puppets,
        ))
    }

    /// Point-in-time scheduling counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.dispatcher.is_some()
    }

    /// Raise the shutdown flag and join the dispatcher. Idempotent.
    ///
    /// # Panics
    ///
    /// Propagates a dispatcher panic: an invariant violation on the data
    /// plane is fatal, not recoverable.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.dispatcher.take() {
            self.shared.shutdown.store(true, Ordering::Release);
            handle.join().expect("dispatcher thread panicked");
            info!(stats = ?self.stats(), "scheduler stopped");
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Submission side of one client's pending ring.
///
/// Deliberately not `Clone`: a second submitter on the same ring would
/// break the single-producer invariant the lock-free protocol rests on.
pub struct ClientHandle {
    shared: Arc<Shared>,
    id: usize,
}

impl ClientHandle {
    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Enqueue a transaction, spinning while the pending ring is full.
    ///
    /// Returns `false` only when shutdown is observed before the push
    /// lands; the transaction is dropped in that case.
    pub fn submit(&self, txn: &Transaction) -> bool {
        let ring = &self.shared.pending[self.id];
        let mut backoff = Backoff::new();
        while !ring.push(*txn) {
            // The flag is only checked at ladder boundaries; the fast path
            // stays a single failed push.
            if backoff.pause() {
                if self.shared.is_shutdown() {
                    return false;
                }
                backoff.reset();
            }
        }
        SchedStats::bump(&self.shared.stats.submitted);
        self.shared
            .recorder
            .record(txn.id(), EventKind::Submit, txn.aux());
        true
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.is_shutdown()
    }
}

/// Worker side of one puppet's scheduled and done rings.
///
/// Not `Clone` for the same reason as [`ClientHandle`]. The completion
/// contract: every polled id must eventually be reported done, and reports
/// must come in poll order; the dispatcher treats a violation as fatal.
pub struct PuppetHandle {
    shared: Arc<Shared>,
    id: usize,
}

impl PuppetHandle {
    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Next scheduled transaction id, or `None` if nothing is waiting.
    /// Never blocks; once the dispatcher has exited this stays `None`
    /// forever after the ring drains.
    pub fn poll(&self) -> Option<TxnId> {
        let id = self.shared.scheduled[self.id].pop()?;
        self.shared
            .recorder
            .record(id, EventKind::WorkRecv, self.id as u64);
        Some(id)
    }

    /// Report a completion, spinning while the done ring is full.
    ///
    /// Returns `false` only when shutdown is observed before the push
    /// lands.
    pub fn report_done(&self, id: TxnId) -> bool {
        let ring = &self.shared.done[self.id];
        let mut backoff = Backoff::new();
        while !ring.push(id) {
            if backoff.pause() {
                if self.shared.is_shutdown() {
                    return false;
                }
                backoff.reset();
            }
        }
        self.shared
            .recorder
            .record(id, EventKind::Done, self.id as u64);
        true
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.is_shutdown()
    }
}
