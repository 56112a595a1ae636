//! The lifecycle event contract consumed by external log collaborators.
//!
//! The core promises to call [`EventRecorder::record`] at five lifecycle
//! points and nothing more; the recorder decides what to do with them (the
//! reference collaborator writes a timestamp-sampled binary log). `record`
//! must be safe to call from any thread: submitters, puppets, and the
//! dispatcher all emit events.

use crate::txn::TxnId;
use std::sync::Mutex;

/// Where in its lifecycle a transaction is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Pushed into a pending ring by a client.
    Submit,
    /// Published to a puppet's scheduled ring by the dispatcher.
    SchedReady,
    /// Popped from the scheduled ring by the puppet.
    WorkRecv,
    /// Reported done by the puppet.
    Done,
    /// Retired from the active set by the dispatcher.
    Cleanup,
}

/// Sink for lifecycle events. Implementations must be cheap and non-blocking;
/// the dispatcher calls this on its scheduling path.
pub trait EventRecorder: Send + Sync {
    fn record(&self, txn: TxnId, kind: EventKind, aux: u64);
}

/// Discards every event. The default recorder.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRecorder;

impl EventRecorder for NoopRecorder {
    #[inline]
    fn record(&self, _txn: TxnId, _kind: EventKind, _aux: u64) {}
}

/// One recorded lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub txn: TxnId,
    pub kind: EventKind,
    pub aux: u64,
}

/// Collects events in memory, in arrival order. Intended for tests and the
/// demo; a mutex is fine off the benchmark path.
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    events: Mutex<Vec<Event>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().expect("event log poisoned").clone()
    }

    /// Recorded events of one kind, in arrival order.
    pub fn of_kind(&self, kind: EventKind) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.kind == kind)
            .collect()
    }
}

impl EventRecorder for MemoryRecorder {
    fn record(&self, txn: TxnId, kind: EventKind, aux: u64) {
        self.events
            .lock()
            .expect("event log poisoned")
            .push(Event { txn, kind, aux });
    }
}
