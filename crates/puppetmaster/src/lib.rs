//! Puppetmaster, a conflict-free transaction scheduler.
//!
//! A single pinned dispatcher thread admits transactions from per-client
//! pending rings to a pool of worker "puppets", guaranteeing that no two
//! concurrently executing transactions share a read/write conflict on any
//! object. Every cross-thread hand-off rides a lock-free SPSC ring (see the
//! `pmring` crate); conflict checks run against the dispatcher-private
//! active set, either exactly or through a pair of alternating Bloom
//! filters whose periodic refresh bounds false-positive accumulation.
//!
//! Data flow: client → pending ring → dispatcher → scheduled ring → puppet
//! → done ring → dispatcher (retires, updates the oracle).
//!
//! # Example
//!
//! ```
//! use puppetmaster::{ObjectRef, OracleKind, Scheduler, SchedulerConfig, Transaction, TxnId};
//!
//! let config = SchedulerConfig::new(1, 1).with_oracle(OracleKind::Exact);
//! let (mut scheduler, clients, puppets) = Scheduler::start(config).unwrap();
//!
//! let txn = Transaction::new(TxnId(1), &[ObjectRef::write(42)]);
//! assert!(clients[0].submit(&txn));
//!
//! // The puppet polls, works, reports.
//! let id = loop {
//!     if let Some(id) = puppets[0].poll() {
//!         break id;
//!     }
//!     std::thread::yield_now();
//! };
//! assert_eq!(id, TxnId(1));
//! assert!(puppets[0].report_done(id));
//!
//! scheduler.shutdown();
//! ```

mod active;
mod bloom;
mod config;
mod dispatch;
mod error;
mod event;
mod oracle;
mod scheduler;
mod stats;
mod txn;
pub mod workers;

pub use active::ActiveSet;
pub use bloom::{BloomOracle, BLOOM_PARTS};
pub use config::{
    BloomConfig, OracleKind, PinPolicy, SchedulerConfig, MAX_CLIENTS, MAX_PUPPETS,
};
pub use error::SchedulerError;
pub use event::{Event, EventKind, EventRecorder, MemoryRecorder, NoopRecorder};
pub use oracle::{ConflictOracle, ExactOracle};
pub use scheduler::{ClientHandle, PuppetHandle, Scheduler};
pub use stats::StatsSnapshot;
pub use txn::{ObjectRef, Transaction, TxnId, MAX_TXN_OBJS};
