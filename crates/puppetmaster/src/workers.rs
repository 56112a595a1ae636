//! Thread helpers running the puppet and client contracts.
//!
//! The core itself spawns only the dispatcher; callers that want the stock
//! worker behavior (poll → work → report, in order) or a fire-and-forget
//! submitter thread get them here. Both helpers accept an optional core to
//! pin to and exit cooperatively on shutdown. Callers that bring their own
//! threads can drive the handles directly instead.

use crate::scheduler::{ClientHandle, PuppetHandle};
use crate::txn::{Transaction, TxnId};
use pmring::Backoff;
use std::thread::{self, JoinHandle};
use tracing::warn;

/// Pin the calling thread to the `core`-th core the platform reports.
/// Returns `false` (and leaves the thread unpinned) when the platform
/// reports no such core.
pub fn pin_to_core(core: usize) -> bool {
    if let Some(core_ids) = core_affinity::get_core_ids() {
        if core < core_ids.len() {
            return core_affinity::set_for_current(core_ids[core]);
        }
    }
    false
}

/// Spawn a puppet worker thread.
///
/// Polls the scheduled ring, runs `work` for each id, and reports the
/// completion in receive order, as the dispatcher requires. Exits once
/// shutdown is observed with the scheduled ring empty.
pub fn spawn_puppet<F>(puppet: PuppetHandle, core: Option<usize>, mut work: F) -> JoinHandle<()>
where
    F: FnMut(TxnId) + Send + 'static,
{
    thread::Builder::new()
        .name(format!("pm-puppet-{}", puppet.id()))
        .spawn(move || {
            if let Some(core) = core {
                if !pin_to_core(core) {
                    warn!(core, puppet = puppet.id(), "could not pin puppet thread");
                }
            }
            let mut idle = Backoff::new();
            loop {
                match puppet.poll() {
                    Some(id) => {
                        work(id);
                        if !puppet.report_done(id) {
                            break;
                        }
                        idle.reset();
                    }
                    None => {
                        if puppet.is_shutdown() {
                            break;
                        }
                        if idle.pause() {
                            idle.reset();
                        }
                    }
                }
            }
        })
        .expect("failed to spawn puppet thread")
}

/// Spawn a client submitter thread that pushes `txns` in order and exits.
///
/// Stops early if shutdown preempts a submission.
pub fn spawn_client(
    client: ClientHandle,
    core: Option<usize>,
    txns: Vec<Transaction>,
) -> JoinHandle<()> {
    thread::Builder::new()
        .name(format!("pm-client-{}", client.id()))
        .spawn(move || {
            if let Some(core) = core {
                if !pin_to_core(core) {
                    warn!(core, client = client.id(), "could not pin client thread");
                }
            }
            for txn in txns {
                if !client.submit(&txn) {
                    break;
                }
            }
        })
        .expect("failed to spawn client thread")
}
