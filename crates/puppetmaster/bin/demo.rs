//! End-to-end demo: a conflict-heavy workload across simulated clients and
//! puppets, with lifecycle logging and a final stats printout.
//!
//! Run with: `cargo run --bin demo` (set `RUST_LOG=debug` to watch filter
//! swaps).

use puppetmaster::workers::{spawn_client, spawn_puppet};
use puppetmaster::{
    BloomConfig, ObjectRef, OracleKind, Scheduler, SchedulerConfig, Transaction, TxnId,
};
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

const CLIENTS: usize = 2;
const PUPPETS: usize = 4;
const TXNS_PER_CLIENT: u64 = 10_000;
/// Distinct objects; small enough that write conflicts actually happen.
const OBJECTS: u64 = 256;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = SchedulerConfig::new(CLIENTS, PUPPETS)
        .with_oracle(OracleKind::Bloom(BloomConfig::new(10)))
        .with_refresh_period(256);
    let (mut scheduler, clients, puppets) =
        Scheduler::start(config).expect("scheduler configuration is valid");

    let started = Instant::now();

    let puppet_threads: Vec<_> = puppets
        .into_iter()
        .map(|puppet| {
            spawn_puppet(puppet, None, |_id| {
                // Simulated transaction body.
                std::hint::spin_loop();
            })
        })
        .collect();

    let client_threads: Vec<_> = clients
        .into_iter()
        .enumerate()
        .map(|(c, client)| {
            let txns: Vec<_> = (0..TXNS_PER_CLIENT)
                .map(|i| {
                    let id = TxnId((c as u64) << 32 | i);
                    // Two reads and a write over a small object universe.
                    Transaction::new(
                        id,
                        &[
                            ObjectRef::read((i * 7) % OBJECTS),
                            ObjectRef::read((i * 13 + 1) % OBJECTS),
                            ObjectRef::write((i * 31 + 2) % OBJECTS),
                        ],
                    )
                })
                .collect();
            spawn_client(client, None, txns)
        })
        .collect();

    for handle in client_threads {
        handle.join().expect("client thread panicked");
    }

    // Let the pipeline drain before pulling the plug.
    let total = CLIENTS as u64 * TXNS_PER_CLIENT;
    while scheduler.stats().retired < total {
        std::thread::sleep(Duration::from_millis(1));
    }

    scheduler.shutdown();
    for handle in puppet_threads {
        handle.join().expect("puppet thread panicked");
    }

    let elapsed = started.elapsed();
    let stats = scheduler.stats();
    info!(?stats, ?elapsed, "workload complete");
    println!(
        "{total} txns in {elapsed:?} ({:.0} txns/s); {} conflict refusals, {} filter refreshes",
        total as f64 / elapsed.as_secs_f64(),
        stats.conflicts,
        stats.refreshes,
    );
}
