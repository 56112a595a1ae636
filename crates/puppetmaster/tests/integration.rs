//! End-to-end scenarios against the public façade, with real threads.
//!
//! The test thread plays the puppets (and sometimes the clients) itself so
//! each scenario can hold the pipeline at a precise point and assert what
//! the dispatcher did (and did not) publish.

use puppetmaster::workers::{spawn_client, spawn_puppet};
use puppetmaster::{
    BloomConfig, EventKind, MemoryRecorder, ObjectRef, OracleKind, PuppetHandle, Scheduler,
    SchedulerConfig, Transaction, TxnId,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn txn(id: u64, reads: &[u64], writes: &[u64]) -> Transaction {
    let refs: Vec<_> = reads
        .iter()
        .map(|&o| ObjectRef::read(o))
        .chain(writes.iter().map(|&o| ObjectRef::write(o)))
        .collect();
    Transaction::new(TxnId(id), &refs)
}

/// Poll `cond` for up to two seconds.
fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    cond()
}

/// Poll every puppet until one yields a dispatch. Panics after two seconds.
fn poll_any(puppets: &[PuppetHandle]) -> (usize, TxnId) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        for (i, p) in puppets.iter().enumerate() {
            if let Some(id) = p.poll() {
                return (i, id);
            }
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    panic!("no dispatch arrived within the deadline");
}

/// Assert that no puppet receives anything for a settle period.
fn assert_nothing_dispatched(puppets: &[PuppetHandle]) {
    let deadline = Instant::now() + Duration::from_millis(50);
    while Instant::now() < deadline {
        for p in puppets {
            assert_eq!(p.poll(), None, "puppet {} received a dispatch", p.id());
        }
        std::thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn disjoint_writers_run_perfectly_parallel() {
    let config = SchedulerConfig::new(1, 4).with_oracle(OracleKind::Exact);
    let recorder = Arc::new(MemoryRecorder::new());
    let (mut scheduler, clients, puppets) =
        Scheduler::start_with_recorder(config, recorder.clone()).unwrap();

    for i in 0..16 {
        assert!(clients[0].submit(&txn(i, &[], &[i])));
    }

    // Play all four puppets: poll and immediately acknowledge.
    let mut dispatched = HashSet::new();
    let all_seen = wait_for(|| {
        for p in &puppets {
            if let Some(id) = p.poll() {
                assert!(dispatched.insert(id), "{id} dispatched twice");
                assert!(p.report_done(id));
            }
        }
        dispatched.len() == 16
    });
    assert!(all_seen, "only {} of 16 dispatched", dispatched.len());
    assert!(wait_for(|| scheduler.stats().retired == 16));

    // 16 distinct dispatch events and 16 matching done events.
    let sched_ids: HashSet<_> = recorder
        .of_kind(EventKind::SchedReady)
        .iter()
        .map(|e| e.txn)
        .collect();
    let done_ids: HashSet<_> = recorder
        .of_kind(EventKind::Done)
        .iter()
        .map(|e| e.txn)
        .collect();
    assert_eq!(sched_ids.len(), 16);
    assert_eq!(sched_ids, done_ids);
    assert_eq!(scheduler.stats().dispatched, 16);

    scheduler.shutdown();
}

#[test]
fn write_write_serializes() {
    let config = SchedulerConfig::new(1, 2).with_oracle(OracleKind::Exact);
    let (mut scheduler, clients, puppets) = Scheduler::start(config).unwrap();

    assert!(clients[0].submit(&txn(1, &[], &[7])));
    assert!(clients[0].submit(&txn(2, &[], &[7])));

    let (owner, first) = poll_any(&puppets);
    assert_eq!(first, TxnId(1));

    // B shares the write-set; nothing may dispatch while A is active.
    assert_nothing_dispatched(&puppets);
    assert_eq!(scheduler.stats().dispatched, 1);

    assert!(puppets[owner].report_done(first));

    let (_, second) = poll_any(&puppets);
    assert_eq!(second, TxnId(2));

    scheduler.shutdown();
}

#[test]
fn read_read_runs_parallel() {
    let config = SchedulerConfig::new(1, 2).with_oracle(OracleKind::Exact);
    let (mut scheduler, clients, _puppets) = Scheduler::start(config).unwrap();

    assert!(clients[0].submit(&txn(1, &[5], &[])));
    assert!(clients[0].submit(&txn(2, &[5], &[])));

    // Both dispatch without either retiring.
    assert!(wait_for(|| scheduler.stats().dispatched == 2));

    scheduler.shutdown();
}

#[test]
fn read_write_blocks_until_reader_retires() {
    let config = SchedulerConfig::new(1, 2).with_oracle(OracleKind::Exact);
    let (mut scheduler, clients, puppets) = Scheduler::start(config).unwrap();

    assert!(clients[0].submit(&txn(1, &[5], &[])));
    assert!(clients[0].submit(&txn(2, &[], &[5])));

    let (owner, reader) = poll_any(&puppets);
    assert_eq!(reader, TxnId(1));

    assert_nothing_dispatched(&puppets);
    assert_eq!(scheduler.stats().dispatched, 1);

    assert!(puppets[owner].report_done(reader));

    let (_, writer) = poll_any(&puppets);
    assert_eq!(writer, TxnId(2));

    scheduler.shutdown();
}

#[test]
fn blocked_head_holds_back_its_client() {
    let config = SchedulerConfig::new(1, 2).with_oracle(OracleKind::Exact);
    let recorder = Arc::new(MemoryRecorder::new());
    let (mut scheduler, clients, puppets) =
        Scheduler::start_with_recorder(config, recorder.clone()).unwrap();

    assert!(clients[0].submit(&txn(1, &[], &[1])));
    assert!(clients[0].submit(&txn(2, &[], &[1])));
    assert!(clients[0].submit(&txn(3, &[], &[2])));

    let (owner, first) = poll_any(&puppets);
    assert_eq!(first, TxnId(1));

    // C is conflict-free against the active set but must wait behind B:
    // per-client FIFO.
    assert_nothing_dispatched(&puppets);
    assert_eq!(scheduler.stats().dispatched, 1);

    assert!(puppets[owner].report_done(first));
    assert!(wait_for(|| scheduler.stats().dispatched == 3));

    let order: Vec<_> = recorder
        .of_kind(EventKind::SchedReady)
        .iter()
        .map(|e| e.txn)
        .collect();
    assert_eq!(order, vec![TxnId(1), TxnId(2), TxnId(3)]);

    scheduler.shutdown();
}

#[test]
fn bloom_false_positive_clears_after_one_refresh() {
    let config = SchedulerConfig::new(1, 2)
        .with_oracle(OracleKind::Bloom(BloomConfig::new(6)))
        .with_refresh_period(16);
    let (mut scheduler, clients, puppets) = Scheduler::start(config).unwrap();

    // Admit and promptly retire a writer of object 42.
    assert!(clients[0].submit(&txn(1, &[], &[42])));
    let (owner, first) = poll_any(&puppets);
    assert_eq!(first, TxnId(1));
    assert!(puppets[owner].report_done(first));
    assert!(wait_for(|| scheduler.stats().retired == 1));

    // A fresh writer of the same object is a guaranteed false positive:
    // nothing is active, but the retired writer's bits still probe
    // positive until the refresh swaps them out.
    assert!(clients[0].submit(&txn(2, &[], &[42])));
    let (_, second) = poll_any(&puppets);
    assert_eq!(second, TxnId(2));

    let stats = scheduler.stats();
    assert!(stats.refreshes >= 1, "admission required a filter refresh");
    assert!(stats.conflicts >= 1, "the stale bits refused it at least once");

    scheduler.shutdown();
}

#[test]
fn schedule_poll_report_round_trips_the_id() {
    let config = SchedulerConfig::new(1, 1).with_oracle(OracleKind::Exact);
    let (mut scheduler, clients, puppets) = Scheduler::start(config).unwrap();

    assert!(clients[0].submit(&txn(77, &[3], &[4])));
    let (_, id) = poll_any(&puppets);
    assert_eq!(id, TxnId(77));
    assert!(puppets[0].report_done(id));
    assert!(wait_for(|| scheduler.stats().retired == 1));

    scheduler.shutdown();
}

#[test]
fn per_client_order_survives_round_robin() {
    let config = SchedulerConfig::new(2, 4).with_oracle(OracleKind::Exact);
    let recorder = Arc::new(MemoryRecorder::new());
    let (mut scheduler, clients, puppets) =
        Scheduler::start_with_recorder(config, recorder.clone()).unwrap();

    let puppet_threads: Vec<_> = puppets
        .into_iter()
        .map(|p| spawn_puppet(p, None, |_| {}))
        .collect();

    let mut clients = clients.into_iter();
    let a: Vec<_> = (0..8).map(|i| txn(i, &[], &[i])).collect();
    let b: Vec<_> = (100..108).map(|i| txn(i, &[], &[i])).collect();
    let client_threads = vec![
        spawn_client(clients.next().unwrap(), None, a),
        spawn_client(clients.next().unwrap(), None, b),
    ];

    assert!(wait_for(|| scheduler.stats().retired == 16));
    for handle in client_threads {
        handle.join().unwrap();
    }

    // Interleaving across clients is free; each client's own order is not.
    let order: Vec<_> = recorder
        .of_kind(EventKind::SchedReady)
        .iter()
        .map(|e| e.txn.0)
        .collect();
    let first: Vec<_> = order.iter().copied().filter(|&id| id < 100).collect();
    let second: Vec<_> = order.iter().copied().filter(|&id| id >= 100).collect();
    assert_eq!(first, (0..8).collect::<Vec<_>>());
    assert_eq!(second, (100..108).collect::<Vec<_>>());

    // Cooperative teardown: every thread the test spawned joins cleanly.
    scheduler.shutdown();
    for handle in puppet_threads {
        handle.join().unwrap();
    }
}

#[test]
fn shutdown_stops_polls_and_workers() {
    let config = SchedulerConfig::new(1, 2).with_oracle(OracleKind::Exact);
    let (mut scheduler, _clients, puppets) = Scheduler::start(config).unwrap();

    let mut puppets = puppets.into_iter();
    let kept = puppets.next().unwrap();
    let worker = spawn_puppet(puppets.next().unwrap(), None, |_| {});

    scheduler.shutdown();
    assert!(!scheduler.is_running());
    assert!(kept.is_shutdown());
    assert_eq!(kept.poll(), None);
    worker.join().unwrap();
}
