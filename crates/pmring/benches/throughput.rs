use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use pmring::Ring;
use std::sync::Arc;
use std::thread;

const MESSAGES: u64 = 1_000_000;

fn bench_spsc(c: &mut Criterion) {
    let mut group = c.benchmark_group("spsc");
    group.throughput(Throughput::Elements(MESSAGES));

    group.bench_function("push_pop_cross_thread", |b| {
        b.iter(|| {
            let ring = Arc::new(Ring::<u64>::new(1 << 12));
            let producer_ring = Arc::clone(&ring);

            let producer = thread::spawn(move || {
                for i in 0..MESSAGES {
                    while !producer_ring.push(i) {
                        std::hint::spin_loop();
                    }
                }
            });

            let mut count = 0u64;
            while count < MESSAGES {
                if let Some(v) = ring.pop() {
                    black_box(v);
                    count += 1;
                } else {
                    std::hint::spin_loop();
                }
            }

            producer.join().unwrap();
        });
    });

    group.finish();
}

fn bench_single_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("spsc_single_thread");
    group.throughput(Throughput::Elements(MESSAGES));

    group.bench_function("push_pop_same_thread", |b| {
        let ring = Ring::<u64>::new(1 << 12);
        b.iter(|| {
            for i in 0..MESSAGES {
                ring.push(black_box(i));
                black_box(ring.pop());
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_spsc, bench_single_thread);
criterion_main!(benches);
