//! Criterion throughput comparison of the SPSC ring against the locked
//! baseline, one producer and one consumer per measurement.

use std::hint::black_box;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use core_affinity::CoreId;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rill::sync::locked::LockedQueue;
use rill::sync::spsc;

const TRANSFER_N: usize = 1_000_000;

type Payload = u64;

#[inline]
fn pin_current(core: Option<CoreId>) {
    if let Some(core_id) = core {
        let _ = core_affinity::set_for_current(core_id);
    }
}

fn affinity_pair(core_ids: &[CoreId]) -> (Option<CoreId>, Option<CoreId>) {
    let producer_core = core_ids.first().cloned();
    let consumer_core = core_ids.get(1).cloned();

    match (producer_core, consumer_core) {
        (Some(p), Some(c)) if p.id != c.id => (Some(p), Some(c)),
        (Some(p), _) => (Some(p), None),
        _ => (None, None),
    }
}

fn run_ring_case<const S: usize>(n: usize, core_ids: &[CoreId]) -> Duration {
    let (producer_core, consumer_core) = affinity_pair(core_ids);
    let (producer, consumer) = spsc::channel::<Payload, S>();
    let barrier = Arc::new(Barrier::new(3));

    let prod_barrier = barrier.clone();
    let producer_handle = thread::spawn(move || {
        pin_current(producer_core);
        prod_barrier.wait();
        for sequence in 0..n as Payload {
            let mut value = black_box(sequence);
            while let Err(returned) = producer.push(value) {
                value = returned;
                std::hint::spin_loop();
            }
        }
    });

    let cons_barrier = barrier.clone();
    let consumer_handle = thread::spawn(move || {
        pin_current(consumer_core);
        cons_barrier.wait();
        for expected in 0..n as Payload {
            loop {
                if let Some(value) = consumer.pop() {
                    assert_eq!(black_box(value), expected, "ring FIFO violation");
                    break;
                }
                std::hint::spin_loop();
            }
        }
        assert!(consumer.pop().is_none());
    });

    barrier.wait();
    let start = Instant::now();

    producer_handle.join().unwrap();
    consumer_handle.join().unwrap();

    start.elapsed()
}

fn run_locked_case(n: usize, core_ids: &[CoreId]) -> Duration {
    let (producer_core, consumer_core) = affinity_pair(core_ids);
    let queue = Arc::new(LockedQueue::<Payload>::new());
    let barrier = Arc::new(Barrier::new(3));

    let prod_barrier = barrier.clone();
    let producer_queue = Arc::clone(&queue);
    let producer_handle = thread::spawn(move || {
        pin_current(producer_core);
        prod_barrier.wait();
        for sequence in 0..n as Payload {
            producer_queue.push(black_box(sequence));
        }
    });

    let cons_barrier = barrier.clone();
    let consumer_queue = Arc::clone(&queue);
    let consumer_handle = thread::spawn(move || {
        pin_current(consumer_core);
        cons_barrier.wait();
        for expected in 0..n as Payload {
            loop {
                if let Some(value) = consumer_queue.pop() {
                    assert_eq!(black_box(value), expected, "locked FIFO violation");
                    break;
                }
                std::hint::spin_loop();
            }
        }
        assert!(consumer_queue.pop().is_none());
    });

    barrier.wait();
    let start = Instant::now();

    producer_handle.join().unwrap();
    consumer_handle.join().unwrap();

    start.elapsed()
}

fn bench_queues(c: &mut Criterion) {
    let core_ids = core_affinity::get_core_ids().unwrap_or_default();
    let mut group = c.benchmark_group("queue_throughput_1p1c");
    group.throughput(Throughput::Elements(TRANSFER_N as u64));
    group.sample_size(10);

    for &slots in &[1024usize, 16384, 1 << 20] {
        group.bench_with_input(BenchmarkId::new("ring", slots), &slots, |b, &slots| {
            b.iter_custom(|iters| {
                let mut total = Duration::ZERO;
                for _ in 0..iters {
                    total += match slots {
                        1024 => run_ring_case::<1024>(TRANSFER_N, &core_ids),
                        16384 => run_ring_case::<16384>(TRANSFER_N, &core_ids),
                        _ => run_ring_case::<{ 1 << 20 }>(TRANSFER_N, &core_ids),
                    };
                }
                total
            });
        });
    }

    group.bench_function("locked", |b| {
        b.iter_custom(|iters| {
            let mut total = Duration::ZERO;
            for _ in 0..iters {
                total += run_locked_case(TRANSFER_N, &core_ids);
            }
            total
        });
    });

    group.finish();
}

criterion_group!(benches, bench_queues);
criterion_main!(benches);
