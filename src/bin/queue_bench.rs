//! Queue throughput benchmark: lock-free SPSC ring vs. mutex baseline.
//!
//! Spawns one producer and one consumer thread per queue under test,
//! transfers a fixed number of integers, and reports elapsed wall-clock
//! time. The spin-until-ready retry loops live here, in the driver; the
//! queues themselves never block.
//!
//! Usage:
//!     cargo run --release --bin queue_bench
//!
//! Environment variables:
//!     ITERATIONS=1000000  Values to transfer per queue (default: 1000000)
//!     PRODUCER_CPU=0      Pin producer to CPU 0 (default: 0)
//!     CONSUMER_CPU=2      Pin consumer to CPU 2 (default: 2)

use std::hint;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use minstant::Instant;

use rill::config::BenchConfig;
use rill::sync::locked::LockedQueue;
use rill::sync::spsc;

/// Ring slot count for the benchmark (1,048,576 slots).
const RING_SLOTS: usize = 1 << 20;

type Payload = u64;

fn pin_to_cpu(cpu: Option<usize>) {
    if let Some(id) = cpu {
        core_affinity::set_for_current(core_affinity::CoreId { id });
    }
}

fn report(label: &str, iterations: usize, elapsed: Duration) {
    let ops_per_ms = iterations as u128 * 1_000_000 / elapsed.as_nanos().max(1);
    println!(
        "{label}: {} us ({ops_per_ms} ops/ms)",
        elapsed.as_micros()
    );
}

fn bench_ring(config: &BenchConfig) {
    let iterations = config.iterations;
    let (producer, consumer) = spsc::channel::<Payload, RING_SLOTS>();

    let ready = Arc::new(AtomicBool::new(false));
    let ready_clone = ready.clone();
    let consumer_cpu = config.consumer_cpu;

    // Consumer thread
    let consumer_thread = thread::spawn(move || {
        pin_to_cpu(consumer_cpu);

        // Signal ready
        ready_clone.store(true, Ordering::Release);

        for expected in 0..iterations as Payload {
            loop {
                if let Some(value) = consumer.pop() {
                    assert_eq!(value, expected, "ring reordered or dropped a value");
                    break;
                }
                hint::spin_loop();
            }
        }
    });

    // Wait for consumer to be ready
    while !ready.load(Ordering::Acquire) {
        hint::spin_loop();
    }

    pin_to_cpu(config.producer_cpu);

    let start = Instant::now();

    for i in 0..iterations as Payload {
        let mut value = i;
        while let Err(returned) = producer.push(value) {
            value = returned;
            hint::spin_loop();
        }
    }

    consumer_thread.join().expect("consumer thread panicked");
    report("ring  ", iterations, start.elapsed());
}

fn bench_locked(config: &BenchConfig) {
    let iterations = config.iterations;
    let queue = Arc::new(LockedQueue::<Payload>::new());

    let ready = Arc::new(AtomicBool::new(false));
    let ready_clone = ready.clone();
    let consumer_queue = Arc::clone(&queue);
    let consumer_cpu = config.consumer_cpu;

    // Consumer thread
    let consumer_thread = thread::spawn(move || {
        pin_to_cpu(consumer_cpu);

        // Signal ready
        ready_clone.store(true, Ordering::Release);

        for expected in 0..iterations as Payload {
            loop {
                if let Some(value) = consumer_queue.pop() {
                    assert_eq!(value, expected, "locked queue reordered or dropped a value");
                    break;
                }
                hint::spin_loop();
            }
        }
    });

    // Wait for consumer to be ready
    while !ready.load(Ordering::Acquire) {
        hint::spin_loop();
    }

    pin_to_cpu(config.producer_cpu);

    let start = Instant::now();

    for i in 0..iterations as Payload {
        queue.push(i); // Unbounded, never fails
    }

    consumer_thread.join().expect("consumer thread panicked");
    report("locked", iterations, start.elapsed());
}

fn main() {
    rill::init_tracing();

    let config = match BenchConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("queue_bench: {err}");
            process::exit(2);
        }
    };

    println!(
        "queue_bench (iterations={}, ring slots={RING_SLOTS}):",
        config.iterations
    );
    bench_ring(&config);
    bench_locked(&config);
}
