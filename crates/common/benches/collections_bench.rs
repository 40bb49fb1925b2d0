//! Keyed queue benchmarks
//!
//! Run with: `cargo bench --bench collections_bench -p orderly-common`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use orderly_common::collections::KeyedQueue;
use orderly_common::{AlphanumericSequence, CacheKey};

// ============================================================================
// KeyedQueue Benchmarks
// ============================================================================

fn bench_keyed_queue_enqueue_dequeue(c: &mut Criterion) {
    let mut group = c.benchmark_group("keyed_queue_enqueue_dequeue");

    for size in [100, 1000, 10_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut queue = KeyedQueue::with_capacity(size);
                for i in 0..size {
                    queue.enqueue(i, i).unwrap();
                }
                while let Ok(item) = queue.dequeue() {
                    black_box(item);
                }
            });
        });
    }

    group.finish();
}

fn bench_keyed_queue_promote(c: &mut Criterion) {
    let mut group = c.benchmark_group("keyed_queue_promote");

    for size in [100, 1000, 10_000] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let mut queue = KeyedQueue::with_capacity(size);
            for i in 0..size {
                queue.enqueue(i, i).unwrap();
            }
            b.iter(|| {
                // Always promote the current head, the worst case for relinking.
                let head = *queue.peek().unwrap().0;
                black_box(queue.promote(&black_box(head)).unwrap());
            });
        });
    }

    group.finish();
}

fn bench_keyed_queue_lru_workload(c: &mut Criterion) {
    let mut group = c.benchmark_group("keyed_queue_lru_workload");
    let capacity = 100;

    group.bench_function("hit_or_evict", |b| {
        let mut queue: KeyedQueue<CacheKey, u64> = KeyedQueue::with_capacity(capacity + 1);
        let mut counter = 0u64;
        b.iter(|| {
            // Skewed access: most requests fall in a hot set smaller than capacity.
            let id = if counter % 10 < 8 { counter % 50 } else { counter % 1000 };
            let key = CacheKey::from(id as i64);
            if queue.has_key(&key) {
                black_box(queue.promote(&key).unwrap());
            } else {
                queue.enqueue(key, id).unwrap();
                if queue.len() > capacity {
                    black_box(queue.dequeue().unwrap());
                }
            }
            counter = counter.wrapping_add(1);
        });
    });

    group.finish();
}

fn bench_sequence_keys(c: &mut Criterion) {
    c.bench_function("alphanumeric_sequence_next_key", |b| {
        let mut keys = AlphanumericSequence::new();
        b.iter(|| black_box(keys.next_key()));
    });
}

criterion_group!(
    keyed_queue,
    bench_keyed_queue_enqueue_dequeue,
    bench_keyed_queue_promote,
    bench_keyed_queue_lru_workload
);

criterion_group!(sequence, bench_sequence_keys);

criterion_main!(keyed_queue, sequence);
