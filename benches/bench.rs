use std::{hint::black_box, time::Duration};

use aws_helpers::{
    api::sqs::message_size,
    batch::{Backoff, BatchPolicy, BatchResponse, partition, partition_weighted, submit_batches},
    paginate::{Page, paginate},
    types::sqs::SendMessageEntry,
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

fn bench_partition(c: &mut Criterion) {
    let mut group = c.benchmark_group("partition");
    group.measurement_time(Duration::from_secs(3));

    for size in [100usize, 10_000] {
        let items: Vec<u64> = (0..size as u64).collect();
        group.bench_with_input(BenchmarkId::new("count", size), &items, |b, input| {
            b.iter(|| {
                let batches = partition(black_box(input.iter()), 25).expect("size is valid");
                black_box(batches.count());
            });
        });
    }

    let messages: Vec<SendMessageEntry> = (0..1_000)
        .map(|i| SendMessageEntry::new("x".repeat(100 + (i % 7) * 5_000)))
        .collect();
    group.bench_function("sqs_weighted", |b| {
        b.iter(|| {
            let batches = partition_weighted(black_box(messages.iter()), 10, 262_144, |m| {
                message_size(m)
            })
            .expect("limits are valid");
            black_box(batches.count());
        });
    });

    group.finish();
}

fn bench_backoff(c: &mut Criterion) {
    let backoffs = [
        ("linear", Backoff::linear(Duration::from_millis(50), Duration::from_secs(5))),
        (
            "exponential",
            Backoff::exponential(Duration::from_millis(50), Duration::from_secs(5)),
        ),
    ];

    let mut group = c.benchmark_group("backoff");
    for (label, backoff) in backoffs {
        group.bench_function(label, |b| {
            b.iter(|| {
                for attempt in 1..=32 {
                    black_box(backoff.delay(black_box(attempt)));
                }
            });
        });
    }
    group.finish();
}

fn bench_submit(c: &mut Criterion) {
    let policy = BatchPolicy::builder()
        .batch_size(25)
        .max_attempts(3)
        .backoff(Backoff::None)
        .build()
        .expect("policy is valid");

    c.bench_function("submit_batches/half_unprocessed_once", |b| {
        b.iter(|| {
            let mut first = true;
            let batches = partition(0..1_000u32, policy.batch_size()).expect("size is valid");
            let output = submit_batches(batches, &policy, |mut batch| {
                let retry = if first {
                    batch.split_off(batch.len() / 2)
                } else {
                    Vec::new()
                };
                first = !first;
                Ok(BatchResponse::<u32, u32>::new(batch, retry))
            })
            .expect("fake submit never fails");
            black_box(output);
        });
    });
}

fn bench_paginate(c: &mut Criterion) {
    c.bench_function("paginate/100_pages", |b| {
        b.iter(|| {
            let total = paginate(|cursor: Option<String>| {
                let page = cursor.map_or(0, |c| c.parse::<u32>().unwrap_or(0));
                let next = (page + 1 < 100).then(|| (page + 1).to_string());
                Ok(Page::new(vec![page; 50], next))
            })
            .filter_map(Result::ok)
            .count();
            black_box(total);
        });
    });
}

criterion_group!(
    benches,
    bench_partition,
    bench_backoff,
    bench_submit,
    bench_paginate
);
criterion_main!(benches);
