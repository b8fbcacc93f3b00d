//! Aggregator Benchmarks
//!
//! Measures the overhead the aggregator adds on top of its sources:
//! - Current token composition with null and in-memory sources
//! - Concurrent vs sequential fan-out
//! - New events collection for one user
//!
//! Run with: `cargo bench`

#![allow(missing_docs)] // Benchmarks don't need extensive docs
#![allow(clippy::expect_used)] // Benchmarks can use expect for setup

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use event_sources_core::{EventsKey, PresenceKey, SourceName, StreamEvent, StreamToken, UserId};
use event_sources_runtime::registry::NullSources;
use event_sources_runtime::{EventSources, EventSourcesConfig, FanOut};
use event_sources_testing::InMemoryStreamSource;
use serde_json::json;
use std::sync::Arc;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build runtime")
}

fn in_memory(fan_out: FanOut, events: u64) -> EventSources {
    let user = UserId::new("@bench:example.org");
    let room = InMemoryStreamSource::<EventsKey>::new(SourceName::Room);
    let presence = InMemoryStreamSource::<PresenceKey>::new(SourceName::Presence);

    for n in 0..events {
        let message = StreamEvent::new("m.room.message", user.clone(), json!({ "n": n }));
        room.append(message).expect("Cursor space exhausted");

        if n % 4 == 0 {
            let online =
                StreamEvent::new("m.presence", user.clone(), json!({ "presence": "online" }));
            presence.append(online).expect("Cursor space exhausted");
        }
    }

    EventSources::builder()
        .room(Arc::new(room))
        .presence(Arc::new(presence))
        .config(EventSourcesConfig::builder().fan_out(fan_out).build())
        .build()
        .expect("Both sources registered")
}

fn benchmark_current_token(c: &mut Criterion) {
    let mut group = c.benchmark_group("current_token");
    group.throughput(Throughput::Elements(1));
    let runtime = runtime();

    group.bench_function("null_sources", |b| {
        let sources = EventSources::new(&NullSources, EventSourcesConfig::default());

        b.to_async(&runtime).iter(|| async {
            let _ = black_box(sources.get_current_token().await);
        });
    });

    let modes = [
        ("concurrent", FanOut::Concurrent),
        ("sequential", FanOut::Sequential),
    ];

    for (label, fan_out) in modes {
        group.bench_function(format!("in_memory_{label}"), |b| {
            let sources = in_memory(fan_out, 1_000);

            b.to_async(&runtime).iter(|| async {
                let _ = black_box(sources.get_current_token().await);
            });
        });
    }

    group.finish();
}

fn benchmark_new_events(c: &mut Criterion) {
    let mut group = c.benchmark_group("new_events");
    let runtime = runtime();
    let user = UserId::new("@bench:example.org");

    for limit in [10_usize, 100] {
        group.throughput(Throughput::Elements(limit as u64));
        group.bench_function(format!("limit_{limit}"), |b| {
            let sources = in_memory(FanOut::Concurrent, 1_000);

            b.to_async(&runtime).iter(|| async {
                let _ = black_box(
                    sources
                        .get_new_events_for_user(&user, StreamToken::START, limit)
                        .await,
                );
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_current_token, benchmark_new_events);
criterion_main!(benches);
