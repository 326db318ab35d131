//! Criterion benchmarks for the request cycle.
//!
//! Each iteration builds a fresh runtime, runs one exchange and tears the
//! runtime down again, so the numbers are the per-invocation overhead a
//! function host pays on top of the application itself.
//!
//! Run with:
//! ```bash
//! cargo bench --package sluice-adapter --bench cycle_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sluice_adapter::application::{app_fn, Adapter, Entrypoint, RequestCycle};
use sluice_adapter::domain::{AdapterConfig, HostRequest};
use sluice_core::{header, HttpScope, Message};

// ── Application fixtures ──────────────────────────────────────────────────────

/// Echoes the request body back in `chunks` equal pieces.
fn chunked_echo(chunks: usize) -> Entrypoint {
    Entrypoint::v3(app_fn(move |_scope, receive, send| async move {
        let body = match receive.receive().await? {
            Message::HttpRequest { body, .. } => body,
            other => anyhow::bail!("unexpected {}", other.message_type()),
        };
        send.send(Message::response_start(
            200,
            vec![header("content-type", "application/octet-stream")],
        ))
        .await?;
        let size = (body.len() / chunks).max(1);
        let mut pieces = body.chunks(size).peekable();
        while let Some(piece) = pieces.next() {
            let more = pieces.peek().is_some();
            send.send(Message::response_body(piece.to_vec(), more)).await?;
        }
        anyhow::Ok(())
    }))
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_single_chunk_cycle(c: &mut Criterion) {
    let app = chunked_echo(1);
    c.bench_function("cycle/single_chunk", |b| {
        b.iter(|| {
            RequestCycle::new(HttpScope::new("POST", "/"))
                .run(&app, black_box(b"hello".to_vec()))
                .unwrap()
        })
    });
}

fn bench_chunk_count_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("cycle/chunks");
    let body = vec![0u8; 64 * 1024];
    group.throughput(Throughput::Bytes(body.len() as u64));

    for chunks in [1usize, 16, 256] {
        let app = chunked_echo(chunks);
        group.bench_with_input(BenchmarkId::from_parameter(chunks), &chunks, |b, _| {
            b.iter(|| {
                RequestCycle::new(HttpScope::new("POST", "/"))
                    .run(&app, black_box(body.clone()))
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_adapter_handle(c: &mut Criterion) {
    let config = AdapterConfig {
        lifespan: false,
        ..AdapterConfig::default()
    };
    let adapter = Adapter::new(chunked_echo(1), config).unwrap();
    let request = HostRequest::new("POST", "https://example.com/items?page=1")
        .with_header("content-type", "text/plain")
        .with_body(b"payload".to_vec());

    c.bench_function("adapter/handle", |b| {
        b.iter(|| adapter.handle(black_box(&request)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_single_chunk_cycle,
    bench_chunk_count_scaling,
    bench_adapter_handle,
);
criterion_main!(benches);
