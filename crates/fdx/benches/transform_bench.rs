//! 🏎️ transform_bench — how fast can a city's worth of eateries go from payload to index?
//!
//! Runs a full `run_ingest` against the in-memory source and engine, so the
//! numbers cover parse + transform + accumulate + NDJSON compose + the fake
//! engine's bulk parsing. No network, no disk. 🦆

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use fdx::InMemorySourceConfig;
use fdx::app_config::{AppConfig, EngineConfig, IngestConfig, SourceConfig};
use serde_json::{Value, json};

const AMENITIES: [&str; 7] = ["restaurant", "cafe", "fast_food", "bar", "pub", "ice_cream", "parking"];

/// 🗺️ A payload that looks like the real thing: mostly nodes, some ways with a
/// center, a few that get rejected for one reason or another.
fn synthetic_payload(n: usize) -> String {
    let elements: Vec<Value> = (0..n)
        .map(|i| {
            let amenity = AMENITIES[i % AMENITIES.len()];
            if i % 5 == 0 {
                json!({
                    "id": i, "type": "way",
                    "center": { "lat": 37.70 + (i % 1000) as f64 * 1e-4, "lon": -122.50 + (i % 700) as f64 * 1e-4 },
                    "tags": { "amenity": amenity, "name": format!("Place {i}"), "cuisine": "pizza;italian" }
                })
            } else {
                json!({
                    "id": i, "type": "node",
                    "lat": 37.70 + (i % 1000) as f64 * 1e-4, "lon": -122.50 + (i % 700) as f64 * 1e-4,
                    "timestamp": "2024-03-01T12:00:00Z",
                    "tags": {
                        "amenity": amenity, "name": format!("Place {i}"), "cuisine": "burger",
                        "addr:street": "Valencia Street", "addr:postcode": "94110"
                    }
                })
            }
        })
        .collect();
    json!({ "elements": elements }).to_string()
}

fn bench_ingest(c: &mut Criterion) {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => panic!("💀 could not start a tokio runtime for the bench: {err}"),
    };

    let mut group = c.benchmark_group("ingest");
    for n in [1_000usize, 10_000] {
        let payload = synthetic_payload(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &payload, |b, payload| {
            b.to_async(&runtime).iter(|| async {
                let app_config = AppConfig {
                    source_config: Some(SourceConfig::InMemory(InMemorySourceConfig {
                        payload: payload.clone(),
                    })),
                    engine_config: EngineConfig::InMemory,
                    ingest: IngestConfig::default(),
                };
                fdx::run_ingest(app_config).await
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_ingest);
criterion_main!(benches);
