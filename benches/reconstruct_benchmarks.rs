use chrono::{Duration, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rail_log_forwarder::domain::{HttpLogRecord, LogRecord, Metadata, SeverityLevel};
use rail_log_forwarder::filter::{FilterSettings, classify};
use rail_log_forwarder::reconstruct::WebhookMode;
use serde_json::json;

fn metadata(index: usize) -> Metadata {
    [
        ("service_id", format!("svc-{}", index % 4)),
        ("service_name", "api".to_string()),
        ("environment_name", "production".to_string()),
        ("deployment_id", "dep-1".to_string()),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value))
    .collect()
}

fn deploy_records(count: usize) -> Vec<LogRecord> {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    (0..count)
        .map(|i| LogRecord {
            timestamp: start + Duration::milliseconds(i as i64),
            message: match i % 3 {
                0 => format!("\x1b[32mINFO\x1b[0m request {i} served"),
                1 => format!("WARN slow query {i}"),
                _ => format!("worker {i} finished"),
            },
            severity: String::new(),
            metadata: metadata(i),
        })
        .collect()
}

fn http_records(count: usize) -> Vec<HttpLogRecord> {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    (0..count)
        .map(|i| HttpLogRecord {
            timestamp: start + Duration::milliseconds(i as i64),
            path: format!("/api/items/{i}"),
            status_code: [200, 404, 503][i % 3],
            log: json!({"method": "GET", "totalDuration": i, "edgeRegion": "us-west1"}),
            metadata: metadata(i),
        })
        .collect()
}

fn benchmark_reconstruct_deploy(c: &mut Criterion) {
    let records = deploy_records(100);
    let mut group = c.benchmark_group("reconstruct_deploy");
    group.throughput(Throughput::Elements(records.len() as u64));

    for mode in WebhookMode::ALL {
        let config = mode.config();
        group.bench_with_input(BenchmarkId::from_parameter(mode), &records, |b, records| {
            b.iter(|| config.reconstruct_deploy(std::hint::black_box(records)));
        });
    }

    group.finish();
}

fn benchmark_reconstruct_http(c: &mut Criterion) {
    let records = http_records(100);
    let mut group = c.benchmark_group("reconstruct_http");
    group.throughput(Throughput::Elements(records.len() as u64));

    for mode in WebhookMode::ALL {
        let config = mode.config();
        group.bench_with_input(BenchmarkId::from_parameter(mode), &records, |b, records| {
            b.iter(|| config.reconstruct_http(std::hint::black_box(records)));
        });
    }

    group.finish();
}

fn benchmark_classify_and_filter(c: &mut Criterion) {
    let records = deploy_records(100);
    let filter =
        FilterSettings::new(SeverityLevel::Info, &["request", "query"], &["healthcheck"]).unwrap();

    c.bench_function("classify", |b| {
        b.iter(|| {
            for record in &records {
                std::hint::black_box(classify(&record.message, &record.severity));
            }
        });
    });

    c.bench_function("filter_retain", |b| {
        b.iter(|| filter.retain(std::hint::black_box(records.clone())));
    });
}

criterion_group!(
    benches,
    benchmark_reconstruct_deploy,
    benchmark_reconstruct_http,
    benchmark_classify_and_filter
);
criterion_main!(benches);
