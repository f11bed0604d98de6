use chrono::{Duration, TimeZone, Utc};
use rail_log_forwarder::domain::{HttpLogRecord, LogRecord, Metadata};
use rail_log_forwarder::reconstruct::{SerializationError, WebhookMode};
use serde_json::{Value, json};

fn metadata(pairs: &[(&str, &str)]) -> Metadata {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

fn deploy_error() -> LogRecord {
    LogRecord {
        timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        message: "\x1b[31mERROR\x1b[0m disk full".to_string(),
        severity: String::new(),
        metadata: metadata(&[("service_id", "abc"), ("service_name", "api")]),
    }
}

fn deploy_info() -> LogRecord {
    LogRecord {
        timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 1).unwrap() + Duration::milliseconds(500),
        message: "booting".to_string(),
        severity: "info".to_string(),
        metadata: metadata(&[("service_id", "abc"), ("service_name", "api")]),
    }
}

fn http(second: u32, path: &str, status_code: u16, log: Value) -> HttpLogRecord {
    HttpLogRecord {
        timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, second).unwrap(),
        path: path.to_string(),
        status_code,
        log,
        metadata: metadata(&[("service_id", "abc")]),
    }
}

fn http_batch() -> Vec<HttpLogRecord> {
    vec![
        http(0, "/health", 200, json!({"method": "GET", "duration": 12})),
        http(2, "/users", 404, json!({"method": "POST"})),
        http(3, "/boom", 503, json!({})),
    ]
}

fn deploy_payload(mode: WebhookMode, records: &[LogRecord]) -> String {
    let bytes = mode.config().reconstruct_deploy(records).unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn http_payload(mode: WebhookMode, records: &[HttpLogRecord]) -> String {
    let bytes = mode.config().reconstruct_http(records).unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[test]
fn test_json_golden() {
    assert_eq!(
        deploy_payload(WebhookMode::Json, &[deploy_error()]),
        r#"[{"timestamp":"2024-05-01T12:00:00Z","message":"ERROR disk full","severity":"","level":"error","_metadata":{"service_id":"abc","service_name":"api"}}]"#
    );
    assert_eq!(
        http_payload(WebhookMode::Json, &http_batch()[..1]),
        r#"[{"_metadata":{"service_id":"abc"},"duration":12,"level":"info","method":"GET","path":"/health","status_code":200,"timestamp":"2024-05-01T12:00:00Z"}]"#
    );
}

#[test]
fn test_jsonl_http_batch_is_one_line_per_record() {
    let payload = http_payload(WebhookMode::Jsonl, &http_batch());

    assert!(payload.ends_with('\n'));
    let lines: Vec<&str> = payload.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(payload.matches('\n').count(), 3);

    let paths: Vec<Value> = lines
        .iter()
        .map(|line| serde_json::from_str::<Value>(line).unwrap()["path"].clone())
        .collect();
    assert_eq!(paths, vec![json!("/health"), json!("/users"), json!("/boom")]);
}

#[test]
fn test_jsonl_deploy_golden() {
    assert_eq!(
        deploy_payload(WebhookMode::Jsonl, &[deploy_info()]),
        concat!(
            r#"{"timestamp":"2024-05-01T12:00:01.500Z","message":"booting","severity":"info","level":"info","_metadata":{"service_id":"abc","service_name":"api"}}"#,
            "\n"
        )
    );
}

#[test]
fn test_papertrail_golden() {
    assert_eq!(
        deploy_payload(WebhookMode::Papertrail, &[deploy_error()]),
        concat!(
            r#"{"timestamp":"2024-05-01T12:00:00Z","hostname":"api","program":"deploy","severity":"error","message":"ERROR disk full","_metadata":{"service_id":"abc","service_name":"api"}}"#,
            "\n"
        )
    );
    assert_eq!(
        http_payload(WebhookMode::Papertrail, &http_batch()[1..2]),
        concat!(
            r#"{"timestamp":"2024-05-01T12:00:02Z","hostname":"abc","program":"http","severity":"warn","message":"/users","status_code":404,"log":{"method":"POST"},"_metadata":{"service_id":"abc"}}"#,
            "\n"
        )
    );
}

#[test]
fn test_loki_golden() {
    assert_eq!(
        deploy_payload(WebhookMode::Loki, &[deploy_error(), deploy_info()]),
        concat!(
            r#"{"streams":["#,
            r#"{"stream":{"level":"error","service_id":"abc","service_name":"api"},"values":[["1714564800000000000","ERROR disk full"]]},"#,
            r#"{"stream":{"level":"info","service_id":"abc","service_name":"api"},"values":[["1714564801500000000","booting"]]}"#,
            r#"]}"#
        )
    );
}

#[test]
fn test_loki_http_groups_by_status_code() {
    let mut batch = http_batch();
    batch.push(http(4, "/health", 200, json!({})));

    let payload: Value = serde_json::from_str(&http_payload(WebhookMode::Loki, &batch)).unwrap();
    let streams = payload["streams"].as_array().unwrap();

    assert_eq!(streams.len(), 3);
    assert_eq!(streams[0]["stream"]["status_code"], "200");
    assert_eq!(streams[0]["values"].as_array().unwrap().len(), 2);
    assert_eq!(streams[1]["stream"]["status_code"], "404");

    let line: Value = serde_json::from_str(streams[2]["values"][0][1].as_str().unwrap()).unwrap();
    assert_eq!(line["path"], "/boom");
    assert_eq!(line["level"], "error");
}

#[test]
fn test_datadog_golden() {
    assert_eq!(
        deploy_payload(WebhookMode::Datadog, &[deploy_error()]),
        r#"[{"ddsource":"railway","ddtags":"service_id:abc,service_name:api","hostname":"api","service":"api","status":"error","message":"ERROR disk full","timestamp":1714564800000}]"#
    );
    assert_eq!(
        http_payload(WebhookMode::Datadog, &http_batch()[2..]),
        r#"[{"ddsource":"railway","ddtags":"service_id:abc","hostname":"abc","service":"abc","status":"error","message":"/boom","timestamp":1714564803000,"http":{"url_details":{"path":"/boom"},"status_code":503},"attributes":{}}]"#
    );
}

#[test]
fn test_axiom_golden() {
    assert_eq!(
        deploy_payload(WebhookMode::Axiom, &[deploy_info()]),
        r#"[{"_time":"2024-05-01T12:00:01.500Z","message":"booting","level":"info","_metadata":{"service_id":"abc","service_name":"api"}}]"#
    );
    assert_eq!(
        http_payload(WebhookMode::Axiom, &http_batch()[..1]),
        r#"[{"_time":"2024-05-01T12:00:00Z","path":"/health","status_code":200,"level":"info","log":{"duration":12,"method":"GET"},"_metadata":{"service_id":"abc"}}]"#
    );
}

#[test]
fn test_betterstack_golden() {
    assert_eq!(
        deploy_payload(WebhookMode::Betterstack, &[deploy_error()]),
        r#"[{"dt":"2024-05-01T12:00:00Z","message":"ERROR disk full","level":"error","_metadata":{"service_id":"abc","service_name":"api"}}]"#
    );
    assert_eq!(
        http_payload(WebhookMode::Betterstack, &http_batch()[1..2]),
        r#"[{"dt":"2024-05-01T12:00:02Z","message":"/users","level":"warn","status_code":404,"log":{"method":"POST"},"_metadata":{"service_id":"abc"}}]"#
    );
}

fn sentry_lines(payload: &str) -> Vec<Value> {
    payload
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_sentry_deploy_envelope() {
    let record = LogRecord {
        metadata: metadata(&[("service_id", "abc")]),
        ..deploy_error()
    };
    let payload = deploy_payload(WebhookMode::Sentry, &[record]);
    assert!(payload.ends_with('\n'));

    let lines = sentry_lines(&payload);
    assert_eq!(lines.len(), 3);

    let (header, item, event) = (&lines[0], &lines[1], &lines[2]);
    assert_eq!(header["event_id"], event["event_id"]);
    assert_eq!(header["event_id"].as_str().unwrap().len(), 32);
    assert_eq!(header["sent_at"], "2024-05-01T12:00:00Z");
    assert_eq!(item, &json!({"type": "event", "item_count": 1, "content_type": "application/json"}));

    assert_eq!(event["tags"], json!({"service_id": "abc"}));
    assert_eq!(event["fingerprint"], json!(["{{ default }}", "abc"]));
    assert_eq!(event["message"], "ERROR disk full");
    assert_eq!(event["level"], "error");
    assert_eq!(event["server_name"], "abc");
    assert_eq!(event["environment"], "production");
}

#[test]
fn test_sentry_without_service_id_has_no_fingerprint() {
    let record = LogRecord {
        metadata: metadata(&[("environment_name", "staging")]),
        ..deploy_info()
    };
    let lines = sentry_lines(&deploy_payload(WebhookMode::Sentry, &[record]));

    assert!(lines[2].get("fingerprint").is_none());
    assert_eq!(lines[2]["environment"], "staging");
    assert_eq!(lines[2]["server_name"], "unknown");
    assert_eq!(lines[2]["tags"], json!({}));
}

#[test]
fn test_sentry_http_envelope_per_record() {
    let lines = sentry_lines(&http_payload(WebhookMode::Sentry, &http_batch()));
    assert_eq!(lines.len(), 9);

    let expected = [("info", 9, "/health"), ("warning", 13, "/users"), ("error", 17, "/boom")];
    for (triplet, (level, number, path)) in lines.chunks(3).zip(expected) {
        assert_eq!(
            triplet[1]["content_type"],
            "application/vnd.sentry.items.log+json"
        );
        let item = &triplet[2]["items"][0];
        assert_eq!(item["level"], level);
        assert_eq!(item["severity_number"], number);
        assert_eq!(item["body"], path);
        assert_eq!(
            item["attributes"]["_metadata__service_id"],
            json!({"value": "abc", "type": "string"})
        );
    }

    let first = &lines[2]["items"][0]["attributes"];
    assert_eq!(first["duration"], json!({"value": 12, "type": "integer"}));
    assert_eq!(first["method"], json!({"value": "GET", "type": "string"}));
}

/// Blank out the random identifiers so payloads can be compared.
fn without_ids(payload: &str) -> Vec<Value> {
    sentry_lines(payload)
        .into_iter()
        .map(|mut line| {
            for key in ["event_id", "trace_id"] {
                if line.get(key).is_some() {
                    line[key] = Value::Null;
                }
            }
            if let Some(items) = line.get_mut("items").and_then(Value::as_array_mut) {
                for item in items {
                    item["trace_id"] = Value::Null;
                }
            }
            line
        })
        .collect()
}

#[test]
fn test_reconstruction_is_idempotent() {
    let deploy = vec![deploy_error(), deploy_info()];
    let http = http_batch();

    for mode in WebhookMode::ALL {
        let config = mode.config();
        let first_deploy = config.reconstruct_deploy(&deploy).unwrap();
        let second_deploy = config.reconstruct_deploy(&deploy).unwrap();
        let first_http = config.reconstruct_http(&http).unwrap();
        let second_http = config.reconstruct_http(&http).unwrap();

        if mode == WebhookMode::Sentry {
            let text = |bytes: &bytes::Bytes| String::from_utf8(bytes.to_vec()).unwrap();
            assert_eq!(without_ids(&text(&first_deploy)), without_ids(&text(&second_deploy)));
            assert_eq!(without_ids(&text(&first_http)), without_ids(&text(&second_http)));
        } else {
            assert_eq!(first_deploy, second_deploy, "mode {mode}");
            assert_eq!(first_http, second_http, "mode {mode}");
        }
    }
}

#[test]
fn test_empty_batches_are_rejected() {
    for mode in WebhookMode::ALL {
        assert!(matches!(
            mode.config().reconstruct_deploy(&[]),
            Err(SerializationError::EmptyBatch)
        ));
        assert!(matches!(
            mode.config().reconstruct_http(&[]),
            Err(SerializationError::EmptyBatch)
        ));
    }
}
