//! Vendor payload reconstruction.
//!
//! Every supported sink is one [`WebhookMode`] variant backed by a
//! [`Reconstructor`]. Builders are pure: the same batch always yields the
//! same bytes, except for the random identifiers the Sentry envelope needs.

pub mod axiom;
pub mod betterstack;
pub mod common;
pub mod datadog;
pub mod error;
pub mod json;
pub mod loki;
pub mod papertrail;
pub mod sentry;

pub use error::SerializationError;

use crate::domain::{HttpLogRecord, LogRecord};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Two-operation interface every vendor implements.
///
/// Callers guarantee non-empty input; see [`WebhookModeConfig`] for the
/// guarded entry points.
pub trait Reconstructor: Send + Sync {
    fn deploy_batch(&self, records: &[LogRecord]) -> Result<Bytes, SerializationError>;
    fn http_batch(&self, records: &[HttpLogRecord]) -> Result<Bytes, SerializationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookMode {
    #[default]
    Json,
    Jsonl,
    Papertrail,
    Loki,
    Datadog,
    Axiom,
    Betterstack,
    Sentry,
}

impl WebhookMode {
    pub const ALL: [WebhookMode; 8] = [
        WebhookMode::Json,
        WebhookMode::Jsonl,
        WebhookMode::Papertrail,
        WebhookMode::Loki,
        WebhookMode::Datadog,
        WebhookMode::Axiom,
        WebhookMode::Betterstack,
        WebhookMode::Sentry,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WebhookMode::Json => "json",
            WebhookMode::Jsonl => "jsonl",
            WebhookMode::Papertrail => "papertrail",
            WebhookMode::Loki => "loki",
            WebhookMode::Datadog => "datadog",
            WebhookMode::Axiom => "axiom",
            WebhookMode::Betterstack => "betterstack",
            WebhookMode::Sentry => "sentry",
        }
    }

    pub fn config(self) -> WebhookModeConfig {
        match self {
            WebhookMode::Json => WebhookModeConfig {
                mode: self,
                expected_host_contains: &[],
                expected_headers: &[],
                headers: &[],
                reconstructor: &json::JsonArray,
            },
            WebhookMode::Jsonl => WebhookModeConfig {
                mode: self,
                expected_host_contains: &[],
                expected_headers: &[],
                headers: &[("Content-Type", "application/json-lines")],
                reconstructor: &json::JsonLines,
            },
            WebhookMode::Papertrail => WebhookModeConfig {
                mode: self,
                expected_host_contains: &["solarwinds"],
                expected_headers: &["Authorization"],
                // The body is JSON lines, but the intake only accepts this content type.
                headers: &[("Content-Type", "application/json")],
                reconstructor: &papertrail::Papertrail,
            },
            WebhookMode::Loki => WebhookModeConfig {
                mode: self,
                expected_host_contains: &["loki", "grafana"],
                expected_headers: &[],
                headers: &[],
                reconstructor: &loki::Loki,
            },
            WebhookMode::Datadog => WebhookModeConfig {
                mode: self,
                expected_host_contains: &["datadog"],
                expected_headers: &["DD-API-KEY", "DD-APPLICATION-KEY"],
                headers: &[],
                reconstructor: &datadog::Datadog,
            },
            WebhookMode::Axiom => WebhookModeConfig {
                mode: self,
                expected_host_contains: &["axiom"],
                expected_headers: &["Authorization"],
                headers: &[],
                reconstructor: &axiom::Axiom,
            },
            WebhookMode::Betterstack => WebhookModeConfig {
                mode: self,
                expected_host_contains: &["betterstack"],
                expected_headers: &["Authorization"],
                headers: &[],
                reconstructor: &betterstack::Betterstack,
            },
            WebhookMode::Sentry => WebhookModeConfig {
                mode: self,
                expected_host_contains: &["sentry"],
                expected_headers: &["X-Sentry-Auth"],
                headers: &[("Content-Type", "application/x-sentry-envelope")],
                reconstructor: &sentry::Sentry,
            },
        }
    }

    /// Parse a configured mode name, trimmed and case-insensitive.
    pub fn parse_lenient(value: &str) -> Option<Self> {
        let normalized = value.trim().to_lowercase();
        Self::ALL.into_iter().find(|mode| mode.as_str() == normalized)
    }
}

impl fmt::Display for WebhookMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebhookMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_lenient(s).ok_or_else(|| {
            let valid: Vec<&str> = Self::ALL.iter().map(|mode| mode.as_str()).collect();
            format!("Invalid webhook mode: {s}. Valid values: {}", valid.join(", "))
        })
    }
}

/// Startup-built description of one mode: hints for misconfiguration
/// warnings, static headers, and the payload builder.
#[derive(Clone, Copy)]
pub struct WebhookModeConfig {
    pub mode: WebhookMode,
    pub expected_host_contains: &'static [&'static str],
    pub expected_headers: &'static [&'static str],
    pub headers: &'static [(&'static str, &'static str)],
    pub reconstructor: &'static dyn Reconstructor,
}

impl WebhookModeConfig {
    pub fn reconstruct_deploy(&self, records: &[LogRecord]) -> Result<Bytes, SerializationError> {
        if records.is_empty() {
            return Err(SerializationError::EmptyBatch);
        }
        self.reconstructor.deploy_batch(records)
    }

    pub fn reconstruct_http(&self, records: &[HttpLogRecord]) -> Result<Bytes, SerializationError> {
        if records.is_empty() {
            return Err(SerializationError::EmptyBatch);
        }
        self.reconstructor.http_batch(records)
    }

    pub fn host_matches(&self, host: &str) -> bool {
        self.expected_host_contains
            .iter()
            .any(|expected| host.contains(expected))
    }

    /// Expected headers absent from `configured` (case-insensitive).
    pub fn missing_headers<'a, I>(&self, configured: I) -> Vec<&'static str>
    where
        I: IntoIterator<Item = &'a str> + Clone,
    {
        self.expected_headers
            .iter()
            .copied()
            .filter(|expected| {
                !configured
                    .clone()
                    .into_iter()
                    .any(|name| name.eq_ignore_ascii_case(expected))
            })
            .collect()
    }
}

impl fmt::Debug for WebhookModeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookModeConfig")
            .field("mode", &self.mode)
            .field("expected_host_contains", &self.expected_host_contains)
            .field("expected_headers", &self.expected_headers)
            .field("headers", &self.headers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lenient() {
        assert_eq!(WebhookMode::parse_lenient(" Sentry "), Some(WebhookMode::Sentry));
        assert_eq!(WebhookMode::parse_lenient("JSONL"), Some(WebhookMode::Jsonl));
        assert_eq!(WebhookMode::parse_lenient("splunk"), None);
        assert!("splunk".parse::<WebhookMode>().unwrap_err().contains("betterstack"));
    }

    #[test]
    fn test_every_mode_has_matching_config() {
        for mode in WebhookMode::ALL {
            assert_eq!(mode.config().mode, mode);
        }
    }

    #[test]
    fn test_empty_batches_rejected() {
        for mode in WebhookMode::ALL {
            let config = mode.config();
            assert!(matches!(
                config.reconstruct_deploy(&[]),
                Err(SerializationError::EmptyBatch)
            ));
            assert!(matches!(
                config.reconstruct_http(&[]),
                Err(SerializationError::EmptyBatch)
            ));
        }
    }

    #[test]
    fn test_host_hints() {
        let loki = WebhookMode::Loki.config();
        assert!(loki.host_matches("logs-prod-eu-west-0.grafana.net"));
        assert!(!loki.host_matches("http-intake.logs.datadoghq.com"));
        assert!(!WebhookMode::Json.config().host_matches("anything"));
    }

    #[test]
    fn test_missing_headers_case_insensitive() {
        let sentry = WebhookMode::Sentry.config();
        assert!(sentry.missing_headers(["x-sentry-auth"]).is_empty());
        assert_eq!(sentry.missing_headers(["Authorization"]), vec!["X-Sentry-Auth"]);
    }
}
