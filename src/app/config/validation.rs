use super::headers::{has_scheme, parse_additional_headers};
use super::{Config, ConfigError, LogFormat, LogLevel};
use crate::domain::SeverityLevel;
use crate::filter::{FilterError, FilterSettings};
use crate::reconstruct::WebhookMode;
use reqwest::header::{HeaderName, HeaderValue};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Everything the service needs, checked and compiled.
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub webhook_url: Url,
    pub webhook_mode: WebhookMode,
    pub additional_headers: Vec<(String, String)>,
    pub filter: FilterSettings,
    pub report_interval: Duration,
    /// Deploy batch source, `None` when the stream is disabled.
    pub deploy_source: Option<PathBuf>,
    /// HTTP batch source, `None` when the stream is disabled.
    pub http_source: Option<PathBuf>,
    pub log_level: LogLevel,
    pub log_format: LogFormat,
}

impl RuntimeSettings {
    pub fn webhook_host(&self) -> &str {
        self.webhook_url.host_str().unwrap_or_default()
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self
            .webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ConfigError::InvalidConfig("WEBHOOK_URL is required".to_string()))?;
        normalize_url(url)?;

        if !self.enable_deploy_logs && !self.enable_http_logs {
            return Err(ConfigError::InvalidConfig(
                "At least one of deploy or http logs must be enabled".to_string(),
            ));
        }

        if self.enable_http_logs && self.http_logs_source.is_none() {
            return Err(ConfigError::InvalidConfig(
                "HTTP logs are enabled but no http logs source is configured".to_string(),
            ));
        }

        if self.report_status_every_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Status report interval must be greater than 0".to_string(),
            ));
        }

        self.min_severity()?;
        self.parsed_log_directives()?;

        for (name, value) in parse_additional_headers(&self.additional_headers)? {
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ConfigError::InvalidHeader(format!("Invalid header name '{name}': {e}"))
            })?;
            HeaderValue::from_str(&value).map_err(|e| {
                ConfigError::InvalidHeader(format!("Invalid value for header '{name}': {e}"))
            })?;
        }

        Ok(())
    }

    fn min_severity(&self) -> Result<SeverityLevel, ConfigError> {
        self.min_severity
            .parse::<SeverityLevel>()
            .map_err(|e| ConfigError::Filter(FilterError::InvalidSeverity(e)))
    }

    /// Validate, compile the filter, and emit startup misconfiguration hints.
    pub fn resolve(&self) -> Result<RuntimeSettings, ConfigError> {
        self.validate()?;

        let raw_url = self.webhook_url.as_deref().unwrap_or_default().trim();
        if !has_scheme(raw_url) {
            warn!(
                webhook_url = raw_url,
                "Webhook URL has no scheme, assuming https://"
            );
        }
        let webhook_url = normalize_url(raw_url)?;

        let webhook_mode = WebhookMode::parse_lenient(&self.webhook_mode).unwrap_or_else(|| {
            warn!(
                webhook_mode = %self.webhook_mode,
                fallback = %WebhookMode::Json,
                "Unknown webhook mode, falling back to json"
            );
            WebhookMode::Json
        });

        let additional_headers = parse_additional_headers(&self.additional_headers)?;
        let filter = FilterSettings::new(
            self.min_severity()?,
            &non_empty(&self.whitelist),
            &non_empty(&self.blacklist),
        )?;

        let settings = RuntimeSettings {
            webhook_url,
            webhook_mode,
            additional_headers,
            filter,
            report_interval: Duration::from_secs(self.report_status_every_secs),
            deploy_source: self
                .enable_deploy_logs
                .then(|| self.deploy_logs_source.clone()),
            http_source: self
                .enable_http_logs
                .then(|| self.http_logs_source.clone())
                .flatten(),
            log_level: self.log_level,
            log_format: self.log_format,
        };

        warn_on_mode_mismatch(&settings);
        Ok(settings)
    }
}

fn normalize_url(raw: &str) -> Result<Url, ConfigError> {
    let candidate = if has_scheme(raw) {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };

    let url = Url::parse(&candidate)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid webhook URL '{raw}': {e}")))?;

    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::InvalidUrl(format!(
            "Webhook URL '{raw}' has no host"
        )));
    }

    Ok(url)
}

fn non_empty(patterns: &[String]) -> Vec<&str> {
    patterns
        .iter()
        .map(|pattern| pattern.trim())
        .filter(|pattern| !pattern.is_empty())
        .collect()
}

/// Host and header hints for the active mode. Never fatal.
pub fn mode_mismatch_hints(settings: &RuntimeSettings) -> ModeHints {
    let host = settings.webhook_host().to_lowercase();
    let active = settings.webhook_mode.config();

    let host_mismatch = !active.expected_host_contains.is_empty() && !active.host_matches(&host);
    let suggested_mode = if host_mismatch || active.expected_host_contains.is_empty() {
        WebhookMode::ALL
            .into_iter()
            .filter(|mode| *mode != settings.webhook_mode)
            .find(|mode| mode.config().host_matches(&host))
    } else {
        None
    };

    let missing_headers = active.missing_headers(
        settings
            .additional_headers
            .iter()
            .map(|(name, _)| name.as_str()),
    );

    ModeHints {
        host_mismatch,
        expected_host_contains: active.expected_host_contains,
        suggested_mode,
        missing_headers,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeHints {
    pub host_mismatch: bool,
    pub expected_host_contains: &'static [&'static str],
    pub suggested_mode: Option<WebhookMode>,
    pub missing_headers: Vec<&'static str>,
}

fn warn_on_mode_mismatch(settings: &RuntimeSettings) {
    let hints = mode_mismatch_hints(settings);
    let webhook_host = settings.webhook_host();
    let webhook_mode = settings.webhook_mode.as_str();

    if hints.host_mismatch || hints.suggested_mode.is_some() {
        match hints.suggested_mode {
            Some(suggested) => warn!(
                webhook_host,
                webhook_mode,
                expected_host_contains = ?hints.expected_host_contains,
                suggested_mode = suggested.as_str(),
                "Webhook host looks like it belongs to a different mode"
            ),
            None => warn!(
                webhook_host,
                webhook_mode,
                expected_host_contains = ?hints.expected_host_contains,
                "Webhook host does not match the configured mode"
            ),
        }
    }

    if !hints.missing_headers.is_empty() {
        warn!(
            webhook_mode,
            missing_headers = ?hints.missing_headers,
            "Additional headers are missing headers this mode usually needs"
        );
    }
}
