use crate::reconstruct::WebhookModeConfig;
use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;
use url::Url;

const ACCEPTED_STATUS_CODES: [StatusCode; 4] = [
    StatusCode::OK,
    StatusCode::CREATED,
    StatusCode::ACCEPTED,
    StatusCode::NO_CONTENT,
];

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("failed to send webhook request: {0}")]
    Request(#[from] reqwest::Error),
    #[error("non success status code: {status}{}", body_suffix(.body))]
    UnexpectedStatus { status: u16, body: Option<String> },
    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },
}

fn body_suffix(body: &Option<String>) -> String {
    match body {
        Some(body) => format!("; with body: {body}"),
        None => String::new(),
    }
}

#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    pub status_code: u16,
    pub latency: Duration,
    pub bytes_sent: usize,
}

/// Posts reconstructed payloads to the one configured destination.
#[derive(Clone)]
pub struct WebhookSender {
    client: Client,
    url: Url,
    headers: HeaderMap,
    mode: WebhookModeConfig,
}

impl WebhookSender {
    pub fn new(
        client: Client,
        url: Url,
        mode: WebhookModeConfig,
        additional_headers: &[(String, String)],
    ) -> Result<Self, DeliveryError> {
        let headers = merge_headers(&mode, additional_headers)?;
        Ok(Self {
            client,
            url,
            headers,
            mode,
        })
    }

    pub fn mode(&self) -> &WebhookModeConfig {
        &self.mode
    }

    pub async fn post(&self, payload: Bytes) -> Result<DeliveryReceipt, DeliveryError> {
        let start = Instant::now();
        let bytes_sent = payload.len();

        let response = self
            .client
            .post(self.url.clone())
            .headers(self.headers.clone())
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        let latency = start.elapsed();

        if !ACCEPTED_STATUS_CODES.contains(&status) {
            let body = response
                .text()
                .await
                .ok()
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty());

            return Err(DeliveryError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            });
        }

        debug!(
            status = status.as_u16(),
            bytes_sent,
            latency_ms = latency.as_millis() as u64,
            "Webhook delivered"
        );

        Ok(DeliveryReceipt {
            status_code: status.as_u16(),
            latency,
            bytes_sent,
        })
    }
}

impl std::fmt::Debug for WebhookSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookSender")
            .field("url", &self.url.as_str())
            .field("mode", &self.mode.mode)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Default headers, then the mode's headers, then user headers.
/// Header names are case-insensitive, so later sources replace earlier ones.
pub fn merge_headers(
    mode: &WebhookModeConfig,
    additional_headers: &[(String, String)],
) -> Result<HeaderMap, DeliveryError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        HeaderName::from_static("keep-alive"),
        HeaderValue::from_static("timeout=5, max=1000"),
    );

    let mode_headers = mode
        .headers
        .iter()
        .map(|(name, value)| (*name, *value));
    let user_headers = additional_headers
        .iter()
        .map(|(name, value)| (name.as_str(), value.as_str()));

    for (name, value) in mode_headers.chain(user_headers) {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| DeliveryError::InvalidHeader {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| DeliveryError::InvalidHeader {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}
