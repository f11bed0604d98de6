pub mod client;
pub mod webhook;

pub use client::{build_client, ClientConfig, ClientError};
pub use webhook::{merge_headers, DeliveryError, DeliveryReceipt, WebhookSender};
