use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::TransportError;

/// Outbound email message. `from` defaults to the configured sender when the
/// dispatcher builds it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
    pub from: String,
    pub to: Vec<String>,
}

/// Email collaborator boundary. Either the message was handed off or a
/// transport error is returned; delivery receipts are not modeled.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), TransportError>;
}

/// Posts messages as JSON to an HTTP mail relay.
pub struct HttpEmailTransport {
    client: Client,
    relay_url: String,
}

impl HttpEmailTransport {
    pub fn new(client: Client, relay_url: String) -> Self {
        Self { client, relay_url }
    }
}

#[async_trait]
impl EmailTransport for HttpEmailTransport {
    async fn send(&self, message: &EmailMessage) -> Result<(), TransportError> {
        let resp = self
            .client
            .post(&self.relay_url)
            .json(message)
            .send()
            .await
            .map_err(|e| TransportError(format!("email relay unreachable: {}", e)))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(TransportError(format!(
                "email relay rejected message: {}",
                resp.status()
            )))
        }
    }
}
