use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;

use super::TransportError;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    /// FCM requires string values in the data payload; callers stringify
    /// before building the message.
    pub data: HashMap<String, String>,
}

impl PushMessage {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            data: HashMap::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.data.insert(key.into(), value.to_string());
        self
    }
}

/// Push collaborator boundary: one token, one delivery attempt. Returns the
/// provider's message id. Multicast fan-out and per-token accounting live in
/// the dispatcher, which never retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<String, TransportError>;
}

/// FCM HTTP implementation.
pub struct FcmPushTransport {
    client: Client,
    send_url: String,
    server_key: String,
}

impl FcmPushTransport {
    pub fn new(client: Client, send_url: String, server_key: String) -> Self {
        Self {
            client,
            send_url,
            server_key,
        }
    }
}

#[async_trait]
impl PushTransport for FcmPushTransport {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<String, TransportError> {
        let payload = json!({
            "message": {
                "token": token,
                "notification": {
                    "title": message.title,
                    "body": message.body,
                },
                "data": message.data,
            }
        });

        let resp = self
            .client
            .post(&self.send_url)
            .bearer_auth(&self.server_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| TransportError(format!("push endpoint unreachable: {}", e)))?;

        if !resp.status().is_success() {
            return Err(TransportError(format!(
                "push send failed for token: {}",
                resp.status()
            )));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| TransportError(format!("push response unreadable: {}", e)))?;
        let message_id = body["name"].as_str().unwrap_or_default().to_string();
        Ok(message_id)
    }
}
