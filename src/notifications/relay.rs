//! HTTP mail relay transport.
//!
//! POSTs each message as JSON to a relay endpoint (a transactional email
//! provider or an internal mail gateway) and treats any non-2xx reply as a
//! failed send.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use url::Url;

use super::{Mailer, NotificationError, NotificationResult, OutgoingEmail};
use crate::config::NotificationConfig;

pub struct RelayMailer {
    client: reqwest::Client,
    endpoint: Url,
}

impl RelayMailer {
    /// Build from `notifications.relay_url`, `relay_token` and `timeout_secs`.
    pub fn from_config(config: &NotificationConfig) -> NotificationResult<Self> {
        let raw = config
            .relay_url
            .as_deref()
            .ok_or_else(|| NotificationError::Configuration("relay_url not configured".to_string()))?;
        let endpoint = Url::parse(raw)
            .map_err(|e| NotificationError::Configuration(format!("invalid relay_url: {}", e)))?;

        let mut headers = HeaderMap::new();
        if let Some(token) = config.relay_token.as_deref().filter(|t| !t.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| NotificationError::Configuration("relay_token is not a valid header value".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NotificationError::Configuration(e.to_string()))?;

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl Mailer for RelayMailer {
    async fn send(&self, email: &OutgoingEmail) -> NotificationResult<()> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(email)
            .send()
            .await
            .map_err(|e| NotificationError::SendFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotificationError::SendFailed(format!("relay returned {}", status)));
        }

        tracing::debug!(to = %email.to, status = %status, "Email accepted by relay");
        Ok(())
    }

    fn transport(&self) -> &'static str {
        "relay"
    }
}
