//! Paystack-compatible hosted checkout client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, Url};
use scholaris_core::payment::{
    GatewayError, InitializeRequest, InitializeResponse, PaymentGateway, VerifyResponse,
};
use scholaris_shared::config::PaystackConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every Paystack answer wraps its payload in this envelope.
#[derive(Debug, Deserialize)]
struct Envelope {
    status: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Serialize)]
struct InitializeBody<'a> {
    email: &'a str,
    amount: i64,
    reference: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    subaccount: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback_url: Option<&'a str>,
    metadata: &'a Value,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: String,
    reference: String,
    amount: i64,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    gateway_response: Option<String>,
    #[serde(default)]
    metadata: Value,
}

/// HTTP client for a Paystack-compatible gateway.
#[derive(Debug, Clone)]
pub struct PaystackGateway {
    client: Client,
    base_url: Url,
    secret_key: String,
}

impl PaystackGateway {
    /// Builds a client with the configured timeout.
    pub fn new(config: &PaystackConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| GatewayError::Transport(format!("failed to create HTTP client: {e}")))?;
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| GatewayError::Transport(format!("invalid gateway URL: {e}")))?;

        Ok(Self {
            client,
            base_url,
            secret_key: config.secret_key.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GatewayError::Transport("gateway URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read_envelope(response: Response) -> Result<Envelope, GatewayError> {
        let http_status = response.status();
        let body = response.text().await.map_err(transport)?;

        let envelope: Envelope = serde_json::from_str(&body).map_err(|e| {
            if http_status.is_success() {
                GatewayError::InvalidResponse(e.to_string())
            } else {
                GatewayError::Rejected(format!("gateway answered {http_status}"))
            }
        })?;

        if !http_status.is_success() || !envelope.status {
            tracing::warn!(status = %http_status, message = %envelope.message, "Gateway rejected request");
            return Err(GatewayError::Rejected(envelope.message));
        }
        Ok(envelope)
    }
}

fn transport(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Transport("gateway timed out".to_string())
    } else {
        GatewayError::Transport(e.to_string())
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    async fn initialize(&self, request: InitializeRequest) -> Result<InitializeResponse, GatewayError> {
        let body = InitializeBody {
            email: &request.email,
            amount: request.amount_minor,
            reference: &request.reference,
            subaccount: request.subaccount.as_deref(),
            callback_url: request.callback_url.as_deref(),
            metadata: &request.metadata,
        };

        let response = self
            .client
            .post(self.endpoint(&["transaction", "initialize"])?)
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        let envelope = Self::read_envelope(response).await?;
        serde_json::from_value(envelope.data)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }

    async fn verify(&self, reference: &str) -> Result<VerifyResponse, GatewayError> {
        let response = self
            .client
            .get(self.endpoint(&["transaction", "verify", reference])?)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(transport)?;

        let envelope = Self::read_envelope(response).await?;
        let raw = envelope.data;
        let data: VerifyData = serde_json::from_value(raw.clone())
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        Ok(VerifyResponse {
            status: data.status,
            reference: data.reference,
            amount_minor: data.amount,
            channel: data.channel,
            paid_at: data.paid_at,
            message: data.gateway_response,
            metadata: data.metadata,
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(base_url: &str) -> PaystackGateway {
        PaystackGateway::new(&PaystackConfig {
            secret_key: "sk_test".to_string(),
            base_url: base_url.to_string(),
            callback_url: None,
            timeout_secs: 15,
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let url = gateway("https://api.paystack.co")
            .endpoint(&["transaction", "verify", "PAY_1_abc"])
            .unwrap();
        assert_eq!(url.as_str(), "https://api.paystack.co/transaction/verify/PAY_1_abc");
    }

    #[test]
    fn test_endpoint_escapes_reference() {
        let url = gateway("http://localhost:9000/")
            .endpoint(&["transaction", "verify", "a/b"])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/transaction/verify/a%2Fb");
    }

    #[test]
    fn test_verify_payload_tolerates_missing_fields() {
        let data: VerifyData = serde_json::from_value(serde_json::json!({
            "status": "abandoned",
            "reference": "PAY_1_abc",
            "amount": 500_000,
        }))
        .unwrap();
        assert_eq!(data.status, "abandoned");
        assert!(data.channel.is_none());
        assert!(data.metadata.is_null());
    }

    #[test]
    fn test_rejects_invalid_base_url() {
        let result = PaystackGateway::new(&PaystackConfig {
            base_url: "not a url".to_string(),
            ..PaystackConfig::default()
        });
        assert!(matches!(result, Err(GatewayError::Transport(_))));
    }
}
