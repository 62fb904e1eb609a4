//! Payment gateway port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by a payment gateway adapter.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The gateway answered and refused the request.
    #[error("{0}")]
    Rejected(String),

    /// The gateway could not be reached.
    #[error("gateway unreachable: {0}")]
    Transport(String),

    /// The gateway answered with something unreadable.
    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),
}

/// Parameters for a checkout initialization.
#[derive(Debug, Clone, Serialize)]
pub struct InitializeRequest {
    /// Payer email.
    pub email: String,
    /// Amount in minor units.
    pub amount_minor: i64,
    /// Local payment reference.
    pub reference: String,
    /// Split-settlement subaccount of the school.
    pub subaccount: Option<String>,
    /// Where the gateway sends the payer afterwards.
    pub callback_url: Option<String>,
    /// Opaque metadata echoed back on verification.
    pub metadata: serde_json::Value,
}

/// Gateway answer to a checkout initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResponse {
    /// Hosted checkout page.
    pub authorization_url: String,
    /// Gateway access code.
    pub access_code: String,
    /// Reference, as acknowledged by the gateway.
    pub reference: String,
}

/// Gateway answer to a verification request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    /// Gateway transaction status, e.g. `success` or `abandoned`.
    pub status: String,
    /// Reference that was verified.
    pub reference: String,
    /// Amount in minor units.
    pub amount_minor: i64,
    /// Channel used, e.g. `card`.
    pub channel: Option<String>,
    /// Settlement time.
    pub paid_at: Option<DateTime<Utc>>,
    /// Human readable gateway message.
    pub message: Option<String>,
    /// Metadata passed at initialization.
    pub metadata: serde_json::Value,
    /// Full raw payload, stored for audit.
    pub raw: serde_json::Value,
}

impl VerifyResponse {
    /// Returns true if the gateway confirmed the charge.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// A hosted-checkout payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Starts a checkout.
    async fn initialize(&self, request: InitializeRequest) -> Result<InitializeResponse, GatewayError>;

    /// Looks up the outcome of a checkout.
    async fn verify(&self, reference: &str) -> Result<VerifyResponse, GatewayError>;
}
