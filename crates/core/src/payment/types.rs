//! Payment lifecycle types.

use serde::{Deserialize, Serialize};

/// Gateway payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Initialized, awaiting gateway confirmation.
    Pending,
    /// Confirmed by the gateway.
    Success,
    /// Rejected or abandoned at the gateway.
    Failed,
}

impl PaymentStatus {
    /// Returns the storage string for this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    /// Returns true if no further transition is allowed.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do with the local payment row after the gateway answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyAction {
    /// Mark the existing row as successful.
    MarkSuccess,
    /// Row already successful; leave it untouched.
    AlreadySettled,
    /// No local row; record a successful payment.
    CreateSuccess,
    /// Mark the existing pending row as failed.
    MarkFailed,
    /// Gateway did not confirm and there is nothing to update.
    Reject,
}
