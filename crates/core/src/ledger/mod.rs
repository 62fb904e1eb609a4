//! Payment ledger aggregation across the gateway and manual channels.

pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use service::PaymentLedger;
pub use types::{
    GatewayReceipt, ManualReceipt, PaidTotals, PaymentMethod, TransactionType,
};
