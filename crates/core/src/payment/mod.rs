//! Gateway payments: status lifecycle, amount conversion and the gateway port.

pub mod gateway;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use gateway::{
    GatewayError, InitializeRequest, InitializeResponse, PaymentGateway, VerifyResponse,
};
pub use service::{PaymentError, PaymentService};
pub use types::{PaymentStatus, VerifyAction};
