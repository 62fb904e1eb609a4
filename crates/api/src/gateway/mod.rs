//! Payment gateway adapters.

pub mod paystack;

pub use paystack::PaystackGateway;
