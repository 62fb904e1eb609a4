//! Student balances, debtor detection and collection summaries.

pub mod service;
pub mod types;

#[cfg(test)]
mod balance_props;
#[cfg(test)]
mod tests;

pub use service::BalanceCalculator;
pub use types::{CollectionSummary, StudentBalance};
