//! HTTP collaborators
//!
//! The controller only talks to the ledger through [`TransactionsApi`], so tests
//! can swap the reqwest client for an in-memory implementation.

pub mod ledger;

use async_trait::async_trait;

use crate::models::{NewTransaction, TransactionRecord};
pub use ledger::ApiError;

/// The two calls the transaction feed needs from the server
#[async_trait]
pub trait TransactionsApi: Send + Sync {
    /// Fetch the full list of transactions, in whatever order the server keeps them
    async fn get_transactions(&self) -> Result<Vec<TransactionRecord>, ApiError>;

    /// Create a transaction and return the stored record
    async fn add_transaction(&self, payload: &NewTransaction) -> Result<TransactionRecord, ApiError>;
}
