//! Data models for the transaction feed
//!
//! `transaction` holds the wire records exchanged with the ledger API.
//! `feed` holds the controller's view state and the events it publishes.

pub mod feed;
pub mod transaction;

pub use feed::{AddTransactionState, FeedEvent, FeedSnapshot, LoadPhase};
pub use transaction::{NewTransaction, TransactionRecord};
