pub mod client;
pub mod models;

pub use client::{LedgerClient, RetryPolicy};
pub use models::ApiError;
