pub mod feed_service;
pub mod refresh_service;
pub mod transaction_service;
pub mod transaction_store;

#[cfg(test)]
pub mod test_support;

pub use feed_service::TransactionFeed;
