//! Transaction models

use serde::{Deserialize, Serialize};

/// A single transaction as returned by `GET /api/transactions`
///
/// `amount` is in minor currency units (cents) and may be negative.
/// `timestamp` is epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub amount: i64,
    pub payee: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    pub timestamp: i64,
}

/// Request body for `POST /api/transactions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub amount: i64,
    pub payee: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

#[cfg(test)]
impl NewTransaction {
    /// Build the server-side record for this payload once an id has been assigned
    pub fn into_record(self, id: String) -> TransactionRecord {
        TransactionRecord {
            id,
            amount: self.amount,
            payee: self.payee,
            memo: self.memo,
            timestamp: self.timestamp,
        }
    }
}
