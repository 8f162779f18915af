use thiserror::Error;
use tracing::{error, info};

use super::Reply;
use crate::models::NewTransaction;
use crate::services::feed_service::{AddTransactionError, TransactionFeed};
use crate::utils::format::{parse_amount, parse_local_timestamp};

pub const USAGE: &str = "`add <date>;<payee>;<amount>[;<memo>]`  e.g. `add 2024-05-01 09:30;Corner Cafe;-4.50;Flat white`";

/// Input problems caught before anything is sent to the server
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Usage: {}", USAGE)]
    Usage,
    #[error("Date is required")]
    DateRequired,
    #[error("Invalid date format: '{0}' (use YYYY-MM-DD or YYYY-MM-DD HH:MM)")]
    InvalidDate(String),
    #[error("Payee is required")]
    PayeeRequired,
    #[error("Amount is required")]
    AmountRequired,
    #[error("Amount must be a valid non-zero number with at most two decimals, got '{0}'")]
    InvalidAmount(String),
}

/// Parse `<date>;<payee>;<amount>[;<memo>]` into a request body
pub fn parse_payload(args: &str) -> Result<NewTransaction, ValidationError> {
    let fields: Vec<&str> = args.splitn(4, ';').map(str::trim).collect();
    if fields.len() < 3 {
        return Err(ValidationError::Usage);
    }

    let date = fields[0];
    if date.is_empty() {
        return Err(ValidationError::DateRequired);
    }
    let timestamp =
        parse_local_timestamp(date).ok_or_else(|| ValidationError::InvalidDate(date.to_string()))?;

    let payee = fields[1];
    if payee.is_empty() {
        return Err(ValidationError::PayeeRequired);
    }

    let amount_text = fields[2];
    if amount_text.is_empty() {
        return Err(ValidationError::AmountRequired);
    }
    let amount = parse_amount(amount_text)
        .filter(|&a| a != 0)
        .ok_or_else(|| ValidationError::InvalidAmount(amount_text.to_string()))?;

    let memo = fields
        .get(3)
        .filter(|m| !m.is_empty())
        .map(|m| m.to_string());

    Ok(NewTransaction {
        amount,
        payee: payee.to_string(),
        timestamp,
        memo,
    })
}

/// Validate the input, then run the add flow in the background
///
/// The result shows up through feed events (new highlight or add error).
pub fn execute(feed: &TransactionFeed, args: &str) -> Result<Reply, String> {
    let payload = parse_payload(args).map_err(|e| e.to_string())?;
    let payee = payload.payee.clone();

    let feed = feed.clone();
    tokio::spawn(async move {
        match feed.add_transaction(payload).await {
            Ok(record) => info!("Transaction {} added for {}", record.id, record.payee),
            Err(AddTransactionError::Submit(e)) => error!("Could not add transaction: {}", e),
            Err(e) => error!("{}", e),
        }
    });

    Ok(Reply::Message(format!("⏳ Submitting transaction for {}...", payee)))
}
