use tracing::debug;

use super::Reply;
use crate::services::feed_service::TransactionFeed;
use crate::services::transaction_service;

pub async fn list(feed: &TransactionFeed) -> Result<Reply, String> {
    Ok(Reply::Message(transaction_service::render_page(&feed.snapshot().await)))
}

pub async fn next(feed: &TransactionFeed) -> Result<Reply, String> {
    if feed.next_page().await {
        // The PageChanged event triggers the redraw
        Ok(Reply::Nothing)
    } else {
        Err("Already on the last page".to_string())
    }
}

pub async fn previous(feed: &TransactionFeed) -> Result<Reply, String> {
    if feed.previous_page().await {
        Ok(Reply::Nothing)
    } else {
        Err("Already on the first page".to_string())
    }
}

/// Jump to the page holding a transaction id
pub async fn find(feed: &TransactionFeed, args: &[&str]) -> Result<Reply, String> {
    let id = args
        .first()
        .ok_or("Usage: `find <transaction id>`".to_string())?;

    let page = feed
        .page_of(id)
        .await
        .ok_or_else(|| format!("Transaction `{}` not found", id))?;
    feed.go_to_page_with_transaction(id).await;

    Ok(Reply::Message(format!("Transaction `{}` is on page {}", id, page)))
}

/// Re-issue the fetch in the background; the outcome arrives as feed events
pub fn retry(feed: &TransactionFeed) -> Result<Reply, String> {
    let feed = feed.clone();
    tokio::spawn(async move {
        if let Err(e) = feed.load().await {
            debug!("Retry failed: {}", e);
        }
    });
    Ok(Reply::Message("🔄 Retrying...".to_string()))
}
