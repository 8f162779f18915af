use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod commands;
mod config;
mod models;
mod services;
mod utils;

use api::ledger::LedgerClient;
use commands::Reply;
use config::AppConfig;
use services::transaction_service::{should_redraw, PageView};
use services::TransactionFeed;

const DEFAULT_LOG_FILTER: &str = "conduit=info,reqwest=warn";

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Logs go to stderr so they don't interleave with the table on stdout
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!("💸 Starting conduit ledger...");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return;
        }
    };
    info!(
        "Using ledger API at {} ({} retries, {}ms apart)",
        config.api_base_url,
        config.retry.retries,
        config.retry.delay.as_millis()
    );

    let client = LedgerClient::with_retry(config.api_base_url.clone(), config.retry);
    let feed = TransactionFeed::new(Arc::new(client), config.feed);
    let mut events = feed.subscribe();

    {
        let feed = feed.clone();
        tokio::spawn(async move {
            if let Err(e) = feed.mount().await {
                debug!("Initial load failed: {}", e);
            }
        });
    }
    println!("Type `help` for the list of commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut view = PageView::default();

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => match commands::handle_line(&feed, &line).await {
                    Ok(Reply::Message(text)) => println!("{}", text),
                    Ok(Reply::Nothing) => {}
                    Ok(Reply::Quit) => break,
                    Err(message) => println!("❌ {}", message),
                },
                Ok(None) => {
                    debug!("Input closed");
                    break;
                }
                Err(e) => {
                    error!("Failed to read input: {}", e);
                    break;
                }
            },
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        debug!(?event, "Feed event");
                        if !should_redraw(&event) {
                            continue;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => warn!("Missed {} feed events", skipped),
                    Err(RecvError::Closed) => break,
                }
                if let Some(rendered) = view.update(&feed.snapshot().await) {
                    println!("{}", rendered);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    feed.teardown().await;
    info!("👋 Bye");
}
