//! Transaction feed controller
//!
//! [`TransactionFeed`] owns the transaction store and the add-transaction
//! state. Every mutation goes through it, and each change is announced on a
//! broadcast channel so a front-end knows when to redraw.
//!
//! Fetches are serialized behind `fetch_gate`: explicit loads queue on it,
//! scheduled refreshes skip when it is taken. Results that land after
//! [`TransactionFeed::teardown`] are dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::refresh_service::RefreshScheduler;
use super::transaction_store::TransactionStore;
use crate::api::{ApiError, TransactionsApi};
use crate::config::FeedConfig;
use crate::models::{AddTransactionState, FeedEvent, FeedSnapshot, NewTransaction, TransactionRecord};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum AddTransactionError {
    /// The POST failed; nothing else was touched
    #[error("Failed to add transaction: {0}")]
    Submit(#[source] ApiError),
    /// The record was created but the follow-up refresh failed
    #[error("Transaction {} was added but the list could not be refreshed: {source}", .record.id)]
    Refresh {
        record: Box<TransactionRecord>,
        #[source]
        source: ApiError,
    },
}

struct FeedState {
    store: TransactionStore,
    add: AddTransactionState,
}

#[derive(Default)]
struct FeedTimers {
    refresh: Option<RefreshScheduler>,
    highlight: Option<JoinHandle<()>>,
}

struct FeedInner {
    api: Arc<dyn TransactionsApi>,
    config: FeedConfig,
    state: Mutex<FeedState>,
    fetch_gate: Mutex<()>,
    timers: Mutex<FeedTimers>,
    events: broadcast::Sender<FeedEvent>,
    torn_down: AtomicBool,
}

/// Cloneable handle to the feed controller
#[derive(Clone)]
pub struct TransactionFeed {
    inner: Arc<FeedInner>,
}

/// Non-owning handle used by background tasks so they never keep the feed alive
#[derive(Clone)]
pub struct WeakTransactionFeed {
    inner: Weak<FeedInner>,
}

impl WeakTransactionFeed {
    pub fn upgrade(&self) -> Option<TransactionFeed> {
        self.inner.upgrade().map(|inner| TransactionFeed { inner })
    }
}

impl TransactionFeed {
    pub fn new(api: Arc<dyn TransactionsApi>, config: FeedConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        TransactionFeed {
            inner: Arc::new(FeedInner {
                api,
                config,
                state: Mutex::new(FeedState {
                    store: TransactionStore::new(config.page_size),
                    add: AddTransactionState::default(),
                }),
                fetch_gate: Mutex::new(()),
                timers: Mutex::new(FeedTimers::default()),
                events,
                torn_down: AtomicBool::new(false),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakTransactionFeed {
        WeakTransactionFeed {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Receive change events. Re-read [`snapshot`](Self::snapshot) after each one.
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.inner.events.subscribe()
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.torn_down.load(Ordering::SeqCst)
    }

    fn publish(&self, event: FeedEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }

    /// Copy out everything a renderer needs
    pub async fn snapshot(&self) -> FeedSnapshot {
        let state = self.inner.state.lock().await;
        let store = &state.store;
        FeedSnapshot {
            page_items: store.current_page_items().to_vec(),
            current_page: store.current_page(),
            total_pages: store.total_pages(),
            total_items: store.len(),
            phase: store.phase(),
            error: store.error().map(str::to_string),
            highlighted_id: state.add.newly_added_id.clone(),
            submitting: state.add.submitting,
            add_error: state.add.error.clone(),
        }
    }

    /// Start the periodic refresh and run the initial load
    pub async fn mount(&self) -> Result<(), ApiError> {
        if self.is_torn_down() {
            return Ok(());
        }

        {
            let mut timers = self.inner.timers.lock().await;
            let scheduler = RefreshScheduler::start(self.downgrade(), self.inner.config.refresh_interval);
            info!(
                "Transaction feed mounted (refresh every {}ms, {} per page)",
                scheduler.period().as_millis(),
                self.inner.config.page_size
            );
            if let Some(previous) = timers.refresh.replace(scheduler) {
                previous.stop();
            }
        }

        self.load().await
    }

    /// Fetch the full list, waiting for any fetch already in flight to finish first
    ///
    /// This is also the user-facing retry.
    pub async fn load(&self) -> Result<(), ApiError> {
        let _gate = self.inner.fetch_gate.lock().await;
        self.fetch_locked().await
    }

    /// Scheduled refresh. Skipped (returns false) when a fetch is already running.
    pub async fn refresh_if_idle(&self) -> bool {
        let Ok(_gate) = self.inner.fetch_gate.try_lock() else {
            debug!("Skipping scheduled refresh, a fetch is already in flight");
            return false;
        };
        // The error is already stored and published
        let _ = self.fetch_locked().await;
        true
    }

    /// Caller must hold `fetch_gate`
    async fn fetch_locked(&self) -> Result<(), ApiError> {
        if self.is_torn_down() {
            return Ok(());
        }

        let phase = {
            let mut state = self.inner.state.lock().await;
            state.store.begin_fetch();
            state.store.phase()
        };
        self.publish(FeedEvent::LoadStarted { phase });

        let result = self.inner.api.get_transactions().await;

        if self.is_torn_down() {
            debug!("Discarding transaction fetch result after teardown");
            return Ok(());
        }

        match result {
            Ok(items) => {
                let (total_items, page, clamped) = {
                    let mut state = self.inner.state.lock().await;
                    let clamped = state.store.replace_all(items);
                    (state.store.len(), state.store.current_page(), clamped)
                };
                debug!("Loaded {} transactions", total_items);
                self.publish(FeedEvent::Loaded { total_items });
                if clamped {
                    debug!("Transaction list shrank, moved to page {}", page);
                    self.publish(FeedEvent::PageChanged { page });
                }
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                {
                    let mut state = self.inner.state.lock().await;
                    state.store.fail_fetch(message.clone());
                }
                warn!("Failed to fetch transactions: {}", message);
                self.publish(FeedEvent::LoadFailed { message });
                Err(e)
            }
        }
    }

    pub async fn next_page(&self) -> bool {
        self.change_page(|store| store.next_page()).await
    }

    pub async fn previous_page(&self) -> bool {
        self.change_page(|store| store.previous_page()).await
    }

    /// Page currently holding `id`
    pub async fn page_of(&self, id: &str) -> Option<usize> {
        self.inner.state.lock().await.store.page_of(id)
    }

    /// Jump to the page holding `id`; no-op when the id is not in the list
    pub async fn go_to_page_with_transaction(&self, id: &str) -> bool {
        self.change_page(|store| store.go_to_page_with_transaction(id)).await
    }

    async fn change_page<F>(&self, apply: F) -> bool
    where
        F: FnOnce(&mut TransactionStore) -> bool,
    {
        let (changed, page) = {
            let mut state = self.inner.state.lock().await;
            let changed = apply(&mut state.store);
            (changed, state.store.current_page())
        };
        if changed {
            self.publish(FeedEvent::PageChanged { page });
        }
        changed
    }

    /// Submit a transaction, refresh, show the page holding it, and highlight it briefly
    ///
    /// The highlight timer only starts once the refresh has finished.
    pub async fn add_transaction(
        &self,
        payload: NewTransaction,
    ) -> Result<TransactionRecord, AddTransactionError> {
        {
            let mut state = self.inner.state.lock().await;
            state.add.submitting = true;
            state.add.error = None;
        }

        let record = match self.inner.api.add_transaction(&payload).await {
            Ok(record) => record,
            Err(e) => {
                let message = e.to_string();
                {
                    let mut state = self.inner.state.lock().await;
                    state.add.submitting = false;
                    state.add.error = Some(message.clone());
                }
                warn!("Failed to add transaction for {}: {}", payload.payee, message);
                self.publish(FeedEvent::AddFailed { message });
                return Err(AddTransactionError::Submit(e));
            }
        };
        info!("Added transaction {} ({})", record.id, record.payee);

        if self.is_torn_down() {
            self.finish_submit().await;
            return Ok(record);
        }
        self.set_highlight(&record.id).await;

        if let Err(source) = self.load().await {
            self.clear_highlight(&record.id).await;
            self.finish_submit().await;
            return Err(AddTransactionError::Refresh {
                record: Box::new(record),
                source,
            });
        }
        if self.is_torn_down() {
            self.finish_submit().await;
            return Ok(record);
        }

        if self.page_of(&record.id).await.is_some() {
            self.go_to_page_with_transaction(&record.id).await;
        } else {
            debug!("Transaction {} not in the refreshed list, staying on current page", record.id);
        }

        self.finish_submit().await;
        self.schedule_highlight_clear(record.id.clone()).await;
        Ok(record)
    }

    async fn finish_submit(&self) {
        let mut state = self.inner.state.lock().await;
        state.add.submitting = false;
    }

    async fn set_highlight(&self, id: &str) {
        {
            let mut timers = self.inner.timers.lock().await;
            if let Some(pending) = timers.highlight.take() {
                pending.abort();
            }
        }
        {
            let mut state = self.inner.state.lock().await;
            state.add.newly_added_id = Some(id.to_string());
        }
        self.publish(FeedEvent::HighlightSet { id: id.to_string() });
    }

    /// Clear the highlight, but only if it still points at `id`
    async fn clear_highlight(&self, id: &str) {
        if self.is_torn_down() {
            return;
        }
        let cleared = {
            let mut state = self.inner.state.lock().await;
            if state.add.newly_added_id.as_deref() == Some(id) {
                state.add.newly_added_id = None;
                true
            } else {
                false
            }
        };
        if cleared {
            self.publish(FeedEvent::HighlightCleared { id: id.to_string() });
        }
    }

    async fn schedule_highlight_clear(&self, id: String) {
        let delay = self.inner.config.highlight_duration;
        let feed = self.downgrade();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(feed) = feed.upgrade() {
                feed.clear_highlight(&id).await;
            }
        });

        let mut timers = self.inner.timers.lock().await;
        if self.is_torn_down() {
            handle.abort();
            return;
        }
        if let Some(previous) = timers.highlight.replace(handle) {
            previous.abort();
        }
    }

    /// Stop all timers. Fetches still in flight finish, but their results are ignored.
    pub async fn teardown(&self) {
        if self.inner.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        {
            let mut timers = self.inner.timers.lock().await;
            if let Some(scheduler) = timers.refresh.take() {
                scheduler.stop();
            }
            if let Some(pending) = timers.highlight.take() {
                pending.abort();
            }
        }
        info!("Transaction feed torn down");
        self.publish(FeedEvent::TornDown);
    }
}
