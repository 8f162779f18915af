//! In-memory ledger used by the controller and scheduler tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::api::{ApiError, TransactionsApi};
use crate::models::{FeedEvent, NewTransaction, TransactionRecord};

/// 2020-01-01T00:00:00Z
pub const JAN_1_2020_MS: i64 = 1_577_836_800_000;

const SEED_NEWEST_MS: i64 = 1_700_000_000_000;
const HOUR_MS: i64 = 3_600_000;

#[derive(Default)]
pub struct FakeLedger {
    records: Mutex<Vec<TransactionRecord>>,
    get_delay: Mutex<Duration>,
    get_calls: AtomicUsize,
    post_calls: AtomicUsize,
    failing_gets: AtomicUsize,
    failing_posts: AtomicBool,
    forget_posts: AtomicBool,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeLedger {
    /// `count` records one hour apart, stored oldest first so the client has to sort
    pub fn seeded(count: usize) -> Arc<Self> {
        let records = (0..count)
            .rev()
            .map(|i| TransactionRecord {
                id: format!("seed-{}", i),
                amount: -((i as i64 + 1) * 150),
                payee: format!("Payee {}", i),
                memo: if i % 2 == 0 { Some(format!("memo {}", i)) } else { None },
                timestamp: SEED_NEWEST_MS - (i as i64) * HOUR_MS,
            })
            .collect();
        Arc::new(FakeLedger {
            records: Mutex::new(records),
            ..Default::default()
        })
    }

    pub fn newest_timestamp(&self) -> i64 {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.timestamp)
            .max()
            .unwrap_or(SEED_NEWEST_MS)
    }

    /// Keep only the `len` newest records
    pub fn truncate(&self, len: usize) {
        let mut records = self.records.lock().unwrap();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records.truncate(len);
    }

    pub fn set_get_delay(&self, delay: Duration) {
        *self.get_delay.lock().unwrap() = delay;
    }

    pub fn fail_next_gets(&self, count: usize) {
        self.failing_gets.store(count, Ordering::SeqCst);
    }

    pub fn fail_posts(&self, fail: bool) {
        self.failing_posts.store(fail, Ordering::SeqCst);
    }

    /// Accept POSTs but never show the created records in later GETs
    pub fn forget_posts(&self, forget: bool) {
        self.forget_posts.store(forget, Ordering::SeqCst);
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn post_calls(&self) -> usize {
        self.post_calls.load(Ordering::SeqCst)
    }

    pub fn max_concurrent_gets(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionsApi for FakeLedger {
    async fn get_transactions(&self) -> Result<Vec<TransactionRecord>, ApiError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        let delay = *self.get_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let should_fail = self
            .failing_gets
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(ApiError::Http {
                status: 500,
                reason: "Internal Server Error".to_string(),
            });
        }
        Ok(self.records.lock().unwrap().clone())
    }

    async fn add_transaction(&self, payload: &NewTransaction) -> Result<TransactionRecord, ApiError> {
        self.post_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_posts.load(Ordering::SeqCst) {
            return Err(ApiError::Network("connection reset".to_string()));
        }
        let record = payload.clone().into_record(Uuid::new_v4().to_string());
        if !self.forget_posts.load(Ordering::SeqCst) {
            self.records.lock().unwrap().push(record.clone());
        }
        Ok(record)
    }
}

/// Everything currently queued on an event receiver
pub fn drain_events(events: &mut broadcast::Receiver<FeedEvent>) -> Vec<FeedEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}
