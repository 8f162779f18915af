use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use super::feed_service::WeakTransactionFeed;

/// Periodic background refresh for a transaction feed
///
/// The first tick fires one `period` after start, since mounting already runs
/// the initial load. Ticks that land while a fetch is in flight are skipped.
/// Dropping the scheduler stops it.
pub struct RefreshScheduler {
    handle: JoinHandle<()>,
    period: Duration,
}

impl RefreshScheduler {
    pub fn start(feed: WeakTransactionFeed, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(feed) = feed.upgrade() else {
                    debug!("Transaction feed dropped, stopping refresh scheduler");
                    break;
                };
                if feed.is_torn_down() {
                    break;
                }
                if feed.refresh_if_idle().await {
                    debug!("Scheduled refresh finished");
                }
            }
        });

        RefreshScheduler { handle, period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Cancel the timer. A fetch started by the current tick is dropped with it.
    pub fn stop(self) {
        debug!("Stopping refresh scheduler ({}ms period)", self.period.as_millis());
        drop(self);
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedConfig;
    use crate::models::LoadPhase;
    use crate::services::feed_service::TransactionFeed;
    use crate::services::test_support::FakeLedger;
    use std::sync::Arc;

    fn feed_for(ledger: &Arc<FakeLedger>) -> TransactionFeed {
        TransactionFeed::new(ledger.clone(), FeedConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_every_interval_after_mount() {
        let ledger = FakeLedger::seeded(3);
        let feed = feed_for(&ledger);

        feed.mount().await.unwrap();
        assert_eq!(ledger.get_calls(), 1);

        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert_eq!(ledger.get_calls(), 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(ledger.get_calls(), 2);

        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert_eq!(ledger.get_calls(), 4);

        // Background refreshes never drop back to the initial-loading state
        assert_eq!(feed.snapshot().await.phase, LoadPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_stops_polling() {
        let ledger = FakeLedger::seeded(3);
        let feed = feed_for(&ledger);
        feed.mount().await.unwrap();

        tokio::time::sleep(Duration::from_millis(5_100)).await;
        assert_eq!(ledger.get_calls(), 2);

        feed.teardown().await;
        tokio::time::sleep(Duration::from_millis(30_000)).await;
        assert_eq!(ledger.get_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skips_tick_while_fetch_in_flight() {
        let ledger = FakeLedger::seeded(3);
        let feed = feed_for(&ledger);
        // Slower than the refresh interval
        ledger.set_get_delay(Duration::from_millis(7_000));

        let mounting = {
            let feed = feed.clone();
            tokio::spawn(async move { feed.mount().await })
        };

        // Tick at 5s finds the initial fetch still running and is skipped
        tokio::time::sleep(Duration::from_millis(6_000)).await;
        assert_eq!(ledger.get_calls(), 1);
        mounting.await.unwrap().unwrap();

        // Tick at 10s runs
        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(ledger.get_calls(), 2);
        assert_eq!(ledger.max_concurrent_gets(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_refresh_recovers_from_error() {
        let ledger = FakeLedger::seeded(3);
        let feed = feed_for(&ledger);
        ledger.fail_next_gets(1);

        assert!(feed.mount().await.is_err());
        assert_eq!(feed.snapshot().await.phase, LoadPhase::Error);

        tokio::time::sleep(Duration::from_millis(5_100)).await;
        let snapshot = feed.snapshot().await;
        assert_eq!(snapshot.phase, LoadPhase::Idle);
        assert_eq!(snapshot.error, None);
        assert_eq!(snapshot.total_items, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_exits_when_feed_is_dropped() {
        let ledger = FakeLedger::seeded(1);
        let feed = feed_for(&ledger);
        let scheduler = RefreshScheduler::start(feed.downgrade(), Duration::from_millis(100));
        assert_eq!(scheduler.period(), Duration::from_millis(100));
        drop(feed);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(scheduler.handle.is_finished());
        assert_eq!(ledger.get_calls(), 0);
    }
}
