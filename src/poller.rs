//! # Reconciliation Poller
//!
//! Periodically fetches an authoritative [`Snapshot`] and hands it to its dashboard session.
//! This is what heals views that missed bus events (dropped on a full queue, or published
//! before the session subscribed).
//!
//! # Failure Handling
//! A failed fetch is retried inside the same cycle with exponential backoff
//! (`base * 2^attempt`, capped). A cycle whose retries are exhausted is reported as
//! [`PollOutcome::Failed`] with the number of consecutive failed cycles; the session turns
//! that into a degraded health flag. The next successful cycle resets the count.

use crate::config::BackoffConfig;
use crate::model::Snapshot;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SourceError {
    #[error("Transient I/O failure: {0}")]
    TransientIo(String),
}

/// Where snapshots come from.
#[async_trait]
pub trait SnapshotSource: Send + Sync + 'static {
    async fn fetch(&self) -> Result<Snapshot, SourceError>;
}

/// Result of one poll cycle.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    Fresh(Snapshot),
    Failed {
        consecutive_failures: u32,
        error: SourceError,
    },
}

pub struct ReconciliationPoller {
    source: Arc<dyn SnapshotSource>,
    interval: Duration,
    backoff: BackoffConfig,
    outcomes: mpsc::Sender<PollOutcome>,
    trigger: Arc<Notify>,
    token: CancellationToken,
}

impl ReconciliationPoller {
    /// # Arguments
    /// * `interval` - Time between cycles. The first cycle runs immediately.
    /// * `outcomes` - Receives one [`PollOutcome`] per cycle.
    /// * `token` - Stops the poller; no outcome is sent after cancellation.
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        interval: Duration,
        backoff: BackoffConfig,
        outcomes: mpsc::Sender<PollOutcome>,
        token: CancellationToken,
    ) -> Self {
        Self {
            source,
            interval,
            backoff,
            outcomes,
            trigger: Arc::new(Notify::new()),
            token,
        }
    }

    /// Notifying this starts a cycle right away instead of waiting for the next tick.
    pub fn trigger(&self) -> Arc<Notify> {
        self.trigger.clone()
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut consecutive_failures = 0u32;
        info!(interval_ms = self.interval.as_millis() as u64, "Poller started");

        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                _ = ticker.tick() => {}
                _ = self.trigger.notified() => debug!("Poll requested"),
            }

            let Some(result) = self.fetch_with_retry().await else {
                break;
            };
            let outcome = match result {
                Ok(snapshot) => {
                    if consecutive_failures > 0 {
                        info!(consecutive_failures, "Snapshot source recovered");
                    }
                    consecutive_failures = 0;
                    PollOutcome::Fresh(snapshot)
                }
                Err(error) => {
                    consecutive_failures += 1;
                    warn!(consecutive_failures, %error, "Poll cycle failed");
                    PollOutcome::Failed {
                        consecutive_failures,
                        error,
                    }
                }
            };

            let sent = tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                sent = self.outcomes.send(outcome) => sent,
            };
            if sent.is_err() {
                debug!("Session gone");
                break;
            }
        }
        info!("Poller stopped");
    }

    /// One cycle: the first attempt plus up to `max_retries` retries.
    ///
    /// Returns `None` if cancelled meanwhile.
    pub async fn fetch_with_retry(&self) -> Option<Result<Snapshot, SourceError>> {
        let mut attempt = 0u32;
        loop {
            let result = tokio::select! {
                biased;
                _ = self.token.cancelled() => return None,
                result = self.source.fetch() => result,
            };
            match result {
                Ok(snapshot) => return Some(Ok(snapshot)),
                Err(error) if attempt < self.backoff.max_retries => {
                    let delay = self.backoff.delay(attempt);
                    debug!(attempt, delay_ms = delay.as_millis() as u64, %error, "Retrying fetch");
                    attempt += 1;
                    tokio::select! {
                        biased;
                        _ = self.token.cancelled() => return None,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(error) => return Some(Err(error)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays scripted results, then succeeds forever.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<Snapshot, SourceError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Snapshot, SourceError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SnapshotSource for ScriptedSource {
        async fn fetch(&self) -> Result<Snapshot, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(empty_snapshot(0)))
        }
    }

    fn empty_snapshot(revision: u64) -> Snapshot {
        Snapshot {
            orders: vec![],
            unread_count: 0,
            notification_revision: revision,
            taken_at: Utc::now(),
        }
    }

    fn io() -> Result<Snapshot, SourceError> {
        Err(SourceError::TransientIo("connection reset".to_string()))
    }

    fn backoff(max_retries: u32) -> BackoffConfig {
        BackoffConfig {
            base_delay_ms: 100,
            max_delay_ms: 1_000,
            max_retries,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_are_retried_within_a_cycle() {
        let source = ScriptedSource::new(vec![io(), io(), Ok(empty_snapshot(7))]);
        let (tx, mut rx) = mpsc::channel(4);
        let token = CancellationToken::new();
        let poller = ReconciliationPoller::new(
            source.clone(),
            Duration::from_secs(30),
            backoff(3),
            tx,
            token.clone(),
        );
        let handle = poller.spawn();

        match rx.recv().await {
            Some(PollOutcome::Fresh(snapshot)) => assert_eq!(snapshot.notification_revision, 7),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(source.calls(), 3);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_cycles_count_up_then_reset() {
        let source = ScriptedSource::new(vec![io(), io(), io(), io()]);
        let (tx, mut rx) = mpsc::channel(4);
        let token = CancellationToken::new();
        let handle = ReconciliationPoller::new(
            source.clone(),
            Duration::from_secs(30),
            backoff(1),
            tx,
            token.clone(),
        )
        .spawn();

        for expected in [1, 2] {
            match rx.recv().await {
                Some(PollOutcome::Failed {
                    consecutive_failures,
                    ..
                }) => assert_eq!(consecutive_failures, expected),
                other => panic!("unexpected {:?}", other),
            }
        }
        assert!(matches!(rx.recv().await, Some(PollOutcome::Fresh(_))));

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_skips_the_wait() {
        let source = ScriptedSource::new(vec![]);
        let (tx, mut rx) = mpsc::channel(4);
        let token = CancellationToken::new();
        let poller = ReconciliationPoller::new(
            source.clone(),
            Duration::from_secs(3600),
            backoff(0),
            tx,
            token.clone(),
        );
        let trigger = poller.trigger();
        let handle = poller.spawn();

        assert!(matches!(rx.recv().await, Some(PollOutcome::Fresh(_))));
        let before = tokio::time::Instant::now();
        trigger.notify_one();
        assert!(matches!(rx.recv().await, Some(PollOutcome::Fresh(_))));
        assert!(before.elapsed() < Duration::from_secs(3600));

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent_and_final() {
        let source = ScriptedSource::new(vec![]);
        let (tx, mut rx) = mpsc::channel(4);
        let token = CancellationToken::new();
        let handle = ReconciliationPoller::new(
            source.clone(),
            Duration::from_secs(30),
            backoff(0),
            tx,
            token.clone(),
        )
        .spawn();

        assert!(rx.recv().await.is_some());
        token.cancel();
        token.cancel();
        handle.await.unwrap();

        let calls = source.calls();
        tokio::time::advance(Duration::from_secs(300)).await;
        assert_eq!(source.calls(), calls);
        assert!(rx.recv().await.is_none());
    }
}
