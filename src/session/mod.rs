//! # Dashboard Sessions
//!
//! One [`DashboardSession`] per open owner dashboard. It is made of two tasks:
//!
//! ```text
//!  EventBus ──Subscription──▶ ┌──────────────┐
//!                             │ session actor │──watch──▶ SessionView (readers)
//!  ReconciliationPoller ────▶ └──────────────┘
//!        ▲      PollOutcome          │
//!        └──────── trigger ──────────┘ (on sequence gap)
//! ```
//!
//! The session actor is the only writer of the [`SessionView`]; bus events and poll results
//! are applied one at a time in arrival order. Readers get cheap copies through a
//! `tokio::sync::watch` channel.

pub mod view;

pub use view::*;

use crate::bus::{EventBus, Subscription};
use crate::config::Config;
use crate::model::BusEvent;
use crate::poller::{PollOutcome, ReconciliationPoller, SnapshotSource};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

struct SessionActor {
    id: u64,
    view: SessionView,
    subscription: Subscription,
    outcomes: mpsc::Receiver<PollOutcome>,
    publisher: watch::Sender<SessionView>,
    trigger: Arc<Notify>,
    stale_after_failures: u32,
    token: CancellationToken,
}

impl SessionActor {
    async fn run(mut self) {
        info!(session = self.id, "Session started");
        loop {
            let changed = tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                outcome = self.outcomes.recv() => match outcome {
                    Some(outcome) => self.handle_poll(outcome),
                    None => break,
                },
                event = self.subscription.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
            };
            if changed {
                self.publisher.send_replace(self.view.clone());
            }
        }
        self.token.cancel();
        self.subscription.unsubscribe();
        info!(session = self.id, "Session closed");
    }

    fn handle_event(&mut self, event: BusEvent) -> bool {
        let applied = match &event {
            BusEvent::Order(event) => self.view.apply_order_event(event),
            BusEvent::Notification(event) => self.view.apply_notification_event(event),
        };
        match applied {
            Applied::Applied => true,
            Applied::Duplicate => false,
            Applied::Gap { expected, received } => {
                debug!(session = self.id, expected, received, "Sequence gap, requesting poll");
                self.trigger.notify_one();
                true
            }
        }
    }

    fn handle_poll(&mut self, outcome: PollOutcome) -> bool {
        match outcome {
            PollOutcome::Fresh(snapshot) => {
                let healed = self.view.reconcile(&snapshot);
                if healed > 0 {
                    info!(session = self.id, healed, "Reconciled stale entries");
                }
                self.view.set_health(Health::Live);
            }
            PollOutcome::Failed {
                consecutive_failures,
                ..
            } => {
                if consecutive_failures >= self.stale_after_failures {
                    warn!(session = self.id, consecutive_failures, "Session degraded");
                    self.view.set_health(Health::Degraded {
                        consecutive_failures,
                    });
                }
            }
        }
        true
    }
}

/// Handle to one open dashboard.
///
/// Dropping the handle stops the session; [`close`](Self::close) also waits for its tasks.
pub struct DashboardSession {
    id: u64,
    view: watch::Receiver<SessionView>,
    token: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl DashboardSession {
    /// Subscribes to `bus` and starts the session actor plus its poller.
    ///
    /// The subscription is taken before the first poll, so nothing published after `open`
    /// returns can be missed by both.
    pub fn open(id: u64, bus: &EventBus, source: Arc<dyn SnapshotSource>, config: &Config) -> Self {
        let subscription = bus.subscribe();
        let token = CancellationToken::new();

        let (outcome_tx, outcome_rx) = mpsc::channel(4);
        let poller = ReconciliationPoller::new(
            source,
            config.poll_interval(),
            config.backoff.clone(),
            outcome_tx,
            token.child_token(),
        );

        let view = SessionView::new(config.toast_capacity);
        let (publisher, view_rx) = watch::channel(view.clone());
        let actor = SessionActor {
            id,
            view,
            subscription,
            outcomes: outcome_rx,
            publisher,
            trigger: poller.trigger(),
            stale_after_failures: config.stale_after_failures,
            token: token.clone(),
        };

        let handles = vec![tokio::spawn(actor.run()), poller.spawn()];
        Self {
            id,
            view: view_rx,
            token,
            handles,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Latest published view.
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// A receiver that is notified on every view change.
    pub fn watch(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// Waits until the view satisfies `predicate` or the session stops.
    pub async fn wait_for<F>(&mut self, predicate: F) -> Option<SessionView>
    where
        F: FnMut(&SessionView) -> bool,
    {
        self.view.wait_for(predicate).await.ok().map(|view| view.clone())
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Stops the poller and the session actor and unsubscribes from the bus. Idempotent.
    pub async fn close(&mut self) {
        self.token.cancel();
        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(session = self.id, error = %e, "Session task failed");
            }
        }
    }
}

impl Drop for DashboardSession {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
