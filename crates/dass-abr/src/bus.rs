use tokio::sync::broadcast;

use crate::{Fragment, LevelTable, LoadStats};

/// Events the host pipeline publishes for the ABR controller.
#[derive(Clone, Debug)]
pub enum PlaybackEvent {
    /// Master manifest parsed, level table finalized.
    ManifestParsed { levels: LevelTable },
    /// Fragment downloaded and buffered.
    FragBuffered { frag: Fragment, stats: LoadStats },
}

/// Event bus shared between the host pipeline and its ABR controllers.
///
/// `publish()` is a sync call. If there are no subscribers, events are
/// silently dropped.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<PlaybackEvent>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: PlaybackEvent) {
        let _ = self.tx.send(event);
    }

    /// Subscribe to all future events.
    ///
    /// The subscription is released when the returned value is dropped.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
            manifest_seen: false,
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A live subscription to an [`EventBus`].
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<PlaybackEvent>,
    manifest_seen: bool,
}

/// Outcome of one non-blocking poll.
#[derive(Debug)]
pub(crate) enum Polled {
    Event(PlaybackEvent),
    Empty,
    Closed,
}

impl Subscription {
    pub(crate) fn poll(&mut self) -> Polled {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Polled::Event(event),
                Err(broadcast::error::TryRecvError::Empty) => return Polled::Empty,
                Err(broadcast::error::TryRecvError::Closed) => return Polled::Closed,
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "ABR subscription lagged, events dropped");
                }
            }
        }
    }

    /// Mark the first manifest as seen; returns `true` only the first time.
    pub(crate) fn first_manifest(&mut self) -> bool {
        !std::mem::replace(&mut self.manifest_seen, true)
    }

    /// Receive the next event, waiting if none is pending.
    ///
    /// Returns `None` once every sender is gone. Lagged events are skipped.
    pub async fn recv(&mut self) -> Option<PlaybackEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "ABR subscription lagged, events dropped");
                }
            }
        }
    }
}
