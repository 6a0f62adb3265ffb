//! Poll scheduler.
//!
//! Spawns a background task that ticks at a fixed cadence and launches one
//! status fetch per tick, so the frontend consumes a channel of
//! [`PollEvent`]s instead of awaiting requests itself. Each fetch is tagged
//! with a monotonically increasing sequence number at launch time; the
//! reconciler uses that tag to drop responses that lose the race against a
//! newer one. Overlap is tolerated but bounded: when every in-flight permit
//! is taken, ticks are skipped rather than queueing further requests.
//!
//! A [`ResyncHandle`] forces one immediate out-of-cycle fetch, which the
//! dispatcher uses to refresh the display right after a command.

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::time::{Duration, MissedTickBehavior, interval};

use crate::api::{ApiError, StatusApi};
use jokenpo_core::protocol::Snapshot;

/// Default poll cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Maximum concurrently in-flight status fetches.
const POLL_PERMITS: usize = 4;

/// One completed fetch attempt, tagged with its launch sequence.
#[derive(Debug)]
pub enum PollEvent {
    /// The fetch returned a decodable snapshot.
    Snapshot { seq: u64, snapshot: Snapshot },
    /// The fetch failed; the display should degrade.
    Degraded { seq: u64, error: ApiError },
}

impl PollEvent {
    /// Launch sequence of the fetch that produced this event.
    pub fn seq(&self) -> u64 {
        match self {
            PollEvent::Snapshot { seq, .. } | PollEvent::Degraded { seq, .. } => *seq,
        }
    }
}

/// Requests an immediate out-of-cycle fetch from the polling task.
///
/// Cheap to clone; all clones feed the same scheduler.
#[derive(Clone)]
pub struct ResyncHandle {
    trigger: mpsc::UnboundedSender<()>,
}

impl ResyncHandle {
    pub(crate) fn new(trigger: mpsc::UnboundedSender<()>) -> Self {
        Self { trigger }
    }

    /// Schedule one immediate fetch. Non-blocking; a no-op once the
    /// polling task has stopped.
    pub fn resync(&self) {
        let _ = self.trigger.send(());
    }
}

/// A channel-based poll scheduler over any [`StatusApi`].
///
/// Construct with [`Poller::spawn`]. Completed fetches arrive on
/// [`events`](Poller::events) in completion order, which under overlap is
/// not necessarily launch order. Dropping the `Poller` stops the
/// background task.
pub struct Poller {
    /// Receive completed fetch attempts. Channel close = task stopped.
    pub events: mpsc::UnboundedReceiver<PollEvent>,
    resync: ResyncHandle,
}

impl Poller {
    /// Spawn the polling task against `api`, ticking every `poll_interval`.
    ///
    /// The first fetch launches immediately rather than one interval in.
    pub fn spawn<A: StatusApi>(api: Arc<A>, poll_interval: Duration) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (resync_tx, resync_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_poll_loop(api, poll_interval, event_tx, resync_rx));
        Self {
            events: event_rx,
            resync: ResyncHandle::new(resync_tx),
        }
    }

    /// A handle for forcing out-of-cycle fetches.
    pub fn resync_handle(&self) -> ResyncHandle {
        self.resync.clone()
    }

    /// Await the next completed fetch. `None` once the task has stopped.
    pub async fn next_event(&mut self) -> Option<PollEvent> {
        self.events.recv().await
    }
}

async fn run_poll_loop<A: StatusApi>(
    api: Arc<A>,
    poll_interval: Duration,
    events: mpsc::UnboundedSender<PollEvent>,
    mut resync: mpsc::UnboundedReceiver<()>,
) {
    let permits = Arc::new(Semaphore::new(POLL_PERMITS));
    let mut next_seq: u64 = 0;
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            triggered = resync.recv() => {
                // The Poller owns a ResyncHandle, so a closed trigger
                // channel means the Poller itself is gone.
                if triggered.is_none() {
                    break;
                }
            }
        }
        if events.is_closed() {
            break;
        }

        // One fetch per tick, if a permit is free. Otherwise skip: the
        // backend is already saturated with unanswered requests.
        let Ok(permit) = permits.clone().try_acquire_owned() else {
            tracing::debug!("all poll permits in flight, skipping tick");
            continue;
        };
        next_seq += 1;
        let seq = next_seq;
        let api = api.clone();
        let events = events.clone();
        tokio::spawn(async move {
            let _permit = permit;
            let event = match api.fetch_status().await {
                Ok(snapshot) => PollEvent::Snapshot { seq, snapshot },
                Err(error) => {
                    tracing::debug!(seq, %error, "status fetch failed");
                    PollEvent::Degraded { seq, error }
                }
            };
            let _ = events.send(event);
        });
    }
}
