use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

/// Stand-in deadline for delays too large to represent
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// The two delayed actions of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Ends capture after the session duration
    Close,
    /// Reopens the guard after duration + buffer
    Rearm,
}

/// Delivered to the controller when a timer expires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    pub attempt: Uuid,
    pub kind: TimerKind,
}

/// Cancellable delayed actions keyed by session attempt
///
/// Expiry is reported on the channel given to [`TimerSet::new`]. A timer
/// cancelled after it already sent its message is filtered out by
/// [`TimerSet::fired`].
pub struct TimerSet {
    tx: mpsc::UnboundedSender<TimerFired>,
    pending: HashMap<(Uuid, TimerKind), JoinHandle<()>>,
}

impl TimerSet {
    pub fn new(tx: mpsc::UnboundedSender<TimerFired>) -> Self {
        Self {
            tx,
            pending: HashMap::new(),
        }
    }

    /// Schedule `kind` for `attempt`, replacing any timer already armed for it
    pub fn arm(&mut self, attempt: Uuid, kind: TimerKind, delay: Duration) {
        let now = Instant::now();
        let deadline = now.checked_add(delay).unwrap_or(now + FAR_FUTURE);
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            // Receiver gone means the controller stopped
            let _ = tx.send(TimerFired { attempt, kind });
        });

        debug!("Armed {:?} timer for {} ({:?})", kind, attempt, delay);

        if let Some(previous) = self.pending.insert((attempt, kind), task) {
            previous.abort();
        }
    }

    /// Consume an expiry. Returns `false` if the timer was cancelled meanwhile.
    pub fn fired(&mut self, fired: &TimerFired) -> bool {
        self.pending.remove(&(fired.attempt, fired.kind)).is_some()
    }

    pub fn is_armed(&self, attempt: Uuid, kind: TimerKind) -> bool {
        self.pending.contains_key(&(attempt, kind))
    }

    /// Cancel both timers of one attempt, returning how many were pending
    pub fn cancel(&mut self, attempt: Uuid) -> usize {
        [TimerKind::Close, TimerKind::Rearm]
            .into_iter()
            .filter_map(|kind| self.pending.remove(&(attempt, kind)))
            .map(|task| task.abort())
            .count()
    }

    /// Cancel every pending timer, returning how many there were
    pub fn cancel_all(&mut self) -> usize {
        let count = self.pending.len();
        for (_, task) in self.pending.drain() {
            task.abort();
        }
        count
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
