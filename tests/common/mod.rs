// In-memory collaborators for driving the session controller in tests.
#![allow(dead_code)]

use anyhow::{bail, Result};
use motion_cam::{
    Collaborators, LifecycleStatus, MediaMode, MemorySessionStore, MessageReceipt, Notification,
    NotificationDispatcher, PublishAgent, PublishHandle, SensorEvent, SessionConfig,
    SessionController, SessionRecord, SessionStore, VideoPlatform,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub const PUBLIC_URL: &str = "https://h.example/";

pub fn session_config(duration_ms: u64, cooldown_buffer_ms: u64) -> SessionConfig {
    SessionConfig {
        duration_ms,
        cooldown_buffer_ms,
        creation_backoff_ms: None,
        media_mode: MediaMode::Routed,
    }
}

// ============================================================================
// Video platform
// ============================================================================

pub struct FakeVideo {
    delay: Duration,
    fail: bool,
    ids: Mutex<VecDeque<String>>,
    pub calls: AtomicUsize,
}

impl FakeVideo {
    /// Hands out `ids` in order, each after `delay`
    pub fn new(delay: Duration, ids: &[&str]) -> Self {
        Self {
            delay,
            fail: false,
            ids: Mutex::new(ids.iter().map(|id| id.to_string()).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(delay: Duration) -> Self {
        Self {
            fail: true,
            ..Self::new(delay, &[])
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl VideoPlatform for FakeVideo {
    async fn create_session(&self, _mode: MediaMode) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        if self.fail {
            bail!("platform unavailable");
        }

        let next = self.ids.lock().unwrap().pop_front();
        match next {
            Some(id) => Ok(id),
            None => Ok(format!("session-{}", self.calls())),
        }
    }

    fn generate_token(&self, session_id: &str) -> Result<String> {
        Ok(format!("token-for-{}", session_id))
    }

    fn api_key(&self) -> &str {
        "test-key"
    }
}

// ============================================================================
// Publish agent
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishCall {
    Start,
    Stop,
    Release,
}

pub struct FakePublisher {
    fail_start: bool,
    fail_stop: bool,
    stop_delay: Duration,
    pub calls: Mutex<Vec<(PublishCall, String, Instant)>>,
}

impl FakePublisher {
    pub fn new() -> Self {
        Self {
            fail_start: false,
            fail_stop: false,
            stop_delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_start() -> Self {
        Self {
            fail_start: true,
            ..Self::new()
        }
    }

    pub fn failing_stop() -> Self {
        Self {
            fail_stop: true,
            ..Self::new()
        }
    }

    pub fn slow_stop(stop_delay: Duration) -> Self {
        Self {
            stop_delay,
            ..Self::new()
        }
    }

    fn record(&self, call: PublishCall, session_id: &str) {
        self.calls
            .lock()
            .unwrap()
            .push((call, session_id.to_string(), Instant::now()));
    }

    pub fn calls_of(&self, call: PublishCall) -> Vec<(String, Instant)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _, _)| *c == call)
            .map(|(_, id, at)| (id.clone(), *at))
            .collect()
    }

    pub fn sequence(&self) -> Vec<PublishCall> {
        self.calls.lock().unwrap().iter().map(|(c, _, _)| *c).collect()
    }
}

#[async_trait::async_trait]
impl PublishAgent for FakePublisher {
    async fn start(&self, session_id: &str) -> Result<PublishHandle> {
        self.record(PublishCall::Start, session_id);
        if self.fail_start {
            bail!("camera permission denied");
        }
        Ok(PublishHandle::new(session_id))
    }

    async fn stop(&self, handle: &PublishHandle) -> Result<()> {
        self.record(PublishCall::Stop, &handle.session_id);
        tokio::time::sleep(self.stop_delay).await;
        if self.fail_stop {
            bail!("browser hung");
        }
        Ok(())
    }

    async fn release(&self, handle: PublishHandle) -> Result<()> {
        self.record(PublishCall::Release, &handle.session_id);
        Ok(())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

// ============================================================================
// Notifications
// ============================================================================

pub struct FakeNotifier {
    fail: bool,
    pub sent: Mutex<Vec<Notification>>,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self {
            fail: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl NotificationDispatcher for FakeNotifier {
    async fn send(&self, notification: &Notification) -> Result<MessageReceipt> {
        self.sent.lock().unwrap().push(notification.clone());
        if self.fail {
            bail!("gateway down");
        }
        Ok(MessageReceipt {
            message_uuid: format!("msg-{}", self.sent.lock().unwrap().len()),
        })
    }
}

// ============================================================================
// Stores
// ============================================================================

/// Memory store that rejects every write
pub struct BrokenStore;

#[async_trait::async_trait]
impl SessionStore for BrokenStore {
    async fn create_active(&self, _external_session_id: &str) -> Result<SessionRecord> {
        bail!("database is locked")
    }

    async fn mark_inactive(&self, _record: &SessionRecord) -> Result<SessionRecord> {
        bail!("database is locked")
    }

    async fn most_recent_active(&self) -> Result<Option<SessionRecord>> {
        Ok(None)
    }

    async fn list(&self) -> Result<Vec<SessionRecord>> {
        Ok(Vec::new())
    }
}

/// Memory store that records the largest number of simultaneously active rows
pub struct InvariantStore {
    inner: MemorySessionStore,
    pub max_active: AtomicUsize,
}

impl InvariantStore {
    pub fn new() -> Self {
        Self {
            inner: MemorySessionStore::new(),
            max_active: AtomicUsize::new(0),
        }
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SessionStore for InvariantStore {
    async fn create_active(&self, external_session_id: &str) -> Result<SessionRecord> {
        let record = self.inner.create_active(external_session_id).await?;
        let active = self
            .inner
            .list()
            .await?
            .iter()
            .filter(|row| row.active)
            .count();
        self.max_active.fetch_max(active, Ordering::SeqCst);
        Ok(record)
    }

    async fn mark_inactive(&self, record: &SessionRecord) -> Result<SessionRecord> {
        self.inner.mark_inactive(record).await
    }

    async fn most_recent_active(&self) -> Result<Option<SessionRecord>> {
        self.inner.most_recent_active().await
    }

    async fn list(&self) -> Result<Vec<SessionRecord>> {
        self.inner.list().await
    }
}

// ============================================================================
// Harness
// ============================================================================

/// A controller running on its own task, fed through a sensor channel
pub struct Harness {
    pub sensor_tx: mpsc::Sender<SensorEvent>,
    pub status: watch::Receiver<LifecycleStatus>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<()>>,
}

impl Harness {
    pub fn start(config: SessionConfig, collaborators: Collaborators) -> Self {
        let controller = SessionController::new(config, PUBLIC_URL, collaborators);
        let status = controller.subscribe();

        let (sensor_tx, sensor_rx) = mpsc::channel(8);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(controller.run(sensor_rx, async move {
            let _ = shutdown_rx.await;
        }));

        Self {
            sensor_tx,
            status,
            shutdown_tx: Some(shutdown_tx),
            task,
        }
    }

    pub async fn send(&self, event: SensorEvent) {
        self.sensor_tx.send(event).await.unwrap();
    }

    pub fn status(&self) -> LifecycleStatus {
        self.status.borrow().clone()
    }

    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.task.await?
    }
}

pub fn collaborators(
    video: &Arc<FakeVideo>,
    publisher: &Arc<FakePublisher>,
    notifier: &Arc<FakeNotifier>,
    store: Arc<dyn SessionStore>,
) -> Collaborators {
    Collaborators {
        video: video.clone(),
        publisher: publisher.clone(),
        notifier: notifier.clone(),
        store,
    }
}

/// Sleep until `offset` after `t0`
pub async fn at(t0: Instant, offset_ms: u64) {
    tokio::time::sleep_until(t0 + Duration::from_millis(offset_ms)).await;
}

pub fn assert_near(actual: Duration, expected_ms: u64) {
    let expected = Duration::from_millis(expected_ms);
    assert!(
        actual >= expected && actual <= expected + Duration::from_millis(5),
        "expected ~{:?}, got {:?}",
        expected,
        actual
    );
}
