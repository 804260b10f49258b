use anyhow::{bail, Result};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::config::SessionConfig;
use super::guard::SessionGuard;
use super::state::{LifecycleState, LifecycleStatus};
use super::timers::{TimerFired, TimerKind, TimerSet};
use crate::error::SessionFault;
use crate::notify::{Notification, NotificationDispatcher};
use crate::publish::{PublishAgent, PublishHandle};
use crate::sensor::SensorEvent;
use crate::store::{SessionRecord, SessionStore};
use crate::video::VideoPlatform;

/// External services a session is built from
#[derive(Clone)]
pub struct Collaborators {
    pub video: Arc<dyn VideoPlatform>,
    pub publisher: Arc<dyn PublishAgent>,
    pub notifier: Arc<dyn NotificationDispatcher>,
    pub store: Arc<dyn SessionStore>,
}

/// Everything the controller knows about the session it is driving
struct SessionContext {
    /// Local key for timers and completions, assigned on the Rising edge
    attempt: Uuid,
    external_session_id: Option<String>,
    /// `None` if the store write failed; memory stays authoritative
    record: Option<SessionRecord>,
    publish: Option<PublishHandle>,
}

impl SessionContext {
    fn new() -> Self {
        Self {
            attempt: Uuid::new_v4(),
            external_session_id: None,
            record: None,
            publish: None,
        }
    }
}

/// Results of work the controller handed off to background tasks
#[derive(Debug)]
enum Completion {
    Created {
        attempt: Uuid,
        result: Result<String, SessionFault>,
    },
    TornDown {
        attempt: Uuid,
        result: Result<(), SessionFault>,
    },
}

enum Input {
    Sensor(Option<SensorEvent>),
    Timer(TimerFired),
    Completion(Completion),
    Shutdown,
}

/// Drives motion-triggered recording sessions
///
/// Owns the guard, the current session and its timers. All transitions
/// run on the task that calls [`SessionController::run`]; collaborator
/// calls that may outlive a transition (creation, teardown, notification)
/// run on spawned tasks and report back through an internal channel.
pub struct SessionController {
    config: SessionConfig,

    /// Base for viewing links, fixed for the life of the process
    public_url: String,

    collaborators: Collaborators,

    guard: SessionGuard,
    state: LifecycleState,
    current: Option<SessionContext>,

    /// Sessions whose teardown was still running when the guard reopened
    draining: HashMap<Uuid, SessionContext>,

    timers: TimerSet,
    timer_rx: mpsc::UnboundedReceiver<TimerFired>,

    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,

    teardowns: HashMap<Uuid, JoinHandle<()>>,

    /// Set when a store write failed; stale active rows are closed before
    /// the next record is created
    store_dirty: bool,

    sessions_started: u64,
    last_fault: Option<String>,
    status_tx: watch::Sender<LifecycleStatus>,
}

impl SessionController {
    pub fn new(
        config: SessionConfig,
        public_url: impl Into<String>,
        collaborators: Collaborators,
    ) -> Self {
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let (status_tx, _) = watch::channel(LifecycleStatus::default());

        Self {
            config,
            public_url: public_url.into(),
            collaborators,
            guard: SessionGuard::new(),
            state: LifecycleState::Idle,
            current: None,
            draining: HashMap::new(),
            timers: TimerSet::new(timer_tx),
            timer_rx,
            completion_tx,
            completion_rx,
            teardowns: HashMap::new(),
            // Rows left active by a previous run are closed on startup
            store_dirty: true,
            sessions_started: 0,
            last_fault: None,
            status_tx,
        }
    }

    /// Watch the controller's state; updated after every transition
    pub fn subscribe(&self) -> watch::Receiver<LifecycleStatus> {
        self.status_tx.subscribe()
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Process sensor edges until `shutdown` resolves or the sensor stream ends
    pub async fn run<F>(
        mut self,
        mut sensor_events: mpsc::Receiver<SensorEvent>,
        shutdown: F,
    ) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        tokio::pin!(shutdown);

        self.reconcile_store().await;
        self.publish_status();

        info!("Session controller running");

        loop {
            let input = tokio::select! {
                _ = &mut shutdown => Input::Shutdown,
                event = sensor_events.recv() => Input::Sensor(event),
                Some(fired) = self.timer_rx.recv() => Input::Timer(fired),
                Some(done) = self.completion_rx.recv() => Input::Completion(done),
            };

            match input {
                Input::Sensor(Some(event)) => self.on_sensor(event)?,
                Input::Sensor(None) => {
                    warn!("Sensor stream ended");
                    break;
                }
                Input::Timer(fired) => self.on_timer(fired).await,
                Input::Completion(done) => self.on_completion(done).await,
                Input::Shutdown => {
                    info!("Shutdown requested");
                    break;
                }
            }
        }

        self.shutdown().await;

        Ok(())
    }

    fn on_sensor(&mut self, event: SensorEvent) -> Result<()> {
        match event {
            SensorEvent::Rising => {
                // The guard flips before any collaborator call is issued
                if !self.guard.try_acquire() {
                    debug!("Motion detected during {:?}; ignoring", self.state);
                    return Ok(());
                }

                if let Some(ctx) = &self.current {
                    bail!(
                        "Guard acquired while session {} is still {:?}",
                        ctx.attempt,
                        self.state
                    );
                }

                info!("Motion detected!");
                self.begin_creation();
            }
            SensorEvent::Falling => {
                info!("Motion stopped");
            }
            SensorEvent::Fault(message) => {
                let fault = SessionFault::SensorRead(message);
                error!("{}", fault);
                self.record_fault(&fault);
            }
        }

        Ok(())
    }

    /// Idle -> Creating
    fn begin_creation(&mut self) {
        let ctx = SessionContext::new();
        let attempt = ctx.attempt;
        self.current = Some(ctx);
        self.state = LifecycleState::Creating;
        self.publish_status();

        let video = Arc::clone(&self.collaborators.video);
        let mode = self.config.media_mode;
        let completion_tx = self.completion_tx.clone();

        tokio::spawn(async move {
            let result = video
                .create_session(mode)
                .await
                .map_err(SessionFault::creation);
            let _ = completion_tx.send(Completion::Created { attempt, result });
        });
    }

    async fn on_completion(&mut self, done: Completion) {
        match done {
            Completion::Created { attempt, result } => self.on_created(attempt, result).await,
            Completion::TornDown { attempt, result } => self.on_torn_down(attempt, result).await,
        }
    }

    /// Creating -> Active, or Creating -> CoolingDown on any failure
    async fn on_created(&mut self, attempt: Uuid, result: Result<String, SessionFault>) {
        if !self.is_current(attempt, LifecycleState::Creating) {
            warn!("Ignoring creation result for stale attempt {}", attempt);
            return;
        }

        let external_session_id = match result {
            Ok(id) => id,
            Err(fault) => {
                error!("{}", fault);
                self.record_fault(&fault);

                let backoff = self.config.creation_backoff();
                warn!("No session this time; accepting motion again in {:?}", backoff);
                self.state = LifecycleState::CoolingDown;
                self.timers.arm(attempt, TimerKind::Rearm, backoff);
                self.publish_status();
                return;
            }
        };

        info!("Session {} created", external_session_id);
        self.sessions_started += 1;

        if self.store_dirty {
            self.reconcile_store().await;
        }

        let record = match self
            .collaborators
            .store
            .create_active(&external_session_id)
            .await
        {
            Ok(record) => Some(record),
            Err(e) => {
                let fault = SessionFault::persistence(e);
                warn!("{}; viewers will not find session {}", fault, external_session_id);
                self.record_fault(&fault);
                self.store_dirty = true;
                None
            }
        };

        if let Some(ctx) = self.current.as_mut() {
            ctx.external_session_id = Some(external_session_id.clone());
            ctx.record = record;
        }

        self.dispatch_notification();

        match self
            .collaborators
            .publisher
            .start(&external_session_id)
            .await
        {
            Ok(handle) => {
                info!(
                    "Publishing into {} via {}",
                    external_session_id,
                    self.collaborators.publisher.name()
                );
                if let Some(ctx) = self.current.as_mut() {
                    ctx.publish = Some(handle);
                }
                self.state = LifecycleState::Active;
                self.timers
                    .arm(attempt, TimerKind::Close, self.config.session_duration());
                self.timers
                    .arm(attempt, TimerKind::Rearm, self.config.rearm_delay());
            }
            Err(e) => {
                // Nothing is capturing, so skip straight past Closing
                let fault = SessionFault::publish_start(e);
                error!("{}; closing session {} now", fault, external_session_id);
                self.record_fault(&fault);

                self.close_current_record().await;
                self.state = LifecycleState::CoolingDown;
                self.timers
                    .arm(attempt, TimerKind::Rearm, self.config.cooldown_buffer());
            }
        }

        self.publish_status();
    }

    /// Fire-and-forget; the outcome is only logged
    fn dispatch_notification(&self) {
        let notification = Notification::motion_detected(&self.public_url);
        let notifier = Arc::clone(&self.collaborators.notifier);

        tokio::spawn(async move {
            match notifier.send(&notification).await {
                Ok(receipt) => {
                    info!("Message {} sent successfully", receipt.message_uuid);
                }
                Err(e) => {
                    error!("{}", SessionFault::notification(e));
                }
            }
        });
    }

    async fn on_timer(&mut self, fired: TimerFired) {
        if !self.timers.fired(&fired) {
            debug!("Ignoring cancelled {:?} timer for {}", fired.kind, fired.attempt);
            return;
        }

        match fired.kind {
            TimerKind::Close => {
                if self.is_current(fired.attempt, LifecycleState::Active) {
                    info!("Time limit expired. Closing stream");
                    self.begin_close();
                    self.publish_status();
                }
            }
            TimerKind::Rearm => self.on_rearm(fired.attempt).await,
        }
    }

    /// Active -> Closing: stop then release capture on a background task
    fn begin_close(&mut self) {
        let Some(ctx) = self.current.as_mut() else {
            return;
        };

        let attempt = ctx.attempt;
        let handle = ctx.publish.take();
        self.state = LifecycleState::Closing;

        let publisher = Arc::clone(&self.collaborators.publisher);
        let completion_tx = self.completion_tx.clone();

        let task = tokio::spawn(async move {
            let result = teardown(publisher.as_ref(), handle).await;
            let _ = completion_tx.send(Completion::TornDown { attempt, result });
        });

        self.teardowns.insert(attempt, task);
    }

    /// Closing -> CoolingDown
    async fn on_torn_down(&mut self, attempt: Uuid, result: Result<(), SessionFault>) {
        self.teardowns.remove(&attempt);

        if let Err(fault) = &result {
            error!("{}", fault);
            self.record_fault(fault);
        }

        if self.is_current(attempt, LifecycleState::Closing) {
            self.close_current_record().await;
            self.state = LifecycleState::CoolingDown;
            info!("Session closed; cooling down");
            self.publish_status();
        } else if self.draining.remove(&attempt).is_some() {
            info!("Late teardown of {} finished", attempt);
        } else {
            debug!("Teardown finished for unknown attempt {}", attempt);
        }
    }

    /// CoolingDown -> Idle. Runs on schedule even if teardown is still going.
    async fn on_rearm(&mut self, attempt: Uuid) {
        if !self.current.as_ref().is_some_and(|ctx| ctx.attempt == attempt) {
            debug!("Ignoring rearm for stale attempt {}", attempt);
            return;
        }

        if self.state == LifecycleState::Active {
            warn!("Rearm fired before close; closing now");
            self.timers.cancel(attempt);
            self.begin_close();
        }

        if self.state == LifecycleState::Closing {
            warn!("Cooldown elapsed before teardown finished");
            // Keep a single active record before the guard reopens
            self.close_current_record().await;
            if let Some(ctx) = self.current.take() {
                self.draining.insert(ctx.attempt, ctx);
            }
        }

        self.current = None;
        self.guard.release();
        self.state = LifecycleState::Idle;
        info!("Ready for a new session");
        self.publish_status();
    }

    /// Mark the current record inactive, surfacing store failures
    async fn close_current_record(&mut self) {
        let Some(record) = self
            .current
            .as_ref()
            .and_then(|ctx| ctx.record.as_ref())
            .filter(|record| record.active)
            .cloned()
        else {
            return;
        };

        let closed = match self.collaborators.store.mark_inactive(&record).await {
            Ok(updated) => updated,
            Err(e) => {
                let fault = SessionFault::persistence(e);
                warn!(
                    "{}; store still lists session {} as active",
                    fault, record.external_session_id
                );
                self.record_fault(&fault);
                self.store_dirty = true;
                let mut local = record;
                local.close();
                local
            }
        };

        if let Some(ctx) = self.current.as_mut() {
            ctx.record = Some(closed);
        }
    }

    /// Close any active rows the store holds that no live session owns
    async fn reconcile_store(&mut self) {
        let store = Arc::clone(&self.collaborators.store);

        let rows = match store.list().await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("{}", SessionFault::persistence(e));
                return;
            }
        };

        let mut clean = true;
        for row in rows.iter().filter(|row| row.active) {
            warn!("Closing stale active session record {}", row.id);
            if let Err(e) = store.mark_inactive(row).await {
                warn!("{}", SessionFault::persistence(e));
                clean = false;
            }
        }

        self.store_dirty = !clean;
    }

    /// Cancel timers, force teardown and close records
    async fn shutdown(&mut self) {
        let cancelled = self.timers.cancel_all();
        info!("Shutting down: {} timers cancelled", cancelled);

        if self.state == LifecycleState::Active {
            let handle = self.current.as_mut().and_then(|ctx| ctx.publish.take());
            if let Err(fault) = teardown(self.collaborators.publisher.as_ref(), handle).await {
                error!("{}", fault);
            }
        }

        let pending: Vec<_> = self.teardowns.drain().map(|(_, task)| task).collect();
        if !pending.is_empty() {
            info!("Waiting for {} teardowns", pending.len());
            for joined in futures::future::join_all(pending).await {
                if let Err(e) = joined {
                    error!("Teardown task panicked: {}", e);
                }
            }
        }

        self.close_current_record().await;
        self.current = None;
        self.draining.clear();
        self.state = LifecycleState::Idle;
        self.publish_status();

        info!("Session controller stopped");
    }

    fn is_current(&self, attempt: Uuid, state: LifecycleState) -> bool {
        self.state == state
            && self
                .current
                .as_ref()
                .is_some_and(|ctx| ctx.attempt == attempt)
    }

    fn record_fault(&mut self, fault: &SessionFault) {
        self.last_fault = Some(fault.to_string());
        self.publish_status();
    }

    fn publish_status(&self) {
        self.status_tx.send_replace(LifecycleStatus {
            state: self.state,
            accepting_new_session: self.guard.is_accepting(),
            external_session_id: self
                .current
                .as_ref()
                .and_then(|ctx| ctx.external_session_id.clone()),
            sessions_started: self.sessions_started,
            last_fault: self.last_fault.clone(),
        });
    }
}

/// Stop capture, then release it. Both run even if the first fails.
async fn teardown(
    publisher: &dyn PublishAgent,
    handle: Option<PublishHandle>,
) -> Result<(), SessionFault> {
    let Some(handle) = handle else {
        return Ok(());
    };

    let stopped = publisher.stop(&handle).await;
    if let Err(e) = &stopped {
        warn!("Failed to stop capture for {}: {:#}", handle.session_id, e);
    }

    let released = publisher.release(handle).await;

    stopped.and(released).map_err(SessionFault::teardown)
}
