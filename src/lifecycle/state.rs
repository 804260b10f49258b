use serde::Serialize;

/// Where the controller is in the session cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Waiting for motion; the guard is open
    Idle,
    /// Waiting on the video platform for a session id
    Creating,
    /// Publishing; the close timer is armed
    Active,
    /// Capture teardown in flight
    Closing,
    /// Waiting for the rearm timer
    CoolingDown,
}

/// Snapshot of the controller published after every transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleStatus {
    pub state: LifecycleState,

    /// Guard value: whether a Rising edge would start a session now
    pub accepting_new_session: bool,

    /// Video platform id of the session being handled, if any
    pub external_session_id: Option<String>,

    /// Sessions that reached the video platform since startup
    pub sessions_started: u64,

    /// Most recent collaborator fault, for operators
    pub last_fault: Option<String>,
}

impl Default for LifecycleStatus {
    fn default() -> Self {
        Self {
            state: LifecycleState::Idle,
            accepting_new_session: true,
            external_session_id: None,
            sessions_started: 0,
            last_fault: None,
        }
    }
}
