//! Per-request lifecycle state machine.
//!
//! ```text
//! Initial ──Success──► Completed
//!    │ ──Error/Cancel──► Failed
//!    │ Unauthorized
//!    ▼
//! RefreshingOrQueued ──RefreshErr/Cancel──► Failed
//!    │ RefreshOk
//!    ▼
//! Replayed ──Success──► Completed
//!          ──Error/Cancel──► Failed
//! ```
//!
//! `Replayed` has no `Unauthorized` input, so a second 401 cannot start
//! another refresh.

use crate::error::{HttpError, HttpResult};
use rust_fsm::*;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub request_attempt(Initial)

    Initial => {
        Success => Completed,
        Unauthorized => RefreshingOrQueued,
        Error => Failed,
        Cancel => Failed
    },
    RefreshingOrQueued => {
        RefreshOk => Replayed,
        RefreshErr => Failed,
        Cancel => Failed
    },
    Replayed => {
        Success => Completed,
        Error => Failed,
        Cancel => Failed
    }
}

pub use request_attempt::Input as AttemptInput;
pub use request_attempt::State as AttemptState;
pub use request_attempt::StateMachine as AttemptMachine;

/// Tracks one logical request through send, refresh, and replay.
pub struct RequestAttempt {
    machine: AttemptMachine,
}

impl Default for RequestAttempt {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestAttempt {
    pub fn new() -> Self {
        Self {
            machine: AttemptMachine::new(),
        }
    }

    pub fn state(&self) -> &AttemptState {
        self.machine.state()
    }

    /// Apply an input, mapping rejected transitions to an error.
    pub fn transition(&mut self, input: AttemptInput) -> HttpResult<()> {
        let from = self.machine.state().clone();
        self.machine.consume(&input).map(|_| ()).map_err(|_| {
            HttpError::InvalidAttemptTransition(format!("{:?} on {:?}", input, from))
        })
    }

    /// Whether a 401 in the current state may start the refresh flow.
    pub fn can_refresh(&self) -> bool {
        matches!(self.machine.state(), AttemptState::Initial)
    }

    pub fn is_replayed(&self) -> bool {
        matches!(self.machine.state(), AttemptState::Replayed)
    }

    pub fn is_settled(&self) -> bool {
        matches!(
            self.machine.state(),
            AttemptState::Completed | AttemptState::Failed
        )
    }
}
