//! Session state machine using rust-fsm.
//!
//! ```text
//! ┌────────────────┐ RestoreSucceeded ┌─────────────────┐
//! │  Initializing  │ ───────────────► │  Authenticated  │ ◄──┐
//! └───────┬────────┘                  └───┬─────────┬───┘    │
//!         │ RestoreFailed /               │         │        │ LoginSuccess
//!         │ SessionRevoked     LogoutRequested  LoginAttempt │
//!         ▼                               ▼         ▼        │
//! ┌────────────────┐ LogoutComplete ┌───────────┐ ┌──────────┴─┐
//! │   Anonymous    │ ◄───────────── │ LoggingOut│ │  LoggingIn │
//! └───────┬────────┘                └───────────┘ └────────────┘
//!         │ LoginAttempt                 LoginFailed / SessionRevoked
//!         └──────────► LoggingIn ──────────────────► Anonymous
//! ```
//!
//! `SessionRevoked` is the forced logout after an unrecoverable refresh.

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Initializing)

    Initializing => {
        RestoreSucceeded => Authenticated,
        RestoreFailed => Anonymous,
        SessionRevoked => Anonymous
    },
    Anonymous => {
        LoginAttempt => LoggingIn
    },
    LoggingIn => {
        LoginSuccess => Authenticated,
        LoginFailed => Anonymous,
        SessionRevoked => Anonymous
    },
    Authenticated => {
        LogoutRequested => LoggingOut,
        SessionRevoked => Anonymous,
        LoginAttempt => LoggingIn
    },
    LoggingOut => {
        LogoutComplete => Anonymous
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Public view of the session machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Silent restore has not settled yet.
    Initializing,
    Anonymous,
    LoggingIn,
    Authenticated,
    LoggingOut,
}

impl SessionPhase {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionPhase::Authenticated)
    }

    /// Returns true for in-progress phases.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SessionPhase::Initializing | SessionPhase::LoggingIn | SessionPhase::LoggingOut
        )
    }
}

impl From<&SessionMachineState> for SessionPhase {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Initializing => SessionPhase::Initializing,
            SessionMachineState::Anonymous => SessionPhase::Anonymous,
            SessionMachineState::LoggingIn => SessionPhase::LoggingIn,
            SessionMachineState::Authenticated => SessionPhase::Authenticated,
            SessionMachineState::LoggingOut => SessionPhase::LoggingOut,
        }
    }
}
