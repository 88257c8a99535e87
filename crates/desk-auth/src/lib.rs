//! Session state and access control for the facility desk client.

pub mod context;
pub mod error;
pub mod guard;
pub mod session;
pub mod session_fsm;

pub use context::SessionContext;
pub use error::{AuthError, AuthResult};
pub use guard::{GuardDecision, RouteGuard, DEFAULT_LANDING_PATH, DEFAULT_LOGIN_PATH};
pub use session::{Role, Session, SessionSnapshot, User};
pub use session_fsm::{SessionMachineInput, SessionMachineState, SessionPhase};
