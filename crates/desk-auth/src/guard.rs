//! Route guard: decides whether a location may be shown for the current session.

use crate::session::{Role, SessionSnapshot};
use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_LANDING_PATH: &str = "/requests";

/// Outcome of a guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GuardDecision {
    /// Session restore has not settled; show nothing yet.
    Loading,
    /// No token. `from` is where to return after login.
    RedirectToLogin { from: String },
    /// Logged in, but the role is not allowed here.
    RedirectToLanding { to: String },
    Render,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    allowed_roles: Option<Vec<Role>>,
    login_path: String,
    landing_path: String,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteGuard {
    /// Guard that only requires a session.
    pub fn new() -> Self {
        Self {
            allowed_roles: None,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            landing_path: DEFAULT_LANDING_PATH.to_string(),
        }
    }

    /// Guard that also requires one of `roles`.
    pub fn for_roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed_roles: Some(roles.into_iter().collect()),
            ..Self::new()
        }
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn with_landing_path(mut self, path: impl Into<String>) -> Self {
        self.landing_path = path.into();
        self
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn landing_path(&self) -> &str {
        &self.landing_path
    }

    pub fn evaluate(&self, snapshot: &SessionSnapshot, location: &str) -> GuardDecision {
        if snapshot.is_loading() {
            return GuardDecision::Loading;
        }
        if !snapshot.session.has_token() {
            return GuardDecision::RedirectToLogin {
                from: location.to_string(),
            };
        }
        if let Some(allowed) = &self.allowed_roles {
            let permitted = snapshot
                .session
                .role()
                .is_some_and(|role| allowed.contains(role));
            if !permitted {
                debug!(
                    location = %location,
                    role = ?snapshot.session.role(),
                    "Role not allowed, redirecting to landing"
                );
                return GuardDecision::RedirectToLanding {
                    to: self.landing_path.clone(),
                };
            }
        }
        GuardDecision::Render
    }

    /// Wait for the session to finish loading, then evaluate.
    pub async fn resolve(
        &self,
        session: &mut watch::Receiver<SessionSnapshot>,
        location: &str,
    ) -> GuardDecision {
        if session
            .wait_for(|snapshot| !snapshot.is_loading())
            .await
            .is_err()
        {
            debug!(location = %location, "Session context dropped before settling");
        }
        let settled = session.borrow().clone();
        self.evaluate(&settled, location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Session, User};
    use crate::session_fsm::SessionPhase;
    use desk_http::AccessToken;
    use std::time::Duration;

    fn snapshot(phase: SessionPhase, token: bool, role: Option<Role>) -> SessionSnapshot {
        SessionSnapshot {
            phase,
            session: Session {
                access_token: token.then(|| AccessToken::new("t")),
                user: role.map(|role| User {
                    username: "someone".into(),
                    role,
                }),
            },
        }
    }

    #[test]
    fn test_loading_while_initializing() {
        let guard = RouteGuard::new();
        let snap = snapshot(SessionPhase::Initializing, false, None);
        assert_eq!(guard.evaluate(&snap, "/requests"), GuardDecision::Loading);
    }

    #[test]
    fn test_redirects_to_login_without_token() {
        let guard = RouteGuard::new();
        let snap = snapshot(SessionPhase::Anonymous, false, None);
        assert_eq!(
            guard.evaluate(&snap, "/admin/users"),
            GuardDecision::RedirectToLogin {
                from: "/admin/users".into()
            }
        );
    }

    #[test]
    fn test_renders_with_token_and_no_allow_list() {
        let guard = RouteGuard::new();
        let snap = snapshot(SessionPhase::Authenticated, true, None);
        assert_eq!(guard.evaluate(&snap, "/requests"), GuardDecision::Render);
    }

    #[test]
    fn test_wrong_role_goes_to_landing() {
        let guard = RouteGuard::for_roles([Role::Admin]);
        let snap = snapshot(SessionPhase::Authenticated, true, Some(Role::Contractor));
        assert_eq!(
            guard.evaluate(&snap, "/admin/users"),
            GuardDecision::RedirectToLanding {
                to: "/requests".into()
            }
        );
    }

    #[test]
    fn test_missing_profile_goes_to_landing_when_roles_required() {
        let guard = RouteGuard::for_roles([Role::Admin]).with_landing_path("/home");
        let snap = snapshot(SessionPhase::Authenticated, true, None);
        assert_eq!(
            guard.evaluate(&snap, "/admin/shops"),
            GuardDecision::RedirectToLanding { to: "/home".into() }
        );
    }

    #[test]
    fn test_allowed_role_renders() {
        let guard = RouteGuard::for_roles([Role::Admin, Role::StoreManager]);
        let snap = snapshot(SessionPhase::Authenticated, true, Some(Role::StoreManager));
        assert_eq!(guard.evaluate(&snap, "/requests/new"), GuardDecision::Render);
    }

    #[test]
    fn test_custom_paths() {
        let guard = RouteGuard::new()
            .with_login_path("/signin")
            .with_landing_path("/home");
        assert_eq!(guard.login_path(), "/signin");
        assert_eq!(guard.landing_path(), "/home");
    }

    #[tokio::test]
    async fn test_resolve_waits_for_initialization() {
        let (tx, mut rx) = watch::channel(snapshot(SessionPhase::Initializing, false, None));
        let guard = RouteGuard::for_roles([Role::Admin]);

        let pending = tokio::spawn(async move { guard.resolve(&mut rx, "/admin/users").await });
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        tx.send_replace(snapshot(SessionPhase::Authenticated, true, Some(Role::Admin)));
        let decision = tokio::time::timeout(Duration::from_secs(1), pending)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(decision, GuardDecision::Render);
    }

    #[tokio::test]
    async fn test_resolve_after_context_dropped() {
        let (tx, mut rx) = watch::channel(snapshot(SessionPhase::Initializing, false, None));
        drop(tx);
        let decision = RouteGuard::new().resolve(&mut rx, "/requests").await;
        assert_eq!(decision, GuardDecision::Loading);
    }
}
