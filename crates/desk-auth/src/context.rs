//! Session context: the single owner of "who is logged in".
//!
//! State changes go through the session FSM and are published on a `watch`
//! channel, so observers (route guards, UIs) always see the phase and the
//! session data change together.

use crate::error::{AuthError, AuthResult};
use crate::session::{Session, SessionSnapshot, User, WhoAmIResponse};
use crate::session_fsm::{SessionMachine, SessionMachineInput, SessionPhase};
use desk_http::{
    AccessToken, ApiClient, ApiRequest, AuthEndpoints, HttpError, SessionListener, TokenResponse,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::{Arc, Weak};
use tokio::sync::{watch, OnceCell};
use tracing::{debug, error, info, warn};

#[derive(Serialize)]
struct LoginRequest<'a> {
    login: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest<'a> {
    login: &'a str,
    password: &'a str,
    role_name: &'a str,
}

pub struct SessionContext {
    client: Arc<ApiClient>,
    endpoints: AuthEndpoints,
    fsm: Mutex<SessionMachine>,
    state: watch::Sender<SessionSnapshot>,
    initialized: OnceCell<()>,
}

impl SessionContext {
    /// Create a context and register it as the client's session listener.
    pub fn new(client: Arc<ApiClient>, endpoints: AuthEndpoints) -> Arc<Self> {
        let (state, _) = watch::channel(SessionSnapshot::initializing());
        let context = Arc::new(Self {
            client,
            endpoints,
            fsm: Mutex::new(SessionMachine::new()),
            state,
            initialized: OnceCell::new(),
        });

        let listener: Weak<dyn SessionListener> =
            Arc::downgrade(&context) as Weak<dyn SessionListener>;
        context.client.set_listener(listener);
        context
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    pub fn phase(&self) -> SessionPhase {
        SessionPhase::from(self.fsm.lock().state())
    }

    /// Restore the session from the refresh cookie.
    ///
    /// Runs once per context; later calls wait for the first run and return
    /// the current snapshot.
    pub async fn initialize(&self) -> SessionSnapshot {
        self.initialized.get_or_init(|| self.restore()).await;
        self.snapshot()
    }

    async fn restore(&self) {
        debug!("Restoring session");

        let token = match self.client.refresh_session().await {
            Ok(token) => token,
            Err(err) => {
                debug!(error = %err, "No session to restore");
                self.client.attach_access_token(None);
                self.tolerate(self.apply(SessionMachineInput::RestoreFailed, Session::clear));
                return;
            }
        };

        self.client.attach_access_token(Some(token.clone()));
        match self.fetch_profile().await {
            Ok(user) => {
                info!(user = %user.username, role = %user.role, "Session restored");
                self.tolerate(self.apply(SessionMachineInput::RestoreSucceeded, |session| {
                    session.access_token = Some(token);
                    session.user = Some(user);
                }));
            }
            Err(err) => {
                warn!(error = %err, "Failed to load profile during restore");
                self.client.attach_access_token(None);
                self.tolerate(self.apply(SessionMachineInput::RestoreFailed, Session::clear));
            }
        }
    }

    /// Log in with credentials.
    ///
    /// A failed profile fetch keeps the token and leaves `user` empty.
    pub async fn login(&self, login: &str, password: &str) -> AuthResult<SessionSnapshot> {
        self.apply(SessionMachineInput::LoginAttempt, |_| {})?;
        info!(login = %login, "Logging in");

        let token = match self.request_token(login, password).await {
            Ok(token) => token,
            Err(err) => {
                warn!(login = %login, error = %err, "Login failed");
                self.client.attach_access_token(None);
                self.tolerate(self.apply(SessionMachineInput::LoginFailed, Session::clear));
                return Err(match err {
                    AuthError::Http(http) if http.is_unauthorized() => {
                        AuthError::InvalidCredentials(login.to_string())
                    }
                    other => other,
                });
            }
        };

        self.client.attach_access_token(Some(token.clone()));
        let (user, profile_error) = match self.fetch_profile().await {
            Ok(user) => (Some(user), None),
            Err(err) => {
                error!(error = %err, "Logged in but failed to load profile");
                (None, Some(err))
            }
        };

        let applied = self.apply(SessionMachineInput::LoginSuccess, |session| {
            session.access_token = Some(token);
            session.user = user;
        });
        match (applied, profile_error) {
            (Ok(_), _) => Ok(self.snapshot()),
            // A forced logout during the profile fetch already ended the session.
            (Err(_), Some(cause)) if self.phase() == SessionPhase::Anonymous => Err(cause),
            (Err(err), _) => Err(err),
        }
    }

    async fn request_token(&self, login: &str, password: &str) -> AuthResult<AccessToken> {
        let request =
            ApiRequest::post(self.endpoints.login.clone()).json(&LoginRequest { login, password })?;
        let response: TokenResponse = self.client.json(request).await?;
        Ok(response.access_token)
    }

    async fn fetch_profile(&self) -> AuthResult<User> {
        let profile: WhoAmIResponse = self.client.get_json(&self.endpoints.whoami).await?;
        Ok(User::from(profile))
    }

    /// Log out. The server call is best effort; local state is always cleared.
    pub async fn logout(&self) {
        let requested = self.apply(SessionMachineInput::LogoutRequested, |_| {});
        if requested.is_err() {
            debug!(phase = ?self.phase(), "Logout without an active session");
        } else if let Err(err) = self
            .client
            .execute(ApiRequest::post(self.endpoints.logout.clone()))
            .await
        {
            warn!(error = %err, "Logout request failed, clearing local session anyway");
        }

        self.client.attach_access_token(None);
        if requested.is_ok() {
            self.tolerate(self.apply(SessionMachineInput::LogoutComplete, Session::clear));
        } else {
            self.publish(Session::clear);
        }
        info!("Logged out");
    }

    /// Create an account. Does not change the current session.
    pub async fn register(&self, login: &str, password: &str, role_name: &str) -> AuthResult<()> {
        let request = ApiRequest::post(self.endpoints.register.clone()).json(&RegisterRequest {
            login,
            password,
            role_name,
        })?;
        self.client.execute(request).await?;
        info!(login = %login, role = %role_name, "Account registered");
        Ok(())
    }

    /// Drop the session locally after the refresh credential was rejected.
    fn force_logout(&self, reason: &HttpError) {
        warn!(error = %reason, "Session expired, logging out");
        self.client.attach_access_token(None);
        if self
            .apply(SessionMachineInput::SessionRevoked, Session::clear)
            .is_err()
        {
            self.publish(Session::clear);
        }
    }

    /// Transition the FSM and publish the new phase with the session update.
    fn apply(
        &self,
        input: SessionMachineInput,
        update: impl FnOnce(&mut Session),
    ) -> AuthResult<SessionPhase> {
        let mut fsm = self.fsm.lock();
        let old_phase = SessionPhase::from(fsm.state());

        fsm.consume(&input).map_err(|_| {
            AuthError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                fsm.state()
            ))
        })?;

        let new_phase = SessionPhase::from(fsm.state());
        self.state.send_modify(|snapshot| {
            snapshot.phase = new_phase;
            update(&mut snapshot.session);
        });
        drop(fsm);

        if old_phase != new_phase {
            debug!(old_phase = ?old_phase, new_phase = ?new_phase, "Session state transition");
        }
        Ok(new_phase)
    }

    /// Publish a session update without a phase change.
    fn publish(&self, update: impl FnOnce(&mut Session)) {
        let phase = self.phase();
        self.state.send_modify(|snapshot| {
            snapshot.phase = phase;
            update(&mut snapshot.session);
        });
    }

    /// Transitions that race with a forced logout may be rejected; that is fine.
    fn tolerate(&self, result: AuthResult<SessionPhase>) {
        if let Err(err) = result {
            debug!(error = %err, "Ignoring stale session transition");
        }
    }
}

impl SessionListener for SessionContext {
    fn token_refreshed(&self, token: &AccessToken) {
        if self.phase().is_authenticated() {
            let token = token.clone();
            self.publish(move |session| session.access_token = Some(token));
        }
    }

    fn refresh_failed(&self, error: &HttpError) {
        self.force_logout(error);
    }
}
