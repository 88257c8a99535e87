//! CLI command implementations.

mod admin;
mod auth;
mod requests;

pub use admin::{notifications_list, shops_list, users_list};
pub use auth::{login, whoami};
pub use requests::{requests_comment, requests_complete, requests_list, requests_show_comments};

use anyhow::Result;
use desk_api::DeskApi;
use desk_auth::{GuardDecision, Role, RouteGuard, SessionContext, SessionSnapshot};
use desk_config_and_utils::Config;
use desk_http::{ApiClient, AuthEndpoints, ReqwestTransport};
use std::io::{self, Write};
use std::sync::Arc;
use tracing::{debug, info};

/// Environment variable read instead of prompting for a password.
const ENV_PASSWORD: &str = "DESK_PASSWORD";

/// A connected client: session context plus typed API.
pub struct Desk {
    session: Arc<SessionContext>,
    api: DeskApi,
    login_path: String,
    landing_path: String,
}

impl Desk {
    /// Build the HTTP stack for the configured API base.
    pub fn connect(config: &Config) -> Result<Self> {
        let base_url = config.api_base_url()?;
        debug!(api_base = %base_url, "Connecting");
        let transport = ReqwestTransport::new(base_url)?;
        let client = Arc::new(ApiClient::new(Arc::new(transport)));
        let session = SessionContext::new(client.clone(), AuthEndpoints::default());

        Ok(Self {
            session,
            api: DeskApi::new(client),
            login_path: config.login_path.clone(),
            landing_path: config.landing_path.clone(),
        })
    }

    pub fn api(&self) -> &DeskApi {
        &self.api
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Restore the session, logging in with `login` when restore finds none.
    ///
    /// The password comes from `DESK_PASSWORD` or an interactive prompt.
    pub async fn sign_in(&self, login: Option<&str>) -> Result<SessionSnapshot> {
        let restored = self.session.initialize().await;
        if restored.session.has_token() {
            debug!("Session restored from refresh cookie");
            return Ok(restored);
        }

        let login = match login {
            Some(login) => login.to_string(),
            None => prompt_line("Login: ")?,
        };
        if login.is_empty() {
            anyhow::bail!("Login is required");
        }

        let password = match std::env::var(ENV_PASSWORD) {
            Ok(password) if !password.is_empty() => password,
            _ => rpassword::prompt_password("Password: ")?,
        };
        if password.is_empty() {
            anyhow::bail!("Password is required");
        }

        let snapshot = self.session.login(&login, &password).await?;
        info!(login = %login, "Logged in");
        Ok(snapshot)
    }

    /// Check the current session against a guard for `location`.
    pub async fn authorize(&self, roles: Option<&[Role]>, location: &str) -> Result<()> {
        let guard = match roles {
            Some(roles) => RouteGuard::for_roles(roles.iter().cloned()),
            None => RouteGuard::new(),
        }
        .with_login_path(self.login_path.as_str())
        .with_landing_path(self.landing_path.as_str());

        let mut updates = self.session.subscribe();
        match guard.resolve(&mut updates, location).await {
            GuardDecision::Render => Ok(()),
            GuardDecision::RedirectToLogin { from } => {
                anyhow::bail!("Login required to open {}", from)
            }
            GuardDecision::RedirectToLanding { .. } => {
                let role = self
                    .session
                    .snapshot()
                    .user()
                    .map(|user| user.role.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                anyhow::bail!("Role {} may not open {}", role, location)
            }
            GuardDecision::Loading => anyhow::bail!("Session is still loading"),
        }
    }

    /// End the session. Safe to call when nobody is logged in.
    pub async fn close(&self) {
        self.session.logout().await;
    }
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
