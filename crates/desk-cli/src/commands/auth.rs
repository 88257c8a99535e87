//! Authentication commands.

use super::Desk;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use desk_auth::{SessionPhase, SessionSnapshot};
use serde::Serialize;
use std::fmt;

/// Who is logged in, as printed by `whoami`.
#[derive(Serialize)]
struct Identity {
    phase: SessionPhase,
    username: Option<String>,
    role: Option<String>,
}

impl From<&SessionSnapshot> for Identity {
    fn from(snapshot: &SessionSnapshot) -> Self {
        Self {
            phase: snapshot.phase,
            username: snapshot.user().map(|u| u.username.clone()),
            role: snapshot.user().map(|u| u.role.to_string()),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Session:  {:?}", self.phase)?;
        writeln!(f, "User:     {}", self.username.as_deref().unwrap_or("unknown"))?;
        write!(f, "Role:     {}", self.role.as_deref().unwrap_or("unknown"))
    }
}

/// Log in and report the resulting user.
pub async fn login(desk: &Desk, login: Option<&str>, format: &OutputFormat) -> Result<()> {
    let snapshot = desk.sign_in(login).await?;
    let name = snapshot
        .user()
        .map(|u| u.username.as_str())
        .unwrap_or("user");
    output::print_success(&format!("Logged in as {}", name), format);
    Ok(())
}

/// Show the current session.
pub async fn whoami(desk: &Desk, login: Option<&str>, format: &OutputFormat) -> Result<()> {
    desk.sign_in(login).await?;
    let snapshot = desk.session().snapshot();
    output::print(&Identity::from(&snapshot), format);
    Ok(())
}
