//! Command handlers and dispatch.

pub mod ask;
pub mod config_cmd;
pub mod dashboard;
pub mod login;
pub mod products;
pub mod sales;
pub mod suppliers;
pub mod users;

use stockpile_core::{Session, UserRole};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Route a parsed command to its handler.
pub async fn dispatch(
    cmd: Command,
    session: &Session,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Login => login::handle(session, global),
        Command::Products(args) => products::handle(session, args, global).await,
        Command::Suppliers(args) => suppliers::handle(session, args, global),
        Command::Sales(args) => sales::handle(session, args, global).await,
        Command::Users(args) => users::handle(session, args, global).await,
        Command::Dashboard => dashboard::handle(session, global),
        Command::Ask(args) => ask::handle(session, args, global).await,
        // Handled in main() before a session exists.
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}

/// Reject commands gated to the Manager role.
///
/// Advisory only -- the backend enforces nothing based on roles; this
/// mirrors the visibility rules of the rest of the tooling.
pub(crate) fn require_manager(session: &Session, command: &str) -> Result<(), CliError> {
    let role = session.profile().borrow().as_ref().map(|p| p.role);
    match role {
        Some(UserRole::Manager) => Ok(()),
        Some(role) => Err(CliError::AccessDenied {
            command: command.into(),
            role: role.to_string(),
        }),
        None => Err(CliError::AccessDenied {
            command: command.into(),
            role: "unknown (no profile)".into(),
        }),
    }
}
