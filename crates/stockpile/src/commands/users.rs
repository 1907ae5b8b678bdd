//! User account command handlers. Manager gated.

use std::io::IsTerminal;
use std::sync::Arc;

use secrecy::SecretString;
use tabled::Tabled;

use stockpile_core::{NewEmployee, Session, UserProfile};

use crate::cli::{GlobalOpts, UsersArgs, UsersCommand};
use crate::error::CliError;
use crate::output;

use super::require_manager;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Max Sale")]
    max_sale: String,
}

impl From<&Arc<UserProfile>> for UserRow {
    fn from(u: &Arc<UserProfile>) -> Self {
        Self {
            id: u.id.clone(),
            name: u.name.clone(),
            email: u.email.clone().unwrap_or_default(),
            role: u.role.to_string(),
            max_sale: u
                .limits
                .map_or_else(String::new, |l| format!("{:.2}", l.max_sale_value)),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: UsersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    require_manager(session, "users")?;

    match args.command {
        UsersCommand::List => {
            let snap = session.users_snapshot();
            let out = output::render_list(&global.output, &snap, |u| UserRow::from(u), |u| u.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        UsersCommand::Register {
            name,
            email,
            role,
            max_sale_value,
        } => {
            let password = prompt_new_password(&email)?;

            let account_id = session
                .register_employee(NewEmployee {
                    name: name.clone(),
                    email,
                    password,
                    role: role.into(),
                    limits: max_sale_value
                        .map(|max_sale_value| stockpile_core::SaleLimits { max_sale_value }),
                })
                .await?;

            // The backend rotated the active session to the new account;
            // this invocation's sign-out will revoke *their* session, and
            // the manager has to sign in again next time regardless.
            output::print_output(
                &format!(
                    "Registered '{name}' ({account_id}).\n\
                     Note: the active session switched to the new account; \
                     sign in again for further manager work."
                ),
                global.quiet,
            );
            Ok(())
        }
    }
}

fn prompt_new_password(email: &str) -> Result<SecretString, CliError> {
    if !std::io::stdin().is_terminal() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "registration needs an interactive terminal to set the password".into(),
        });
    }

    let first = rpassword::prompt_password(format!("Password for {email}: "))?;
    let second = rpassword::prompt_password("Repeat password: ")?;
    if first != second {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "passwords do not match".into(),
        });
    }
    Ok(SecretString::from(first))
}
