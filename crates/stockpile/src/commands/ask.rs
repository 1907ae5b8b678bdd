//! Analytics assistant command. Manager gated.
//!
//! Sends the user's free-text question plus the full business snapshot
//! to the assist provider. Provider failures come back as a fixed
//! fallback string, never as an error.

use stockpile_core::Session;

use crate::cli::{AskArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::require_manager;

pub async fn handle(
    session: &Session,
    args: AskArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    require_manager(session, "ask")?;

    let query = args.query.join(" ");
    if query.trim().is_empty() {
        return Err(CliError::Validation {
            field: "query".into(),
            reason: "ask needs a question, e.g. stockpile ask \"What sells best?\"".into(),
        });
    }

    let answer = session.analyze_business_data(&query).await;
    output::print_output(&answer, global.quiet);
    Ok(())
}
