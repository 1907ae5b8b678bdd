//! Login command: verify credentials and show the signed-in profile.

use owo_colors::OwoColorize;

use stockpile_core::Session;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub fn handle(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let profile = session.profile().borrow().clone();

    let text = match profile {
        Some(profile) => {
            let mut lines = vec![
                format!("Signed in as: {}", profile.name),
                format!("Role:         {}", profile.role),
            ];
            if let Some(ref email) = profile.email {
                lines.push(format!("Email:        {email}"));
            }
            if let Some(limits) = profile.limits {
                lines.push(format!("Max sale:     {:.2}", limits.max_sale_value));
            }
            if output::should_color(&global.color) {
                format!("{}\n{}", "✓ Credentials valid".green(), lines.join("\n"))
            } else {
                format!("✓ Credentials valid\n{}", lines.join("\n"))
            }
        }
        // Authenticated, but the identity has no profile document yet.
        None => "✓ Credentials valid (no profile document for this account)".to_string(),
    };

    output::print_output(&text, global.quiet);
    Ok(())
}
