//! Supplier command handlers. Read-only, manager gated.

use std::sync::Arc;

use tabled::Tabled;

use stockpile_core::{Session, Supplier};

use crate::cli::{GlobalOpts, SuppliersArgs, SuppliersCommand};
use crate::error::CliError;
use crate::output;

use super::require_manager;

#[derive(Tabled)]
struct SupplierRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Contact")]
    contact: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Phone")]
    phone: String,
}

impl From<&Arc<Supplier>> for SupplierRow {
    fn from(s: &Arc<Supplier>) -> Self {
        Self {
            id: s.id.clone(),
            name: s.name.clone(),
            contact: s.contact_person.clone(),
            email: s.email.clone(),
            phone: s.phone.clone(),
        }
    }
}

pub fn handle(
    session: &Session,
    args: SuppliersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    require_manager(session, "suppliers")?;

    match args.command {
        SuppliersCommand::List => {
            let snap = session.suppliers_snapshot();
            let out = output::render_list(
                &global.output,
                &snap,
                |s| SupplierRow::from(s),
                |s| s.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
