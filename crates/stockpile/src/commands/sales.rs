//! Sales command handlers.

use std::sync::Arc;

use tabled::Tabled;

use stockpile_core::{Sale, SaleDraft, Session};

use crate::cli::{GlobalOpts, SalesArgs, SalesCommand};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SaleRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Product")]
    product: String,
    #[tabled(rename = "Qty")]
    quantity: u32,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Employee")]
    employee: String,
}

fn sale_row(sale: &Arc<Sale>, session: &Session) -> SaleRow {
    // Resolve the employee's display name from the users replica.
    let employee = session
        .replicas()
        .user_by_id(&sale.employee_id)
        .map_or_else(|| "N/A".to_string(), |u| u.name.clone());

    SaleRow {
        id: sale.id.clone(),
        product: sale.product_name.clone(),
        quantity: sale.quantity,
        total: format!("{:.2}", sale.total_price),
        date: sale.date.clone(),
        employee,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: SalesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SalesCommand::List => {
            // Newest first, straight from the replica's ordering contract.
            let snap = session.sales_snapshot();
            let out = output::render_list(
                &global.output,
                &snap,
                |s| sale_row(s, session),
                |s| s.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SalesCommand::Record { product, quantity } => {
            let sale = session
                .record_sale(SaleDraft {
                    product_id: product,
                    quantity,
                })
                .await?;

            output::print_output(
                &format!(
                    "Sale of {} x {} recorded successfully! Total: {:.2}",
                    sale.quantity, sale.product_name, sale.total_price
                ),
                global.quiet,
            );
            Ok(())
        }
    }
}
