//! Dashboard command: headline numbers plus the most recent sales.

use owo_colors::OwoColorize;

use stockpile_core::Session;
use stockpile_core::analytics;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

pub fn handle(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let snapshot = session.business_snapshot();
    let summary = session.summary();

    // Structured formats get the raw summary; the table view gets a
    // small hand-laid report.
    if !matches!(global.output, OutputFormat::Table) {
        let out = output::render_single(&global.output, &summary, |_| String::new(), |_| {
            String::new()
        });
        output::print_output(&out, global.quiet);
        return Ok(());
    }

    let color = output::should_color(&global.color);
    let heading = |text: &str| {
        if color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    };

    let mut lines = vec![
        heading("Dashboard"),
        format!("Total revenue:    {:.2}", summary.total_revenue),
        format!("Inventory value:  {:.2}", summary.inventory_value),
        format!("Products:         {}", summary.product_count),
        format!("Suppliers:        {}", summary.supplier_count),
        String::new(),
        heading("Recent sales"),
    ];

    let recent = analytics::recent_sales(&snapshot);
    if recent.is_empty() {
        lines.push("(no sales recorded)".into());
    }
    for sale in recent {
        lines.push(format!(
            "{}  {} x {}  {:.2}",
            sale.date, sale.quantity, sale.product_name, sale.total_price
        ));
    }

    output::print_output(&lines.join("\n"), global.quiet);
    Ok(())
}
