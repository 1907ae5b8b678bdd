//! Product command handlers.

use std::sync::Arc;

use tabled::Tabled;

use stockpile_core::{NewProduct, Product, Session};

use crate::cli::{GlobalOpts, ProductFields, ProductsArgs, ProductsCommand};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ProductRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Supplier")]
    supplier: String,
    #[tabled(rename = "Stock")]
    stock: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Cost")]
    cost: String,
}

impl From<&Arc<Product>> for ProductRow {
    fn from(p: &Arc<Product>) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            category: p.category.clone(),
            supplier: p.supplier_id.clone(),
            stock: if p.is_low_stock() {
                format!("{} (low)", p.stock)
            } else {
                p.stock.to_string()
            },
            price: format!("{:.2}", p.price),
            cost: format!("{:.2}", p.cost),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: ProductsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ProductsCommand::List => {
            let snap = session.products_snapshot();
            let out = output::render_list(
                &global.output,
                &snap,
                |p| ProductRow::from(p),
                |p| p.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ProductsCommand::Add(fields) => {
            let product = build_new_product(session, fields).await;
            let created = session.add_product(product).await?;
            output::print_output(&format!("Added product '{}' ({})", created.name, created.id), global.quiet);
            Ok(())
        }

        ProductsCommand::Update { id, fields } => {
            let description = resolve_description(session, &fields).await;
            let updated = session
                .update_product(Product {
                    id: id.clone(),
                    name: fields.name,
                    description,
                    category: fields.category,
                    supplier_id: fields.supplier,
                    stock: fields.stock,
                    price: fields.price,
                    cost: fields.cost,
                })
                .await?;
            output::print_output(&format!("Updated product '{}' ({})", updated.name, id), global.quiet);
            Ok(())
        }

        ProductsCommand::Describe { name, category } => {
            let text = session.draft_product_description(&name, &category).await;
            output::print_output(&text, global.quiet);
            Ok(())
        }
    }
}

async fn build_new_product(session: &Session, fields: ProductFields) -> NewProduct {
    let description = resolve_description(session, &fields).await;
    NewProduct {
        name: fields.name,
        description,
        category: fields.category,
        supplier_id: fields.supplier,
        stock: fields.stock,
        price: fields.price,
        cost: fields.cost,
    }
}

/// Use the given description, or draft one with the assist model when
/// `--draft-description` was passed.
async fn resolve_description(session: &Session, fields: &ProductFields) -> String {
    if fields.draft_description {
        session
            .draft_product_description(&fields.name, &fields.category)
            .await
    } else {
        fields.description.clone()
    }
}
