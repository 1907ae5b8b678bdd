// ── Command API ──
//
// All write operations flow through a unified `Command` enum, routed
// over an mpsc channel to the session's command processor task. Reads
// bypass the channel via replica snapshots.

use std::sync::Arc;

use crate::error::SessionError;
use crate::model::{NewEmployee, NewProduct, Product, Sale, SaleDraft};

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, SessionError>>,
}

/// All write operations the session facade can issue.
#[derive(Debug, Clone)]
pub enum Command {
    /// Append a new product; the backend assigns the id.
    AddProduct(NewProduct),

    /// Overwrite every field of an existing product except its id.
    UpdateProduct(Product),

    /// Record a sale and decrement the product's stock as one atomic
    /// batch.
    RecordSale(SaleDraft),

    /// Create a new identity and write its profile document. Rotates
    /// the active session to the new identity (provider contract).
    RegisterEmployee(NewEmployee),
}

/// Result payload of a successfully executed command.
#[derive(Debug, Clone)]
pub enum CommandResult {
    /// The created or updated product, as acknowledged by the backend.
    Product(Arc<Product>),

    /// The recorded sale, as committed.
    Sale(Arc<Sale>),

    /// The account id of the newly registered employee.
    Registered { account_id: String },
}
