//! Reactive data layer between `stockpile-api` and UI consumers.
//!
//! This crate owns the business logic, domain model, and reactive data
//! infrastructure for the stockpile workspace:
//!
//! - **[`Session`]** — Central facade managing the full lifecycle:
//!   [`sign_in()`](Session::sign_in) authenticates, loads the profile and an
//!   initial snapshot of every collection, then spawns background tasks for
//!   the change-feed bridge and command processing.
//!   [`Session::oneshot()`](Session::oneshot) provides a lightweight
//!   sign-in/run/sign-out mode for single CLI invocations.
//!
//! - **[`ReplicaSet`]** — Reactive storage for the four synchronized
//!   collections (products, suppliers, sales, users), built on `DashMap` +
//!   `tokio::sync::watch` channels. Every refresh replaces a replica's full
//!   snapshot; the sales replica is kept sorted by date descending.
//!
//! - **[`CollectionStream<T>`]** — Subscription handle vended by the
//!   `ReplicaSet`. Exposes `current()` / `latest()` / `changed()` for
//!   reactive consumers; drop it to unsubscribe.
//!
//! - **[`Command`]** — Typed mutation requests routed through an `mpsc`
//!   channel to the session's command processor. Reads bypass the channel
//!   via replica snapshots.
//!
//! - **Domain model** ([`model`]) — Canonical types (`Product`, `Supplier`,
//!   `Sale`, `UserProfile`) with backend-assigned string ids.

pub mod analytics;
pub mod assist;
pub mod command;
pub mod config;
mod convert;
pub mod error;
pub mod model;
pub mod session;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use analytics::{BusinessSnapshot, BusinessSummary};
pub use command::{Command, CommandResult};
pub use config::{AssistSettings, SessionConfig};
pub use error::SessionError;
pub use session::{Session, SessionState};
pub use store::ReplicaSet;
pub use stream::CollectionStream;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    LOW_STOCK_THRESHOLD,
    NewEmployee,
    NewProduct,
    Product,
    Sale,
    SaleDraft,
    SaleLimits,
    Supplier,
    UserProfile,
    UserRole,
};
