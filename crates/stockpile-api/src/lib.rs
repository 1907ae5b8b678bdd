//! Async clients for the stockpile backend and the assist provider.
//!
//! Three independent surfaces, one crate:
//!
//! - **[`DirectoryClient`]** -- the identity surface: sign-in, sign-out,
//!   account creation. Stateless; mints [`AuthSession`]s.
//! - **[`StoreClient`]** -- the document surface: collection listing,
//!   document CRUD, and atomic multi-write batches. Carries the active
//!   session's bearer token.
//! - **[`watch`]** -- the change feed: a WebSocket stream of per-collection
//!   [`ChangeNotice`]s with automatic reconnection.
//! - **[`AssistClient`]** -- the hosted model provider's `generateContent`
//!   endpoint, used for description drafting and data analysis.
//!
//! No business logic lives here; `stockpile-core` owns session state,
//! replicas, and mutation semantics.

pub mod assist;
pub mod directory;
pub mod error;
pub mod store;
pub mod transport;
pub mod watch;

pub use assist::{AssistClient, GenerationConfig};
pub use directory::{AuthSession, DirectoryClient};
pub use error::Error;
pub use store::{Document, StoreClient, Write};
pub use transport::TransportConfig;
pub use watch::{ChangeNotice, ReconnectConfig, WatchHandle};
