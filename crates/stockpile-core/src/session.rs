// ── Session facade ──
//
// Full lifecycle management for one authenticated session against the
// backend: sign-in, profile tracking, replica synchronization, command
// routing, and teardown. The single source of truth for "who is signed
// in" and "what does each collection currently look like", and the only
// code path permitted to mutate remote data.

use std::sync::Arc;

use chrono::Utc;
use secrecy::SecretString;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use stockpile_api::{
    AssistClient, AuthSession, DirectoryClient, ReconnectConfig, StoreClient, TransportConfig,
    WatchHandle, Write,
};

use crate::analytics::{BusinessSnapshot, BusinessSummary};
use crate::command::{Command, CommandEnvelope, CommandResult};
use crate::config::SessionConfig;
use crate::convert::{entities_from_documents, entity_from_document, fields_without_id};
use crate::error::SessionError;
use crate::model::{NewEmployee, NewProduct, Product, Sale, SaleDraft, Supplier, UserProfile};
use crate::store::{ReplicaSet, collections};
use crate::stream::CollectionStream;

const COMMAND_CHANNEL_SIZE: usize = 64;

// ── SessionState ─────────────────────────────────────────────────────

/// Session state observable by consumers.
///
/// The profile itself travels on a separate `watch` channel
/// ([`Session::profile`]); this enum only tracks which phase the
/// session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No authenticated identity; replicas are empty.
    SignedOut,
    /// Identity authenticated, but its profile document has not been
    /// seen yet (or does not exist).
    AwaitingProfile,
    /// Identity authenticated and profile loaded.
    Ready,
}

// ── Session ──────────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<SessionInner>`. Constructed explicitly,
/// initialized by [`sign_in`](Self::sign_in), torn down by
/// [`sign_out`](Self::sign_out) -- no ambient global state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: SessionConfig,
    directory: DirectoryClient,
    store_client: StoreClient,
    assist: AssistClient,
    replicas: Arc<ReplicaSet>,
    state: watch::Sender<SessionState>,
    /// True until the first sign-in attempt resolves either way.
    loading: watch::Sender<bool>,
    profile: watch::Sender<Option<Arc<UserProfile>>>,
    /// The active identity. Rotated by `register_employee` -- the
    /// provider hands the new identity's session back, silently
    /// replacing the caller's.
    identity: Mutex<Option<AuthSession>>,
    command_tx: Mutex<mpsc::Sender<CommandEnvelope>>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    /// Child token for the current sign-in -- cancelled on sign-out,
    /// replaced on the next sign-in.
    cancel_child: Mutex<CancellationToken>,
    watch_handle: Mutex<Option<WatchHandle>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Session {
    /// Create a new session from configuration. Does NOT touch the
    /// network -- call [`sign_in`](Self::sign_in) to authenticate and
    /// start background tasks.
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        let transport = TransportConfig {
            timeout: config.timeout,
        };
        let directory = DirectoryClient::new(config.backend_url.clone(), &transport)?;
        let store_client = StoreClient::new(config.backend_url.clone(), &transport)?;
        let assist = AssistClient::new(
            config.assist.base_url.clone(),
            config.assist.api_key.clone(),
            &transport,
        )?;

        let (state, _) = watch::channel(SessionState::SignedOut);
        let (loading, _) = watch::channel(true);
        let (profile, _) = watch::channel(None);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Ok(Self {
            inner: Arc::new(SessionInner {
                config,
                directory,
                store_client,
                assist,
                replicas: Arc::new(ReplicaSet::new()),
                state,
                loading,
                profile,
                identity: Mutex::new(None),
                command_tx: Mutex::new(command_tx),
                command_rx: Mutex::new(Some(command_rx)),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                watch_handle: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Access the session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Access the underlying replica set.
    pub fn replicas(&self) -> &Arc<ReplicaSet> {
        &self.inner.replicas
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Sign in with email and password.
    ///
    /// Delegates credential validation entirely to the identity
    /// provider. On success: installs the bearer token, fetches the
    /// profile document, performs an initial refresh of all four
    /// collections, and spawns the background tasks (command processor,
    /// change-feed bridge, optional periodic refresh).
    pub async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<(), SessionError> {
        let auth = match self.inner.directory.sign_in(email, password).await {
            Ok(auth) => auth,
            Err(e) => {
                let _ = self.inner.loading.send(false);
                return Err(e.into());
            }
        };

        self.inner.store_client.set_bearer(Some(auth.token.clone()));
        let account_id = auth.account_id.clone();
        *self.inner.identity.lock().await = Some(auth);

        // Fresh child token for this sign-in (supports re-sign-in).
        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        let _ = self.inner.state.send(SessionState::AwaitingProfile);

        // Profile first, then the initial data load.
        let bootstrap = async {
            self.refresh_profile(&account_id).await?;
            self.full_refresh().await
        };
        if let Err(e) = bootstrap.await {
            let _ = self.inner.loading.send(false);
            return Err(e);
        }

        // Spawn background tasks.
        let mut handles = self.inner.task_handles.lock().await;

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            let session = self.clone();
            let cancel = child.clone();
            handles.push(tokio::spawn(command_processor_task(session, rx, cancel)));
        }

        let interval_secs = self.inner.config.refresh_interval_secs;
        if interval_secs > 0 {
            let session = self.clone();
            let cancel = child.clone();
            handles.push(tokio::spawn(refresh_task(session, interval_secs, cancel)));
        }

        if self.inner.config.watch_enabled {
            self.spawn_watch_bridge(&child, &mut handles).await;
        }

        drop(handles);

        let _ = self.inner.loading.send(false);
        info!(%account_id, "signed in");
        Ok(())
    }

    /// Sign out.
    ///
    /// Revokes the remote session (failure is non-fatal), cancels and
    /// joins the background tasks, clears the bearer token, and empties
    /// every replica and the profile.
    pub async fn sign_out(&self) {
        if let Some(auth) = self.inner.identity.lock().await.take() {
            if let Err(e) = self.inner.directory.sign_out(&auth.token).await {
                warn!(error = %e, "remote sign-out failed (non-fatal)");
            }
        }

        // Cancel the child token (not the parent -- allows re-sign-in).
        self.inner.cancel_child.lock().await.cancel();

        if let Some(handle) = self.inner.watch_handle.lock().await.take() {
            handle.shutdown();
        }

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        drop(handles);

        self.inner.store_client.set_bearer(None);
        self.inner.replicas.clear_all();
        let _ = self.inner.profile.send(None);
        let _ = self.inner.state.send(SessionState::SignedOut);
        let _ = self.inner.loading.send(false);

        // Recreate the command channel so a later sign-in can spawn a
        // fresh processor (the old receiver died with its task).
        {
            let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
            *self.inner.command_tx.lock().await = tx;
            *self.inner.command_rx.lock().await = Some(rx);
        }

        debug!("signed out");
    }

    /// Spawn the change-feed stream and a bridge task that maps each
    /// [`stockpile_api::ChangeNotice`] to a single-collection refresh.
    ///
    /// Non-fatal on failure -- the session falls back to post-mutation
    /// and periodic refreshes.
    async fn spawn_watch_bridge(
        &self,
        cancel: &CancellationToken,
        handles: &mut Vec<JoinHandle<()>>,
    ) {
        let watch_url = match self.inner.store_client.watch_url() {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "invalid change-feed URL (non-fatal)");
                return;
            }
        };

        let bearer = self.inner.store_client.bearer_header();
        let ws_cancel = cancel.child_token();

        let handle = match WatchHandle::connect(
            watch_url,
            ReconnectConfig::default(),
            ws_cancel.clone(),
            bearer,
        ) {
            Ok(h) => h,
            Err(e) => {
                warn!(error = %e, "change feed connection failed (non-fatal)");
                return;
            }
        };

        let mut notice_rx = handle.subscribe();
        let session = self.clone();
        let bridge_cancel = ws_cancel;

        handles.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = bridge_cancel.cancelled() => break,
                    result = notice_rx.recv() => {
                        match result {
                            Ok(notice) => {
                                debug!(collection = %notice.collection, "change notice");
                                if let Err(e) =
                                    session.refresh_collection(&notice.collection).await
                                {
                                    warn!(
                                        collection = %notice.collection,
                                        error = %e,
                                        "change-driven refresh failed"
                                    );
                                }
                            }
                            Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                                warn!(skipped = n, "change-feed bridge: receiver lagged");
                            }
                            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                        }
                    }
                }
            }
        }));

        *self.inner.watch_handle.lock().await = Some(handle);
        debug!("change feed bridge spawned");
    }

    // ── Refresh paths ────────────────────────────────────────────────

    /// Fetch all four collections and replace the local replicas.
    pub async fn full_refresh(&self) -> Result<(), SessionError> {
        let store = &self.inner.store_client;

        let (products_res, suppliers_res, sales_res, users_res) = tokio::join!(
            store.list_documents(collections::PRODUCTS),
            store.list_documents(collections::SUPPLIERS),
            store.list_documents(collections::SALES),
            store.list_documents(collections::USERS),
        );

        self.inner
            .replicas
            .apply_products(entities_from_documents(products_res?));
        self.inner
            .replicas
            .apply_suppliers(entities_from_documents(suppliers_res?));
        self.inner
            .replicas
            .apply_sales(entities_from_documents(sales_res?));
        self.inner
            .replicas
            .apply_users(entities_from_documents(users_res?));
        self.derive_profile_from_replica().await;

        debug!(
            products = self.inner.replicas.product_count(),
            sales = self.inner.replicas.sale_count(),
            "full refresh complete"
        );
        Ok(())
    }

    /// Re-fetch a single collection's full snapshot and replace its
    /// replica. Unknown collection names are ignored with a debug log.
    pub async fn refresh_collection(&self, name: &str) -> Result<(), SessionError> {
        match name {
            collections::PRODUCTS => {
                let docs = self
                    .inner
                    .store_client
                    .list_documents(collections::PRODUCTS)
                    .await?;
                self.inner
                    .replicas
                    .apply_products(entities_from_documents(docs));
            }
            collections::SUPPLIERS => {
                let docs = self
                    .inner
                    .store_client
                    .list_documents(collections::SUPPLIERS)
                    .await?;
                self.inner
                    .replicas
                    .apply_suppliers(entities_from_documents(docs));
            }
            collections::SALES => {
                let docs = self
                    .inner
                    .store_client
                    .list_documents(collections::SALES)
                    .await?;
                self.inner
                    .replicas
                    .apply_sales(entities_from_documents(docs));
            }
            collections::USERS => {
                let docs = self
                    .inner
                    .store_client
                    .list_documents(collections::USERS)
                    .await?;
                self.inner
                    .replicas
                    .apply_users(entities_from_documents(docs));
                self.derive_profile_from_replica().await;
            }
            other => {
                debug!(collection = %other, "ignoring notice for unknown collection");
            }
        }
        Ok(())
    }

    /// Fetch the active identity's profile document directly and
    /// publish the resulting state.
    async fn refresh_profile(&self, account_id: &str) -> Result<(), SessionError> {
        let doc = self
            .inner
            .store_client
            .get_document(collections::USERS, account_id)
            .await?;

        match doc {
            Some(doc) => {
                let profile: UserProfile = entity_from_document(doc)?;
                self.publish_profile(Some(Arc::new(profile)));
            }
            None => {
                // Identity exists at the provider but has no profile
                // document yet.
                self.publish_profile(None);
            }
        }
        Ok(())
    }

    /// Re-derive the profile from the users replica after a users
    /// refresh, keeping it current without an extra round-trip.
    ///
    /// Only publishes when the account is present in the replica -- the
    /// direct fetch in [`refresh_profile`](Self::refresh_profile) stays
    /// authoritative for the absent case.
    async fn derive_profile_from_replica(&self) {
        let account_id = {
            let guard = self.inner.identity.lock().await;
            guard.as_ref().map(|a| a.account_id.clone())
        };
        if let Some(account_id) = account_id {
            if let Some(profile) = self.inner.replicas.user_by_id(&account_id) {
                self.publish_profile(Some(profile));
            }
        }
    }

    fn publish_profile(&self, profile: Option<Arc<UserProfile>>) {
        let state = if profile.is_some() {
            SessionState::Ready
        } else {
            SessionState::AwaitingProfile
        };
        let _ = self.inner.profile.send(profile);
        let _ = self.inner.state.send(state);
    }

    // ── Command execution ────────────────────────────────────────────

    /// Execute a command against the backend.
    ///
    /// Sends the command through the internal channel to the command
    /// processor task and awaits the result.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, SessionError> {
        if *self.inner.state.borrow() == SessionState::SignedOut {
            return Err(SessionError::NotSignedIn);
        }

        let (tx, rx) = tokio::sync::oneshot::channel();

        let command_tx = self.inner.command_tx.lock().await.clone();

        command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| SessionError::NotSignedIn)?;

        rx.await.map_err(|_| SessionError::NotSignedIn)?
    }

    // ── Mutation operations ──────────────────────────────────────────

    /// Append a new product. The backend assigns the id; the replica
    /// picks it up on the next products refresh.
    pub async fn add_product(&self, product: NewProduct) -> Result<Arc<Product>, SessionError> {
        match self.execute(Command::AddProduct(product)).await? {
            CommandResult::Product(p) => Ok(p),
            other => Err(SessionError::Internal(format!(
                "unexpected command result: {other:?}"
            ))),
        }
    }

    /// Overwrite every field of an existing product except its id.
    pub async fn update_product(&self, product: Product) -> Result<Arc<Product>, SessionError> {
        match self.execute(Command::UpdateProduct(product)).await? {
            CommandResult::Product(p) => Ok(p),
            other => Err(SessionError::Internal(format!(
                "unexpected command result: {other:?}"
            ))),
        }
    }

    /// Record a sale.
    ///
    /// Fails before issuing any remote write if the product is missing
    /// from the local replica or the quantity exceeds the locally-known
    /// stock. On success the sale insert and the stock decrement commit
    /// as one atomic batch; the decrement is applied server-side against
    /// the persisted value, so concurrent sales accumulate instead of
    /// overwriting each other.
    pub async fn record_sale(&self, draft: SaleDraft) -> Result<Arc<Sale>, SessionError> {
        match self.execute(Command::RecordSale(draft)).await? {
            CommandResult::Sale(s) => Ok(s),
            other => Err(SessionError::Internal(format!(
                "unexpected command result: {other:?}"
            ))),
        }
    }

    /// Register a new employee: create the identity, then write its
    /// profile document.
    ///
    /// Known defect, reproduced deliberately: the identity provider
    /// rotates the active session to the newly created account, so after
    /// this call the session belongs to the NEW employee and the acting
    /// manager must sign in again. Returns the new account id.
    pub async fn register_employee(&self, employee: NewEmployee) -> Result<String, SessionError> {
        match self.execute(Command::RegisterEmployee(employee)).await? {
            CommandResult::Registered { account_id } => Ok(account_id),
            other => Err(SessionError::Internal(format!(
                "unexpected command result: {other:?}"
            ))),
        }
    }

    // ── State observation ────────────────────────────────────────────

    /// Subscribe to session state changes.
    pub fn state(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Subscribe to the loading flag (true until the first sign-in
    /// attempt resolves).
    pub fn loading(&self) -> watch::Receiver<bool> {
        self.inner.loading.subscribe()
    }

    /// Subscribe to the active identity's profile.
    pub fn profile(&self) -> watch::Receiver<Option<Arc<UserProfile>>> {
        self.inner.profile.subscribe()
    }

    /// The active identity's account id, if signed in.
    pub async fn account_id(&self) -> Option<String> {
        self.inner
            .identity
            .lock()
            .await
            .as_ref()
            .map(|a| a.account_id.clone())
    }

    // ── Snapshot accessors (delegate to ReplicaSet) ──────────────────

    pub fn products_snapshot(&self) -> Arc<Vec<Arc<Product>>> {
        self.inner.replicas.products_snapshot()
    }

    pub fn suppliers_snapshot(&self) -> Arc<Vec<Arc<Supplier>>> {
        self.inner.replicas.suppliers_snapshot()
    }

    pub fn sales_snapshot(&self) -> Arc<Vec<Arc<Sale>>> {
        self.inner.replicas.sales_snapshot()
    }

    pub fn users_snapshot(&self) -> Arc<Vec<Arc<UserProfile>>> {
        self.inner.replicas.users_snapshot()
    }

    // ── Stream accessors (delegate to ReplicaSet) ────────────────────

    pub fn products(&self) -> CollectionStream<Product> {
        self.inner.replicas.subscribe_products()
    }

    pub fn suppliers(&self) -> CollectionStream<Supplier> {
        self.inner.replicas.subscribe_suppliers()
    }

    pub fn sales(&self) -> CollectionStream<Sale> {
        self.inner.replicas.subscribe_sales()
    }

    pub fn users(&self) -> CollectionStream<UserProfile> {
        self.inner.replicas.subscribe_users()
    }

    // ── Analytics & assist ───────────────────────────────────────────

    /// Snapshot of the business data handed to analysis.
    pub fn business_snapshot(&self) -> BusinessSnapshot {
        BusinessSnapshot {
            products: self.products_snapshot(),
            sales: self.sales_snapshot(),
            suppliers: self.suppliers_snapshot(),
        }
    }

    /// Headline numbers over the current replicas.
    pub fn summary(&self) -> BusinessSummary {
        crate::analytics::summarize(&self.business_snapshot())
    }

    /// Draft a short e-commerce description for a product. Never fails:
    /// provider errors collapse into a fixed fallback string.
    pub async fn draft_product_description(&self, name: &str, category: &str) -> String {
        crate::assist::draft_product_description(&self.inner.assist, name, category).await
    }

    /// Answer a free-text business-analytics question over the current
    /// replicas. Never fails: provider errors collapse into a fixed
    /// fallback string.
    pub async fn analyze_business_data(&self, query: &str) -> String {
        crate::assist::analyze_business_data(&self.inner.assist, query, &self.business_snapshot())
            .await
    }

    // ── One-shot convenience ─────────────────────────────────────────

    /// One-shot: sign in, run closure, sign out.
    ///
    /// Optimized for the CLI: disables the change feed and periodic
    /// refresh since we only need a single request-response cycle.
    pub async fn oneshot<F, Fut, T, E>(
        config: SessionConfig,
        email: &str,
        password: &SecretString,
        f: F,
    ) -> Result<T, E>
    where
        F: FnOnce(Session) -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: From<SessionError>,
    {
        let mut cfg = config;
        cfg.watch_enabled = false;
        cfg.refresh_interval_secs = 0;

        let session = Session::new(cfg)?;
        session.sign_in(email, password).await?;
        let result = f(session.clone()).await;
        session.sign_out().await;
        result
    }
}

// ── Command application ──────────────────────────────────────────────

/// Apply a single command: issue the remote write(s), then refresh the
/// collections it touched so local state converges even with the change
/// feed disabled.
async fn apply_command(session: &Session, cmd: Command) -> Result<CommandResult, SessionError> {
    let inner = &session.inner;
    match cmd {
        Command::AddProduct(product) => {
            let doc = inner
                .store_client
                .create_document(collections::PRODUCTS, &product)
                .await?;
            session.refresh_collection(collections::PRODUCTS).await?;
            let created: Product = entity_from_document(doc)?;
            Ok(CommandResult::Product(Arc::new(created)))
        }

        Command::UpdateProduct(product) => {
            let fields = fields_without_id(&product)?;
            let doc = inner
                .store_client
                .update_document(collections::PRODUCTS, &product.id, &fields)
                .await?;
            session.refresh_collection(collections::PRODUCTS).await?;
            let updated: Product = entity_from_document(doc)?;
            Ok(CommandResult::Product(Arc::new(updated)))
        }

        Command::RecordSale(draft) => {
            // Local preconditions, checked before any remote write.
            let product = inner
                .replicas
                .product_by_id(&draft.product_id)
                .ok_or_else(|| SessionError::ProductNotFound {
                    id: draft.product_id.clone(),
                })?;

            if draft.quantity > product.stock {
                return Err(SessionError::InsufficientStock {
                    requested: draft.quantity,
                    available: product.stock,
                });
            }

            let profile_id = inner.profile.borrow().as_ref().map(|p| p.id.clone());
            let employee_id = match profile_id {
                Some(id) => id,
                None => session
                    .account_id()
                    .await
                    .ok_or(SessionError::NotSignedIn)?,
            };

            let sale = Sale {
                id: String::new(), // assigned by the backend
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                quantity: draft.quantity,
                total_price: product.price * f64::from(draft.quantity),
                date: Utc::now().to_rfc3339(),
                employee_id,
            };

            let writes = vec![
                Write::Create {
                    collection: collections::SALES.into(),
                    fields: fields_without_id(&sale)?,
                },
                Write::Increment {
                    collection: collections::PRODUCTS.into(),
                    id: product.id.clone(),
                    field: "stock".into(),
                    by: -i64::from(draft.quantity),
                    floor: Some(0),
                },
            ];

            inner.store_client.commit_batch(&writes).await?;

            let (products_res, sales_res) = tokio::join!(
                session.refresh_collection(collections::PRODUCTS),
                session.refresh_collection(collections::SALES),
            );
            products_res?;
            sales_res?;

            Ok(CommandResult::Sale(Arc::new(sale)))
        }

        Command::RegisterEmployee(employee) => {
            let current = inner
                .identity
                .lock()
                .await
                .clone()
                .ok_or(SessionError::NotSignedIn)?;

            let new_session = inner
                .directory
                .create_account(&employee.email, &employee.password, &current.token)
                .await?;
            let account_id = new_session.account_id.clone();

            // Provider contract: the new token replaces the active
            // session. Install it so subsequent writes carry the new
            // identity -- the acting manager is now signed out and must
            // re-authenticate.
            inner
                .store_client
                .set_bearer(Some(new_session.token.clone()));
            *inner.identity.lock().await = Some(new_session);

            let profile = UserProfile {
                id: account_id.clone(),
                name: employee.name,
                email: Some(employee.email),
                role: employee.role,
                limits: employee.limits,
            };
            inner
                .store_client
                .set_document(collections::USERS, &account_id, &fields_without_id(&profile)?)
                .await?;

            session.refresh_collection(collections::USERS).await?;
            session.refresh_profile(&account_id).await?;

            info!(%account_id, "employee registered; session now belongs to the new identity");
            Ok(CommandResult::Registered { account_id })
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Drains the command channel, applying commands one at a time.
async fn command_processor_task(
    session: Session,
    mut rx: mpsc::Receiver<CommandEnvelope>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = apply_command(&session, envelope.command).await;
                // Receiver gone just means the caller stopped waiting.
                let _ = envelope.response_tx.send(result);
            }
        }
    }
    debug!("command processor exiting");
}

/// Periodic full refresh -- the polling fallback when the change feed
/// is disabled or down.
async fn refresh_task(session: Session, interval_secs: u64, cancel: CancellationToken) {
    let period = std::time::Duration::from_secs(interval_secs);
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(period) => {
                if let Err(e) = session.full_refresh().await {
                    warn!(error = %e, "periodic refresh failed");
                }
            }
        }
    }
    debug!("refresh task exiting");
}
