use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::{
    config::RemoteConfig,
    currency::{Currency, ACCOUNT_ONE},
    errors::RemoteError,
    ledger::LedgerTracker,
    pool::{PoolConfig, ServerPool},
    request::{resolve_ledger, LedgerArg, Request},
    signing::Signer,
    storage::Storage,
    transaction::{Transaction, TransactionManager},
    transport::Transport,
};

/// Parameters shared by the account-scoped query constructors.
///
/// ```
/// use ledger_remote::AccountParams;
///
/// let params = AccountParams::new("r4qLSAzv4LZ9TLsR7diphGwKnSEAMQTSjS")
///     .ledger(9592219u64)
///     .limit(100.0);
/// assert_eq!(params.account, "r4qLSAzv4LZ9TLsR7diphGwKnSEAMQTSjS");
/// ```
#[derive(Debug, Clone, Default)]
pub struct AccountParams {
    pub account: String,
    pub ledger: Option<LedgerArg>,
    pub peer: Option<String>,
    pub limit: Option<f64>,
    pub marker: Option<Value>,
}

impl AccountParams {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            ..Self::default()
        }
    }

    pub fn ledger(mut self, ledger: impl Into<LedgerArg>) -> Self {
        self.ledger = Some(ledger.into());
        self
    }

    pub fn peer(mut self, peer: impl Into<String>) -> Self {
        self.peer = Some(peer.into());
        self
    }

    pub fn limit(mut self, limit: f64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn marker(mut self, marker: Value) -> Self {
        self.marker = Some(marker);
        self
    }
}

/// One side of an order book: a currency and, for issued assets, its
/// issuer.
#[derive(Debug, Clone)]
pub struct BookSide {
    pub currency: String,
    pub issuer: Option<String>,
}

impl BookSide {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            issuer: None,
        }
    }

    pub fn issued(currency: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            issuer: Some(issuer.into()),
        }
    }
}

/// Parameters for an order-book offers query.
#[derive(Debug, Clone)]
pub struct BookOffersParams {
    pub gets: BookSide,
    pub pays: BookSide,
    /// Taking account context; a well-known placeholder is used when the
    /// caller has no real taking account.
    pub taker: Option<String>,
    pub ledger: Option<LedgerArg>,
    pub limit: Option<f64>,
}

impl BookOffersParams {
    pub fn new(gets: BookSide, pays: BookSide) -> Self {
        Self {
            gets,
            pays,
            taker: None,
            ledger: None,
            limit: None,
        }
    }

    pub fn taker(mut self, taker: impl Into<String>) -> Self {
        self.taker = Some(taker.into());
        self
    }

    pub fn ledger(mut self, ledger: impl Into<LedgerArg>) -> Self {
        self.ledger = Some(ledger.into());
        self
    }

    pub fn limit(mut self, limit: f64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Client-side orchestrator for the ledger network's request/response
/// protocol.
///
/// A `Remote` owns the server pool, the ledger tracker, and the
/// transaction submission pipeline. Query constructors return requests in
/// the un-dispatched state; [`Remote::send`] hands one to the pool and
/// resolves with the correlated response.
pub struct Remote {
    config: RemoteConfig,
    pool: ServerPool,
    ledger: Arc<LedgerTracker>,
    transactions: TransactionManager,
    storage: Option<Arc<dyn Storage>>,
    signer: Option<Arc<dyn Signer>>,
}

impl Remote {
    pub fn new(config: RemoteConfig, transport: Arc<dyn Transport>) -> Self {
        let ledger = Arc::new(LedgerTracker::default());
        let pool = ServerPool::new(
            config.servers.clone(),
            transport,
            PoolConfig::default(),
            Arc::clone(&ledger),
        );
        let transactions = TransactionManager::new(config.max_fee);
        Self {
            config,
            pool,
            ledger,
            transactions,
            storage: None,
            signer: None,
        }
    }

    /// Builds a remote from a loosely-typed configuration object.
    pub fn from_json(config: &Value, transport: Arc<dyn Transport>) -> Result<Self, RemoteError> {
        Ok(Self::new(RemoteConfig::from_json(config)?, transport))
    }

    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    pub fn max_fee(&self) -> u64 {
        self.config.max_fee
    }

    pub fn pool(&self) -> &ServerPool {
        &self.pool
    }

    pub fn ledger(&self) -> &LedgerTracker {
        &self.ledger
    }

    /// Connects the pool and, when a storage backend is attached, replays
    /// any transactions still pending from a previous run.
    pub async fn connect(&self) -> Result<(), RemoteError> {
        self.pool.connect().await?;
        if self.storage.is_some() {
            self.resubmit_pending().await?;
        }
        Ok(())
    }

    /// Dispatches a constructed request and awaits its response.
    pub async fn send(&self, request: &mut Request) -> Result<Value, RemoteError> {
        self.pool.dispatch(request).await
    }

    // Plain protocol requests: nothing beyond `command` and `id`.

    pub fn request_ledger(&self) -> Request {
        Request::new("ledger")
    }

    pub fn request_server_info(&self) -> Request {
        Request::new("server_info")
    }

    pub fn request_peers(&self) -> Request {
        Request::new("peers")
    }

    pub fn request_connect(&self) -> Request {
        Request::new("connect")
    }

    pub fn request_unl_add(&self) -> Request {
        Request::new("unl_add")
    }

    pub fn request_unl_list(&self) -> Request {
        Request::new("unl_list")
    }

    pub fn request_unl_delete(&self) -> Request {
        Request::new("unl_delete")
    }

    /// Shared factory behind the account-scoped constructors.
    ///
    /// Validation happens here, before any network activity: the limit is
    /// clamped, and a marker without a resolved ledger selector (a numeric
    /// index or 64-character hash; identifier keywords do not qualify)
    /// fails the construction.
    pub fn account_request(
        command: &str,
        params: &AccountParams,
    ) -> Result<Request, RemoteError> {
        if params.account.is_empty() {
            return Err(RemoteError::MissingField("account"));
        }

        let selector = params.ledger.as_ref().and_then(resolve_ledger);
        if params.marker.is_some() && !selector.as_ref().is_some_and(|s| s.is_resolved()) {
            return Err(RemoteError::LedgerRequiredWithMarker);
        }

        let mut request = Request::new(command);
        request.account(&params.account);
        if let Some(selector) = &selector {
            request.ledger_selector(selector);
        }
        if let Some(peer) = &params.peer {
            request.peer(peer);
        }
        if let Some(limit) = params.limit {
            request.limit(limit);
        }
        if let Some(marker) = &params.marker {
            request.marker(marker.clone());
        }
        Ok(request)
    }

    pub fn request_account_info(&self, params: &AccountParams) -> Result<Request, RemoteError> {
        Self::account_request("account_info", params)
    }

    pub fn request_account_currencies(
        &self,
        params: &AccountParams,
    ) -> Result<Request, RemoteError> {
        Self::account_request("account_currencies", params)
    }

    pub fn request_account_lines(&self, params: &AccountParams) -> Result<Request, RemoteError> {
        Self::account_request("account_lines", params)
    }

    pub fn request_account_offers(&self, params: &AccountParams) -> Result<Request, RemoteError> {
        Self::account_request("account_offers", params)
    }

    /// Balance lookup through the account's root ledger entry.
    pub fn request_account_balance(
        &self,
        account: &str,
        ledger: impl Into<LedgerArg>,
    ) -> Result<Request, RemoteError> {
        if account.is_empty() {
            return Err(RemoteError::MissingField("account"));
        }
        let mut request = Request::new("ledger_entry");
        request.set_field("account_root", json!(account));
        request.select_ledger(&ledger.into());
        Ok(request)
    }

    /// Order-book offers between two assets.
    ///
    /// Currencies are encoded to their canonical hex form; the issuer is
    /// omitted for the native asset. The `taker` field always appears,
    /// defaulting to the well-known placeholder account.
    pub fn request_book_offers(&self, params: &BookOffersParams) -> Result<Request, RemoteError> {
        let mut request = Request::new("book_offers");
        request.set_field("taker_gets", encode_book_side(&params.gets)?);
        request.set_field("taker_pays", encode_book_side(&params.pays)?);
        request.set_field(
            "taker",
            json!(params.taker.as_deref().unwrap_or(ACCOUNT_ONE)),
        );
        if let Some(ledger) = &params.ledger {
            request.select_ledger(ledger);
        }
        if let Some(limit) = params.limit {
            request.limit(limit);
        }
        Ok(request)
    }

    /// Signs and submits a transaction through the pipeline.
    pub async fn submit_transaction(&self, tx: Transaction) -> Result<Value, RemoteError> {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| RemoteError::Signing("no signer configured".into()))?;
        self.transactions
            .submit(tx, signer.as_ref(), &self.pool, &self.ledger)
            .await
    }

    /// Replays transactions the storage layer still holds as pending.
    pub async fn resubmit_pending(&self) -> Result<Vec<String>, RemoteError> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| RemoteError::Storage("no storage configured".into()))?;
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| RemoteError::Signing("no signer configured".into()))?;
        self.transactions
            .resubmit_pending(storage.as_ref(), signer.as_ref(), &self.pool, &self.ledger)
            .await
    }

    /// Snapshot of a pending transaction by client id.
    pub fn pending_transaction(&self, client_id: &str) -> Option<Transaction> {
        self.transactions.pending(client_id)
    }

    pub fn pending_count(&self) -> usize {
        self.transactions.pending_count()
    }

    /// Marks a submitted transaction confirmed and drops it from the
    /// pending set.
    pub fn confirm_transaction(&self, client_id: &str) -> Option<Transaction> {
        self.transactions.confirm(client_id)
    }

    /// Marks a submitted transaction failed and drops it from the pending
    /// set.
    pub fn fail_transaction(&self, client_id: &str) -> Option<Transaction> {
        self.transactions.fail(client_id)
    }
}

fn encode_book_side(side: &BookSide) -> Result<Value, RemoteError> {
    let currency = Currency::from_human(&side.currency)?;
    let mut encoded = Map::new();
    encoded.insert("currency".to_string(), json!(currency.to_hex()));
    if !currency.is_native() {
        if let Some(issuer) = &side.issuer {
            encoded.insert("issuer".to_string(), json!(issuer));
        }
    }
    Ok(Value::Object(encoded))
}
