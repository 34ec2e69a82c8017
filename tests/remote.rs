//! End-to-end tests against in-memory transport, storage, and signing
//! collaborators.

use std::collections::HashSet;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use ledger_remote::{
    AccountParams, BookOffersParams, BookSide, Endpoint, LedgerTracker, Link, PersistedTransaction,
    PoolConfig, Remote, RemoteConfig, RemoteError, Request, ServerPool, SignedPayload, Signer,
    Storage, Transaction, Transport, TxState, ACCOUNT_ONE,
};

const ADDRESS: &str = "r4qLSAzv4LZ9TLsR7diphGwKnSEAMQTSjS";
const PEER_ADDRESS: &str = "rfYv1TXnwgDDK4WQNbFALykYuEBnrR4pDX";
const LEDGER_INDEX: u64 = 9592219;
const LEDGER_HASH: &str = "B4FD84A73DBD8F0DA9E320D137176EBFED969691DC0AAC7882B76B595A0841AE";
const PAGING_MARKER: &str = "29F992CC252056BF690107D1E8F2D9FBAFF29FF107B62B1D1F4E4E11ADF2CC73";

const USD_HEX: &str = "0000000000000000000000005553440000000000";
const NATIVE_HEX: &str = "0000000000000000000000000000000000000000";

struct LinkState {
    sent: Mutex<Vec<Value>>,
    inbox: Mutex<Option<mpsc::UnboundedSender<Value>>>,
    healthy: AtomicBool,
}

impl LinkState {
    fn sent(&self) -> Vec<Value> {
        self.sent.lock().unwrap().clone()
    }

    fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Pushes a server-originated message into the connection's inbox.
    fn push(&self, message: Value) {
        if let Some(inbox) = self.inbox.lock().unwrap().as_ref() {
            let _ = inbox.send(message);
        }
    }

    /// Simulates the connection dropping: the inbox sender is released,
    /// which is how the transport signals a dead link.
    fn kill(&self) {
        self.inbox.lock().unwrap().take();
    }

    fn refuse_sends(&self) {
        self.healthy.store(false, Ordering::SeqCst);
    }
}

struct MockLink {
    state: Arc<LinkState>,
    auto_reply: bool,
}

#[async_trait]
impl Link for MockLink {
    async fn send(&self, message: &Value) -> Result<(), RemoteError> {
        if !self.state.healthy.load(Ordering::SeqCst) {
            return Err(RemoteError::Transport("link down".into()));
        }
        self.state.sent.lock().unwrap().push(message.clone());
        if self.auto_reply {
            let id = message.get("id").cloned().unwrap_or(Value::Null);
            self.state
                .push(json!({ "id": id, "status": "success", "result": {} }));
        }
        Ok(())
    }

    async fn close(&self) {
        self.state.kill();
    }
}

struct MockTransport {
    auto_reply: bool,
    refuse: Mutex<HashSet<String>>,
    links: Mutex<Vec<Arc<LinkState>>>,
}

impl MockTransport {
    fn new(auto_reply: bool) -> Self {
        Self {
            auto_reply,
            refuse: Mutex::new(HashSet::new()),
            links: Mutex::new(Vec::new()),
        }
    }

    fn refuse(&self, url: &str) {
        self.refuse.lock().unwrap().insert(url.to_string());
    }

    fn link(&self, index: usize) -> Arc<LinkState> {
        self.links.lock().unwrap()[index].clone()
    }

    fn link_count(&self) -> usize {
        self.links.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(
        &self,
        url: &str,
        inbox: mpsc::UnboundedSender<Value>,
    ) -> Result<Box<dyn Link>, RemoteError> {
        if self.refuse.lock().unwrap().contains(url) {
            return Err(RemoteError::Transport(format!("connection refused: {url}")));
        }
        let state = Arc::new(LinkState {
            sent: Mutex::new(Vec::new()),
            inbox: Mutex::new(Some(inbox)),
            healthy: AtomicBool::new(true),
        });
        self.links.lock().unwrap().push(Arc::clone(&state));
        Ok(Box::new(MockLink {
            state,
            auto_reply: self.auto_reply,
        }))
    }
}

struct MockStorage {
    records: Vec<PersistedTransaction>,
}

#[async_trait]
impl Storage for MockStorage {
    async fn get_pending_transactions(&self) -> Result<Vec<PersistedTransaction>, RemoteError> {
        Ok(self.records.clone())
    }
}

#[derive(Default)]
struct MockSigner {
    calls: AtomicUsize,
}

impl MockSigner {
    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Signer for MockSigner {
    async fn sign(&self, _tx_json: &Value, _secret: &str) -> Result<SignedPayload, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SignedPayload {
            blob: "DEADBEEFCAFE".to_string(),
            id: "SIG-NEW-ATTEMPT".to_string(),
        })
    }
}

fn endpoints(count: usize) -> Vec<Endpoint> {
    (0..count)
        .map(|i| Endpoint::new(format!("server{i}.example.com"), 443, true).unwrap())
        .collect()
}

fn quiet_remote() -> Remote {
    let config = RemoteConfig {
        servers: endpoints(1),
        ..RemoteConfig::default()
    };
    Remote::new(config, Arc::new(MockTransport::new(true)))
}

async fn connected_pool(transport: &Arc<MockTransport>, count: usize) -> ServerPool {
    let pool = ServerPool::new(
        endpoints(count),
        Arc::clone(transport) as Arc<dyn Transport>,
        PoolConfig::default(),
        Arc::new(LedgerTracker::default()),
    );
    pool.connect().await.unwrap();
    pool
}

// --- request construction -------------------------------------------------

#[test]
fn plain_constructors_carry_only_command_and_id() {
    let remote = quiet_remote();
    let requests = [
        remote.request_ledger(),
        remote.request_server_info(),
        remote.request_peers(),
        remote.request_connect(),
        remote.request_unl_add(),
        remote.request_unl_list(),
        remote.request_unl_delete(),
    ];
    for request in requests {
        assert_eq!(
            request.message_value(),
            json!({ "command": request.command(), "id": null })
        );
        assert!(!request.requested());
    }
}

#[test]
fn account_request_minimal_shape() {
    let request =
        Remote::account_request("account_lines", &AccountParams::new(ADDRESS)).unwrap();
    assert_eq!(
        request.message_value(),
        json!({ "command": "account_lines", "id": null, "account": ADDRESS })
    );
}

#[test]
fn account_request_with_limit() {
    let request = Remote::account_request(
        "account_lines",
        &AccountParams::new(ADDRESS).limit(100.0),
    )
    .unwrap();
    assert_eq!(
        request.message_value(),
        json!({ "command": "account_lines", "id": null, "account": ADDRESS, "limit": 100 })
    );
}

#[test]
fn account_request_with_limit_marker_and_ledger() {
    let request = Remote::account_request(
        "account_lines",
        &AccountParams::new(ADDRESS)
            .limit(100.0)
            .marker(json!(PAGING_MARKER))
            .ledger(LEDGER_INDEX),
    )
    .unwrap();
    assert_eq!(
        request.message_value(),
        json!({
            "command": "account_lines",
            "id": null,
            "account": ADDRESS,
            "limit": 100,
            "marker": PAGING_MARKER,
            "ledger_index": LEDGER_INDEX
        })
    );
    assert!(!request.requested());
}

#[test]
fn account_request_clamps_limit_to_zero() {
    for limit in [0.0, -1.0, -1e9, -1e24] {
        let request = Remote::account_request(
            "account_lines",
            &AccountParams::new(ADDRESS).limit(limit),
        )
        .unwrap();
        assert_eq!(request.message()["limit"], json!(0), "limit {limit}");
    }
}

#[test]
fn account_request_clamps_limit_to_the_ceiling() {
    for limit in [1e9, 1e9 + 1.0, 1e10, 1e24] {
        let request = Remote::account_request(
            "account_lines",
            &AccountParams::new(ADDRESS).limit(limit),
        )
        .unwrap();
        assert_eq!(
            request.message()["limit"],
            json!(1_000_000_000u64),
            "limit {limit}"
        );
    }
}

#[test]
fn marker_requires_a_resolved_ledger() {
    let failing: Vec<AccountParams> = vec![
        AccountParams::new(ADDRESS).marker(json!(PAGING_MARKER)),
        AccountParams::new(ADDRESS)
            .marker(json!(PAGING_MARKER))
            .ledger("validated"),
        AccountParams::new(ADDRESS)
            .marker(json!(PAGING_MARKER))
            .ledger(f64::NAN),
        AccountParams::new(ADDRESS)
            .marker(json!(PAGING_MARKER))
            .ledger(&LEDGER_HASH[..63]),
        AccountParams::new(ADDRESS)
            .marker(json!(PAGING_MARKER))
            .ledger(format!("{LEDGER_HASH}F")),
    ];
    for params in &failing {
        let err = Remote::account_request("account_lines", params).unwrap_err();
        assert!(matches!(err, RemoteError::LedgerRequiredWithMarker));
        assert_eq!(
            err.to_string(),
            "a ledger index or ledger hash must be provided when using a marker"
        );
    }

    // A numeric index or a 64-character hash satisfies the requirement.
    for params in [
        AccountParams::new(ADDRESS)
            .marker(json!(PAGING_MARKER))
            .ledger(LEDGER_INDEX),
        AccountParams::new(ADDRESS)
            .marker(json!(PAGING_MARKER))
            .ledger(LEDGER_HASH),
    ] {
        let request = Remote::account_request("account_lines", &params).unwrap();
        assert!(!request.requested());
    }
}

#[test]
fn account_info_resolves_each_selector_form() {
    let remote = quiet_remote();

    let request = remote
        .request_account_info(&AccountParams::new(ADDRESS).ledger(LEDGER_INDEX))
        .unwrap();
    assert_eq!(
        request.message_value(),
        json!({
            "command": "account_info",
            "id": null,
            "account": ADDRESS,
            "ledger_index": LEDGER_INDEX
        })
    );

    let request = remote
        .request_account_info(&AccountParams::new(ADDRESS).ledger(LEDGER_HASH))
        .unwrap();
    assert_eq!(
        request.message_value(),
        json!({
            "command": "account_info",
            "id": null,
            "account": ADDRESS,
            "ledger_hash": LEDGER_HASH
        })
    );

    let request = remote
        .request_account_info(&AccountParams::new(ADDRESS).ledger("validated"))
        .unwrap();
    assert_eq!(
        request.message_value(),
        json!({
            "command": "account_info",
            "id": null,
            "account": ADDRESS,
            "ledger_index": "validated"
        })
    );
}

#[test]
fn account_currencies_passes_the_account_through() {
    let remote = quiet_remote();
    let request = remote
        .request_account_currencies(&AccountParams::new(ADDRESS))
        .unwrap();
    assert_eq!(request.command(), "account_currencies");
    assert_eq!(request.message()["account"], json!(ADDRESS));
}

#[test]
fn account_balance_uses_the_account_root_entry() {
    let remote = quiet_remote();

    let request = remote
        .request_account_balance(ADDRESS, LEDGER_INDEX)
        .unwrap();
    assert_eq!(
        request.message_value(),
        json!({
            "command": "ledger_entry",
            "id": null,
            "account_root": ADDRESS,
            "ledger_index": LEDGER_INDEX
        })
    );

    let request = remote.request_account_balance(ADDRESS, LEDGER_HASH).unwrap();
    assert_eq!(request.message()["ledger_hash"], json!(LEDGER_HASH));
    assert!(request.message().get("account").is_none());

    let request = remote.request_account_balance(ADDRESS, "validated").unwrap();
    assert_eq!(request.message()["ledger_index"], json!("validated"));
}

#[test]
fn account_lines_with_ledger_hash_and_peer() {
    let remote = quiet_remote();
    let request = remote
        .request_account_lines(
            &AccountParams::new(ADDRESS)
                .ledger(LEDGER_HASH)
                .peer(PEER_ADDRESS),
        )
        .unwrap();
    assert_eq!(
        request.message_value(),
        json!({
            "command": "account_lines",
            "id": null,
            "account": ADDRESS,
            "ledger_hash": LEDGER_HASH,
            "peer": PEER_ADDRESS
        })
    );
}

#[test]
fn account_offers_full_paging_shape() {
    let remote = quiet_remote();
    let request = remote
        .request_account_offers(
            &AccountParams::new(ADDRESS)
                .ledger(LEDGER_HASH)
                .peer(PEER_ADDRESS)
                .limit(32.0)
                .marker(json!(PAGING_MARKER)),
        )
        .unwrap();
    assert_eq!(
        request.message_value(),
        json!({
            "command": "account_offers",
            "id": null,
            "account": ADDRESS,
            "ledger_hash": LEDGER_HASH,
            "peer": PEER_ADDRESS,
            "limit": 32,
            "marker": PAGING_MARKER
        })
    );
}

#[test]
fn book_offers_encodes_currencies_and_defaults_the_taker() {
    let remote = quiet_remote();
    let request = remote
        .request_book_offers(
            &BookOffersParams::new(BookSide::issued("USD", ADDRESS), BookSide::new("XRP"))
                .ledger(LEDGER_HASH),
        )
        .unwrap();
    assert_eq!(
        request.message_value(),
        json!({
            "command": "book_offers",
            "id": null,
            "taker_gets": { "currency": USD_HEX, "issuer": ADDRESS },
            "taker_pays": { "currency": NATIVE_HEX },
            "taker": ACCOUNT_ONE,
            "ledger_hash": LEDGER_HASH
        })
    );
    assert!(!request.requested());
}

#[test]
fn book_offers_with_limit() {
    let remote = quiet_remote();
    let request = remote
        .request_book_offers(
            &BookOffersParams::new(BookSide::issued("USD", ADDRESS), BookSide::new("XRP"))
                .ledger(LEDGER_HASH)
                .limit(10.0),
        )
        .unwrap();
    assert_eq!(
        request.message_value(),
        json!({
            "command": "book_offers",
            "id": null,
            "taker_gets": { "currency": USD_HEX, "issuer": ADDRESS },
            "taker_pays": { "currency": NATIVE_HEX },
            "taker": ACCOUNT_ONE,
            "ledger_hash": LEDGER_HASH,
            "limit": 10
        })
    );
}

// --- pool behavior --------------------------------------------------------

#[tokio::test]
async fn dispatch_assigns_an_id_and_correlates_the_response() {
    let transport = Arc::new(MockTransport::new(true));
    let pool = connected_pool(&transport, 1).await;

    let mut request = Request::new("server_info");
    assert!(!request.requested());

    let response = pool.dispatch(&mut request).await.unwrap();
    assert!(request.requested());
    assert_eq!(request.id(), Some(1));
    assert_eq!(response["id"], json!(1));
    assert_eq!(response["status"], json!("success"));
    assert_eq!(pool.inflight_count(), 0);

    // A dispatched request cannot be dispatched again.
    let err = pool.dispatch(&mut request).await.unwrap_err();
    assert!(matches!(err, RemoteError::RequestAlreadyDispatched));
}

#[tokio::test]
async fn responses_match_by_correlation_id_not_send_order() {
    let transport = Arc::new(MockTransport::new(false));
    let pool = connected_pool(&transport, 1).await;

    let first = tokio::spawn({
        let pool = pool.clone();
        async move {
            let mut request = Request::new("server_info");
            pool.dispatch(&mut request).await
        }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    let second = tokio::spawn({
        let pool = pool.clone();
        async move {
            let mut request = Request::new("peers");
            pool.dispatch(&mut request).await
        }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let link = transport.link(0);
    assert_eq!(link.sent_count(), 2);

    // Answer the second request first.
    link.push(json!({ "id": 2, "order": "replied-first" }));
    link.push(json!({ "id": 1, "order": "replied-second" }));

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();
    assert_eq!(first["id"], json!(1));
    assert_eq!(first["order"], json!("replied-second"));
    assert_eq!(second["id"], json!(2));
}

#[tokio::test]
async fn unreachable_primary_falls_through_to_the_next_endpoint() {
    let transport = Arc::new(MockTransport::new(true));
    transport.refuse("wss://server0.example.com:443");

    let pool = connected_pool(&transport, 2).await;
    assert_eq!(pool.primary(), Some(1));

    let mut request = Request::new("server_info");
    let response = pool.dispatch(&mut request).await.unwrap();
    assert_eq!(response["status"], json!("success"));
    assert_eq!(transport.link(0).sent_count(), 1);
}

#[tokio::test]
async fn send_failure_demotes_the_primary_and_fails_over() {
    let transport = Arc::new(MockTransport::new(true));
    let pool = connected_pool(&transport, 2).await;
    assert_eq!(pool.primary(), Some(0));

    transport.link(0).refuse_sends();

    let mut request = Request::new("server_info");
    let response = pool.dispatch(&mut request).await.unwrap();
    assert_eq!(response["status"], json!("success"));

    // The spare was brought up and served the request.
    assert_eq!(transport.link_count(), 2);
    assert_eq!(transport.link(1).sent_count(), 1);
}

#[tokio::test]
async fn dead_connection_rehomes_outstanding_requests() {
    let transport = Arc::new(MockTransport::new(false));
    let pool = connected_pool(&transport, 2).await;
    assert_eq!(pool.primary(), Some(0));

    let pending = tokio::spawn({
        let pool = pool.clone();
        async move {
            let mut request = Request::new("server_info");
            pool.dispatch(&mut request).await
        }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(transport.link(0).sent_count(), 1);

    // The primary's connection drops with the request still outstanding.
    transport.link(0).kill();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(pool.primary(), Some(1));
    let rehomed = transport.link(1).sent();
    assert_eq!(rehomed.len(), 1);
    assert_eq!(rehomed[0]["id"], json!(1));

    transport.link(1).push(json!({ "id": 1, "status": "success" }));
    let response = pending.await.unwrap().unwrap();
    assert_eq!(response["id"], json!(1));
}

#[tokio::test]
async fn timeout_with_a_single_endpoint_surfaces_to_the_caller() {
    let transport = Arc::new(MockTransport::new(false));
    let pool = connected_pool(&transport, 1).await;

    let mut request = Request::new("server_info");
    request.with_timeout(Duration::from_millis(50));

    let err = pool.dispatch(&mut request).await.unwrap_err();
    assert!(matches!(err, RemoteError::RequestTimeout { id: 1, .. }));
    assert_eq!(pool.inflight_count(), 0);
}

#[tokio::test]
async fn cancel_suppresses_a_late_response() {
    let transport = Arc::new(MockTransport::new(false));
    let pool = connected_pool(&transport, 1).await;

    let pending = tokio::spawn({
        let pool = pool.clone();
        async move {
            let mut request = Request::new("server_info");
            pool.dispatch(&mut request).await
        }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(pool.cancel(1));
    let result = pending.await.unwrap();
    assert!(matches!(result, Err(RemoteError::Cancelled)));

    // The response still arrives, and is dropped without a waiter.
    transport.link(0).push(json!({ "id": 1, "status": "success" }));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(pool.inflight_count(), 0);
}

#[tokio::test]
async fn ledger_notices_feed_the_tracker() {
    let transport = Arc::new(MockTransport::new(true));
    let ledger = Arc::new(LedgerTracker::default());
    let pool = ServerPool::new(
        endpoints(1),
        Arc::clone(&transport) as Arc<dyn Transport>,
        PoolConfig::default(),
        Arc::clone(&ledger),
    );
    pool.connect().await.unwrap();

    transport.link(0).push(json!({
        "type": "ledgerClosed",
        "ledger_index": LEDGER_INDEX,
        "ledger_hash": LEDGER_HASH
    }));
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(ledger.validated_index(), Some(LEDGER_INDEX));
    assert_eq!(ledger.validated_hash().as_deref(), Some(LEDGER_HASH));
}

// --- submission pipeline --------------------------------------------------

fn pending_record() -> PersistedTransaction {
    PersistedTransaction {
        tx_json: json!({
            "Account": ADDRESS,
            "Amount": { "currency": "LTC", "issuer": ADDRESS, "value": "9.985" },
            "Destination": ADDRESS,
            "Fee": "15",
            "Flags": 0,
            "Sequence": 415,
            "TransactionType": "Payment",
            "TxnSignature": "304602210096C2F385530587DE"
        }),
        client_id: "48631".to_string(),
        state: TxState::Pending,
        submit_index: 1,
        submitted_ids: vec!["304602210096C2F385530587DE".to_string()],
        secret: "mysecret".to_string(),
    }
}

#[tokio::test]
async fn replay_restores_members_and_issues_a_new_attempt() {
    let record = pending_record();
    let transport = Arc::new(MockTransport::new(true));
    let signer = Arc::new(MockSigner::default());
    let config = RemoteConfig {
        servers: endpoints(1),
        ..RemoteConfig::default()
    };
    let remote = Remote::new(config, Arc::clone(&transport) as Arc<dyn Transport>)
        .with_storage(Arc::new(MockStorage {
            records: vec![record.clone()],
        }))
        .with_signer(Arc::clone(&signer) as Arc<dyn Signer>);

    // Connecting replays everything storage still holds as pending.
    remote.connect().await.unwrap();
    assert_eq!(signer.call_count(), 1);

    let tx = remote.pending_transaction("48631").unwrap();
    assert_eq!(tx.client_id(), Some("48631"));
    assert_eq!(tx.secret(), Some("mysecret"));
    assert_eq!(tx.state, TxState::Submitted);
    // The prior client-visible identifier survives, with the new attempt
    // appended after it.
    assert_eq!(tx.submitted_ids.len(), 2);
    assert_eq!(tx.submitted_ids[0], record.submitted_ids[0]);
    assert_eq!(tx.submitted_ids[1], "SIG-NEW-ATTEMPT");
    // No newer validated ledger was observed, so the stored submit index
    // stands.
    assert_eq!(tx.submit_index, 1);

    let sent = transport.link(0).sent();
    let submit = sent
        .iter()
        .find(|message| message["command"] == json!("submit"))
        .unwrap();
    assert_eq!(submit["tx_blob"], json!("DEADBEEFCAFE"));
}

#[tokio::test]
async fn fee_above_the_ceiling_fails_before_signing() {
    let transport = Arc::new(MockTransport::new(true));
    let signer = Arc::new(MockSigner::default());
    let config = RemoteConfig {
        servers: endpoints(1),
        ..RemoteConfig::default()
    };
    let remote = Remote::new(config, Arc::clone(&transport) as Arc<dyn Transport>)
        .with_signer(Arc::clone(&signer) as Arc<dyn Signer>);

    let mut tx = Transaction::new(json!({ "TransactionType": "Payment", "Fee": "2000000" }));
    tx.set_client_id("fee-test").unwrap();
    tx.set_secret("mysecret");

    let err = remote.submit_transaction(tx).await.unwrap_err();
    assert!(matches!(
        err,
        RemoteError::FeeExceedsMax {
            fee: 2_000_000,
            max_fee: 1_000_000
        }
    ));
    assert_eq!(signer.call_count(), 0);
    assert_eq!(transport.link_count(), 0);
}

#[tokio::test]
async fn submit_signs_and_dispatches_through_the_pool() {
    let transport = Arc::new(MockTransport::new(true));
    let signer = Arc::new(MockSigner::default());
    let config = RemoteConfig {
        servers: endpoints(1),
        ..RemoteConfig::default()
    };
    let remote = Remote::new(config, Arc::clone(&transport) as Arc<dyn Transport>)
        .with_signer(Arc::clone(&signer) as Arc<dyn Signer>);
    remote.connect().await.unwrap();

    let mut tx = Transaction::new(json!({ "TransactionType": "Payment", "Fee": "15" }));
    tx.set_client_id("app-42").unwrap();
    tx.set_secret("mysecret");

    let response = remote.submit_transaction(tx).await.unwrap();
    assert_eq!(response["status"], json!("success"));

    let pending = remote.pending_transaction("app-42").unwrap();
    assert_eq!(pending.state, TxState::Submitted);
    assert_eq!(pending.submitted_ids, vec!["SIG-NEW-ATTEMPT".to_string()]);

    // The secret never leaves the process.
    let sent = transport.link(0).sent();
    let submit = &sent[0];
    assert_eq!(submit["command"], json!("submit"));
    assert!(submit.get("secret").is_none());
    assert!(!submit.to_string().contains("mysecret"));

    // Finality drops it from the pending set.
    let confirmed = remote.confirm_transaction("app-42").unwrap();
    assert_eq!(confirmed.state, TxState::Confirmed);
    assert_eq!(remote.pending_count(), 0);
}
