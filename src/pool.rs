use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::time;
use tracing::{debug, info, warn};

use crate::{
    backoff::ExponentialBackoff,
    endpoint::Endpoint,
    errors::RemoteError,
    ledger::LedgerTracker,
    request::Request,
    transport::{Link, Transport},
};

/// Connection lifecycle of a pooled endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Pool tuning knobs.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Window a dispatched request waits for its response before the
    /// serving endpoint is treated as failed.
    pub request_timeout: Duration,
    /// First reconnect delay after an endpoint goes down.
    pub reconnect_initial: Duration,
    /// Ceiling on the reconnect delay.
    pub reconnect_max: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            reconnect_initial: Duration::from_millis(500),
            reconnect_max: Duration::from_secs(30),
        }
    }
}

struct ServerSlot {
    endpoint: Endpoint,
    state: ConnectionState,
    link: Option<Arc<dyn Link>>,
    // Bumped on every (re)connect so a stale inbox task cannot demote a
    // newer link for the same slot.
    generation: u64,
}

struct Inflight {
    message: Value,
    idempotent: bool,
    reply: Option<oneshot::Sender<Value>>,
    sent_on: Option<usize>,
}

struct PoolInner {
    servers: Vec<ServerSlot>,
    inflight: HashMap<u64, Inflight>,
}

/// Owns the ordered endpoint list and routes every outgoing request.
///
/// The first connected endpoint in configured order is the primary; on its
/// failure the pool demotes it, reconnects with backoff, and re-homes any
/// outstanding idempotent requests to the next endpoint. Responses are
/// matched to requests solely by correlation id, never by send order.
#[derive(Clone)]
pub struct ServerPool {
    transport: Arc<dyn Transport>,
    cfg: PoolConfig,
    ledger: Arc<LedgerTracker>,
    inner: Arc<Mutex<PoolInner>>,
    next_id: Arc<AtomicU64>,
}

impl ServerPool {
    pub fn new(
        endpoints: Vec<Endpoint>,
        transport: Arc<dyn Transport>,
        cfg: PoolConfig,
        ledger: Arc<LedgerTracker>,
    ) -> Self {
        let servers = endpoints
            .into_iter()
            .map(|endpoint| ServerSlot {
                endpoint,
                state: ConnectionState::Disconnected,
                link: None,
                generation: 0,
            })
            .collect();

        Self {
            transport,
            cfg,
            ledger,
            inner: Arc::new(Mutex::new(PoolInner {
                servers,
                inflight: HashMap::new(),
            })),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn server_count(&self) -> usize {
        self.lock().servers.len()
    }

    pub fn connection_state(&self, index: usize) -> Option<ConnectionState> {
        self.lock().servers.get(index).map(|slot| slot.state)
    }

    /// Index of the current primary: the first connected endpoint in
    /// configured order.
    pub fn primary(&self) -> Option<usize> {
        self.lock()
            .servers
            .iter()
            .position(|slot| slot.state == ConnectionState::Connected)
    }

    pub fn is_connected(&self) -> bool {
        self.primary().is_some()
    }

    /// Number of requests awaiting responses.
    pub fn inflight_count(&self) -> usize {
        self.lock().inflight.len()
    }

    /// Connects the first reachable endpoint in configured order.
    pub async fn connect(&self) -> Result<(), RemoteError> {
        let count = self.server_count();
        for index in 0..count {
            match self.open_link(index).await {
                Ok(()) => return Ok(()),
                Err(error) => {
                    warn!(endpoint = %self.endpoint_url(index), %error, "connect failed");
                }
            }
        }
        Err(RemoteError::NoServersAvailable)
    }

    /// Dispatches a request: assigns its correlation id, sends it on the
    /// primary endpoint, and awaits the matching response.
    ///
    /// A response timeout is treated as endpoint failure and triggers
    /// failover; the caller only sees an error once every endpoint has
    /// been exhausted. Submission traffic is exempt from transparent
    /// retry; resubmission replay owns that path.
    pub async fn dispatch(&self, request: &mut Request) -> Result<Value, RemoteError> {
        if request.requested() {
            return Err(RemoteError::RequestAlreadyDispatched);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let idempotent = request.command() != "submit";
        let timeout = request.timeout().unwrap_or(self.cfg.request_timeout);
        request.begin_dispatch(id);
        let message = request.message_value();

        let (reply_tx, mut reply_rx) = oneshot::channel();
        self.lock().inflight.insert(
            id,
            Inflight {
                message: message.clone(),
                idempotent,
                reply: Some(reply_tx),
                sent_on: None,
            },
        );

        if let Err(error) = self.send_inflight(id, &message).await {
            self.lock().inflight.remove(&id);
            return Err(error);
        }

        let endpoints = self.server_count().max(1);
        let mut attempts = 1;
        loop {
            match time::timeout(timeout, &mut reply_rx).await {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(_)) => return Err(RemoteError::Cancelled),
                Err(_) => {
                    let sent_on = self.lock().inflight.get(&id).and_then(|entry| entry.sent_on);
                    if let Some(index) = sent_on {
                        warn!(id, endpoint = %self.endpoint_url(index), "response window elapsed");
                        self.demote(index);
                    }
                    attempts += 1;
                    if !idempotent || attempts > endpoints {
                        self.lock().inflight.remove(&id);
                        return Err(RemoteError::RequestTimeout { id, timeout });
                    }
                    if let Err(error) = self.send_inflight(id, &message).await {
                        self.lock().inflight.remove(&id);
                        return Err(error);
                    }
                }
            }
        }
    }

    /// Drops a dispatched request, suppressing its response on late
    /// arrival. The request is not retracted from the server.
    pub fn cancel(&self, id: u64) -> bool {
        self.lock().inflight.remove(&id).is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PoolInner> {
        self.inner.lock().expect("server pool mutex poisoned")
    }

    fn endpoint_url(&self, index: usize) -> String {
        self.lock()
            .servers
            .get(index)
            .map(|slot| slot.endpoint.url())
            .unwrap_or_default()
    }

    async fn open_link(&self, index: usize) -> Result<(), RemoteError> {
        let (url, generation) = {
            let mut inner = self.lock();
            let slot = &mut inner.servers[index];
            slot.state = ConnectionState::Connecting;
            slot.generation += 1;
            (slot.endpoint.url(), slot.generation)
        };

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        match self.transport.connect(&url, inbox_tx).await {
            Ok(link) => {
                let link: Arc<dyn Link> = Arc::from(link);
                {
                    let mut inner = self.lock();
                    let slot = &mut inner.servers[index];
                    slot.link = Some(link);
                    slot.state = ConnectionState::Connected;
                }
                info!(endpoint = %url, "connected");
                self.spawn_inbox(index, generation, inbox_rx);
                Ok(())
            }
            Err(error) => {
                let mut inner = self.lock();
                let slot = &mut inner.servers[index];
                slot.state = ConnectionState::Disconnected;
                slot.link = None;
                Err(error)
            }
        }
    }

    fn spawn_inbox(&self, index: usize, generation: u64, mut inbox: mpsc::UnboundedReceiver<Value>) {
        let pool = self.clone();
        tokio::spawn(async move {
            while let Some(message) = inbox.recv().await {
                pool.route_incoming(message);
            }
            // Inbox closed: the transport dropped the connection.
            if pool.still_current(index, generation) {
                pool.demote(index);
                pool.rehome_inflight().await;
            }
        });
    }

    fn still_current(&self, index: usize, generation: u64) -> bool {
        self.lock()
            .servers
            .get(index)
            .map(|slot| slot.generation == generation)
            .unwrap_or(false)
    }

    /// Routes one incoming message: by correlation id to its waiting
    /// request, or into the ledger tracker for validated-ledger notices.
    fn route_incoming(&self, message: Value) {
        if let Some(id) = message.get("id").and_then(Value::as_u64) {
            let entry = self.lock().inflight.remove(&id);
            match entry.and_then(|entry| entry.reply) {
                Some(reply) => {
                    if reply.send(message).is_err() {
                        debug!(id, "response dropped: requester gone");
                    }
                }
                None => debug!(id, "response for unknown request"),
            }
            return;
        }

        if message.get("type").and_then(Value::as_str) == Some("ledgerClosed") {
            if let Some(index) = message.get("ledger_index").and_then(Value::as_u64) {
                self.ledger
                    .observe(index, message.get("ledger_hash").and_then(Value::as_str));
            }
            return;
        }

        debug!("unroutable message dropped");
    }

    /// Demotes a failed endpoint and schedules its reconnection.
    fn demote(&self, index: usize) {
        {
            let mut inner = self.lock();
            let Some(slot) = inner.servers.get_mut(index) else {
                return;
            };
            if slot.state == ConnectionState::Disconnected {
                return;
            }
            warn!(endpoint = %slot.endpoint, "endpoint down, failing over");
            slot.state = ConnectionState::Disconnected;
            slot.link = None;
        }
        self.schedule_reconnect(index);
    }

    fn schedule_reconnect(&self, index: usize) {
        let pool = self.clone();
        tokio::spawn(async move {
            let mut backoff = ExponentialBackoff::new(
                pool.cfg.reconnect_initial,
                pool.cfg.reconnect_max,
                2.0,
            );
            loop {
                time::sleep(backoff.next_delay()).await;
                match pool.open_link(index).await {
                    Ok(()) => {
                        pool.rehome_inflight().await;
                        break;
                    }
                    Err(error) => {
                        debug!(endpoint = %pool.endpoint_url(index), %error, "reconnect attempt failed");
                    }
                }
            }
        });
    }

    /// Re-dispatches outstanding idempotent requests after a failover, so
    /// their responses can still arrive under the original correlation ids.
    async fn rehome_inflight(&self) {
        let pending: Vec<(u64, Value)> = self
            .lock()
            .inflight
            .iter()
            .filter(|(_, entry)| entry.idempotent)
            .map(|(id, entry)| (*id, entry.message.clone()))
            .collect();

        if pending.is_empty() {
            return;
        }
        debug!(count = pending.len(), "re-homing outstanding requests");

        let sends = pending.into_iter().map(|(id, message)| async move {
            if let Err(error) = self.send_inflight(id, &message).await {
                warn!(id, %error, "re-home failed");
            }
        });
        futures::future::join_all(sends).await;
    }

    /// Sends one registered message on the current primary, connecting cold
    /// spares in configured order as needed.
    async fn send_inflight(&self, id: u64, message: &Value) -> Result<(), RemoteError> {
        let mut attempts = 0;
        loop {
            let target = {
                let inner = self.lock();
                inner
                    .servers
                    .iter()
                    .enumerate()
                    .find_map(|(index, slot)| match (&slot.state, &slot.link) {
                        (ConnectionState::Connected, Some(link)) => Some((index, link.clone())),
                        _ => None,
                    })
            };

            match target {
                Some((index, link)) => match link.send(message).await {
                    Ok(()) => {
                        if let Some(entry) = self.lock().inflight.get_mut(&id) {
                            entry.sent_on = Some(index);
                        }
                        return Ok(());
                    }
                    Err(error) => {
                        warn!(id, endpoint = %self.endpoint_url(index), %error, "send failed");
                        self.demote(index);
                    }
                },
                None => {
                    if !self.connect_next().await {
                        return Err(RemoteError::NoServersAvailable);
                    }
                }
            }

            attempts += 1;
            if attempts > self.server_count() {
                return Err(RemoteError::NoServersAvailable);
            }
        }
    }

    /// Brings up the next disconnected endpoint in configured order.
    async fn connect_next(&self) -> bool {
        let candidates: Vec<usize> = {
            let inner = self.lock();
            inner
                .servers
                .iter()
                .enumerate()
                .filter(|(_, slot)| slot.state == ConnectionState::Disconnected)
                .map(|(index, _)| index)
                .collect()
        };
        for index in candidates {
            if self.open_link(index).await.is_ok() {
                return true;
            }
        }
        false
    }
}
