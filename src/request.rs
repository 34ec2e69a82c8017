use std::time::Duration;

use serde_json::{json, Map, Value};
use tracing::warn;

use crate::errors::RemoteError;

/// Largest accepted value for a paged query's `limit` field.
pub const LIMIT_MAX: u64 = 1_000_000_000;

/// Caller-facing ledger selector input.
///
/// A numeric input names a ledger index. A string input is either a
/// 64-character hex hash or an identifier keyword (`"validated"`,
/// `"closed"`, `"current"`) passed through verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerArg {
    Index(u64),
    Number(f64),
    Text(String),
}

impl From<u64> for LedgerArg {
    fn from(index: u64) -> Self {
        LedgerArg::Index(index)
    }
}

impl From<f64> for LedgerArg {
    fn from(number: f64) -> Self {
        LedgerArg::Number(number)
    }
}

impl From<&str> for LedgerArg {
    fn from(text: &str) -> Self {
        LedgerArg::Text(text.to_string())
    }
}

impl From<String> for LedgerArg {
    fn from(text: String) -> Self {
        LedgerArg::Text(text)
    }
}

/// A ledger selector resolved to its wire field.
///
/// `Index` and `Hash` are the only *resolved* forms; an `Identifier` still
/// maps to `ledger_index` but carries keyword semantics, not a numeric
/// index, and does not satisfy the marker invariant.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerSelector {
    Index(u64),
    Hash(String),
    Identifier(String),
}

impl LedgerSelector {
    /// Whether this selector pins a concrete ledger (index or hash).
    pub fn is_resolved(&self) -> bool {
        matches!(self, LedgerSelector::Index(_) | LedgerSelector::Hash(_))
    }

    /// Writes the selector into a message under its wire field name.
    pub fn apply(&self, message: &mut Map<String, Value>) {
        match self {
            LedgerSelector::Index(index) => {
                message.insert("ledger_index".to_string(), json!(index));
            }
            LedgerSelector::Hash(hash) => {
                message.insert("ledger_hash".to_string(), json!(hash));
            }
            LedgerSelector::Identifier(keyword) => {
                message.insert("ledger_index".to_string(), json!(keyword));
            }
        }
    }
}

fn is_ledger_hash(text: &str) -> bool {
    text.len() == 64 && text.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Maps a caller-supplied ledger argument to its wire form.
///
/// Returns `None` for a non-finite or negative numeric input, which names
/// no ledger at all.
pub fn resolve_ledger(arg: &LedgerArg) -> Option<LedgerSelector> {
    match arg {
        LedgerArg::Index(index) => Some(LedgerSelector::Index(*index)),
        LedgerArg::Number(n) if n.is_finite() && *n >= 0.0 => {
            Some(LedgerSelector::Index(*n as u64))
        }
        LedgerArg::Number(_) => None,
        LedgerArg::Text(text) if is_ledger_hash(text) => Some(LedgerSelector::Hash(text.clone())),
        LedgerArg::Text(text) => Some(LedgerSelector::Identifier(text.clone())),
    }
}

/// Clamps a paged query limit into `[0, 1e9]`.
///
/// Negative and non-finite inputs collapse to 0; anything at or above the
/// ceiling collapses to the ceiling.
pub fn clamp_limit(limit: f64) -> u64 {
    if !limit.is_finite() || limit <= 0.0 {
        0
    } else if limit >= LIMIT_MAX as f64 {
        LIMIT_MAX
    } else {
        limit as u64
    }
}

/// A protocol request message under construction.
///
/// The message always carries `command` and an `id` field (null until the
/// server pool assigns a correlation id at dispatch). Fields may be mutated
/// freely until the request is dispatched; afterwards the command and core
/// fields are frozen and only retry bookkeeping changes.
#[derive(Debug, Clone)]
pub struct Request {
    command: String,
    message: Map<String, Value>,
    id: Option<u64>,
    requested: bool,
    timeout: Option<Duration>,
}

impl Request {
    pub fn new(command: &str) -> Self {
        let mut message = Map::new();
        message.insert("command".to_string(), json!(command));
        message.insert("id".to_string(), Value::Null);
        Self {
            command: command.to_string(),
            message,
            id: None,
            requested: false,
            timeout: None,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Correlation id, unset until the pool assigns one at send time.
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    /// True once the request has been handed to the server pool.
    pub fn requested(&self) -> bool {
        self.requested
    }

    pub fn message(&self) -> &Map<String, Value> {
        &self.message
    }

    /// The message as a JSON value, in its current shape.
    pub fn message_value(&self) -> Value {
        Value::Object(self.message.clone())
    }

    /// Sets an arbitrary message field. Ignored with a warning once the
    /// request has been dispatched.
    pub fn set_field(&mut self, key: &str, value: Value) -> &mut Self {
        if self.requested {
            warn!(command = %self.command, key, "ignoring mutation of dispatched request");
            return self;
        }
        self.message.insert(key.to_string(), value);
        self
    }

    pub fn account(&mut self, account: &str) -> &mut Self {
        self.set_field("account", json!(account))
    }

    /// Applies a caller-supplied ledger argument, if it names a ledger.
    pub fn select_ledger(&mut self, arg: &LedgerArg) -> &mut Self {
        if let Some(selector) = resolve_ledger(arg) {
            self.ledger_selector(&selector);
        }
        self
    }

    pub fn ledger_selector(&mut self, selector: &LedgerSelector) -> &mut Self {
        if self.requested {
            warn!(command = %self.command, "ignoring mutation of dispatched request");
            return self;
        }
        selector.apply(&mut self.message);
        self
    }

    pub fn limit(&mut self, limit: f64) -> &mut Self {
        self.set_field("limit", json!(clamp_limit(limit)))
    }

    pub fn marker(&mut self, marker: Value) -> &mut Self {
        self.set_field("marker", marker)
    }

    pub fn peer(&mut self, peer: &str) -> &mut Self {
        self.set_field("peer", json!(peer))
    }

    /// Overrides the pool's per-request response window.
    pub fn with_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Stamps the correlation id and freezes the request. Called by the
    /// server pool at send time.
    pub(crate) fn begin_dispatch(&mut self, id: u64) {
        self.id = Some(id);
        self.message.insert("id".to_string(), json!(id));
        self.requested = true;
    }
}
