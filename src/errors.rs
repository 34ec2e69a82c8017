use std::time::Duration;

/// Errors that can occur while constructing, validating, or dispatching
/// remote operations.
///
/// Variants fall into four groups: construction errors (bad endpoint or
/// configuration input, surfaced before any network activity), validation
/// errors (malformed request fields, fatal to that request only),
/// connectivity errors (surfaced once every endpoint has been exhausted),
/// and submission errors (fatal to a single submission attempt).
#[derive(thiserror::Error, Debug)]
pub enum RemoteError {
    /// The host does not match the hostname/IP grammar.
    #[error("invalid host: {host:?}")]
    InvalidHost { host: String },

    /// The port was not an integer or numeric string.
    #[error("port must be a number")]
    PortType,

    /// The port is outside [1, 65535].
    #[error("port {port} out of range")]
    PortRange { port: i64 },

    /// The server URL could not be parsed as `ws[s]://host:port`.
    #[error("invalid server url: {url:?}")]
    InvalidUrl { url: String },

    /// The configuration object is malformed.
    #[error("invalid configuration: {0}")]
    BadConfig(String),

    /// A paged request carried a marker without a resolved ledger selector.
    #[error("a ledger index or ledger hash must be provided when using a marker")]
    LedgerRequiredWithMarker,

    /// A required request field was absent or empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The request was already handed to the server pool.
    #[error("request already dispatched")]
    RequestAlreadyDispatched,

    /// The currency code is neither a known keyword, a 3-character code,
    /// nor a 40-character hex string.
    #[error("unknown currency: {0:?}")]
    InvalidCurrency(String),

    /// No endpoint could be connected.
    #[error("no servers available")]
    NoServersAvailable,

    /// Every endpoint was tried and none answered within the window.
    #[error("request {id} timed out after {timeout:?}")]
    RequestTimeout { id: u64, timeout: Duration },

    /// The request was cancelled before a response arrived.
    #[error("request cancelled")]
    Cancelled,

    /// The transport collaborator reported a failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The computed fee exceeds the configured ceiling.
    #[error("fee {fee} exceeds max_fee {max_fee}")]
    FeeExceedsMax { fee: u64, max_fee: u64 },

    /// The signing collaborator failed or is not configured.
    #[error("signing failed: {0}")]
    Signing(String),

    /// The storage collaborator failed or is not configured.
    #[error("storage error: {0}")]
    Storage(String),

    /// The client correlation id is immutable once set to a non-empty value.
    #[error("client id is already set")]
    ClientIdImmutable,
}
