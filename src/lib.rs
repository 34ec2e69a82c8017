//! A ledger network RPC client that orchestrates queries and transaction
//! submission across a redundant pool of servers.
//!
//! The crate covers three tightly coupled concerns: a multi-server
//! connection pool with failover selection, validated construction of
//! protocol request messages (including paging semantics), and a
//! transaction submission pipeline that signs locally, tracks pending
//! transactions in persistent storage, and resubmits them on restart.
//! The physical transport, the signing primitives, and the storage engine
//! are collaborator traits supplied by the embedding application.
//!
//! # Quick Start
//!
//! ```
//! use ledger_remote::{AccountParams, Remote};
//!
//! let params = AccountParams::new("r4qLSAzv4LZ9TLsR7diphGwKnSEAMQTSjS").ledger(9592219u64);
//! let request = Remote::account_request("account_lines", &params)?;
//!
//! assert_eq!(request.command(), "account_lines");
//! assert!(!request.requested());
//! # Ok::<(), ledger_remote::RemoteError>(())
//! ```
//!
//! # Failover
//!
//! Endpoints are tried in configured order:
//! 1. The first connected endpoint is the primary and receives every
//!    dispatch
//! 2. On a send failure or response timeout the primary is demoted and
//!    reconnected with backoff
//! 3. Outstanding idempotent requests are re-homed to the next endpoint
//!    under their original correlation ids
//! 4. Callers see a connectivity error only once every endpoint has been
//!    exhausted

pub mod backoff;
pub mod config;
pub mod currency;
pub mod endpoint;
pub mod errors;
pub mod ledger;
pub mod pool;
pub mod remote;
pub mod request;
pub mod signing;
pub mod storage;
pub mod transaction;
pub mod transport;

pub use config::{BridgeConfig, RemoteConfig, DEFAULT_MAX_FEE};
pub use currency::{Currency, ACCOUNT_ONE};
pub use endpoint::Endpoint;
pub use errors::RemoteError;
pub use ledger::LedgerTracker;
pub use pool::{ConnectionState, PoolConfig, ServerPool};
pub use remote::{AccountParams, BookOffersParams, BookSide, Remote};
pub use request::{clamp_limit, resolve_ledger, LedgerArg, LedgerSelector, Request};
pub use signing::{SignedPayload, Signer};
pub use storage::{PersistedTransaction, Storage};
pub use transaction::{Transaction, TransactionManager, TxState};
pub use transport::{Link, Transport};
