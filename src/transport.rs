use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::errors::RemoteError;

/// Byte-level connection factory, supplied by the embedding application.
///
/// The pool hands each connection an inbox sender; the transport pushes
/// every message received from the server into it and drops the sender
/// when the underlying connection dies, which is how the pool learns a
/// link is gone.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Opens a link to the endpoint's canonical URL.
    async fn connect(
        &self,
        url: &str,
        inbox: mpsc::UnboundedSender<Value>,
    ) -> Result<Box<dyn Link>, RemoteError>;
}

/// An established server connection.
#[async_trait]
pub trait Link: Send + Sync {
    /// Writes one protocol message to the server.
    async fn send(&self, message: &Value) -> Result<(), RemoteError>;

    /// Closes the connection. The transport drops the inbox sender in
    /// response.
    async fn close(&self);
}
