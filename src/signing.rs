use async_trait::async_trait;
use serde_json::Value;

use crate::errors::RemoteError;

/// A signed transaction ready for the wire.
#[derive(Debug, Clone)]
pub struct SignedPayload {
    /// Serialized signed transaction blob.
    pub blob: String,
    /// Signature/hash identifier for this attempt.
    pub id: String,
}

/// Local signing collaborator.
///
/// The secret is a credential reference resolved by the implementation; it
/// is handed to the signer and never placed in an outgoing message.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(&self, tx_json: &Value, secret: &str) -> Result<SignedPayload, RemoteError>;
}
