use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::RemoteError;
use crate::transaction::TxState;

/// A transaction record as held by the persistence layer.
///
/// Field names mirror the stored wire shape (`clientID`, `submitIndex`,
/// `submittedIDs`) so records round-trip byte-for-byte through serde.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedTransaction {
    pub tx_json: Value,
    #[serde(rename = "clientID")]
    pub client_id: String,
    pub state: TxState,
    #[serde(rename = "submitIndex")]
    pub submit_index: u64,
    #[serde(rename = "submittedIDs")]
    pub submitted_ids: Vec<String>,
    pub secret: String,
}

/// Persistence backend for pending transactions.
///
/// The submission pipeline only ever asks one thing of storage: the set of
/// transactions still awaiting finality, fetched at startup (and on
/// reconnect when persistent auth is enabled) so they can be resubmitted.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get_pending_transactions(&self) -> Result<Vec<PersistedTransaction>, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn persisted_record_round_trips_through_serde() {
        let record = PersistedTransaction {
            tx_json: json!({ "TransactionType": "Payment", "Fee": "15" }),
            client_id: "48631".to_string(),
            state: TxState::Pending,
            submit_index: 1,
            submitted_ids: vec!["3046022100".to_string()],
            secret: "mysecret".to_string(),
        };

        let encoded = serde_json::to_value(&record).unwrap();
        assert_eq!(encoded["clientID"], json!("48631"));
        assert_eq!(encoded["state"], json!("pending"));
        assert_eq!(encoded["submitIndex"], json!(1));
        assert_eq!(encoded["submittedIDs"], json!(["3046022100"]));

        let decoded: PersistedTransaction = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, record);
    }
}
