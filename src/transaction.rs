use std::{collections::HashMap, sync::Mutex};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::{
    errors::RemoteError,
    ledger::LedgerTracker,
    pool::ServerPool,
    request::Request,
    signing::Signer,
    storage::{PersistedTransaction, Storage},
};

/// Submission lifecycle of a transaction.
///
/// `unsubmitted → pending → submitted → {confirmed | failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxState {
    Unsubmitted,
    Pending,
    Submitted,
    Confirmed,
    Failed,
}

/// A transaction owned by the submission pipeline.
///
/// `submitted_ids` accumulates one signature/hash identifier per submit
/// attempt, oldest first, so downstream observers can deduplicate across
/// fee or sequence races. The caller-assigned client id is immutable once
/// set to a non-empty value.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub tx_json: Value,
    client_id: Option<String>,
    pub state: TxState,
    /// Ledger index in effect at the latest submission attempt.
    pub submit_index: u64,
    pub submitted_ids: Vec<String>,
    secret: Option<String>,
}

impl Transaction {
    pub fn new(tx_json: Value) -> Self {
        Self {
            tx_json,
            client_id: None,
            state: TxState::Unsubmitted,
            submit_index: 0,
            submitted_ids: Vec::new(),
            secret: None,
        }
    }

    /// Reconstructs a transaction from its persisted record, restoring the
    /// client id, submitted identifiers, submit index, and signing secret
    /// exactly as stored.
    pub fn from_persisted(record: &PersistedTransaction) -> Self {
        Self {
            tx_json: record.tx_json.clone(),
            client_id: Some(record.client_id.clone()),
            state: record.state,
            submit_index: record.submit_index,
            submitted_ids: record.submitted_ids.clone(),
            secret: Some(record.secret.clone()),
        }
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Assigns the caller correlation id. A non-empty id, once set, cannot
    /// be replaced.
    pub fn set_client_id(&mut self, id: &str) -> Result<&mut Self, RemoteError> {
        match &self.client_id {
            Some(existing) if !existing.is_empty() && existing != id => {
                Err(RemoteError::ClientIdImmutable)
            }
            _ => {
                self.client_id = Some(id.to_string());
                Ok(self)
            }
        }
    }

    pub fn secret(&self) -> Option<&str> {
        self.secret.as_deref()
    }

    pub fn set_secret(&mut self, secret: &str) -> &mut Self {
        self.secret = Some(secret.to_string());
        self
    }

    /// Fee named in the payload, in drops. Absent or malformed fees read
    /// as zero.
    pub fn fee(&self) -> u64 {
        match self.tx_json.get("Fee") {
            Some(Value::String(s)) => s.parse().unwrap_or(0),
            Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
            _ => 0,
        }
    }
}

/// Coordinates signing, dispatch, and the persisted pending set.
pub struct TransactionManager {
    max_fee: u64,
    pending: Mutex<HashMap<String, Transaction>>,
}

impl TransactionManager {
    pub fn new(max_fee: u64) -> Self {
        Self {
            max_fee,
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn max_fee(&self) -> u64 {
        self.max_fee
    }

    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    /// Snapshot of a pending transaction by client id.
    pub fn pending(&self, client_id: &str) -> Option<Transaction> {
        self.lock().get(client_id).cloned()
    }

    /// Signs and dispatches one transaction.
    ///
    /// Fails before any signing or network activity when the named fee
    /// exceeds the configured ceiling; the fee is never silently reduced.
    /// On success the transaction sits in the pending set as `Submitted`
    /// until confirmed or failed.
    pub async fn submit(
        &self,
        mut tx: Transaction,
        signer: &dyn Signer,
        pool: &ServerPool,
        ledger: &LedgerTracker,
    ) -> Result<Value, RemoteError> {
        let fee = tx.fee();
        if fee > self.max_fee {
            return Err(RemoteError::FeeExceedsMax {
                fee,
                max_fee: self.max_fee,
            });
        }

        let secret = tx
            .secret()
            .ok_or_else(|| RemoteError::Signing("no signing credential on transaction".into()))?
            .to_string();

        if tx.state == TxState::Unsubmitted {
            tx.state = TxState::Pending;
        }

        let signed = signer.sign(&tx.tx_json, &secret).await?;
        tx.submitted_ids.push(signed.id.clone());
        tx.submit_index = ledger.validated_index().unwrap_or(tx.submit_index);
        tx.state = TxState::Submitted;

        let key = tx
            .client_id()
            .map(str::to_string)
            .unwrap_or_else(|| signed.id.clone());
        debug!(client_id = %key, attempt = tx.submitted_ids.len(), "submitting transaction");
        self.lock().insert(key, tx);

        let mut request = Request::new("submit");
        request.set_field("tx_blob", json!(signed.blob));
        pool.dispatch(&mut request).await
    }

    /// Replays every transaction the storage layer still holds as pending.
    ///
    /// Each record is reconstructed with its prior client-visible
    /// identifiers intact before a new attempt is issued, so downstream
    /// observers can deduplicate. A failed attempt leaves that transaction
    /// pending and moves on. Returns the client ids replayed.
    pub async fn resubmit_pending(
        &self,
        storage: &dyn Storage,
        signer: &dyn Signer,
        pool: &ServerPool,
        ledger: &LedgerTracker,
    ) -> Result<Vec<String>, RemoteError> {
        let records = storage.get_pending_transactions().await?;
        info!(count = records.len(), "replaying pending transactions");

        let mut replayed = Vec::with_capacity(records.len());
        for record in &records {
            let tx = Transaction::from_persisted(record);
            debug_assert_eq!(tx.submitted_ids, record.submitted_ids);
            replayed.push(record.client_id.clone());
            if let Err(error) = self.submit(tx, signer, pool, ledger).await {
                warn!(client_id = %record.client_id, %error, "resubmission attempt failed");
            }
        }
        Ok(replayed)
    }

    /// Marks a pending transaction final and removes it from the set.
    pub fn confirm(&self, client_id: &str) -> Option<Transaction> {
        self.finalize(client_id, TxState::Confirmed)
    }

    /// Marks a pending transaction failed and removes it from the set.
    pub fn fail(&self, client_id: &str) -> Option<Transaction> {
        self.finalize(client_id, TxState::Failed)
    }

    fn finalize(&self, client_id: &str, state: TxState) -> Option<Transaction> {
        let mut tx = self.lock().remove(client_id)?;
        tx.state = state;
        info!(client_id, ?state, "transaction finalized");
        Some(tx)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Transaction>> {
        self.pending.lock().expect("pending set mutex poisoned")
    }
}
