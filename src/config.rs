use std::collections::HashMap;

use serde_json::Value;

use crate::endpoint::Endpoint;
use crate::errors::RemoteError;

/// Default ceiling on transaction fees, in drops.
pub const DEFAULT_MAX_FEE: u64 = 1_000_000;

/// Default page size for transaction history queries.
pub const DEFAULT_TRANSACTIONS_PER_PAGE: u32 = 50;

/// Routing table for external asset bridges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Outbound asset name to bridge endpoint URL.
    pub out: HashMap<String, String>,
}

/// Remote orchestrator configuration.
///
/// Built either directly or from a loosely-typed JSON object via
/// [`RemoteConfig::from_json`]. Server entries accept both structured specs
/// and `ws[s]://host:port` URL strings; a malformed entry fails the whole
/// configuration.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Ordered endpoint list; the first healthy entry is preferred.
    pub servers: Vec<Endpoint>,
    /// Ceiling on transaction fees. A non-numeric configuration value,
    /// including a numeric string, is rejected in favor of the default
    /// rather than coerced.
    pub max_fee: u64,
    pub trace: bool,
    pub trusted: bool,
    pub local_signing: bool,
    pub persistent_auth: bool,
    pub transactions_per_page: u32,
    /// External vault URL, when the application uses one.
    pub blobvault: Option<String>,
    pub bridge: BridgeConfig,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
            max_fee: DEFAULT_MAX_FEE,
            trace: false,
            trusted: false,
            local_signing: false,
            persistent_auth: false,
            transactions_per_page: DEFAULT_TRANSACTIONS_PER_PAGE,
            blobvault: None,
            bridge: BridgeConfig::default(),
        }
    }
}

impl RemoteConfig {
    /// Parses a configuration object.
    ///
    /// Recognized keys: `servers`, `max_fee`, `trace`, `trusted`,
    /// `local_signing`, `persistent_auth`, `transactions_per_page`,
    /// `blobvault`, `bridge.out`. Unknown keys are ignored.
    pub fn from_json(value: &Value) -> Result<Self, RemoteError> {
        let obj = value
            .as_object()
            .ok_or_else(|| RemoteError::BadConfig("configuration must be an object".into()))?;

        let mut cfg = Self::default();

        if let Some(servers) = obj.get("servers") {
            let entries = servers
                .as_array()
                .ok_or_else(|| RemoteError::BadConfig("servers must be an array".into()))?;
            for entry in entries {
                cfg.servers.push(Endpoint::from_value(entry)?);
            }
        }

        // Only a genuine JSON number is honored; a numeric string falls
        // back to the default. This leniency is specific to max_fee.
        cfg.max_fee = match obj.get("max_fee") {
            Some(Value::Number(n)) => n.as_f64().map(|f| f as u64).unwrap_or(DEFAULT_MAX_FEE),
            _ => DEFAULT_MAX_FEE,
        };

        cfg.trace = obj.get("trace").and_then(Value::as_bool).unwrap_or(false);
        cfg.trusted = obj.get("trusted").and_then(Value::as_bool).unwrap_or(false);
        cfg.local_signing = obj
            .get("local_signing")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        cfg.persistent_auth = obj
            .get("persistent_auth")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        cfg.transactions_per_page = obj
            .get("transactions_per_page")
            .and_then(Value::as_u64)
            .map(|n| n as u32)
            .unwrap_or(DEFAULT_TRANSACTIONS_PER_PAGE);

        cfg.blobvault = obj
            .get("blobvault")
            .and_then(Value::as_str)
            .map(str::to_string);

        if let Some(out) = obj
            .get("bridge")
            .and_then(|bridge| bridge.get("out"))
            .and_then(Value::as_object)
        {
            for (asset, target) in out {
                if let Some(target) = target.as_str() {
                    cfg.bridge.out.insert(asset.clone(), target.to_string());
                }
            }
        }

        Ok(cfg)
    }
}
