use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::errors::RemoteError;

static HOST_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$")
        .expect("host pattern")
});

/// A validated server address.
///
/// An `Endpoint` is constructed from either a structured spec
/// (`{host, port, secure}`) or a URL string of the form `ws[s]://host:port`,
/// and renders back to its canonical connection URL. Construction fails on a
/// malformed host, a non-numeric port, or a port outside [1, 65535]; values
/// are never clamped.
///
/// # Example
/// ```
/// use ledger_remote::Endpoint;
///
/// let endpoint = Endpoint::from_url("wss://s-west.example.com:443")?;
/// assert_eq!(endpoint.url(), "wss://s-west.example.com:443");
/// # Ok::<(), ledger_remote::RemoteError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
    secure: bool,
}

impl Endpoint {
    /// Creates an endpoint from already-typed parts.
    pub fn new(host: impl Into<String>, port: u16, secure: bool) -> Result<Self, RemoteError> {
        let host = host.into();
        if !HOST_PATTERN.is_match(&host) {
            return Err(RemoteError::InvalidHost { host });
        }
        if port == 0 {
            return Err(RemoteError::PortRange { port: 0 });
        }
        Ok(Self { host, port, secure })
    }

    /// Creates an endpoint from a structured spec object.
    ///
    /// `port` is accepted as a JSON integer or a numeric string; any other
    /// type (including `null`) is a type error. `secure` defaults to `true`
    /// when absent.
    pub fn from_spec(spec: &Value) -> Result<Self, RemoteError> {
        let obj = spec
            .as_object()
            .ok_or_else(|| RemoteError::BadConfig("server spec must be an object".into()))?;

        let host = obj
            .get("host")
            .and_then(Value::as_str)
            .ok_or(RemoteError::MissingField("host"))?;

        let port = match obj.get("port") {
            Some(Value::Number(n)) => n.as_i64().ok_or(RemoteError::PortType)?,
            Some(Value::String(s)) => s.parse::<i64>().map_err(|_| RemoteError::PortType)?,
            _ => return Err(RemoteError::PortType),
        };
        if !(1..=65535).contains(&port) {
            return Err(RemoteError::PortRange { port });
        }

        let secure = obj.get("secure").and_then(Value::as_bool).unwrap_or(true);

        Self::new(host, port as u16, secure)
    }

    /// Parses a `ws://host:port` or `wss://host:port` URL string.
    pub fn from_url(url: &str) -> Result<Self, RemoteError> {
        let (secure, rest) = if let Some(rest) = url.strip_prefix("wss://") {
            (true, rest)
        } else if let Some(rest) = url.strip_prefix("ws://") {
            (false, rest)
        } else {
            return Err(RemoteError::InvalidUrl { url: url.into() });
        };

        let (host, port) = rest.rsplit_once(':').ok_or_else(|| RemoteError::InvalidUrl {
            url: url.into(),
        })?;
        let port: i64 = port.parse().map_err(|_| RemoteError::PortType)?;
        if !(1..=65535).contains(&port) {
            return Err(RemoteError::PortRange { port });
        }

        Self::new(host, port as u16, secure)
    }

    /// Accepts either a URL string or a structured spec object, the two
    /// forms a `servers` configuration entry may take.
    pub fn from_value(value: &Value) -> Result<Self, RemoteError> {
        match value {
            Value::String(url) => Self::from_url(url),
            Value::Object(_) => Self::from_spec(value),
            other => Err(RemoteError::BadConfig(format!(
                "server entry must be a url string or spec object, got {other}"
            ))),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    /// Canonical connection URL: `wss://host:port`, or `ws://host:port` when
    /// `secure` is explicitly false.
    pub fn url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}
