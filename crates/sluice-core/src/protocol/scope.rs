//! Connection scopes handed to the application.
//!
//! A scope is the immutable, per-connection metadata the application receives
//! before any message is exchanged.  Sluice produces two kinds:
//!
//! - [`HttpScope`] – one inbound request (method, path, headers, ...).
//! - [`LifespanScope`] – the process-level startup/shutdown exchange.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::protocol::messages::HeaderPair;

// ── Calling convention version ────────────────────────────────────────────────

/// Application calling convention version.
///
/// - `V2`: the application is called with the scope and returns an instance
///   that is then called with `(receive, send)`.
/// - `V3`: the application is called with `(scope, receive, send)` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ProtocolVersion {
    V2,
    #[default]
    V3,
}

impl ProtocolVersion {
    /// Version string placed in the scope's `asgi.version` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolVersion::V2 => "2.0",
            ProtocolVersion::V3 => "3.0",
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for ProtocolVersion {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(ProtocolVersion::V2),
            3 => Ok(ProtocolVersion::V3),
            other => Err(format!("unsupported protocol version {other}, expected 2 or 3")),
        }
    }
}

impl From<ProtocolVersion> for u8 {
    fn from(value: ProtocolVersion) -> Self {
        match value {
            ProtocolVersion::V2 => 2,
            ProtocolVersion::V3 => 3,
        }
    }
}

/// The `asgi` sub-record present in every scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsgiInfo {
    pub version: String,
    pub spec_version: String,
}

impl AsgiInfo {
    /// Describes the given calling convention.
    pub fn new(version: ProtocolVersion) -> Self {
        Self {
            version: version.as_str().to_string(),
            spec_version: "2.0".to_string(),
        }
    }
}

impl Default for AsgiInfo {
    fn default() -> Self {
        Self::new(ProtocolVersion::default())
    }
}

// ── HTTP scope ────────────────────────────────────────────────────────────────

/// Connection descriptor for one inbound HTTP request.
///
/// Built once per invocation and read-only for the lifetime of the cycle.
/// `server` and `client` are always `None` on a function host: there is no
/// socket to take addresses from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpScope {
    pub asgi: AsgiInfo,
    pub method: String,
    pub path: String,
    pub scheme: String,
    pub http_version: String,
    pub root_path: String,
    pub raw_path: Option<Vec<u8>>,
    pub query_string: Vec<u8>,
    pub headers: Vec<HeaderPair>,
    pub server: Option<(String, u16)>,
    pub client: Option<(String, u16)>,
}

impl HttpScope {
    /// Creates a scope for `method` on `path` with HTTP/1.1 defaults and no
    /// headers, query string or scheme.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            asgi: AsgiInfo::default(),
            method: method.into(),
            path: path.into(),
            scheme: String::new(),
            http_version: "1.1".to_string(),
            root_path: String::new(),
            raw_path: None,
            query_string: Vec::new(),
            headers: Vec::new(),
            server: None,
            client: None,
        }
    }

    /// Returns the first request header named `name` (ASCII case-insensitive).
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name.as_bytes()))
            .map(|(_, v)| v.as_slice())
    }
}

// ── Lifespan scope ────────────────────────────────────────────────────────────

/// Descriptor for the startup/shutdown exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifespanScope {
    pub asgi: AsgiInfo,
}

// ── Scope ─────────────────────────────────────────────────────────────────────

/// Everything an application can be called with, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Scope {
    #[serde(rename = "http")]
    Http(HttpScope),
    #[serde(rename = "lifespan")]
    Lifespan(LifespanScope),
}

impl Scope {
    /// The scope's type tag: `"http"` or `"lifespan"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Scope::Http(_) => "http",
            Scope::Lifespan(_) => "lifespan",
        }
    }

    /// Returns the HTTP descriptor, if this is an HTTP scope.
    pub fn as_http(&self) -> Option<&HttpScope> {
        match self {
            Scope::Http(scope) => Some(scope),
            Scope::Lifespan(_) => None,
        }
    }
}
