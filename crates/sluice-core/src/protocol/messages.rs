//! All protocol message types exchanged between the host side and an application.
//!
//! Every message is a mapping with a `type` discriminator and type-specific
//! fields.  Serde's `#[serde(tag = "type")]` gives the same shape on the
//! wire, for example:
//!
//! ```json
//! {"type":"http.response.body","body":[104,105],"more_body":false}
//! ```
//!
//! # Directions
//!
//! ```text
//! Host → Application:  http.request, http.disconnect,
//!                      lifespan.startup, lifespan.shutdown
//! Application → Host:  http.response.start, http.response.body,
//!                      lifespan.startup.complete, lifespan.shutdown.complete
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single header as a raw `(name, value)` byte pair.
///
/// Header names and values are raw bytes at this boundary regardless of how
/// the host encodes text.
pub type HeaderPair = (Vec<u8>, Vec<u8>);

/// Builds a [`HeaderPair`] from text.
pub fn header(name: &str, value: &str) -> HeaderPair {
    (name.as_bytes().to_vec(), value.as_bytes().to_vec())
}

// ── Message type codes ────────────────────────────────────────────────────────

/// The `type` discriminator of every protocol message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageType {
    HttpRequest,
    HttpDisconnect,
    HttpResponseStart,
    HttpResponseBody,
    LifespanStartup,
    LifespanStartupComplete,
    LifespanShutdown,
    LifespanShutdownComplete,
}

impl MessageType {
    /// Returns the protocol name of this message type, e.g. `"http.request"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::HttpRequest => "http.request",
            MessageType::HttpDisconnect => "http.disconnect",
            MessageType::HttpResponseStart => "http.response.start",
            MessageType::HttpResponseBody => "http.response.body",
            MessageType::LifespanStartup => "lifespan.startup",
            MessageType::LifespanStartupComplete => "lifespan.startup.complete",
            MessageType::LifespanShutdown => "lifespan.shutdown",
            MessageType::LifespanShutdownComplete => "lifespan.shutdown.complete",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Top-level message enum ────────────────────────────────────────────────────

/// All protocol messages.
///
/// Optional fields follow the protocol defaults: an absent `body` is empty,
/// an absent `more_body` is `false` and absent `headers` are empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    /// Inbound request body.  The driver always sends the full body at once.
    #[serde(rename = "http.request")]
    HttpRequest {
        #[serde(default)]
        body: Vec<u8>,
        #[serde(default)]
        more_body: bool,
    },

    /// Inbound notice that the exchange is over.
    #[serde(rename = "http.disconnect")]
    HttpDisconnect,

    /// Outbound status line and headers.  Must be the first outbound message.
    #[serde(rename = "http.response.start")]
    HttpResponseStart {
        status: u16,
        #[serde(default)]
        headers: Vec<HeaderPair>,
    },

    /// Outbound body chunk.  `more_body = false` marks the last chunk.
    #[serde(rename = "http.response.body")]
    HttpResponseBody {
        #[serde(default)]
        body: Vec<u8>,
        #[serde(default)]
        more_body: bool,
    },

    #[serde(rename = "lifespan.startup")]
    LifespanStartup,

    #[serde(rename = "lifespan.startup.complete")]
    LifespanStartupComplete,

    #[serde(rename = "lifespan.shutdown")]
    LifespanShutdown,

    #[serde(rename = "lifespan.shutdown.complete")]
    LifespanShutdownComplete,
}

impl Message {
    /// Returns the [`MessageType`] discriminator for this message.
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::HttpRequest { .. } => MessageType::HttpRequest,
            Message::HttpDisconnect => MessageType::HttpDisconnect,
            Message::HttpResponseStart { .. } => MessageType::HttpResponseStart,
            Message::HttpResponseBody { .. } => MessageType::HttpResponseBody,
            Message::LifespanStartup => MessageType::LifespanStartup,
            Message::LifespanStartupComplete => MessageType::LifespanStartupComplete,
            Message::LifespanShutdown => MessageType::LifespanShutdown,
            Message::LifespanShutdownComplete => MessageType::LifespanShutdownComplete,
        }
    }

    /// A complete `http.request` carrying the whole body.
    pub fn request(body: impl Into<Vec<u8>>) -> Self {
        Message::HttpRequest {
            body: body.into(),
            more_body: false,
        }
    }

    /// An `http.response.start` with the given status and headers.
    pub fn response_start(status: u16, headers: Vec<HeaderPair>) -> Self {
        Message::HttpResponseStart { status, headers }
    }

    /// An `http.response.body` chunk.
    pub fn response_body(body: impl Into<Vec<u8>>, more_body: bool) -> Self {
        Message::HttpResponseBody {
            body: body.into(),
            more_body,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
