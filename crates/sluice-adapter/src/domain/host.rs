//! Host-side request and response records.
//!
//! These are the shapes a function host hands to the adapter and expects
//! back.  They are deliberately plain: text method and URL, text header
//! pairs, raw body bytes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One inbound platform request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRequest {
    pub method: String,
    /// Absolute (`https://host/path?q`) or relative (`/path`) URL.
    pub url: String,
    /// Header pairs in the order the host delivered them.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Query parameters as parsed by the host.  When non-empty these are
    /// used for the query string instead of the URL's own query.
    #[serde(default)]
    pub params: Vec<(String, String)>,
    #[serde(default)]
    pub body: Option<Vec<u8>>,
}

impl HostRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// One outbound platform response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
    pub mimetype: Option<String>,
    pub charset: Option<String>,
}

impl HostResponse {
    /// The body decoded as text, using replacement characters for invalid
    /// UTF-8.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
