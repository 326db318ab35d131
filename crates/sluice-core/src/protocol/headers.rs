//! Response header decoding and `content-type` parsing.
//!
//! Applications emit headers as raw byte pairs.  The host response wants a
//! text mapping plus a resolved media type and charset, so the request cycle
//! decodes them once, when the response start arrives.

use std::collections::BTreeMap;

use crate::protocol::error::ProtocolError;
use crate::protocol::messages::HeaderPair;

/// Name of the header the media type and charset are read from.
///
/// Matching is exact: header names are compared case-sensitively.
pub const CONTENT_TYPE: &str = "content-type";

/// Media type and charset resolved from a `content-type` header value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentType {
    /// E.g. `text/html`.  `None` when the header value has no media type.
    pub mimetype: Option<String>,
    /// Value of the `charset` parameter, if present and non-empty.
    pub charset: Option<String>,
}

/// Decodes raw header byte pairs into a case-sensitive text mapping.
///
/// When a name repeats, the last value wins.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedHeader`] if a name or value is not UTF-8.
pub fn decode_headers(raw: &[HeaderPair]) -> Result<BTreeMap<String, String>, ProtocolError> {
    let mut headers = BTreeMap::new();
    for (name, value) in raw {
        let name = std::str::from_utf8(name)
            .map_err(|e| ProtocolError::MalformedHeader(format!("name: {e}")))?;
        let value = std::str::from_utf8(value)
            .map_err(|e| ProtocolError::MalformedHeader(format!("value of '{name}': {e}")))?;
        headers.insert(name.to_string(), value.to_string());
    }
    Ok(headers)
}

/// Parses a `content-type` header value into a media type and charset.
///
/// The first `;`-separated segment is the media type.  Each following
/// `name=value` segment is a parameter; names are matched case-insensitively
/// and surrounding double quotes are stripped from values.  A `;` inside a
/// quoted value does not end the parameter, and a repeated `charset` keeps
/// its last value.
///
/// # Example
///
/// ```rust
/// use sluice_core::protocol::parse_content_type;
///
/// let ct = parse_content_type("text/html; charset=utf-8");
/// assert_eq!(ct.mimetype.as_deref(), Some("text/html"));
/// assert_eq!(ct.charset.as_deref(), Some("utf-8"));
/// ```
pub fn parse_content_type(value: &str) -> ContentType {
    let mut segments = split_segments(value);

    let mimetype = segments
        .next()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string);

    let charset = segments
        .filter_map(|param| param.split_once('='))
        .filter(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
        .last()
        .map(|(_, value)| unquote(value.trim()))
        .filter(|c| !c.is_empty());

    ContentType { mimetype, charset }
}

/// Splits on `;` outside double quotes.  Inside quotes a backslash escapes
/// the next character.
fn split_segments(value: &str) -> impl Iterator<Item = &str> {
    let mut quoted = false;
    let mut escaped = false;
    value.split(move |c: char| {
        let boundary = c == ';' && !quoted;
        if escaped {
            escaped = false;
        } else if c == '\\' && quoted {
            escaped = true;
        } else if c == '"' {
            quoted = !quoted;
        }
        boundary
    })
}

fn unquote(value: &str) -> String {
    match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(inner) => inner.replace("\\\\", "\\").replace("\\\"", "\""),
        None => value.to_string(),
    }
}
