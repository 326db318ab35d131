//! Conversions between host records and protocol records.

use url::{form_urlencoded, Url};

use sluice_core::{AsgiInfo, CycleResponse, HttpScope, ProtocolVersion};

use crate::application::adapter::AdapterError;
use crate::domain::host::{HostRequest, HostResponse};

/// Base used to resolve relative request URLs.  Never visible in a scope.
const RELATIVE_BASE: &str = "http://relative.invalid/";

/// Builds the HTTP scope for `request`.
///
/// - `path` is taken verbatim from the URL, without normalisation or
///   percent-encoding.
/// - `scheme` is the URL's scheme, or empty for a relative URL.
/// - `query_string` is the form-encoded `params` when there are any,
///   otherwise the URL's raw query, otherwise empty.
/// - headers keep their delivery order and become byte pairs.
///
/// # Errors
///
/// Returns [`AdapterError::InvalidUrl`] if the URL cannot be parsed even
/// as a relative reference.
pub fn build_scope(request: &HostRequest, version: ProtocolVersion) -> Result<HttpScope, AdapterError> {
    let (url, absolute) = parse_url(&request.url)?;

    let mut scope = HttpScope::new(request.method.clone(), raw_path(&request.url, absolute));
    scope.asgi = AsgiInfo::new(version);
    if absolute {
        scope.scheme = url.scheme().to_string();
    }
    scope.query_string = query_string(request, &url);
    scope.headers = request
        .headers
        .iter()
        .map(|(name, value)| (name.as_bytes().to_vec(), value.as_bytes().to_vec()))
        .collect();
    Ok(scope)
}

/// Copies a finished cycle response into the host's response record.
pub fn into_host_response(response: CycleResponse) -> HostResponse {
    HostResponse {
        status_code: response.status,
        headers: response.headers,
        body: response.body,
        mimetype: response.mimetype,
        charset: response.charset,
    }
}

fn parse_url(raw: &str) -> Result<(Url, bool), AdapterError> {
    let invalid = |source: url::ParseError| AdapterError::InvalidUrl {
        url: raw.to_string(),
        source,
    };
    match Url::parse(raw) {
        Ok(url) => Ok((url, true)),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(RELATIVE_BASE)
            .and_then(|base| base.join(raw))
            .map(|url| (url, false))
            .map_err(invalid),
        Err(source) => Err(invalid(source)),
    }
}

/// Slices the path out of `raw`: after the scheme and authority of an
/// absolute URL, up to the first `?` or `#`.
fn raw_path(raw: &str, absolute: bool) -> &str {
    let rest = if absolute {
        let hier = raw.split_once(':').map_or(raw, |(_, rest)| rest);
        match hier.strip_prefix("//") {
            Some(authority) => authority
                .find(|c: char| matches!(c, '/' | '?' | '#'))
                .map_or("", |start| &authority[start..]),
            None => hier,
        }
    } else {
        raw
    };
    rest.find(|c: char| matches!(c, '?' | '#'))
        .map_or(rest, |end| &rest[..end])
}

fn query_string(request: &HostRequest, url: &Url) -> Vec<u8> {
    if request.params.is_empty() {
        return url.query().unwrap_or_default().as_bytes().to_vec();
    }
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(&request.params)
        .finish()
        .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_relative_url_has_empty_scheme() {
        let scope = build_scope(&HostRequest::new("GET", "/"), ProtocolVersion::V3).unwrap();

        assert_eq!(scope.scheme, "");
        assert_eq!(scope.path, "/");
        assert!(scope.query_string.is_empty());
        assert_eq!(scope.http_version, "1.1");
        assert_eq!(scope.root_path, "");
        assert_eq!(scope.server, None);
        assert_eq!(scope.client, None);
    }

    #[test]
    fn test_absolute_url_parts() {
        // Arrange
        let request = HostRequest::new("GET", "https://example.com/api/items?page=2&sort=asc");

        // Act
        let scope = build_scope(&request, ProtocolVersion::V2).unwrap();

        // Assert
        assert_eq!(scope.scheme, "https");
        assert_eq!(scope.path, "/api/items");
        assert_eq!(scope.query_string, b"page=2&sort=asc");
        assert_eq!(scope.asgi.version, "2.0");
    }

    #[test]
    fn test_path_is_passed_through_unchanged() {
        let cases = [
            ("/a/../b", "/a/../b"),
            ("/a b", "/a b"),
            ("/a b?x=1#frag", "/a b"),
            ("search", "search"),
            ("http://h/x/./y/%41", "/x/./y/%41"),
            ("https://user@h:8443/p q?x#y", "/p q"),
            ("http://h?x=1", ""),
        ];

        for (url, expected) in cases {
            let scope = build_scope(&HostRequest::new("GET", url), ProtocolVersion::V3).unwrap();
            assert_eq!(scope.path, expected, "path of {url}");
        }
    }

    #[test]
    fn test_params_take_precedence_over_url_query() {
        let request = HostRequest::new("GET", "/search?ignored=1")
            .with_param("q", "rust lang")
            .with_param("n", "10");

        let scope = build_scope(&request, ProtocolVersion::V3).unwrap();

        assert_eq!(scope.query_string, b"q=rust+lang&n=10");
    }

    #[test]
    fn test_headers_become_ordered_byte_pairs() {
        let request = HostRequest::new("GET", "/")
            .with_header("x-b", "2")
            .with_header("x-a", "1");

        let scope = build_scope(&request, ProtocolVersion::V3).unwrap();

        assert_eq!(
            scope.headers,
            vec![
                (b"x-b".to_vec(), b"2".to_vec()),
                (b"x-a".to_vec(), b"1".to_vec())
            ]
        );
    }

    #[test]
    fn test_unparseable_url_is_rejected() {
        let err = build_scope(&HostRequest::new("GET", "http://[::1"), ProtocolVersion::V3)
            .unwrap_err();

        assert!(matches!(err, AdapterError::InvalidUrl { .. }));
    }

    #[test]
    fn test_into_host_response_copies_every_field() {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "text/plain".to_string());
        let response = CycleResponse {
            status: 201,
            headers: headers.clone(),
            mimetype: Some("text/plain".to_string()),
            charset: None,
            body: b"made".to_vec(),
        };

        let host = into_host_response(response);

        assert_eq!(host.status_code, 201);
        assert_eq!(host.headers, headers);
        assert_eq!(host.mimetype.as_deref(), Some("text/plain"));
        assert_eq!(host.charset, None);
        assert_eq!(host.body_text(), "made");
    }
}
