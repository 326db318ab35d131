//! sluice-invoke: runs one host invocation against a demo application.
//!
//! Builds a [`HostRequest`] from the command line, wraps a built-in demo
//! application in an [`Adapter`], handles the request once and prints the
//! response as JSON on stdout.  Logs go to stderr.
//!
//! # Usage
//!
//! ```text
//! sluice-invoke [OPTIONS]
//!
//! Options:
//!   --method <METHOD>          HTTP method [default: GET]
//!   --url <URL>                Absolute or relative URL [default: /]
//!   --header <NAME:VALUE>      Request header (repeatable)
//!   --param <NAME=VALUE>       Query parameter (repeatable)
//!   --body <TEXT>              Request body
//!   --config <PATH>            TOML adapter config
//!   --no-lifespan              Skip the lifespan handshake
//!   --asgi-version <2|3>       Calling convention [default: from config]
//!   --app <hello|echo>         Demo application [default: hello]
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable              | Description                      |
//! |-----------------------|----------------------------------|
//! | `SLUICE_METHOD`       | HTTP method                      |
//! | `SLUICE_URL`          | Request URL                      |
//! | `SLUICE_CONFIG`       | Path to the TOML adapter config  |
//! | `SLUICE_ASGI_VERSION` | Calling convention (`2` or `3`)  |
//! | `SLUICE_APP`          | Demo application                 |
//! | `RUST_LOG`            | Log filter (overrides `log_level`) |

mod demo;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sluice_adapter::application::Adapter;
use sluice_adapter::domain::{AdapterConfig, HostRequest, HostResponse};
use sluice_core::ProtocolVersion;

use demo::DemoApp;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Runs one function-host invocation through the sluice adapter.
#[derive(Debug, Parser)]
#[command(
    name = "sluice-invoke",
    about = "Invoke a demo application once through the sluice adapter",
    version
)]
struct Cli {
    /// HTTP method of the simulated request.
    #[arg(long, default_value = "GET", env = "SLUICE_METHOD")]
    method: String,

    /// Absolute (`https://host/path?q`) or relative (`/path`) request URL.
    #[arg(long, default_value = "/", env = "SLUICE_URL")]
    url: String,

    /// Request header as `name:value`.  May be repeated.
    #[arg(long = "header", value_name = "NAME:VALUE")]
    headers: Vec<String>,

    /// Query parameter as `name=value`.  May be repeated; replaces the URL's
    /// own query string when present.
    #[arg(long = "param", value_name = "NAME=VALUE")]
    params: Vec<String>,

    /// Request body, sent as UTF-8 bytes.
    #[arg(long)]
    body: Option<String>,

    /// TOML adapter config.  Command-line flags override its values.
    #[arg(long, env = "SLUICE_CONFIG")]
    config: Option<PathBuf>,

    /// Skip the lifespan startup/shutdown handshake.
    #[arg(long)]
    no_lifespan: bool,

    /// Calling convention of the demo application: `2` or `3`.
    #[arg(long, env = "SLUICE_ASGI_VERSION", value_parser = parse_protocol_version)]
    asgi_version: Option<ProtocolVersion>,

    /// Demo application to run.
    #[arg(long, value_enum, default_value_t = DemoApp::Hello, env = "SLUICE_APP")]
    app: DemoApp,
}

fn parse_protocol_version(value: &str) -> Result<ProtocolVersion, String> {
    let number: u8 = value
        .trim()
        .parse()
        .map_err(|_| format!("expected 2 or 3, got '{value}'"))?;
    ProtocolVersion::try_from(number)
}

impl Cli {
    /// Loads the config file, if any, and applies command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if `--config` names a file that cannot be loaded.
    fn adapter_config(&self) -> anyhow::Result<AdapterConfig> {
        let mut config = match &self.config {
            Some(path) => AdapterConfig::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => AdapterConfig::default(),
        };
        if self.no_lifespan {
            config.lifespan = false;
        }
        if let Some(version) = self.asgi_version {
            config.protocol_version = version;
        }
        Ok(config)
    }

    /// Builds the simulated host request.
    ///
    /// # Errors
    ///
    /// Returns an error if a `--header` lacks a `:` or a `--param` lacks a `=`.
    fn host_request(&self) -> anyhow::Result<HostRequest> {
        let mut request = HostRequest::new(self.method.to_uppercase(), self.url.clone());
        for raw in &self.headers {
            let (name, value) = raw
                .split_once(':')
                .with_context(|| format!("invalid header '{raw}': expected NAME:VALUE"))?;
            request = request.with_header(name.trim(), value.trim());
        }
        for raw in &self.params {
            let (name, value) = raw
                .split_once('=')
                .with_context(|| format!("invalid param '{raw}': expected NAME=VALUE"))?;
            request = request.with_param(name, value);
        }
        if let Some(body) = &self.body {
            request = request.with_body(body.as_bytes().to_vec());
        }
        Ok(request)
    }
}

// ── Output ────────────────────────────────────────────────────────────────────

/// JSON shape printed on stdout.  The body is rendered as text.
#[derive(Debug, Serialize)]
struct InvocationOutput<'a> {
    status_code: u16,
    headers: &'a BTreeMap<String, String>,
    mimetype: Option<&'a str>,
    charset: Option<&'a str>,
    body: String,
}

impl<'a> From<&'a HostResponse> for InvocationOutput<'a> {
    fn from(response: &'a HostResponse) -> Self {
        Self {
            status_code: response.status_code,
            headers: &response.headers,
            mimetype: response.mimetype.as_deref(),
            charset: response.charset.as_deref(),
            body: response.body_text(),
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// Runs without `#[tokio::main]`: the adapter drives its own runtimes and
/// must be called from a plain thread.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.adapter_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let request = cli.host_request()?;
    info!(
        app = ?cli.app,
        method = %request.method,
        url = %request.url,
        protocol_version = %config.protocol_version,
        "sluice-invoke starting"
    );

    let entrypoint = demo::entrypoint(cli.app, config.protocol_version);
    let adapter = Adapter::new(entrypoint, config).context("failed to start adapter")?;
    let outcome = adapter.handle(&request);
    adapter.shutdown();
    let response = outcome.context("invocation failed")?;

    let output = serde_json::to_string_pretty(&InvocationOutput::from(&response))
        .context("failed to encode response as JSON")?;
    println!("{output}");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        // Arrange: parse with no arguments (all defaults apply)
        let cli = Cli::parse_from(["sluice-invoke"]);

        // Assert
        assert_eq!(cli.method, "GET");
        assert_eq!(cli.url, "/");
        assert_eq!(cli.app, DemoApp::Hello);
        assert!(cli.headers.is_empty());
        assert!(!cli.no_lifespan);
    }

    #[test]
    fn test_cli_repeated_headers_and_params() {
        let cli = Cli::parse_from([
            "sluice-invoke",
            "--header",
            "content-type: text/plain",
            "--header",
            "x-trace:1",
            "--param",
            "q=rust",
        ]);

        let request = cli.host_request().unwrap();

        assert_eq!(
            request.headers,
            vec![
                ("content-type".to_string(), "text/plain".to_string()),
                ("x-trace".to_string(), "1".to_string())
            ]
        );
        assert_eq!(request.params, vec![("q".to_string(), "rust".to_string())]);
    }

    #[test]
    fn test_host_request_uppercases_method_and_keeps_body() {
        let cli = Cli::parse_from(["sluice-invoke", "--method", "post", "--body", "123"]);

        let request = cli.host_request().unwrap();

        assert_eq!(request.method, "POST");
        assert_eq!(request.body.as_deref(), Some(&b"123"[..]));
    }

    #[test]
    fn test_header_without_colon_is_an_error() {
        let cli = Cli::parse_from(["sluice-invoke", "--header", "broken"]);
        assert!(cli.host_request().is_err());
    }

    #[test]
    fn test_param_without_equals_is_an_error() {
        let cli = Cli::parse_from(["sluice-invoke", "--param", "broken"]);
        assert!(cli.host_request().is_err());
    }

    #[test]
    fn test_flags_override_config() {
        // Arrange
        let cli = Cli::parse_from(["sluice-invoke", "--no-lifespan", "--asgi-version", "2"]);

        // Act
        let config = cli.adapter_config().unwrap();

        // Assert
        assert!(!config.lifespan);
        assert_eq!(config.protocol_version, ProtocolVersion::V2);
    }

    #[test]
    fn test_unsupported_asgi_version_is_rejected() {
        let result = Cli::try_parse_from(["sluice-invoke", "--asgi-version", "4"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let cli = Cli::parse_from(["sluice-invoke", "--config", "/definitely/not/here.toml"]);
        assert!(cli.adapter_config().is_err());
    }

    #[test]
    fn test_output_renders_body_as_text() {
        let response = HostResponse {
            status_code: 200,
            body: b"hello".to_vec(),
            mimetype: Some("text/plain".to_string()),
            ..HostResponse::default()
        };

        let json = serde_json::to_value(InvocationOutput::from(&response)).unwrap();

        assert_eq!(json["status_code"], 200);
        assert_eq!(json["body"], "hello");
        assert_eq!(json["mimetype"], "text/plain");
        assert!(json["charset"].is_null());
    }
}
