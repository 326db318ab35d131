//! Built-in demo applications for `sluice-invoke`.
//!
//! Both answer the lifespan handshake and can be wrapped in either calling
//! convention, so the binary can exercise every adapter path without an
//! external application.

use clap::ValueEnum;

use sluice_adapter::application::{app_fn, factory_fn, Entrypoint, Receiver, Sender};
use sluice_core::{header, HttpScope, Message, ProtocolVersion, Scope};

const HELLO_PAGE: &str = "<html><h1>Hello, world!</h1></html>";

/// Which demo application to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DemoApp {
    /// Responds with a fixed HTML page.
    Hello,
    /// Responds with the request body and content type.
    Echo,
}

/// Wraps `app` in the requested calling convention.
pub fn entrypoint(app: DemoApp, version: ProtocolVersion) -> Entrypoint {
    match version {
        ProtocolVersion::V3 => Entrypoint::v3(app_fn(move |scope, receive, send| {
            serve(app, scope, receive, send)
        })),
        ProtocolVersion::V2 => Entrypoint::v2(factory_fn(move |scope: Scope| {
            move |receive: Receiver, send: Sender| serve(app, scope, receive, send)
        })),
    }
}

async fn serve(app: DemoApp, scope: Scope, receive: Receiver, send: Sender) -> anyhow::Result<()> {
    match scope {
        Scope::Lifespan(_) => lifespan(receive, send).await,
        Scope::Http(http) => match app {
            DemoApp::Hello => hello(send).await,
            DemoApp::Echo => echo(&http, receive, send).await,
        },
    }
}

async fn lifespan(receive: Receiver, send: Sender) -> anyhow::Result<()> {
    loop {
        match receive.receive().await? {
            Message::LifespanStartup => send.send(Message::LifespanStartupComplete).await?,
            Message::LifespanShutdown => {
                send.send(Message::LifespanShutdownComplete).await?;
                return Ok(());
            }
            other => anyhow::bail!("unexpected lifespan message {}", other.message_type()),
        }
    }
}

async fn hello(send: Sender) -> anyhow::Result<()> {
    send.send(Message::response_start(
        200,
        vec![header("content-type", "text/html; charset=utf-8")],
    ))
    .await?;
    send.send(Message::response_body(HELLO_PAGE.as_bytes().to_vec(), false))
        .await?;
    Ok(())
}

async fn echo(scope: &HttpScope, receive: Receiver, send: Sender) -> anyhow::Result<()> {
    let mut body = Vec::new();
    while append_chunk(&mut body, receive.receive().await?)? {}

    let content_type = scope
        .header("content-type")
        .map(|value| String::from_utf8_lossy(value).into_owned())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    send.send(Message::response_start(
        200,
        vec![header("content-type", &content_type)],
    ))
    .await?;
    send.send(Message::response_body(body, false)).await?;
    Ok(())
}

/// Appends one request chunk to `body`.  Returns whether more chunks follow.
fn append_chunk(body: &mut Vec<u8>, message: Message) -> anyhow::Result<bool> {
    match message {
        Message::HttpRequest {
            body: chunk,
            more_body,
        } => {
            body.extend_from_slice(&chunk);
            Ok(more_body)
        }
        Message::HttpDisconnect => {
            anyhow::bail!("client disconnected before the request body was complete")
        }
        other => anyhow::bail!("unexpected request message {}", other.message_type()),
    }
}
