//! Protocol module containing message types, connection scopes and header helpers.

pub mod error;
pub mod headers;
pub mod messages;
pub mod scope;

pub use error::ProtocolError;
pub use headers::{decode_headers, parse_content_type, ContentType};
pub use messages::*;
pub use scope::{AsgiInfo, HttpScope, LifespanScope, ProtocolVersion, Scope};
