//! Protocol violation errors.

use thiserror::Error;

use crate::protocol::messages::MessageType;

/// Errors raised when an application breaks the message ordering rules.
///
/// A protocol error is always fatal for the exchange it happened in.  The
/// request cycle never retries and never returns a partial response after
/// one of these.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The application sent a message that is not valid in the current state,
    /// e.g. a body before the response start, or a second response start.
    #[error("expected '{expected}', received: '{received}'")]
    UnexpectedMessage {
        expected: MessageType,
        received: MessageType,
    },

    /// The application kept sending after the final body chunk.
    #[error("response already complete, received: '{received}'")]
    ResponseComplete { received: MessageType },

    /// The lifespan exchange only accepts the two completion messages.
    #[error("unexpected lifespan message: '{received}'")]
    UnexpectedLifespanMessage { received: MessageType },

    /// A response header name or value was not valid UTF-8.
    #[error("malformed response header: {0}")]
    MalformedHeader(String),
}

impl ProtocolError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProtocolError::UnexpectedMessage { .. } => "protocol_unexpected_message",
            ProtocolError::ResponseComplete { .. } => "protocol_response_complete",
            ProtocolError::UnexpectedLifespanMessage { .. } => "protocol_unexpected_lifespan",
            ProtocolError::MalformedHeader(_) => "protocol_malformed_header",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_message_display_names_both_types() {
        let err = ProtocolError::UnexpectedMessage {
            expected: MessageType::HttpResponseStart,
            received: MessageType::HttpResponseBody,
        };
        assert_eq!(
            err.to_string(),
            "expected 'http.response.start', received: 'http.response.body'"
        );
    }

    #[test]
    fn test_labels_are_distinct() {
        let labels = [
            ProtocolError::UnexpectedMessage {
                expected: MessageType::HttpResponseStart,
                received: MessageType::HttpResponseBody,
            }
            .as_label(),
            ProtocolError::ResponseComplete {
                received: MessageType::HttpResponseBody,
            }
            .as_label(),
            ProtocolError::UnexpectedLifespanMessage {
                received: MessageType::HttpResponseStart,
            }
            .as_label(),
            ProtocolError::MalformedHeader("x".into()).as_label(),
        ];
        let mut unique = labels.to_vec();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), labels.len());
    }
}
