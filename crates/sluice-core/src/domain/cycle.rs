//! Request-cycle state machine and the buffered response it builds.
//!
//! # States
//!
//! ```text
//!                  http.response.start            http.response.body
//!  AwaitingStart ───────────────────────► AwaitingBody ──(more_body=false)──► Complete
//!                                           │    ▲
//!                                           └────┘ http.response.body (more_body=true)
//! ```
//!
//! Any other (state, message type) pair is a [`ProtocolError`].  The machine
//! never moves backwards, and once `Complete` it rejects everything, so an
//! exchange can finish at most once.

use std::collections::BTreeMap;

use tracing::trace;

use crate::protocol::error::ProtocolError;
use crate::protocol::headers::{decode_headers, parse_content_type, CONTENT_TYPE};
use crate::protocol::messages::{Message, MessageType};

/// Which outbound message the cycle accepts next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CycleState {
    /// Waiting for `http.response.start`.
    #[default]
    AwaitingStart,
    /// Status and headers are known; waiting for body chunks.
    AwaitingBody,
    /// The final body chunk arrived.
    Complete,
}

impl CycleState {
    /// Returns the state reached by accepting `message`, or the violation.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::UnexpectedMessage`] when the message type is not
    ///   the one this state expects.
    /// - [`ProtocolError::ResponseComplete`] for anything sent after the
    ///   final body chunk.
    pub fn transition(self, message: &Message) -> Result<CycleState, ProtocolError> {
        match (self, message) {
            (CycleState::AwaitingStart, Message::HttpResponseStart { .. }) => {
                Ok(CycleState::AwaitingBody)
            }
            (CycleState::AwaitingBody, Message::HttpResponseBody { more_body, .. }) => {
                Ok(if *more_body {
                    CycleState::AwaitingBody
                } else {
                    CycleState::Complete
                })
            }
            (CycleState::Complete, other) => Err(ProtocolError::ResponseComplete {
                received: other.message_type(),
            }),
            (state, other) => Err(ProtocolError::UnexpectedMessage {
                expected: state.expected(),
                received: other.message_type(),
            }),
        }
    }

    /// The message type this state waits for.
    fn expected(self) -> MessageType {
        match self {
            CycleState::AwaitingStart => MessageType::HttpResponseStart,
            CycleState::AwaitingBody | CycleState::Complete => MessageType::HttpResponseBody,
        }
    }
}

/// What accepting one outbound message did to the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Status and headers recorded.
    Started,
    /// A non-final body chunk was appended.
    BodyAppended,
    /// The final body chunk was appended; the response is finished.
    Completed,
}

/// The buffered result of one request cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub mimetype: Option<String>,
    pub charset: Option<String>,
    pub body: Vec<u8>,
}

/// Folds outbound application messages into a [`CycleResponse`].
///
/// Owns the [`CycleState`]; the state only changes inside [`apply`], after
/// the message has been fully validated.
///
/// [`apply`]: ResponseAccumulator::apply
#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    state: CycleState,
    response: CycleResponse,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of the cycle.
    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Validates `message` against the current state and records it.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] if the message is out of order or its
    /// headers cannot be decoded.  The accumulator is left unchanged.
    pub fn apply(&mut self, message: Message) -> Result<Step, ProtocolError> {
        let next = self.state.transition(&message)?;

        let step = match message {
            Message::HttpResponseStart { status, headers } => {
                let headers = decode_headers(&headers)?;
                let content_type = headers
                    .get(CONTENT_TYPE)
                    .map(|value| parse_content_type(value))
                    .unwrap_or_default();

                self.response.status = status;
                self.response.headers = headers;
                self.response.mimetype = content_type.mimetype;
                self.response.charset = content_type.charset;
                Step::Started
            }
            Message::HttpResponseBody { body, .. } => {
                self.response.body.extend_from_slice(&body);
                if next == CycleState::Complete {
                    Step::Completed
                } else {
                    Step::BodyAppended
                }
            }
            // `transition` only accepts the two response messages.
            other => {
                return Err(ProtocolError::UnexpectedMessage {
                    expected: self.state.expected(),
                    received: other.message_type(),
                })
            }
        };

        trace!(from = ?self.state, to = ?next, "cycle transition");
        self.state = next;
        Ok(step)
    }

    /// Returns the finished response, or `None` if the final body chunk has
    /// not been accepted yet.
    pub fn finish(self) -> Option<CycleResponse> {
        (self.state == CycleState::Complete).then_some(self.response)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::header;

    fn html_start() -> Message {
        Message::response_start(200, vec![header("content-type", "text/html; charset=utf-8")])
    }

    #[test]
    fn test_initial_state_is_awaiting_start() {
        assert_eq!(ResponseAccumulator::new().state(), CycleState::AwaitingStart);
    }

    #[test]
    fn test_start_then_final_body_completes() {
        // Arrange
        let mut acc = ResponseAccumulator::new();

        // Act
        let started = acc.apply(html_start()).unwrap();
        let done = acc.apply(Message::response_body(b"hi".to_vec(), false)).unwrap();

        // Assert
        assert_eq!(started, Step::Started);
        assert_eq!(done, Step::Completed);
        let response = acc.finish().expect("response must be complete");
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"hi");
        assert_eq!(response.mimetype.as_deref(), Some("text/html"));
        assert_eq!(response.charset.as_deref(), Some("utf-8"));
    }

    #[test]
    fn test_body_chunks_are_concatenated_in_order() {
        let mut acc = ResponseAccumulator::new();
        acc.apply(Message::response_start(200, vec![])).unwrap();
        assert_eq!(
            acc.apply(Message::response_body(b"a".to_vec(), true)).unwrap(),
            Step::BodyAppended
        );
        acc.apply(Message::response_body(b"b".to_vec(), true)).unwrap();
        acc.apply(Message::response_body(b"c".to_vec(), false)).unwrap();

        assert_eq!(acc.finish().unwrap().body, b"abc");
    }

    #[test]
    fn test_body_before_start_is_rejected() {
        let mut acc = ResponseAccumulator::new();
        let err = acc
            .apply(Message::response_body(b"x".to_vec(), false))
            .unwrap_err();
        assert_eq!(
            err,
            ProtocolError::UnexpectedMessage {
                expected: MessageType::HttpResponseStart,
                received: MessageType::HttpResponseBody,
            }
        );
        assert_eq!(acc.state(), CycleState::AwaitingStart);
    }

    #[test]
    fn test_second_start_is_rejected() {
        let mut acc = ResponseAccumulator::new();
        acc.apply(html_start()).unwrap();
        let err = acc.apply(html_start()).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::UnexpectedMessage {
                expected: MessageType::HttpResponseBody,
                received: MessageType::HttpResponseStart,
            }
        );
    }

    #[test]
    fn test_anything_after_completion_is_rejected() {
        let mut acc = ResponseAccumulator::new();
        acc.apply(html_start()).unwrap();
        acc.apply(Message::response_body(Vec::new(), false)).unwrap();

        let err = acc.apply(Message::response_body(b"late".to_vec(), false)).unwrap_err();
        assert!(matches!(err, ProtocolError::ResponseComplete { .. }));
    }

    #[test]
    fn test_inbound_message_types_are_rejected_as_outbound() {
        let mut acc = ResponseAccumulator::new();
        let err = acc.apply(Message::HttpDisconnect).unwrap_err();
        assert!(matches!(err, ProtocolError::UnexpectedMessage { .. }));
    }

    #[test]
    fn test_missing_content_type_leaves_mimetype_and_charset_absent() {
        let mut acc = ResponseAccumulator::new();
        acc.apply(Message::response_start(404, vec![header("x-a", "1")])).unwrap();
        acc.apply(Message::response_body(Vec::new(), false)).unwrap();

        let response = acc.finish().unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.mimetype, None);
        assert_eq!(response.charset, None);
        assert_eq!(response.headers["x-a"], "1");
    }

    #[test]
    fn test_malformed_header_keeps_state() {
        let mut acc = ResponseAccumulator::new();
        let start = Message::response_start(200, vec![(b"x".to_vec(), vec![0xc3])]);
        assert!(acc.apply(start).is_err());
        assert_eq!(acc.state(), CycleState::AwaitingStart);
    }

    #[test]
    fn test_finish_before_completion_returns_none() {
        let mut acc = ResponseAccumulator::new();
        acc.apply(html_start()).unwrap();
        acc.apply(Message::response_body(b"partial".to_vec(), true)).unwrap();
        assert!(acc.finish().is_none());
    }
}
