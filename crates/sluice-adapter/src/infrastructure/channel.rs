//! Unbounded, ordered, single-consumer message queue.
//!
//! The driver side posts messages before the application is ready to read
//! them (the request body is queued before the application even starts), so
//! `put` must never block.  The application side suspends in `get` until a
//! message is available.
//!
//! Backed by `tokio::sync::mpsc::unbounded_channel`.  The channel keeps its
//! own sender alive, so the queue cannot close while the channel exists.

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::warn;

use sluice_core::Message;

/// Errors surfaced by [`MessageChannel::get`].
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The queue was closed and drained.
    #[error("message channel closed")]
    Closed,
}

impl ChannelError {
    /// Stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ChannelError::Closed => "channel_closed",
        }
    }
}

/// FIFO queue of protocol messages between a producer and one consumer.
#[derive(Debug)]
pub struct MessageChannel {
    tx: mpsc::UnboundedSender<Message>,
    /// Only one consumer may read at a time; concurrent `get` calls queue up
    /// on this lock rather than racing for messages.
    rx: Mutex<mpsc::UnboundedReceiver<Message>>,
}

impl MessageChannel {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }

    /// Appends `message` to the queue.  Never blocks.
    pub fn put(&self, message: Message) {
        let kind = message.message_type();
        if self.tx.send(message).is_err() {
            // Unreachable while `self` owns the receiver.
            warn!("dropping '{kind}': message channel receiver is gone");
        }
    }

    /// Waits for the next message and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] if the queue is closed and empty.
    pub async fn get(&self) -> Result<Message, ChannelError> {
        let mut rx = self.rx.lock().await;
        rx.recv().await.ok_or(ChannelError::Closed)
    }
}

impl Default for MessageChannel {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_messages_are_returned_fifo() {
        // Arrange
        let channel = MessageChannel::new();
        channel.put(Message::request(b"1".to_vec()));
        channel.put(Message::HttpDisconnect);

        // Act
        let first = tokio_test::block_on(channel.get()).unwrap();
        let second = tokio_test::block_on(channel.get()).unwrap();

        // Assert
        assert_eq!(first, Message::request(b"1".to_vec()));
        assert_eq!(second, Message::HttpDisconnect);
    }

    #[test]
    fn test_get_is_pending_while_empty() {
        let channel = MessageChannel::new();
        let mut get = tokio_test::task::spawn(channel.get());
        tokio_test::assert_pending!(get.poll());
    }

    #[tokio::test]
    async fn test_get_wakes_when_message_is_put_later() {
        let channel = Arc::new(MessageChannel::new());
        let producer = Arc::clone(&channel);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            producer.put(Message::LifespanStartup);
        });

        let msg = tokio::time::timeout(Duration::from_secs(1), channel.get())
            .await
            .expect("get must wake up")
            .unwrap();
        assert_eq!(msg, Message::LifespanStartup);
    }

    #[test]
    fn test_put_never_blocks_on_a_large_backlog() {
        let channel = MessageChannel::new();
        for i in 0..10_000u32 {
            channel.put(Message::request(i.to_be_bytes().to_vec()));
        }
        let first = tokio_test::block_on(channel.get()).unwrap();
        assert_eq!(first, Message::request(0u32.to_be_bytes().to_vec()));
    }

    #[test]
    fn test_closed_error_label() {
        assert_eq!(ChannelError::Closed.as_label(), "channel_closed");
        assert_eq!(ChannelError::Closed.to_string(), "message channel closed");
    }
}
