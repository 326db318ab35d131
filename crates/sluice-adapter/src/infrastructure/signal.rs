//! One-shot completion flags observed by any number of waiters.

use tokio::sync::watch;

/// A binary flag that can be set once and awaited.
///
/// Setting is idempotent: the first [`set`](Signal::set) flips the flag and
/// wakes every waiter, later calls are no-ops.  Waiting on an already-set
/// signal returns immediately.
#[derive(Debug)]
pub struct Signal {
    tx: watch::Sender<bool>,
}

impl Signal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Sets the flag.  Returns `true` only for the call that actually set it.
    pub fn set(&self) -> bool {
        self.tx.send_if_modified(|set| {
            if *set {
                false
            } else {
                *set = true;
                true
            }
        })
    }

    pub fn is_set(&self) -> bool {
        *self.tx.borrow()
    }

    /// Suspends until the flag is set.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // `wait_for` only fails if the sender is dropped, and `self` owns it.
        let _ = rx.wait_for(|set| *set).await;
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_first_set_wins() {
        let signal = Signal::new();
        assert!(!signal.is_set());
        assert!(signal.set());
        assert!(!signal.set(), "second set must be a no-op");
        assert!(signal.is_set());
    }

    #[test]
    fn test_wait_on_set_signal_returns_immediately() {
        let signal = Signal::new();
        signal.set();
        let mut wait = tokio_test::task::spawn(signal.wait());
        tokio_test::assert_ready!(wait.poll());
    }

    #[tokio::test]
    async fn test_all_waiters_are_released() {
        let signal = Arc::new(Signal::new());
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let s = Arc::clone(&signal);
                tokio::spawn(async move { s.wait().await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(5)).await;
        signal.set();

        for waiter in waiters {
            tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .expect("waiter must be released")
                .unwrap();
        }
    }
}
