use std::sync::Arc;

use tokio::sync::watch;

/// Opaque cancellation token threaded through to the transport.
///
/// The hydration engine never inspects it; transports abort the in-flight
/// request once [`Cancellable::cancel`] has been called on any clone.
#[derive(Clone, Debug)]
pub struct Cancellable {
    tx: Arc<watch::Sender<bool>>,
}

impl Cancellable {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Completes once the token has been cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so `wait_for` only returns once
        // the flag flips.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for Cancellable {
    fn default() -> Self {
        Self::new()
    }
}
