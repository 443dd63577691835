//! Graceful shutdown broadcast.
//!
//! One [`Shutdown`] is created at startup. Every long-running task holds a
//! subscription and exits its loop when the signal arrives.

use tokio::sync::broadcast;
use tracing::info;

/// Fans a single shutdown signal out to every subscriber.
pub struct Shutdown {
    notify: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(1);
        Self { notify }
    }

    /// A receiver that resolves once shutdown is triggered.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.notify.subscribe()
    }

    /// Signals every subscriber to stop.
    pub fn trigger(&self) {
        info!("shutdown triggered");
        let _ = self.notify.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_all_subscribers_are_notified() {
        let shutdown = Shutdown::new();
        let mut first = shutdown.subscribe();
        let mut second = shutdown.subscribe();

        shutdown.trigger();
        assert!(first.recv().await.is_ok());
        assert!(second.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_trigger_without_subscribers_is_harmless() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        // A later subscriber simply waits for the next trigger.
        let mut late = shutdown.subscribe();
        shutdown.trigger();
        assert!(late.recv().await.is_ok());
    }
}
