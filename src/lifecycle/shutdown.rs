//! Shutdown coordination.

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
#[derive(Debug)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of subscribers still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves on Ctrl+C or when `shutdown` fires (or its sender is dropped).
pub async fn shutdown_signal(mut shutdown: broadcast::Receiver<()>) {
    let ctrl_c_failed = tokio::select! {
        res = tokio::signal::ctrl_c() => match res {
            Ok(()) => {
                tracing::info!("Shutdown signal received");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                true
            }
        },
        _ = shutdown.recv() => {
            tracing::info!("Shutdown requested");
            false
        }
    };

    // without a signal listener only the trigger can end the wait
    if ctrl_c_failed {
        let _ = shutdown.recv().await;
        tracing::info!("Shutdown requested");
    }
}
