//! Stop signal shared by the gateway's listener and its owner.
//!
//! `startup::run` triggers it when SIGINT/SIGTERM arrives; `HttpServer::run`
//! holds a receiver and stops accepting connections once it fires, letting
//! in-flight routed requests (checks plus forward) finish. The integration
//! tests trigger it directly to tear down each in-process gateway.

use tokio::sync::broadcast;

/// One-shot stop signal fanned out over a broadcast channel.
///
/// Capacity is one: a single `()` is all any listener ever needs to see.
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

    /// Trigger the shutdown signal. A no-op when nobody is listening.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of listeners still waiting; zero once the server has exited.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
