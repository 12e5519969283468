/// Task-owned engine behind an mpsc mailbox
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use confluo_protocol::{Inbound, Outbound};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Handle to an engine running on its own task
///
/// Inbound messages are processed one at a time in arrival order; every
/// outbound message they produce is forwarded on the outbound channel.
pub struct EngineHandle {
    inbox: mpsc::UnboundedSender<Inbound>,
    task: JoinHandle<Engine>,
}

impl EngineHandle {
    /// Move `engine` onto a new task
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(engine: Engine) -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (inbox, mut rx) = mpsc::unbounded_channel::<Inbound>();
        let (tx, outbox) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            let mut engine = engine;
            while let Some(message) = rx.recv().await {
                for outbound in engine.handle(message) {
                    if tx.send(outbound).is_err() {
                        debug!("outbound receiver dropped");
                    }
                }
            }
            info!("engine mailbox closed");
            engine
        });

        (Self { inbox, task }, outbox)
    }

    /// Queue a message for the engine
    pub fn send(&self, message: Inbound) -> EngineResult<()> {
        self.inbox
            .send(message)
            .map_err(|_| EngineError::ChannelClosed)
    }

    /// Close the mailbox and wait for queued messages to drain
    ///
    /// Returns the engine with its final state.
    pub async fn shutdown(self) -> EngineResult<Engine> {
        let Self { inbox, task } = self;
        drop(inbox);
        task.await.map_err(|_| EngineError::ChannelClosed)
    }
}
