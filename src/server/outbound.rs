use crate::transport::Transport;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug)]
pub(crate) struct Outbound {
    pub topic: String,
    pub payload: Bytes,
}

/// OutboundQueue funnels every publish of one server through a single task, so topic messages
/// leave in the order the actor produced them.
pub(crate) struct OutboundQueue {
    sender: mpsc::UnboundedSender<Outbound>,
}

impl OutboundQueue {
    pub(crate) fn spawn(logger: slog::Logger, transport: Arc<dyn Transport>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(Self::run(logger, transport, rx));

        OutboundQueue { sender: tx }
    }

    #[cfg(test)]
    pub(crate) fn capture() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (OutboundQueue { sender: tx }, rx)
    }

    pub(crate) fn publish(&self, topic: &str, payload: Bytes) {
        let outbound = Outbound {
            topic: topic.to_string(),
            payload,
        };
        // Publishing task only exits once this queue is dropped.
        let _ = self.sender.send(outbound);
    }

    async fn run(logger: slog::Logger, transport: Arc<dyn Transport>, mut queue: mpsc::UnboundedReceiver<Outbound>) {
        while let Some(outbound) = queue.recv().await {
            if let Err(e) = transport.publish(&outbound.topic, outbound.payload).await {
                slog::warn!(logger, "Dropped publish on '{}': {}", outbound.topic, e);
            }
        }
    }
}
