use bytes::Bytes;
use std::fmt;
use tokio::sync::oneshot;
use tokio::time::Duration;

/// Topic carrying coordinator announcements.
pub const SERVERS_TOPIC: &str = "servers";

/// Topic carrying replication events.
pub const REPLICATION_TOPIC: &str = "replication";

/// Address the directory authority answers on.
pub const DIRECTORY_ADDRESS: &str = "directory";

/// Address a server answers client requests on.
pub fn client_address(server_name: &str) -> String {
    format!("client:{}", server_name)
}

/// Address a server answers peer requests (clock, election) on.
pub fn peer_address(server_name: &str) -> String {
    format!("peer:{}", server_name)
}

/// Topic a channel's messages, or a user's direct messages, are delivered on. Kept apart from
/// the control topics whatever the name.
pub fn delivery_topic(channel_or_user: &str) -> String {
    format!("chat:{}", channel_or_user)
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("No endpoint is bound at '{0}'")]
    Unreachable(String),

    #[error("Address '{0}' is already bound")]
    AddressInUse(String),

    #[error("Request timed out")]
    TimedOut,

    #[error("Transport is busy, retry later")]
    Contention,

    #[error("Transport closed")]
    Closed,
}

impl TransportError {
    /// Transient errors are retried by receive loops after a short back off.
    pub fn is_transient(&self) -> bool {
        matches!(self, TransportError::Contention)
    }
}

/// Transport is the seam between the coordination layer and the message bus. It offers a topic
/// pub/sub bus with at-most-once delivery, and a request/reply transport where each outbound
/// request opens its own short-lived connection.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn request(&self, target: &str, payload: Bytes) -> Result<Bytes, TransportError>;

    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), TransportError>;

    /// Bind a reply endpoint. The returned endpoint is the only receiver for `address` until it
    /// is dropped.
    fn bind(&self, address: &str) -> Result<Box<dyn ReplyEndpoint>, TransportError>;

    fn subscribe(&self, topic: &str) -> Box<dyn Subscription>;
}

#[async_trait::async_trait]
pub trait Subscription: Send {
    async fn next(&mut self) -> Result<Bytes, TransportError>;
}

/// ReplyEndpoint yields one request at a time. A request must be answered (or its responder
/// dropped) before the owner asks for the next one.
#[async_trait::async_trait]
pub trait ReplyEndpoint: Send {
    async fn recv(&mut self) -> Result<PendingRequest, TransportError>;
}

pub struct PendingRequest {
    pub payload: Bytes,
    pub responder: Responder,
}

pub struct Responder(oneshot::Sender<Bytes>);

impl Responder {
    pub(crate) fn new(sender: oneshot::Sender<Bytes>) -> Self {
        Responder(sender)
    }

    pub fn respond(self, payload: Bytes) {
        // Requester may have timed out and gone away.
        let _ = self.0.send(payload);
    }
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

pub async fn request_with_timeout(
    transport: &dyn Transport,
    target: &str,
    payload: Bytes,
    timeout: Duration,
) -> Result<Bytes, TransportError> {
    match tokio::time::timeout(timeout, transport.request(target, payload)).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::TimedOut),
    }
}
