use crate::transport::api::{PendingRequest, ReplyEndpoint, Responder, Subscription, Transport, TransportError};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::{broadcast, mpsc, oneshot};

const ENDPOINT_QUEUE_SIZE: usize = 32;
const TOPIC_CAPACITY: usize = 1024;

/// LocalNetwork is an in-process message bus. Every server in a test cluster, and the directory
/// authority, share one clone of it.
#[derive(Clone, Default)]
pub struct LocalNetwork {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    endpoints: HashMap<String, BoundEndpoint>,
    topics: HashMap<String, broadcast::Sender<Bytes>>,
    next_binding_id: u64,
}

struct BoundEndpoint {
    binding_id: u64,
    sender: mpsc::Sender<PendingRequest>,
}

struct LocalEndpoint {
    address: String,
    binding_id: u64,
    receiver: mpsc::Receiver<PendingRequest>,
    network: Weak<Mutex<Inner>>,
}

struct LocalSubscription {
    receiver: broadcast::Receiver<Bytes>,
}

impl LocalNetwork {
    pub fn new() -> Self {
        LocalNetwork::default()
    }

    /// Returns whether anything is currently bound at `address`.
    pub fn is_bound(&self, address: &str) -> bool {
        self.lock().endpoints.contains_key(address)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("LocalNetwork mutex guard poison")
    }

    fn topic_sender(inner: &mut Inner, topic: &str) -> broadcast::Sender<Bytes> {
        inner
            .topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .clone()
    }
}

#[async_trait::async_trait]
impl Transport for LocalNetwork {
    async fn request(&self, target: &str, payload: Bytes) -> Result<Bytes, TransportError> {
        let sender = match self.lock().endpoints.get(target) {
            Some(endpoint) => endpoint.sender.clone(),
            None => return Err(TransportError::Unreachable(target.to_string())),
        };

        let (tx, rx) = oneshot::channel();
        let request = PendingRequest {
            payload,
            responder: Responder::new(tx),
        };
        sender
            .send(request)
            .await
            .map_err(|_| TransportError::Unreachable(target.to_string()))?;

        rx.await.map_err(|_| TransportError::Closed)
    }

    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), TransportError> {
        let sender = Self::topic_sender(&mut self.lock(), topic);
        // No subscribers means nobody hears it, same as a real bus.
        let _ = sender.send(payload);
        Ok(())
    }

    fn bind(&self, address: &str) -> Result<Box<dyn ReplyEndpoint>, TransportError> {
        let mut inner = self.lock();
        if inner.endpoints.contains_key(address) {
            return Err(TransportError::AddressInUse(address.to_string()));
        }

        let (tx, rx) = mpsc::channel(ENDPOINT_QUEUE_SIZE);
        inner.next_binding_id += 1;
        let binding_id = inner.next_binding_id;
        inner.endpoints.insert(
            address.to_string(),
            BoundEndpoint {
                binding_id,
                sender: tx,
            },
        );

        Ok(Box::new(LocalEndpoint {
            address: address.to_string(),
            binding_id,
            receiver: rx,
            network: Arc::downgrade(&self.inner),
        }))
    }

    fn subscribe(&self, topic: &str) -> Box<dyn Subscription> {
        let receiver = Self::topic_sender(&mut self.lock(), topic).subscribe();
        Box::new(LocalSubscription { receiver })
    }
}

#[async_trait::async_trait]
impl ReplyEndpoint for LocalEndpoint {
    async fn recv(&mut self) -> Result<PendingRequest, TransportError> {
        self.receiver.recv().await.ok_or(TransportError::Closed)
    }
}

impl Drop for LocalEndpoint {
    fn drop(&mut self) {
        if let Some(network) = self.network.upgrade() {
            if let Ok(mut inner) = network.lock() {
                let still_ours = inner
                    .endpoints
                    .get(&self.address)
                    .map_or(false, |bound| bound.binding_id == self.binding_id);
                if still_ours {
                    inner.endpoints.remove(&self.address);
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl Subscription for LocalSubscription {
    async fn next(&mut self) -> Result<Bytes, TransportError> {
        match self.receiver.recv().await {
            Ok(payload) => Ok(payload),
            Err(broadcast::error::RecvError::Lagged(_)) => Err(TransportError::Contention),
            Err(broadcast::error::RecvError::Closed) => Err(TransportError::Closed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn request_reaches_bound_endpoint() {
        let network = LocalNetwork::new();
        let mut endpoint = network.bind("peer:a").unwrap();

        tokio::spawn(async move {
            let request = endpoint.recv().await.unwrap();
            let mut reply = request.payload.to_vec();
            reply.reverse();
            request.responder.respond(Bytes::from(reply));
        });

        let reply = network.request("peer:a", Bytes::from_static(b"abc")).await.unwrap();
        assert_eq!(&reply[..], b"cba");
    }

    #[tokio::test]
    async fn unknown_target_is_unreachable() {
        let network = LocalNetwork::new();
        let result = network.request("peer:nobody", Bytes::new()).await;
        assert_eq!(result, Err(TransportError::Unreachable("peer:nobody".to_string())));
    }

    #[tokio::test]
    async fn dropping_endpoint_unbinds_address() {
        let network = LocalNetwork::new();
        let endpoint = network.bind("client:a").unwrap();
        assert!(matches!(network.bind("client:a"), Err(TransportError::AddressInUse(_))));

        drop(endpoint);
        assert!(!network.is_bound("client:a"));
        assert!(network.bind("client:a").is_ok());
    }

    #[tokio::test]
    async fn dropped_responder_closes_request() {
        let network = LocalNetwork::new();
        let mut endpoint = network.bind("peer:a").unwrap();

        tokio::spawn(async move {
            let request = endpoint.recv().await.unwrap();
            drop(request);
        });

        let result = network.request("peer:a", Bytes::new()).await;
        assert_eq!(result, Err(TransportError::Closed));
    }

    #[tokio::test]
    async fn publish_fans_out_to_every_subscriber() {
        let network = LocalNetwork::new();
        let mut sub_1 = network.subscribe("servers");
        let mut sub_2 = network.subscribe("servers");
        let mut other = network.subscribe("replication");

        network.publish("servers", Bytes::from_static(b"hello")).await.unwrap();

        assert_eq!(&sub_1.next().await.unwrap()[..], b"hello");
        assert_eq!(&sub_2.next().await.unwrap()[..], b"hello");
        tokio::time::timeout(std::time::Duration::from_millis(20), other.next())
            .await
            .expect_err("Expected timeout");
    }
}
