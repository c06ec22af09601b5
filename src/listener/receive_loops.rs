use crate::actor::WeakActorClient;
use crate::listener::ListenerShutdownSignal;
use crate::transport::{self, ReplyEndpoint, Subscription, Transport, TransportError};
use crate::wire::{self, Announcement, ClientReply, ClientRequest, PeerReply, PeerRequest, ReplicationEvent};
use bytes::Bytes;
use tokio::time::Duration;

/// Service name put on error replies to requests that could not be decoded at all.
const UNKNOWN_SERVICE: &str = "unknown";

/// What a receive loop does with one inbound request or topic message.
enum LoopControl {
    Continue,
    Exit,
}

/// ServerListener holds everything one server receives on: its client and peer reply endpoints
/// and its two topic subscriptions. Each gets its own strictly sequential receive loop.
pub(crate) struct ServerListener {
    client_endpoint: Box<dyn ReplyEndpoint>,
    peer_endpoint: Box<dyn ReplyEndpoint>,
    announcements: Box<dyn Subscription>,
    replication: Box<dyn Subscription>,
}

impl ServerListener {
    pub(crate) fn bind(transport: &dyn Transport, server_name: &str) -> Result<Self, TransportError> {
        let client_endpoint = transport.bind(&transport::client_address(server_name))?;
        let peer_endpoint = transport.bind(&transport::peer_address(server_name))?;

        Ok(ServerListener {
            client_endpoint,
            peer_endpoint,
            announcements: transport.subscribe(transport::SERVERS_TOPIC),
            replication: transport.subscribe(transport::REPLICATION_TOPIC),
        })
    }

    pub(crate) fn spawn(
        self,
        logger: slog::Logger,
        actor_client: WeakActorClient,
        receive_backoff: Duration,
        shutdown: ListenerShutdownSignal,
    ) {
        let context = LoopContext {
            logger,
            actor_client,
            receive_backoff,
        };

        tokio::spawn(context.clone().run_client_loop(self.client_endpoint, shutdown.clone()));
        tokio::spawn(context.clone().run_peer_loop(self.peer_endpoint, shutdown.clone()));
        tokio::spawn(context.clone().run_announcement_loop(self.announcements, shutdown.clone()));
        tokio::spawn(context.run_replication_loop(self.replication, shutdown));
    }
}

#[derive(Clone)]
struct LoopContext {
    logger: slog::Logger,
    actor_client: WeakActorClient,
    receive_backoff: Duration,
}

impl LoopContext {
    async fn run_client_loop(self, mut endpoint: Box<dyn ReplyEndpoint>, mut shutdown: ListenerShutdownSignal) {
        let logger = self.logger.new(slog::o!("loop" => "client"));
        loop {
            let received = tokio::select! {
                _ = shutdown.recv() => break,
                received = endpoint.recv() => received,
            };
            let control = match received {
                Ok(pending) => match self.handle_client_request(&pending.payload).await {
                    Some(reply) => {
                        pending.responder.respond(reply);
                        LoopControl::Continue
                    }
                    None => LoopControl::Exit,
                },
                Err(e) => self.on_receive_error(&logger, e).await,
            };
            if let LoopControl::Exit = control {
                break;
            }
        }
        slog::info!(logger, "Receive loop exited");
    }

    async fn run_peer_loop(self, mut endpoint: Box<dyn ReplyEndpoint>, mut shutdown: ListenerShutdownSignal) {
        let logger = self.logger.new(slog::o!("loop" => "peer"));
        loop {
            let received = tokio::select! {
                _ = shutdown.recv() => break,
                received = endpoint.recv() => received,
            };
            let control = match received {
                Ok(pending) => match self.handle_peer_request(&pending.payload).await {
                    Some(reply) => {
                        pending.responder.respond(reply);
                        LoopControl::Continue
                    }
                    None => LoopControl::Exit,
                },
                Err(e) => self.on_receive_error(&logger, e).await,
            };
            if let LoopControl::Exit = control {
                break;
            }
        }
        slog::info!(logger, "Receive loop exited");
    }

    async fn run_announcement_loop(self, mut subscription: Box<dyn Subscription>, mut shutdown: ListenerShutdownSignal) {
        let logger = self.logger.new(slog::o!("loop" => "servers"));
        loop {
            let received = tokio::select! {
                _ = shutdown.recv() => break,
                received = subscription.next() => received,
            };
            let control = match received {
                Ok(payload) => match wire::decode::<Announcement>(&payload) {
                    Ok(announcement) => self.forward(self.actor_client.announcement(announcement).await),
                    Err(e) => {
                        slog::warn!(logger, "Dropping undecodable announcement: {}", e);
                        LoopControl::Continue
                    }
                },
                Err(e) => self.on_receive_error(&logger, e).await,
            };
            if let LoopControl::Exit = control {
                break;
            }
        }
        slog::info!(logger, "Receive loop exited");
    }

    async fn run_replication_loop(self, mut subscription: Box<dyn Subscription>, mut shutdown: ListenerShutdownSignal) {
        let logger = self.logger.new(slog::o!("loop" => "replication"));
        loop {
            let received = tokio::select! {
                _ = shutdown.recv() => break,
                received = subscription.next() => received,
            };
            let control = match received {
                Ok(payload) => match wire::decode::<ReplicationEvent>(&payload) {
                    Ok(event) => self.forward(self.actor_client.replication(event).await),
                    Err(e) => {
                        slog::warn!(logger, "Dropping undecodable replication event: {}", e);
                        LoopControl::Continue
                    }
                },
                Err(e) => self.on_receive_error(&logger, e).await,
            };
            if let LoopControl::Exit = control {
                break;
            }
        }
        slog::info!(logger, "Receive loop exited");
    }

    /// Returns `None` once the actor is gone.
    async fn handle_client_request(&self, payload: &[u8]) -> Option<Bytes> {
        let reply = match wire::decode::<ClientRequest>(payload) {
            Ok(request) => self.actor_client.client_request(request).await.ok()?,
            Err(e) => {
                let description = format!("Request not recognized: {}", e);
                ClientReply::Error(self.actor_client.malformed_request(UNKNOWN_SERVICE, description).await.ok()?)
            }
        };
        slog::debug!(self.logger, "ServerWire - {:?}", reply);

        Some(wire::encode(&reply))
    }

    /// Returns `None` once the actor is gone.
    async fn handle_peer_request(&self, payload: &[u8]) -> Option<Bytes> {
        let reply = match wire::decode::<PeerRequest>(payload) {
            Ok(request) => self.actor_client.peer_request(request).await.ok()?,
            Err(e) => {
                let description = format!("Request not recognized: {}", e);
                PeerReply::Error(self.actor_client.malformed_request(UNKNOWN_SERVICE, description).await.ok()?)
            }
        };
        slog::debug!(self.logger, "ServerWire - {:?}", reply);

        Some(wire::encode(&reply))
    }

    fn forward<E>(&self, result: Result<(), E>) -> LoopControl {
        match result {
            Ok(()) => LoopControl::Continue,
            Err(_) => LoopControl::Exit,
        }
    }

    async fn on_receive_error(&self, logger: &slog::Logger, error: TransportError) -> LoopControl {
        if error.is_transient() {
            slog::debug!(logger, "Transient receive error, backing off: {}", error);
            tokio::time::sleep(self.receive_backoff).await;
            LoopControl::Continue
        } else {
            slog::warn!(logger, "Receive failed: {}", error);
            LoopControl::Exit
        }
    }
}
