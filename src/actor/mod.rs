use crate::server::{
    ChatServer, ClockSyncReply, DelayedAction, ElectionProbeReply, HeartbeatReply, RosterFetched, ServerStatus,
};
use crate::wire::{Announcement, ClientReply, ClientRequest, ErrorReply, PeerReply, PeerRequest, ReplicationEvent};
use std::fmt::Debug;
use tokio::sync::{mpsc, oneshot};

// Design choice: Durable store writes stay synchronous inside the actor. They are small, and
//                doing them inline keeps a mutation and its persistence in one event.
#[derive(Debug)]
pub(crate) enum Event {
    // Business request from a chat client. Always answered, errors included.
    ClientRequest(ClientRequest, Callback<ClientReply>),

    // `clock` or `election` request from a peer server.
    PeerRequest(PeerRequest, Callback<PeerReply>),

    // An inbound request that could not be decoded. Answered with a structured error.
    MalformedRequest {
        service: &'static str,
        description: String,
        callback: Callback<ErrorReply>,
    },

    // Topic messages. No reply.
    Announcement(Announcement),
    Replication(ReplicationEvent),

    // Timers.
    HeartbeatTick,
    DelayElapsed(DelayedAction),

    // Results of network calls the server spawned.
    HeartbeatReply(HeartbeatReply),
    RosterFetched(RosterFetched),
    ClockSyncReply(ClockSyncReply),
    ElectionProbeReply(ElectionProbeReply),

    // Operator surface.
    TriggerClockSync,
    Inspect(Callback<ServerStatus>),
}

#[derive(Debug)]
pub(crate) struct Callback<T: Debug>(oneshot::Sender<T>);

impl<T: Debug> Callback<T> {
    pub fn send(self, message: T) {
        let _ = self.0.send(message);
    }
}

/// Returned when the actor's event loop has exited and can no longer take events.
#[derive(Debug, thiserror::Error)]
#[error("Server actor has exited")]
pub struct ActorExited;

/// ActorClient is the strong handle to a server actor. The actor runs for as long as one exists.
pub(crate) struct ActorClient {
    sender: mpsc::Sender<Event>,
}

impl ActorClient {
    pub(crate) fn new(buffer_size: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(buffer_size);

        (ActorClient { sender: tx }, rx)
    }

    pub(crate) fn weak(&self) -> WeakActorClient {
        WeakActorClient {
            sender: self.sender.downgrade(),
        }
    }

    pub(crate) async fn trigger_clock_sync(&self) {
        self.send(Event::TriggerClockSync).await;
    }

    pub(crate) async fn status(&self) -> ServerStatus {
        let (tx, rx) = oneshot::channel();
        self.send(Event::Inspect(Callback(tx))).await;

        rx.await.expect("Server actor dropped our callback. WTF!")
    }

    async fn send(&self, event: Event) {
        self.sender
            .send(event)
            .await
            .expect("Server actor event loop is dead. WTF!!");
    }
}

/// WeakActorClient is handed to receive loops, timers and spawned network calls. It does not keep
/// the actor alive, so those tasks wind down once the owning ActorClient is dropped.
#[derive(Clone)]
pub(crate) struct WeakActorClient {
    sender: mpsc::WeakSender<Event>,
}

impl WeakActorClient {
    pub(crate) async fn client_request(&self, request: ClientRequest) -> Result<ClientReply, ActorExited> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::ClientRequest(request, Callback(tx))).await?;

        rx.await.map_err(|_| ActorExited)
    }

    pub(crate) async fn peer_request(&self, request: PeerRequest) -> Result<PeerReply, ActorExited> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::PeerRequest(request, Callback(tx))).await?;

        rx.await.map_err(|_| ActorExited)
    }

    pub(crate) async fn malformed_request(
        &self,
        service: &'static str,
        description: String,
    ) -> Result<ErrorReply, ActorExited> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::MalformedRequest {
            service,
            description,
            callback: Callback(tx),
        })
        .await?;

        rx.await.map_err(|_| ActorExited)
    }

    pub(crate) async fn announcement(&self, announcement: Announcement) -> Result<(), ActorExited> {
        self.send(Event::Announcement(announcement)).await
    }

    pub(crate) async fn replication(&self, event: ReplicationEvent) -> Result<(), ActorExited> {
        self.send(Event::Replication(event)).await
    }

    pub(crate) async fn heartbeat_tick(&self) -> Result<(), ActorExited> {
        self.send(Event::HeartbeatTick).await
    }

    pub(crate) async fn delay_elapsed(&self, action: DelayedAction) -> Result<(), ActorExited> {
        self.send(Event::DelayElapsed(action)).await
    }

    pub(crate) async fn heartbeat_reply(&self, reply: HeartbeatReply) -> Result<(), ActorExited> {
        self.send(Event::HeartbeatReply(reply)).await
    }

    pub(crate) async fn roster_fetched(&self, fetched: RosterFetched) -> Result<(), ActorExited> {
        self.send(Event::RosterFetched(fetched)).await
    }

    pub(crate) async fn clock_sync_reply(&self, reply: ClockSyncReply) -> Result<(), ActorExited> {
        self.send(Event::ClockSyncReply(reply)).await
    }

    pub(crate) async fn election_probe_reply(&self, reply: ElectionProbeReply) -> Result<(), ActorExited> {
        self.send(Event::ElectionProbeReply(reply)).await
    }

    async fn send(&self, event: Event) -> Result<(), ActorExited> {
        let sender = self.sender.upgrade().ok_or(ActorExited)?;
        sender.send(event).await.map_err(|_| ActorExited)
    }
}

/// ServerActor is the chat server logic in actor model. It is the only owner of the server's
/// clock, coordination state and tables.
pub(crate) struct ServerActor {
    logger: slog::Logger,
    receiver: mpsc::Receiver<Event>,
    server: ChatServer,
}

impl ServerActor {
    pub(crate) fn new(logger: slog::Logger, receiver: mpsc::Receiver<Event>, server: ChatServer) -> Self {
        ServerActor {
            logger,
            receiver,
            server,
        }
    }

    pub(crate) async fn run_event_loop(mut self) {
        self.server.start();
        while let Some(event) = self.receiver.recv().await {
            self.handle_event(event);
        }
        slog::info!(self.logger, "Server actor event loop exited");
    }

    // This must NOT be async. Any long running work must be spawned on another task
    // and come back to this actor as an event.
    fn handle_event(&mut self, event: Event) {
        match event {
            Event::ClientRequest(request, callback) => {
                let reply = self.server.handle_client_request(request);
                callback.send(reply);
            }
            Event::PeerRequest(request, callback) => {
                let reply = self.server.handle_peer_request(request);
                callback.send(reply);
            }
            Event::MalformedRequest {
                service,
                description,
                callback,
            } => {
                let reply = self.server.handle_malformed_request(service, description);
                callback.send(reply);
            }
            Event::Announcement(announcement) => self.server.handle_announcement(announcement),
            Event::Replication(event) => self.server.handle_replication(event),
            Event::HeartbeatTick => self.server.handle_heartbeat_tick(),
            Event::DelayElapsed(action) => self.server.handle_delay_elapsed(action),
            Event::HeartbeatReply(reply) => self.server.handle_heartbeat_reply(reply),
            Event::RosterFetched(fetched) => self.server.handle_roster_fetched(fetched),
            Event::ClockSyncReply(reply) => self.server.handle_clock_sync_reply(reply),
            Event::ElectionProbeReply(reply) => self.server.handle_election_probe_reply(reply),
            Event::TriggerClockSync => self.server.trigger_clock_sync(),
            Event::Inspect(callback) => callback.send(self.server.status()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::test_support::{test_server, TestServer};

    #[tokio::test]
    async fn weak_client_fails_once_actor_is_gone() {
        let (client, receiver) = ActorClient::new(4);
        let weak = client.weak();
        drop(receiver);

        assert!(weak.heartbeat_tick().await.is_err());

        drop(client);
        assert!(weak.delay_elapsed(DelayedAction::InitialSync).await.is_err());
    }

    #[tokio::test]
    async fn actor_serves_requests_and_status() {
        let TestServer {
            server,
            actor_client,
            actor_queue,
            ..
        } = test_server("server_1", 1);
        let weak = actor_client.weak();
        let logger = slog::Logger::root(slog::Discard, slog::o!());
        tokio::spawn(ServerActor::new(logger, actor_queue, server).run_event_loop());

        let reply = weak
            .client_request(ClientRequest::Login {
                user: "alice".into(),
                timestamp: 1,
                clock: 0,
            })
            .await
            .unwrap();
        assert!(matches!(reply, ClientReply::Status { .. }));

        let status = actor_client.status().await;
        assert_eq!(status.name, "server_1");
        assert_eq!(status.coordinator.as_deref(), Some("server_1"));
        assert_eq!(status.snapshot.users.len(), 1);
    }
}
