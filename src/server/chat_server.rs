use crate::actor::WeakActorClient;
use crate::clock::{now_millis, now_seconds, LogicalClock};
use crate::directory::{DirectoryError, DirectoryResponse, PeerDirectoryClient};
use crate::model::{MessageRecord, RosterEntry, ServerIdentity, Snapshot};
use crate::server::coordination::{CoordinationState, ProbeVerdict};
use crate::server::outbound::OutboundQueue;
use crate::server::replication::{ApplyOutcome, ReplicationStore};
use crate::server::{CoordinationChangeListener, CoordinationSnapshot};
use crate::timers::{DelayTimerHandle, HeartbeatTimerHandle};
use crate::transport::{self, Transport, TransportError};
use crate::wire::{
    self, Announcement, ClockReply, ClockRequest, DecodeError, Delivery, ElectionReply, ElectionRequest, ErrorReply,
    PeerReply, PeerRequest, ReplicationEvent, ELECTION_OK,
};
use rand::Rng;
use std::sync::Arc;
use tokio::time::Duration;

/// Work a one-shot timer hands back to the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DelayedAction {
    /// Ask peers for a full snapshot shortly after joining as a follower.
    InitialSync,
    /// Look for a coordinator again, and elect if there still is none.
    CoordinatorRecheck,
    /// Answer a peer's sync request after the random jitter.
    SyncResponse,
}

/// Why a roster was fetched. Decides what happens once it arrives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RosterPurpose {
    StartupLookup,
    ClockSync,
    Election { round: u64 },
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum PeerCallError {
    #[error("Peer unreachable: {0}")]
    Transport(#[from] TransportError),

    #[error("Undecodable peer reply: {0}")]
    Decode(#[from] DecodeError),
}

#[derive(Debug)]
pub(crate) struct RosterFetched {
    pub purpose: RosterPurpose,
    pub result: Result<DirectoryResponse<Vec<RosterEntry>>, DirectoryError>,
}

pub(crate) type HeartbeatReply = Result<DirectoryResponse<()>, DirectoryError>;

#[derive(Debug)]
pub(crate) struct ClockSyncReply {
    pub coordinator: String,
    pub result: Result<PeerReply, PeerCallError>,
}

#[derive(Debug)]
pub(crate) struct ElectionProbeReply {
    pub round: u64,
    pub peer: String,
    pub result: Result<PeerReply, PeerCallError>,
}

/// A point in time view of one server, for diagnostics and tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerStatus {
    pub name: String,
    pub rank: u64,
    pub clock: u64,
    pub coordinator: Option<String>,
    pub roster: Vec<RosterEntry>,
    pub snapshot: Snapshot,
    pub mutation_count: u64,
}

#[derive(Clone, Debug)]
pub(crate) struct CoordinationTimings {
    pub heartbeat_interval: Duration,
    pub initial_sync_delay: Duration,
    pub coordinator_recheck_delay: Duration,
    pub election_probe_timeout: Duration,
    pub clock_sync_timeout: Duration,
    pub sync_jitter_max: Duration,
}

/// ChatServer is all state one server owns: identity, logical clock, coordination state and the
/// replicated tables. It runs inside the actor, so every method here is synchronous. Network
/// calls are spawned onto tasks that report back to the actor as events.
pub(crate) struct ChatServer {
    pub(super) logger: slog::Logger,
    pub(super) identity: ServerIdentity,
    pub(super) my_name: String,
    pub(super) my_rank: u64,
    pub(super) clock: LogicalClock,
    pub(super) coordination: CoordinationState,
    pub(super) replication: ReplicationStore,
    pub(super) mutation_count: u64,
    pub(super) outbound: OutboundQueue,
    transport: Arc<dyn Transport>,
    directory: PeerDirectoryClient,
    actor_client: WeakActorClient,
    timings: CoordinationTimings,
    heartbeat_timer: Option<HeartbeatTimerHandle>,
    delay_timers: Vec<DelayTimerHandle>,
    clock_sync_in_flight: bool,
}

pub(crate) struct ChatServerParts {
    pub logger: slog::Logger,
    pub name: String,
    pub rank: u64,
    pub clock: LogicalClock,
    pub replication: ReplicationStore,
    pub outbound: OutboundQueue,
    pub transport: Arc<dyn Transport>,
    pub directory: PeerDirectoryClient,
    pub actor_client: WeakActorClient,
    pub timings: CoordinationTimings,
}

impl ChatServer {
    pub(crate) fn new(parts: ChatServerParts) -> (Self, CoordinationChangeListener) {
        let mut identity = ServerIdentity::new(parts.name.clone());
        identity.assign_rank(parts.rank);
        let (coordination, listener) = CoordinationState::new(parts.name.clone());

        let server = ChatServer {
            logger: parts.logger,
            identity,
            my_name: parts.name,
            my_rank: parts.rank,
            clock: parts.clock,
            coordination,
            replication: parts.replication,
            mutation_count: 0,
            outbound: parts.outbound,
            transport: parts.transport,
            directory: parts.directory,
            actor_client: parts.actor_client,
            timings: parts.timings,
            heartbeat_timer: None,
            delay_timers: Vec::new(),
            clock_sync_in_flight: false,
        };

        (server, listener)
    }

    /// Leave the registered phase: rank 1 takes over as coordinator, everyone else looks for one.
    pub(crate) fn start(&mut self) {
        self.coordination.mark_registered();
        slog::info!(
            self.logger,
            "Starting {:?}, logical clock {}",
            self.identity,
            self.clock.current()
        );

        self.heartbeat_timer = Some(HeartbeatTimerHandle::spawn_timer_task(
            self.timings.heartbeat_interval,
            self.actor_client.clone(),
        ));

        if self.my_rank == 1 {
            self.self_elect();
        } else {
            self.coordination.become_follower(None);
            self.fetch_roster(RosterPurpose::StartupLookup);
            self.schedule(DelayedAction::InitialSync, self.timings.initial_sync_delay);
        }
    }

    pub(crate) fn status(&self) -> ServerStatus {
        ServerStatus {
            name: self.my_name.clone(),
            rank: self.my_rank,
            clock: self.clock.current(),
            coordinator: self.coordination.coordinator().map(str::to_string),
            roster: self.coordination.roster().to_vec(),
            snapshot: self.replication.snapshot(),
            mutation_count: self.mutation_count,
        }
    }

    #[cfg(test)]
    pub(crate) fn clock_sync_in_flight(&self) -> bool {
        self.clock_sync_in_flight
    }

    // ---- directory ----

    pub(crate) fn handle_heartbeat_tick(&mut self) {
        let clock = self.clock.tick();
        tokio::spawn(Self::call_heartbeat(
            self.directory.clone(),
            self.my_name.clone(),
            clock,
            self.actor_client.clone(),
        ));
    }

    pub(crate) fn handle_heartbeat_reply(&mut self, reply: HeartbeatReply) {
        match reply {
            Ok(response) => {
                self.clock.observe(response.clock);
            }
            Err(e) => {
                if let Some(reply_clock) = e.reply_clock() {
                    self.clock.observe(reply_clock);
                }
                slog::warn!(self.logger, "Heartbeat failed: {}", e);
            }
        }
    }

    fn fetch_roster(&mut self, purpose: RosterPurpose) {
        let clock = self.clock.tick();
        tokio::spawn(Self::call_roster(
            self.directory.clone(),
            clock,
            purpose,
            self.actor_client.clone(),
        ));
    }

    pub(crate) fn handle_roster_fetched(&mut self, fetched: RosterFetched) {
        match fetched.result {
            Ok(response) => {
                self.clock.observe(response.clock);
                self.coordination.update_roster(response.value);
            }
            Err(e) => {
                if let Some(reply_clock) = e.reply_clock() {
                    self.clock.observe(reply_clock);
                }
                slog::warn!(self.logger, "Roster fetch failed, keeping cached roster: {}", e);
            }
        }

        match fetched.purpose {
            RosterPurpose::StartupLookup => self.finish_startup_lookup(),
            RosterPurpose::ClockSync => self.continue_clock_sync(),
            RosterPurpose::Election { round } => self.send_election_probes(round),
        }
    }

    fn finish_startup_lookup(&mut self) {
        // An announcement may have beaten the roster here.
        if self.coordination.coordinator().is_some() {
            return;
        }

        match self.coordination.rank_one_peer().map(str::to_string) {
            Some(coordinator) => {
                slog::info!(self.logger, "Adopting rank 1 server {} as coordinator", coordinator);
                self.coordination.become_follower(Some(coordinator));
            }
            None => self.schedule(DelayedAction::CoordinatorRecheck, self.timings.coordinator_recheck_delay),
        }
    }

    // ---- timers ----

    fn schedule(&mut self, action: DelayedAction, delay: Duration) {
        // A pending timer for the same action already covers this one.
        if self.delay_timers.iter().any(|timer| timer.action() == action) {
            return;
        }

        self.delay_timers.push(DelayTimerHandle::spawn_timer_task(
            delay,
            action,
            self.actor_client.clone(),
        ));
    }

    pub(crate) fn handle_delay_elapsed(&mut self, action: DelayedAction) {
        self.delay_timers.retain(|timer| timer.action() != action);

        match action {
            DelayedAction::InitialSync => {
                let event = self.replication.request_sync(&mut self.clock);
                self.publish_replication(&event);
            }
            DelayedAction::CoordinatorRecheck => {
                if self.coordination.coordinator().is_none() {
                    slog::info!(self.logger, "Still no coordinator after recheck delay");
                    self.start_election();
                }
            }
            DelayedAction::SyncResponse => {
                let event = self.replication.broadcast_sync(&mut self.clock);
                self.publish_replication(&event);
            }
        }
    }

    // ---- clock synchronization ----

    pub(crate) fn trigger_clock_sync(&mut self) {
        slog::info!(
            self.logger,
            "Clock audit: {:?}, coordinator {:?}, logical clock {}",
            self.identity,
            self.coordination.coordinator(),
            self.clock.current()
        );

        if self.coordination.is_coordinator() {
            slog::debug!(self.logger, "This server is the coordinator, nothing to sync against");
            return;
        }
        if self.clock_sync_in_flight || self.coordination.is_electing() {
            slog::debug!(self.logger, "Clock sync or election already running");
            return;
        }

        self.clock_sync_in_flight = true;
        self.fetch_roster(RosterPurpose::ClockSync);
    }

    fn continue_clock_sync(&mut self) {
        if self.coordination.is_coordinator() {
            self.clock_sync_in_flight = false;
            return;
        }

        let coordinator = match self.coordination.coordinator_entry() {
            Some(entry) => entry.name.clone(),
            None => {
                self.clock_sync_in_flight = false;
                slog::info!(
                    self.logger,
                    "Coordinator {:?} not found on roster",
                    self.coordination.coordinator()
                );
                self.start_election();
                return;
            }
        };

        let request = PeerRequest::Clock(ClockRequest {
            timestamp: now_seconds(),
            clock: self.clock.tick(),
            coordinator: Some(coordinator.clone()),
            requesting_server: Some(self.my_name.clone()),
        });
        tokio::spawn(Self::call_clock_sync(
            self.logger.clone(),
            self.transport.clone(),
            coordinator,
            request,
            self.timings.clock_sync_timeout,
            self.actor_client.clone(),
        ));
    }

    pub(crate) fn handle_clock_sync_reply(&mut self, reply: ClockSyncReply) {
        self.clock_sync_in_flight = false;

        match reply.result {
            Ok(PeerReply::Clock(clock_reply)) => {
                let offset = (clock_reply.timestamp as i64).saturating_sub(now_seconds() as i64);
                self.clock.observe(clock_reply.clock);
                slog::info!(
                    self.logger,
                    "Clock sync with {}: offset {}s (coordinator time {}ms), logical clock {}",
                    reply.coordinator,
                    offset,
                    clock_reply.time,
                    self.clock.current()
                );
            }
            Ok(other) => {
                self.clock.observe(other.clock());
                slog::warn!(self.logger, "Coordinator {} refused clock sync: {:?}", reply.coordinator, other);
                self.start_election();
            }
            Err(e) => {
                slog::warn!(self.logger, "Coordinator {} unreachable: {}", reply.coordinator, e);
                self.start_election();
            }
        }
    }

    // ---- election ----

    fn start_election(&mut self) {
        if self.coordination.is_electing() {
            return;
        }

        let round = self.coordination.start_election();
        slog::info!(self.logger, "Starting election round {}", round);
        self.fetch_roster(RosterPurpose::Election { round });
    }

    fn send_election_probes(&mut self, round: u64) {
        if !self.coordination.is_current_round(round) {
            slog::debug!(self.logger, "Roster for finished election round {}", round);
            return;
        }

        let peers = self.coordination.lower_ranked_peers(self.my_rank);
        if peers.is_empty() {
            slog::info!(self.logger, "No lower ranked peers in round {}", round);
            self.self_elect();
            return;
        }

        self.coordination.probes_sent(round, peers.len());
        for peer in peers {
            let request = PeerRequest::Election(ElectionRequest {
                timestamp: now_seconds(),
                clock: self.clock.tick(),
                requesting_server: self.my_name.clone(),
                requesting_rank: self.my_rank,
            });
            tokio::spawn(Self::call_election_probe(
                self.logger.clone(),
                self.transport.clone(),
                peer.name,
                request,
                self.timings.election_probe_timeout,
                round,
                self.actor_client.clone(),
            ));
        }
    }

    pub(crate) fn handle_election_probe_reply(&mut self, reply: ElectionProbeReply) {
        let answered_ok = match &reply.result {
            Ok(PeerReply::Election(election)) => election.election == ELECTION_OK,
            _ => false,
        };
        if let Ok(peer_reply) = &reply.result {
            self.clock.observe(peer_reply.clock());
        }

        match self.coordination.record_probe(reply.round, answered_ok) {
            ProbeVerdict::Stale => {
                slog::debug!(self.logger, "Ignoring probe reply from {} for round {}", reply.peer, reply.round);
            }
            ProbeVerdict::Pending => {}
            ProbeVerdict::Abstain => {
                slog::info!(self.logger, "{} answered election round {}, abstaining", reply.peer, reply.round);
                self.coordination.become_follower(None);
            }
            ProbeVerdict::SelfElect => {
                slog::info!(self.logger, "No lower ranked peer answered round {}", reply.round);
                self.self_elect();
            }
        }
    }

    fn self_elect(&mut self) {
        self.coordination.become_coordinator();

        let announcement = Announcement {
            coordinator: self.my_name.clone(),
            timestamp: now_seconds(),
            clock: self.clock.tick(),
        };
        slog::info!(self.logger, "Announcing self as coordinator (clock {})", announcement.clock);
        self.outbound.publish(transport::SERVERS_TOPIC, wire::encode(&announcement));
    }

    pub(crate) fn handle_announcement(&mut self, announcement: Announcement) {
        self.clock.observe(announcement.clock);
        let previous = self.coordination.adopt_announcement(announcement.coordinator.clone());

        if previous.as_deref() != Some(announcement.coordinator.as_str()) {
            slog::info!(
                self.logger,
                "Coordinator changed from {:?} to {} (clock {})",
                previous,
                announcement.coordinator,
                self.clock.current()
            );
        }
    }

    // ---- peer requests ----

    pub(crate) fn handle_peer_request(&mut self, request: PeerRequest) -> PeerReply {
        slog::debug!(self.logger, "ServerWire - {:?}", request);
        match request {
            PeerRequest::Election(election) => {
                self.clock.observe(election.clock);
                slog::info!(
                    self.logger,
                    "Election probe from {} (rank {})",
                    election.requesting_server,
                    election.requesting_rank
                );
                PeerReply::Election(ElectionReply {
                    election: ELECTION_OK.to_string(),
                    timestamp: now_seconds(),
                    clock: self.clock.tick(),
                })
            }
            PeerRequest::Clock(clock_request) => {
                self.clock.observe(clock_request.clock);
                if let Some(description) = self.refuse_clock_request(&clock_request) {
                    return PeerReply::Error(self.error_reply("clock", description));
                }
                PeerReply::Clock(ClockReply {
                    time: now_millis(),
                    timestamp: now_seconds(),
                    clock: self.clock.tick(),
                })
            }
        }
    }

    fn refuse_clock_request(&self, request: &ClockRequest) -> Option<String> {
        if let Some(named) = &request.coordinator {
            if named != &self.my_name {
                return Some(format!("{} is not the coordinator", self.my_name));
            }
        }
        match self.coordination.coordinator() {
            Some(believed) if believed != self.my_name => {
                Some(format!("{} is not the coordinator, ask {}", self.my_name, believed))
            }
            _ => None,
        }
    }

    pub(crate) fn handle_malformed_request(&mut self, service: &str, description: String) -> ErrorReply {
        self.error_reply(service, description)
    }

    pub(super) fn error_reply(&mut self, service: &str, description: String) -> ErrorReply {
        ErrorReply {
            service: service.to_string(),
            description,
            timestamp: now_seconds(),
            clock: self.clock.tick(),
        }
    }

    // ---- replication ----

    pub(crate) fn handle_replication(&mut self, event: ReplicationEvent) {
        match self.replication.apply_replication(event, &mut self.clock) {
            ApplyOutcome::OwnEvent | ApplyOutcome::Applied | ApplyOutcome::Duplicate => {}
            ApplyOutcome::SyncRequested { origin_server } => {
                if self.coordination.should_answer_sync_request(self.my_rank) {
                    let jitter = rand::thread_rng().gen_range(Duration::from_millis(0)..=self.timings.sync_jitter_max);
                    slog::info!(self.logger, "Answering sync request from {} in {:?}", origin_server, jitter);
                    self.schedule(DelayedAction::SyncResponse, jitter);
                }
            }
        }
    }

    pub(super) fn publish_replication(&self, event: &ReplicationEvent) {
        self.outbound.publish(transport::REPLICATION_TOPIC, wire::encode(event));
    }

    pub(super) fn deliver(&self, channel_or_user: &str, record: MessageRecord) {
        self.outbound
            .publish(&transport::delivery_topic(channel_or_user), wire::encode(&Delivery(record)));
    }

    // ---- spawned network calls ----

    async fn call_heartbeat(directory: PeerDirectoryClient, name: String, clock: u64, callback: WeakActorClient) {
        let result = directory.heartbeat(&name, clock).await;
        let _ = callback.heartbeat_reply(result).await;
    }

    async fn call_roster(directory: PeerDirectoryClient, clock: u64, purpose: RosterPurpose, callback: WeakActorClient) {
        let result = directory.roster(clock).await;
        let _ = callback.roster_fetched(RosterFetched { purpose, result }).await;
    }

    async fn call_clock_sync(
        logger: slog::Logger,
        transport: Arc<dyn Transport>,
        coordinator: String,
        request: PeerRequest,
        timeout: Duration,
        callback: WeakActorClient,
    ) {
        let result = Self::call_peer(&logger, transport.as_ref(), &coordinator, request, timeout).await;
        let _ = callback.clock_sync_reply(ClockSyncReply { coordinator, result }).await;
    }

    async fn call_election_probe(
        logger: slog::Logger,
        transport: Arc<dyn Transport>,
        peer: String,
        request: PeerRequest,
        timeout: Duration,
        round: u64,
        callback: WeakActorClient,
    ) {
        let result = Self::call_peer(&logger, transport.as_ref(), &peer, request, timeout).await;
        let _ = callback
            .election_probe_reply(ElectionProbeReply { round, peer, result })
            .await;
    }

    async fn call_peer(
        logger: &slog::Logger,
        transport: &dyn Transport,
        peer: &str,
        request: PeerRequest,
        timeout: Duration,
    ) -> Result<PeerReply, PeerCallError> {
        slog::debug!(logger, "ClientWire - {} {:?}", peer, request);
        let reply_bytes = transport::request_with_timeout(
            transport,
            &transport::peer_address(peer),
            wire::encode(&request),
            timeout,
        )
        .await?;
        let reply = wire::decode::<PeerReply>(&reply_bytes)?;
        slog::debug!(logger, "ClientWire - {} {:?}", peer, reply);

        Ok(reply)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::actor::{ActorClient, Event};
    use crate::server::outbound::Outbound;
    use crate::storage::InMemoryStore;
    use crate::transport::LocalNetwork;
    use tokio::sync::mpsc;

    pub(crate) struct TestServer {
        pub server: ChatServer,
        pub listener: CoordinationChangeListener,
        pub outbound: mpsc::UnboundedReceiver<Outbound>,
        pub store: InMemoryStore,
        // Keeps the weak client given to the server alive.
        pub actor_client: ActorClient,
        pub actor_queue: mpsc::Receiver<Event>,
    }

    impl TestServer {
        /// Drain everything published so far, decoded as `T`, for one topic.
        pub(crate) fn published<T: wire::WireFormat>(&mut self, topic: &str) -> Vec<T> {
            let mut decoded = Vec::new();
            while let Ok(outbound) = self.outbound.try_recv() {
                if outbound.topic == topic {
                    decoded.push(wire::decode(&outbound.payload).unwrap());
                }
            }
            decoded
        }
    }

    pub(crate) fn test_server(name: &str, rank: u64) -> TestServer {
        let logger = slog::Logger::root(slog::Discard, slog::o!());
        let network = Arc::new(LocalNetwork::new());
        let store = InMemoryStore::new();
        let replication = ReplicationStore::load(logger.clone(), name.to_string(), Box::new(store.clone())).unwrap();
        let (outbound, outbound_rx) = OutboundQueue::capture();
        let (actor_client, actor_queue) = ActorClient::new(64);

        let (server, listener) = ChatServer::new(ChatServerParts {
            logger: logger.clone(),
            name: name.to_string(),
            rank,
            clock: LogicalClock::new(),
            replication,
            outbound,
            transport: network.clone(),
            directory: PeerDirectoryClient::new(logger, network, Duration::from_millis(50)),
            actor_client: actor_client.weak(),
            timings: CoordinationTimings {
                heartbeat_interval: Duration::from_secs(10),
                initial_sync_delay: Duration::from_secs(5),
                coordinator_recheck_delay: Duration::from_secs(1),
                election_probe_timeout: Duration::from_millis(50),
                clock_sync_timeout: Duration::from_millis(100),
                sync_jitter_max: Duration::from_millis(10),
            },
        });

        TestServer {
            server,
            listener,
            outbound: outbound_rx,
            store,
            actor_client,
            actor_queue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::test_server;
    use super::*;
    use crate::actor::Event;
    use crate::wire::ReplicationPayload;

    #[tokio::test]
    async fn rank_one_announces_exactly_once() {
        let mut t = test_server("server_1", 1);
        t.server.start();

        let announcements: Vec<Announcement> = t.published(transport::SERVERS_TOPIC);
        assert_eq!(announcements.len(), 1);
        assert_eq!(announcements[0].coordinator, "server_1");
        assert_eq!(t.listener.current(), CoordinationSnapshot::Coordinator);
    }

    #[tokio::test]
    async fn follower_refuses_clock_request() {
        let mut t = test_server("server_2", 2);
        t.server.coordination.become_follower(Some("server_1".into()));

        let reply = t.server.handle_peer_request(PeerRequest::Clock(ClockRequest {
            timestamp: 1,
            clock: 10,
            coordinator: None,
            requesting_server: Some("server_3".into()),
        }));

        match reply {
            PeerReply::Error(error) => {
                assert_eq!(error.service, "clock");
                assert_eq!(error.clock, 12);
            }
            other => panic!("Unexpected reply: {:?}", other),
        }
    }

    #[tokio::test]
    async fn coordinator_refuses_clock_request_naming_another_server() {
        let mut t = test_server("server_1", 1);
        t.server.start();

        let reply = t.server.handle_peer_request(PeerRequest::Clock(ClockRequest {
            timestamp: 1,
            clock: 10,
            coordinator: Some("server_2".into()),
            requesting_server: Some("server_3".into()),
        }));

        match reply {
            PeerReply::Error(error) => {
                assert_eq!(error.service, "clock");
                assert_eq!(error.description, "server_1 is not the coordinator");
                assert!(error.clock > 10);
            }
            other => panic!("Unexpected reply: {:?}", other),
        }
        assert!(t.server.coordination.is_coordinator());
    }

    #[tokio::test]
    async fn coordinator_answers_clock_request() {
        let mut t = test_server("server_1", 1);
        t.server.start();
        let before = t.server.clock.current();

        let reply = t.server.handle_peer_request(PeerRequest::Clock(ClockRequest {
            timestamp: 1,
            clock: 100,
            coordinator: Some("server_1".into()),
            requesting_server: Some("server_2".into()),
        }));

        match reply {
            PeerReply::Clock(clock_reply) => {
                assert!(clock_reply.time > 1_000_000_000_000);
                assert_eq!(clock_reply.clock, 102);
            }
            other => panic!("Unexpected reply: {:?}", other),
        }
        assert!(t.server.clock.current() > before);
    }

    #[tokio::test]
    async fn election_probe_is_always_ok() {
        let mut t = test_server("server_1", 1);
        t.server.start();

        let reply = t.server.handle_peer_request(PeerRequest::Election(ElectionRequest {
            timestamp: 1,
            clock: 40,
            requesting_server: "server_3".into(),
            requesting_rank: 3,
        }));

        match reply {
            PeerReply::Election(election) => {
                assert_eq!(election.election, ELECTION_OK);
                assert_eq!(election.clock, 42);
            }
            other => panic!("Unexpected reply: {:?}", other),
        }
    }

    #[tokio::test]
    async fn ok_probe_abstains_without_announcing() {
        let mut t = test_server("server_3", 3);
        let round = t.server.coordination.start_election();
        t.server.coordination.probes_sent(round, 2);

        t.server.handle_election_probe_reply(ElectionProbeReply {
            round,
            peer: "server_2".into(),
            result: Ok(PeerReply::Election(ElectionReply {
                election: ELECTION_OK.into(),
                timestamp: 1,
                clock: 7,
            })),
        });
        t.server.handle_election_probe_reply(ElectionProbeReply {
            round,
            peer: "server_1".into(),
            result: Err(PeerCallError::Transport(TransportError::TimedOut)),
        });

        assert!(t.published::<Announcement>(transport::SERVERS_TOPIC).is_empty());
        assert_eq!(t.server.coordination.coordinator(), None);
        assert_eq!(t.listener.current(), CoordinationSnapshot::FollowerNoCoordinator);
        assert_eq!(t.server.clock.current(), 8);
    }

    #[tokio::test]
    async fn silent_lower_ranks_lead_to_single_announcement() {
        let mut t = test_server("server_3", 3);
        let round = t.server.coordination.start_election();
        t.server.coordination.probes_sent(round, 2);

        for peer in &["server_1", "server_2"] {
            t.server.handle_election_probe_reply(ElectionProbeReply {
                round,
                peer: peer.to_string(),
                result: Err(PeerCallError::Transport(TransportError::Unreachable(peer.to_string()))),
            });
        }

        let announcements: Vec<Announcement> = t.published(transport::SERVERS_TOPIC);
        assert_eq!(announcements.len(), 1);
        assert_eq!(announcements[0].coordinator, "server_3");
        assert_eq!(t.listener.current(), CoordinationSnapshot::Coordinator);
    }

    #[tokio::test]
    async fn sync_request_is_answered_by_rank_one_only() {
        let mut follower = test_server("server_3", 3);
        follower.server.coordination.become_follower(Some("server_1".into()));
        let request = ReplicationEvent {
            origin_server: "server_4".into(),
            timestamp: 1,
            clock: 1,
            payload: ReplicationPayload::SyncRequest,
        };

        follower.server.handle_replication(request.clone());
        assert!(follower.server.delay_timers.is_empty());

        let mut coordinator = test_server("server_1", 1);
        coordinator.server.start();
        coordinator.server.handle_replication(request);
        assert_eq!(coordinator.server.delay_timers.len(), 1);
        assert_eq!(coordinator.server.delay_timers[0].action(), DelayedAction::SyncResponse);
    }

    #[tokio::test]
    async fn clock_sync_reply_failure_escalates_to_election() {
        let mut t = test_server("server_2", 2);
        t.server.coordination.become_follower(Some("server_1".into()));

        t.server.handle_clock_sync_reply(ClockSyncReply {
            coordinator: "server_1".into(),
            result: Err(PeerCallError::Transport(TransportError::TimedOut)),
        });

        assert!(t.server.coordination.is_electing());
        assert_eq!(t.listener.current(), CoordinationSnapshot::Electing);
    }

    #[tokio::test]
    async fn missing_rank_one_escalates_to_election_after_recheck() {
        let mut t = test_server("server_2", 2);
        t.server.start();
        let roster = vec![
            RosterEntry {
                name: "server_2".into(),
                rank: 2,
            },
            RosterEntry {
                name: "server_3".into(),
                rank: 3,
            },
        ];

        t.server.handle_roster_fetched(RosterFetched {
            purpose: RosterPurpose::StartupLookup,
            result: Ok(DirectoryResponse { value: roster, clock: 4 }),
        });
        assert_eq!(t.server.coordination.coordinator(), None);
        assert!(t
            .server
            .delay_timers
            .iter()
            .any(|timer| timer.action() == DelayedAction::CoordinatorRecheck));

        t.server.handle_delay_elapsed(DelayedAction::CoordinatorRecheck);
        assert!(t.server.coordination.is_electing());
        assert_eq!(t.listener.current(), CoordinationSnapshot::Electing);

        // No directory on this network, so the election's roster fetch fails and the cached
        // roster is used. It has no one ranked below server_2.
        let election_fetch = loop {
            match t.actor_queue.recv().await {
                Some(Event::RosterFetched(fetched)) if matches!(fetched.purpose, RosterPurpose::Election { .. }) => {
                    break fetched
                }
                Some(_) => continue,
                None => panic!("Actor queue closed"),
            }
        };
        assert!(election_fetch.result.is_err());
        t.server.handle_roster_fetched(election_fetch);

        let announcements: Vec<Announcement> = t.published(transport::SERVERS_TOPIC);
        assert_eq!(announcements.len(), 1);
        assert_eq!(announcements[0].coordinator, "server_2");
        assert_eq!(t.listener.current(), CoordinationSnapshot::Coordinator);
    }
}
