use crate::clock::now_seconds;
use crate::model::RosterEntry;
use crate::timers::{Clock, RealClock};
use crate::transport::{self, PendingRequest, ReplyEndpoint, Transport, TransportError};
use crate::wire::{self, DecodeError, DirectoryReply, DirectoryRequest, ErrorReply};
use std::collections::HashMap;
use tokio::sync::oneshot;
use tokio::time::{Duration, Instant};

#[derive(Clone, Debug)]
pub struct DirectoryAuthorityOptions {
    /// Servers that have not been heard from for this long are dropped from the roster.
    pub inactive_after: Duration,
    pub sweep_interval: Duration,
    pub receive_backoff: Duration,
}

impl Default for DirectoryAuthorityOptions {
    fn default() -> Self {
        DirectoryAuthorityOptions {
            inactive_after: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(10),
            receive_backoff: Duration::from_millis(100),
        }
    }
}

/// DirectoryAuthority hands out ranks and keeps the roster of live servers.
pub struct DirectoryAuthority;

struct AuthorityTask<C: Clock> {
    logger: slog::Logger,
    registry: Registry,
    options: DirectoryAuthorityOptions,
    clock: C,
}

/// Dropping the handle stops the authority and releases its address.
pub struct DirectoryAuthorityHandle {
    _shutdown: oneshot::Sender<()>,
}

struct Registry {
    servers: HashMap<String, Registration>,
    next_rank: u64,
}

struct Registration {
    rank: u64,
    last_heartbeat: Instant,
}

impl DirectoryAuthority {
    pub fn spawn(
        logger: slog::Logger,
        transport: &dyn Transport,
        options: DirectoryAuthorityOptions,
    ) -> Result<DirectoryAuthorityHandle, TransportError> {
        let endpoint = transport.bind(transport::DIRECTORY_ADDRESS)?;
        let (tx, rx) = oneshot::channel();

        let authority = AuthorityTask {
            logger: logger.new(slog::o!("Component" => "DirectoryAuthority")),
            registry: Registry::new(),
            options,
            clock: RealClock,
        };
        tokio::spawn(authority.run(endpoint, rx));

        Ok(DirectoryAuthorityHandle { _shutdown: tx })
    }
}

impl<C: Clock> AuthorityTask<C> {
    async fn run(mut self, mut endpoint: Box<dyn ReplyEndpoint>, mut shutdown: oneshot::Receiver<()>) {
        slog::info!(self.logger, "Listening on '{}'", transport::DIRECTORY_ADDRESS);
        let mut next_sweep = self.clock.now() + self.options.sweep_interval;

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                received = endpoint.recv() => match received {
                    Ok(pending) => self.handle_pending(pending),
                    Err(e) if e.is_transient() => tokio::time::sleep(self.options.receive_backoff).await,
                    Err(e) => {
                        slog::warn!(self.logger, "Endpoint closed: {:?}", e);
                        break;
                    }
                },
                _ = self.clock.sleep_until(next_sweep) => {
                    self.sweep();
                    next_sweep += self.options.sweep_interval;
                }
            }
        }

        slog::info!(self.logger, "Authority has exited");
    }

    fn handle_pending(&mut self, pending: PendingRequest) {
        let reply = match wire::decode::<DirectoryRequest>(&pending.payload) {
            Ok(request) => self.handle_request(request),
            Err(e) => decode_failure_reply(e),
        };
        pending.responder.respond(wire::encode(&reply));
    }

    fn handle_request(&mut self, request: DirectoryRequest) -> DirectoryReply {
        slog::debug!(self.logger, "ServerWire - {:?}", request);
        let now = self.clock.now();
        match request {
            DirectoryRequest::Rank { name, clock, .. } => {
                let rank = self.registry.rank(&name, now);
                slog::info!(self.logger, "Server '{}' has rank {}", name, rank);
                DirectoryReply::Rank {
                    rank,
                    timestamp: now_seconds(),
                    clock,
                }
            }
            DirectoryRequest::Heartbeat { name, clock, .. } => {
                self.registry.heartbeat(&name, now);
                DirectoryReply::Heartbeat {
                    timestamp: now_seconds(),
                    clock,
                }
            }
            DirectoryRequest::List { clock, .. } => DirectoryReply::List {
                roster: self.registry.list(),
                timestamp: now_seconds(),
                clock,
            },
        }
    }

    fn sweep(&mut self) {
        let pruned = self.registry.prune(self.clock.now(), self.options.inactive_after);
        if !pruned.is_empty() {
            slog::info!(self.logger, "Pruned inactive servers {:?}", pruned);
        }
    }
}

fn decode_failure_reply(error: DecodeError) -> DirectoryReply {
    DirectoryReply::Error(ErrorReply {
        service: "unknown".to_string(),
        description: format!("Request not recognized: {}", error),
        timestamp: now_seconds(),
        clock: 0,
    })
}

impl Registry {
    fn new() -> Self {
        Registry {
            servers: HashMap::new(),
            next_rank: 1,
        }
    }

    fn rank(&mut self, name: &str, now: Instant) -> u64 {
        if let Some(registration) = self.servers.get_mut(name) {
            registration.last_heartbeat = now;
            return registration.rank;
        }

        let rank = self.next_rank;
        self.next_rank += 1;
        self.servers.insert(
            name.to_string(),
            Registration {
                rank,
                last_heartbeat: now,
            },
        );

        rank
    }

    fn heartbeat(&mut self, name: &str, now: Instant) {
        // Unknown names (e.g. pruned, or registered with a previous authority) get a fresh rank.
        self.rank(name, now);
    }

    fn list(&self) -> Vec<RosterEntry> {
        let mut roster: Vec<_> = self
            .servers
            .iter()
            .map(|(name, registration)| RosterEntry {
                name: name.clone(),
                rank: registration.rank,
            })
            .collect();
        roster.sort_by_key(|entry| entry.rank);

        roster
    }

    fn prune(&mut self, now: Instant, inactive_after: Duration) -> Vec<String> {
        let pruned: Vec<String> = self
            .servers
            .iter()
            .filter(|(_, registration)| now.saturating_duration_since(registration.last_heartbeat) > inactive_after)
            .map(|(name, _)| name.clone())
            .collect();
        for name in &pruned {
            self.servers.remove(name);
        }

        pruned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timers::mocked_clock;
    use crate::transport::LocalNetwork;
    use bytes::Bytes;

    fn test_logger() -> slog::Logger {
        slog::Logger::root(slog::Discard, slog::o!())
    }

    #[test]
    fn ranks_are_unique_and_sticky() {
        let now = Instant::now();
        let mut registry = Registry::new();

        assert_eq!(registry.rank("a", now), 1);
        assert_eq!(registry.rank("b", now), 2);
        assert_eq!(registry.rank("a", now), 1);
        registry.heartbeat("c", now);

        let ranks: Vec<_> = registry.list().into_iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn prune_drops_only_silent_servers() {
        let start = Instant::now();
        let mut registry = Registry::new();
        registry.rank("quiet", start);
        registry.rank("chatty", start);

        registry.heartbeat("chatty", start + Duration::from_secs(25));
        let pruned = registry.prune(start + Duration::from_secs(31), Duration::from_secs(30));

        assert_eq!(pruned, vec!["quiet".to_string()]);
        assert_eq!(registry.list().len(), 1);

        // A pruned server that comes back is treated as new.
        registry.heartbeat("quiet", start + Duration::from_secs(32));
        assert_eq!(registry.list()[1].rank, 3);
    }

    #[tokio::test]
    async fn sweep_runs_on_the_mock_clock() {
        let network = LocalNetwork::new();
        let endpoint = network.bind(transport::DIRECTORY_ADDRESS).unwrap();
        let (mock_clock, mut controller) = mocked_clock();
        let (_shutdown_tx, shutdown_rx) = oneshot::channel();

        let mut authority = AuthorityTask {
            logger: test_logger(),
            registry: Registry::new(),
            options: DirectoryAuthorityOptions::default(),
            clock: mock_clock.clone(),
        };
        authority.registry.rank("server_a", mock_clock.now());
        tokio::spawn(authority.run(endpoint, shutdown_rx));

        assert_eq!(list(&network).await.len(), 1);

        // Advance in sweep sized steps until past the inactivity window.
        for _ in 0..4 {
            controller.advance(Duration::from_secs(10));
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(list(&network).await.is_empty());
    }

    async fn list(network: &LocalNetwork) -> Vec<RosterEntry> {
        let request = DirectoryRequest::List { timestamp: 0, clock: 7 };
        let bytes = network
            .request(transport::DIRECTORY_ADDRESS, wire::encode(&request))
            .await
            .unwrap();
        match wire::decode::<DirectoryReply>(&bytes).unwrap() {
            DirectoryReply::List { roster, clock, .. } => {
                assert_eq!(clock, 7);
                roster
            }
            other => panic!("Unexpected reply: {:?}", other),
        }
    }

    #[tokio::test]
    async fn garbage_gets_structured_error() {
        let network = LocalNetwork::new();
        let _handle = DirectoryAuthority::spawn(test_logger(), &network, DirectoryAuthorityOptions::default()).unwrap();

        let bytes = network
            .request(transport::DIRECTORY_ADDRESS, Bytes::from_static(&[0xff, 0x01]))
            .await
            .unwrap();

        match wire::decode::<DirectoryReply>(&bytes).unwrap() {
            DirectoryReply::Error(error) => assert!(error.description.contains("not recognized")),
            other => panic!("Unexpected reply: {:?}", other),
        }
    }
}
