use crate::actor::{ActorClient, ServerActor};
use crate::api::handle::ChatServerHandle;
use crate::api::options::ServerOptionsValidated;
use crate::api::ServerOptions;
use crate::clock::LogicalClock;
use crate::directory::{DirectoryError, PeerDirectoryClient};
use crate::listener::{self, ServerListener};
use crate::server::{ChatServer, ChatServerParts, CoordinationTimings, OutboundQueue, ReplicationStore};
use crate::storage::{DurableStore, InMemoryStore, JsonFileStore, StoreError};
use crate::transport::{Transport, TransportError};
use rand::Rng;
use std::convert::TryFrom;
use std::path::PathBuf;
use std::sync::Arc;

pub struct ServerConfig {
    /// Name used in every protocol message. A random `server_NNNN` name is picked when absent.
    pub server_name: Option<String>,
    /// Parent directory for the server's data files. Each server keeps its files in a
    /// sub-directory named after itself. Records only live in memory when absent.
    pub data_directory: Option<PathBuf>,
    pub info_logger: slog::Logger,
    pub options: ServerOptions,
}

#[derive(Debug, thiserror::Error)]
pub enum ServerCreationError {
    #[error("Illegal options for configuring server: {0}")]
    IllegalOptions(String),
    #[error("Could not register with the directory authority")]
    RegistrationFailed(#[source] DirectoryError),
    #[error("Could not load stored records")]
    StoreLoad(#[source] StoreError),
    #[error("Could not bind server endpoints")]
    Bind(#[source] TransportError),
}

pub async fn try_create_chat_server(
    mut config: ServerConfig,
    transport: Arc<dyn Transport>,
) -> Result<ChatServerHandle, ServerCreationError> {
    let server_name = config.server_name.get_or_insert_with(random_server_name).clone();
    let store: Box<dyn DurableStore> = match &config.data_directory {
        Some(directory) => Box::new(JsonFileStore::new(directory.join(server_name))),
        None => Box::new(InMemoryStore::new()),
    };

    try_create_chat_server_with_store(config, transport, store).await
}

/// Like `try_create_chat_server()`, but records are kept in the given store.
pub async fn try_create_chat_server_with_store(
    config: ServerConfig,
    transport: Arc<dyn Transport>,
    store: Box<dyn DurableStore>,
) -> Result<ChatServerHandle, ServerCreationError> {
    let options = ServerOptionsValidated::try_from(config.options)
        .map_err(|e| ServerCreationError::IllegalOptions(e.to_string()))?;

    let server_name = config.server_name.unwrap_or_else(random_server_name);
    let logger = config.info_logger.new(slog::o!("Server" => server_name.clone()));

    let server_listener = ServerListener::bind(transport.as_ref(), &server_name).map_err(ServerCreationError::Bind)?;

    let directory = PeerDirectoryClient::new(logger.clone(), transport.clone(), options.directory_request_timeout);
    let mut clock = LogicalClock::new();
    let rank = directory
        .register(&server_name, &mut clock, options.registration_attempts)
        .await
        .map_err(ServerCreationError::RegistrationFailed)?;

    let replication =
        ReplicationStore::load(logger.clone(), server_name.clone(), store).map_err(ServerCreationError::StoreLoad)?;

    let (actor_client, actor_queue_rx) = ActorClient::new(64);
    let outbound = OutboundQueue::spawn(logger.clone(), transport.clone());

    let (server, coordination_change_listener) = ChatServer::new(ChatServerParts {
        logger: logger.clone(),
        name: server_name.clone(),
        rank,
        clock,
        replication,
        outbound,
        transport,
        directory,
        actor_client: actor_client.weak(),
        timings: CoordinationTimings {
            heartbeat_interval: options.heartbeat_interval,
            initial_sync_delay: options.initial_sync_delay,
            coordinator_recheck_delay: options.coordinator_recheck_delay,
            election_probe_timeout: options.election_probe_timeout,
            clock_sync_timeout: options.clock_sync_timeout,
            sync_jitter_max: options.sync_jitter_max,
        },
    });

    let server_actor = ServerActor::new(logger.clone(), actor_queue_rx, server);
    tokio::spawn(server_actor.run_event_loop());

    let (shutdown_handle, shutdown_signal) = listener::shutdown_signal();
    server_listener.spawn(logger, actor_client.weak(), options.receive_backoff, shutdown_signal);

    Ok(ChatServerHandle::new(
        server_name,
        rank,
        actor_client,
        coordination_change_listener,
        shutdown_handle,
    ))
}

fn random_server_name() -> String {
    format!("server_{}", rand::thread_rng().gen_range(1000..10000))
}
