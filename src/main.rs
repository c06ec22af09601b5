use chatpeer::{
    ChatClient, ChatServerHandle, DirectoryAuthority, DirectoryAuthorityOptions, LocalNetwork, ServerConfig,
    ServerOptions,
};
use slog::Drain;
use std::error::Error;
use std::sync::Arc;
use tokio::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let logger = create_root_logger_for_stdout();
    let network = Arc::new(LocalNetwork::new());

    let _authority = DirectoryAuthority::spawn(logger.clone(), &*network, DirectoryAuthorityOptions::default())?;

    let data_directory = tempfile::tempdir()?;
    let mut servers: Vec<ChatServerHandle> = Vec::with_capacity(3);
    for i in 1..=3 {
        let config = ServerConfig {
            server_name: Some(format!("server_{}", i)),
            data_directory: Some(data_directory.path().to_path_buf()),
            info_logger: logger.clone(),
            options: ServerOptions {
                initial_sync_delay: Some(Duration::from_secs(1)),
                ..Default::default()
            },
        };
        servers.push(chatpeer::try_create_chat_server(config, network.clone()).await?);
    }

    // Rank 1 announces itself right away; give the others a moment to adopt it.
    tokio::time::sleep(Duration::from_millis(500)).await;
    for server in &servers {
        slog::info!(logger, "{} (rank {}): {:?}", server.name(), server.rank(), server.coordinator_events().current());
    }

    let mut alice = ChatClient::new(network.clone(), "server_2", Duration::from_secs(2));
    let mut bob = ChatClient::new(network.clone(), "server_3", Duration::from_secs(2));
    let mut general = bob.subscribe("general");

    alice.login("alice").await?;
    bob.login("bob").await?;
    alice.create_channel("general").await?;
    // Let the channel replicate to bob's server.
    tokio::time::sleep(Duration::from_millis(100)).await;

    for i in 0..10 {
        alice.publish("alice", "general", &format!("hello #{}", i)).await?;
    }
    let first = general.next().await?;
    slog::info!(logger, "bob received {:?}", first);

    bob.message("bob", "alice", "hi alice").await?;

    tokio::time::sleep(Duration::from_secs(2)).await;
    for server in &servers {
        let status = server.status().await;
        slog::info!(
            logger,
            "{}: clock {}, coordinator {:?}, {} users, {} channels, {} messages",
            status.name,
            status.clock,
            status.coordinator,
            status.snapshot.users.len(),
            status.snapshot.channels.len(),
            status.snapshot.messages.len()
        );
    }

    // Coordinator goes away. Only server_1 ranks below server_2, so its next clock sync
    // ends with it announcing itself.
    let coordinator = servers.remove(0);
    slog::info!(logger, "Stopping {}", coordinator.name());
    drop(coordinator);
    servers[0].trigger_clock_sync().await;
    tokio::time::sleep(Duration::from_secs(3)).await;
    for server in &servers {
        slog::info!(logger, "{}: {:?}", server.name(), server.coordinator_events().current());
    }

    Ok(())
}

fn create_root_logger_for_stdout() -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, slog::o!())
}
