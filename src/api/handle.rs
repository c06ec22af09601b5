use crate::actor::ActorClient;
use crate::api::CoordinatorEventListener;
use crate::listener::ListenerShutdownHandle;
use crate::server::{CoordinationChangeListener, ServerStatus};

/// ChatServerHandle keeps one running chat server alive. Dropping it stops the receive loops,
/// unbinds the server's endpoints and lets the server actor drain and exit.
pub struct ChatServerHandle {
    name: String,
    rank: u64,
    actor_client: ActorClient,
    coordination_change_listener: CoordinationChangeListener,
    _shutdown_handle: ListenerShutdownHandle,
}

impl ChatServerHandle {
    pub(crate) fn new(
        name: String,
        rank: u64,
        actor_client: ActorClient,
        coordination_change_listener: CoordinationChangeListener,
        shutdown_handle: ListenerShutdownHandle,
    ) -> Self {
        ChatServerHandle {
            name,
            rank,
            actor_client,
            coordination_change_listener,
            _shutdown_handle: shutdown_handle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rank(&self) -> u64 {
        self.rank
    }

    /// A fresh listener for coordinator changes, starting from the current state.
    pub fn coordinator_events(&self) -> CoordinatorEventListener {
        CoordinatorEventListener::new(self.coordination_change_listener.clone())
    }

    /// Run a clock audit and synchronization round now, as if the 10th mutation had just landed.
    pub async fn trigger_clock_sync(&self) {
        self.actor_client.trigger_clock_sync().await;
    }

    pub async fn status(&self) -> ServerStatus {
        self.actor_client.status().await
    }
}
