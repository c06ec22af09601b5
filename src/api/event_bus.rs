use crate::server::{CoordinationChangeListener, CoordinationSnapshot};

/// How the local server sees the coordinator, as observed by its coordination state. Consuming
/// these is subtle: intermediate states are not queued. If several changes happen before the
/// application awaits the next event, only the most recent one is seen.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CoordinatorEvent {
    /// Rank not assigned yet.
    Unranked,
    /// This server is the coordinator.
    Coordinator,
    /// An election round is running.
    Electing,
    Follower(FollowerEventData),
    /// Following, but no coordinator is known.
    FollowerNoCoordinator,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FollowerEventData {
    pub coordinator: String,
}

pub struct CoordinatorEventListener {
    coordination_change_listener: CoordinationChangeListener,
}

impl CoordinatorEventListener {
    pub(crate) fn new(coordination_change_listener: CoordinationChangeListener) -> Self {
        CoordinatorEventListener {
            coordination_change_listener,
        }
    }

    /// `next_event()` returns the next change this server observes. `None` once the server is gone.
    pub async fn next_event(&mut self) -> Option<CoordinatorEvent> {
        self.coordination_change_listener
            .next()
            .await
            .map(CoordinatorEvent::from)
    }

    pub fn current(&self) -> CoordinatorEvent {
        CoordinatorEvent::from(self.coordination_change_listener.current())
    }
}

// ------- Conversions --------

impl From<CoordinationSnapshot> for CoordinatorEvent {
    fn from(snapshot: CoordinationSnapshot) -> Self {
        match snapshot {
            CoordinationSnapshot::Unranked => CoordinatorEvent::Unranked,
            CoordinationSnapshot::Coordinator => CoordinatorEvent::Coordinator,
            CoordinationSnapshot::Electing => CoordinatorEvent::Electing,
            CoordinationSnapshot::Follower(coordinator) => {
                CoordinatorEvent::Follower(FollowerEventData { coordinator })
            }
            CoordinationSnapshot::FollowerNoCoordinator => CoordinatorEvent::FollowerNoCoordinator,
        }
    }
}
