mod chat_server;
mod coordination;
mod handlers;
mod outbound;
mod replication;
mod state_change_listener;

pub(crate) use chat_server::ChatServer;
pub(crate) use chat_server::ChatServerParts;
pub(crate) use chat_server::ClockSyncReply;
pub(crate) use chat_server::CoordinationTimings;
pub(crate) use chat_server::DelayedAction;
pub(crate) use chat_server::ElectionProbeReply;
pub(crate) use chat_server::HeartbeatReply;
pub(crate) use chat_server::RosterFetched;
pub use chat_server::ServerStatus;
pub(crate) use outbound::OutboundQueue;
pub(crate) use replication::ReplicationStore;
pub(crate) use state_change_listener::CoordinationChangeListener;
pub(crate) use state_change_listener::CoordinationSnapshot;

#[cfg(test)]
pub(crate) use chat_server::test_support;
