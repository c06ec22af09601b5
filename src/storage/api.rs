use crate::model::{ChannelRecord, MessageRecord, Snapshot, UserRecord};
use std::io;
use std::path::PathBuf;

/// DurableStore persists the three flat record lists of one server.
///
/// There are no transactions and no indexes. Every mutation or merge rewrites the affected
/// list wholesale. The store is loaded exactly once, after the server has been assigned a rank.
pub trait DurableStore: Send + 'static {
    fn load(&mut self) -> Result<Snapshot, StoreError>;

    fn save_users(&mut self, users: &[UserRecord]) -> Result<(), StoreError>;

    fn save_channels(&mut self, channels: &[ChannelRecord]) -> Result<(), StoreError>;

    fn save_messages(&mut self, messages: &[MessageRecord]) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO failure on {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("Malformed records in {path:?}: {source}")]
    Malformed { path: PathBuf, source: serde_json::Error },
}
