use crate::model::{ChannelRecord, MessageRecord, Snapshot, UserRecord};
use crate::storage::{DurableStore, StoreError};
use std::sync::{Arc, Mutex};

/// InMemoryStore "persists" to a shared in-memory snapshot. Clones share the same snapshot, so a
/// test can keep one clone around and inspect what the server last saved.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    saved: Arc<Mutex<Saved>>,
}

#[derive(Default)]
struct Saved {
    snapshot: Snapshot,
    num_saves: usize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        InMemoryStore {
            saved: Arc::new(Mutex::new(Saved { snapshot, num_saves: 0 })),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot.clone()
    }

    pub fn num_saves(&self) -> usize {
        self.lock().num_saves
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Saved> {
        self.saved.lock().expect("InMemoryStore mutex guard poison")
    }
}

impl DurableStore for InMemoryStore {
    fn load(&mut self) -> Result<Snapshot, StoreError> {
        Ok(self.snapshot())
    }

    fn save_users(&mut self, users: &[UserRecord]) -> Result<(), StoreError> {
        let mut saved = self.lock();
        saved.snapshot.users = users.to_vec();
        saved.num_saves += 1;
        Ok(())
    }

    fn save_channels(&mut self, channels: &[ChannelRecord]) -> Result<(), StoreError> {
        let mut saved = self.lock();
        saved.snapshot.channels = channels.to_vec();
        saved.num_saves += 1;
        Ok(())
    }

    fn save_messages(&mut self, messages: &[MessageRecord]) -> Result<(), StoreError> {
        let mut saved = self.lock();
        saved.snapshot.messages = messages.to_vec();
        saved.num_saves += 1;
        Ok(())
    }
}
