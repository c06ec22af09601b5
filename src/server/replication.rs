use crate::clock::{now_seconds, LogicalClock};
use crate::model::{ChannelRecord, MessageRecord, Snapshot, UserRecord};
use crate::storage::{DurableStore, StoreError};
use crate::wire::{ReplicationEvent, ReplicationPayload};

/// ReplicationStore owns this server's copy of the users, channels and messages tables. Every
/// local mutation is persisted and turned into a ReplicationEvent for peers. Every inbound event
/// is merged according to its data type.
pub(crate) struct ReplicationStore {
    logger: slog::Logger,
    server_name: String,
    users: Vec<UserRecord>,
    channels: Vec<ChannelRecord>,
    messages: Vec<MessageRecord>,
    store: Box<dyn DurableStore>,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ApplyOutcome {
    /// The event came from this server.
    OwnEvent,
    Applied,
    /// A message event that was already in the table.
    Duplicate,
    /// A peer asked for a full snapshot. Whether to answer is up to the caller.
    SyncRequested { origin_server: String },
}

impl ReplicationStore {
    pub(crate) fn load(
        logger: slog::Logger,
        server_name: String,
        mut store: Box<dyn DurableStore>,
    ) -> Result<Self, StoreError> {
        let snapshot = store.load()?;
        slog::info!(
            logger,
            "Loaded {} users, {} channels, {} messages",
            snapshot.users.len(),
            snapshot.channels.len(),
            snapshot.messages.len()
        );

        Ok(ReplicationStore {
            logger,
            server_name,
            users: snapshot.users,
            channels: snapshot.channels,
            messages: snapshot.messages,
            store,
        })
    }

    pub(crate) fn has_user(&self, user: &str) -> bool {
        self.users.iter().any(|u| u.user == user)
    }

    pub(crate) fn has_channel(&self, channel: &str) -> bool {
        self.channels.iter().any(|c| c.channel == channel)
    }

    pub(crate) fn user_names(&self) -> Vec<String> {
        self.users.iter().map(|u| u.user.clone()).collect()
    }

    pub(crate) fn channel_names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.channel.clone()).collect()
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            users: self.users.clone(),
            channels: self.channels.clone(),
            messages: self.messages.clone(),
        }
    }

    // ---- local mutations ----

    pub(crate) fn add_user(&mut self, record: UserRecord, clock: &mut LogicalClock) -> ReplicationEvent {
        self.users.push(record.clone());
        self.persist_users();
        self.new_event(ReplicationPayload::User(record), clock)
    }

    pub(crate) fn add_channel(&mut self, record: ChannelRecord, clock: &mut LogicalClock) -> ReplicationEvent {
        self.channels.push(record.clone());
        self.persist_channels();
        self.new_event(ReplicationPayload::Channel(record), clock)
    }

    pub(crate) fn append_message(&mut self, record: MessageRecord, clock: &mut LogicalClock) -> ReplicationEvent {
        self.messages.push(record.clone());
        self.persist_messages();
        self.new_event(ReplicationPayload::Message(record), clock)
    }

    pub(crate) fn broadcast_sync(&self, clock: &mut LogicalClock) -> ReplicationEvent {
        slog::info!(
            self.logger,
            "Broadcasting full sync ({} users, {} channels, {} messages)",
            self.users.len(),
            self.channels.len(),
            self.messages.len()
        );
        self.new_event(ReplicationPayload::Sync(self.snapshot()), clock)
    }

    pub(crate) fn request_sync(&self, clock: &mut LogicalClock) -> ReplicationEvent {
        slog::info!(self.logger, "Requesting full sync");
        self.new_event(ReplicationPayload::SyncRequest, clock)
    }

    fn new_event(&self, payload: ReplicationPayload, clock: &mut LogicalClock) -> ReplicationEvent {
        ReplicationEvent {
            origin_server: self.server_name.clone(),
            timestamp: now_seconds(),
            clock: clock.tick(),
            payload,
        }
    }

    // ---- inbound replication ----

    pub(crate) fn apply_replication(&mut self, event: ReplicationEvent, clock: &mut LogicalClock) -> ApplyOutcome {
        if event.origin_server == self.server_name {
            return ApplyOutcome::OwnEvent;
        }

        clock.observe(event.clock);
        slog::info!(
            self.logger,
            "Applying '{}' from {} (clock {})",
            event.payload.data_type(),
            event.origin_server,
            clock.current()
        );

        match event.payload {
            ReplicationPayload::User(record) => {
                upsert(&mut self.users, record, |a, b| a.user == b.user);
                self.persist_users();
                ApplyOutcome::Applied
            }
            ReplicationPayload::Channel(record) => {
                upsert(&mut self.channels, record, |a, b| a.channel == b.channel);
                self.persist_channels();
                ApplyOutcome::Applied
            }
            ReplicationPayload::Message(record) => {
                if self.messages.iter().any(|m| m.is_same_event(&record)) {
                    return ApplyOutcome::Duplicate;
                }
                self.messages.push(record);
                self.persist_messages();
                ApplyOutcome::Applied
            }
            ReplicationPayload::Sync(snapshot) => {
                self.merge_snapshot(snapshot);
                ApplyOutcome::Applied
            }
            ReplicationPayload::SyncRequest => ApplyOutcome::SyncRequested {
                origin_server: event.origin_server,
            },
        }
    }

    fn merge_snapshot(&mut self, snapshot: Snapshot) {
        for record in snapshot.users {
            upsert_if_newer(&mut self.users, record, |a, b| a.user == b.user, |r| r.clock);
        }
        for record in snapshot.channels {
            upsert_if_newer(&mut self.channels, record, |a, b| a.channel == b.channel, |r| r.clock);
        }

        let mut appended = 0;
        for record in snapshot.messages {
            if !self.messages.iter().any(|m| m.is_same_message(&record)) {
                self.messages.push(record);
                appended += 1;
            }
        }
        self.messages.sort_by_key(|m| m.clock);

        slog::info!(self.logger, "Sync merge appended {} messages", appended);
        self.persist_users();
        self.persist_channels();
        self.persist_messages();
    }

    // ---- persistence ----

    fn persist_users(&mut self) {
        let result = self.store.save_users(&self.users);
        self.log_store_failure("users", result);
    }

    fn persist_channels(&mut self) {
        let result = self.store.save_channels(&self.channels);
        self.log_store_failure("channels", result);
    }

    fn persist_messages(&mut self) {
        let result = self.store.save_messages(&self.messages);
        self.log_store_failure("messages", result);
    }

    // In memory tables stay authoritative. The next successful save rewrites the file wholesale.
    fn log_store_failure(&self, table: &str, result: Result<(), StoreError>) {
        if let Err(e) = result {
            slog::error!(self.logger, "Failed to persist {}: {}", table, e);
        }
    }
}

fn upsert<T>(table: &mut Vec<T>, record: T, same_key: impl Fn(&T, &T) -> bool) {
    match table.iter_mut().find(|existing| same_key(existing, &record)) {
        Some(existing) => *existing = record,
        None => table.push(record),
    }
}

fn upsert_if_newer<T>(
    table: &mut Vec<T>,
    record: T,
    same_key: impl Fn(&T, &T) -> bool,
    clock_of: impl Fn(&T) -> u64,
) {
    match table.iter_mut().find(|existing| same_key(existing, &record)) {
        Some(existing) => {
            if clock_of(&record) > clock_of(existing) {
                *existing = record;
            }
        }
        None => table.push(record),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MessageKind;
    use crate::storage::InMemoryStore;

    fn store_for(name: &str, backing: &InMemoryStore) -> ReplicationStore {
        let logger = slog::Logger::root(slog::Discard, slog::o!());
        ReplicationStore::load(logger, name.to_string(), Box::new(backing.clone())).unwrap()
    }

    fn event_from(origin: &str, clock: u64, payload: ReplicationPayload) -> ReplicationEvent {
        ReplicationEvent {
            origin_server: origin.to_string(),
            timestamp: 1,
            clock,
            payload,
        }
    }

    fn publish(timestamp: u64, clock: u64) -> MessageRecord {
        MessageRecord {
            kind: MessageKind::Publish {
                user: "alice".into(),
                channel: "general".into(),
            },
            message: "hello".into(),
            timestamp,
            clock,
        }
    }

    #[test]
    fn local_mutation_persists_and_ticks() {
        let backing = InMemoryStore::new();
        let mut store = store_for("server_a", &backing);
        let mut clock = LogicalClock::new();

        let record = UserRecord {
            user: "alice".into(),
            timestamp: 1000,
            clock: clock.tick(),
        };
        let event = store.add_user(record.clone(), &mut clock);

        assert_eq!(event.origin_server, "server_a");
        assert_eq!(event.clock, 2);
        assert_eq!(event.payload, ReplicationPayload::User(record.clone()));
        assert_eq!(backing.snapshot().users, vec![record]);
    }

    #[test]
    fn own_events_are_ignored_without_touching_the_clock() {
        let mut store = store_for("server_a", &InMemoryStore::new());
        let mut clock = LogicalClock::new();

        let outcome = store.apply_replication(event_from("server_a", 50, ReplicationPayload::SyncRequest), &mut clock);
        assert_eq!(outcome, ApplyOutcome::OwnEvent);
        assert_eq!(clock.current(), 0);
    }

    #[test]
    fn replicated_user_lands_and_clock_advances() {
        let backing = InMemoryStore::new();
        let mut store = store_for("server_b", &backing);
        let mut clock = LogicalClock::new();
        for _ in 0..3 {
            clock.tick();
        }

        let alice = UserRecord {
            user: "alice".into(),
            timestamp: 1000,
            clock: 5,
        };
        let event = event_from("server_a", 6, ReplicationPayload::User(alice.clone()));

        assert_eq!(store.apply_replication(event.clone(), &mut clock), ApplyOutcome::Applied);
        assert_eq!(clock.current(), 7);
        assert!(store.has_user("alice"));

        // Upsert is idempotent.
        store.apply_replication(event, &mut clock);
        assert_eq!(store.snapshot().users, vec![alice]);
        assert_eq!(backing.snapshot().users.len(), 1);
    }

    #[test]
    fn duplicate_message_events_append_once() {
        let mut store = store_for("server_b", &InMemoryStore::new());
        let mut clock = LogicalClock::new();
        let event = event_from("server_a", 9, ReplicationPayload::Message(publish(1000, 5)));

        assert_eq!(store.apply_replication(event.clone(), &mut clock), ApplyOutcome::Applied);
        assert_eq!(store.apply_replication(event, &mut clock), ApplyOutcome::Duplicate);
        assert_eq!(store.snapshot().messages.len(), 1);
    }

    #[test]
    fn live_events_ignore_participants_but_sync_does_not() {
        let backing = InMemoryStore::new();
        let mut store = store_for("server_b", &backing);
        let mut clock = LogicalClock::new();
        let original = publish(1000, 5);
        let other_channel = MessageRecord {
            kind: MessageKind::Publish {
                user: "alice".into(),
                channel: "random".into(),
            },
            ..original.clone()
        };

        store.apply_replication(event_from("server_a", 6, ReplicationPayload::Message(original)), &mut clock);
        let live = event_from("server_a", 7, ReplicationPayload::Message(other_channel.clone()));
        assert_eq!(store.apply_replication(live, &mut clock), ApplyOutcome::Duplicate);
        assert_eq!(store.snapshot().messages.len(), 1);

        let incoming = Snapshot {
            messages: vec![other_channel.clone()],
            ..Snapshot::default()
        };
        store.apply_replication(event_from("server_a", 8, ReplicationPayload::Sync(incoming)), &mut clock);

        let messages = store.snapshot().messages;
        assert_eq!(messages.len(), 2);
        assert!(messages.contains(&other_channel));
        assert_eq!(backing.snapshot().messages.len(), 2);
    }

    #[test]
    fn sync_keeps_newer_local_records() {
        let backing = InMemoryStore::with_snapshot(Snapshot {
            users: vec![],
            channels: vec![ChannelRecord {
                channel: "general".into(),
                timestamp: 10,
                clock: 9,
            }],
            messages: vec![],
        });
        let mut store = store_for("server_b", &backing);
        let mut clock = LogicalClock::new();

        let incoming = Snapshot {
            users: vec![],
            channels: vec![
                ChannelRecord {
                    channel: "general".into(),
                    timestamp: 99,
                    clock: 7,
                },
                ChannelRecord {
                    channel: "random".into(),
                    timestamp: 12,
                    clock: 3,
                },
            ],
            messages: vec![],
        };
        store.apply_replication(event_from("server_a", 20, ReplicationPayload::Sync(incoming)), &mut clock);

        let channels = store.snapshot().channels;
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].clock, 9);
        assert_eq!(channels[0].timestamp, 10);
        assert_eq!(channels[1].channel, "random");
    }

    #[test]
    fn sync_overwrites_older_local_records() {
        let backing = InMemoryStore::with_snapshot(Snapshot {
            users: vec![UserRecord {
                user: "alice".into(),
                timestamp: 10,
                clock: 2,
            }],
            channels: vec![],
            messages: vec![],
        });
        let mut store = store_for("server_b", &backing);
        let mut clock = LogicalClock::new();

        let newer = UserRecord {
            user: "alice".into(),
            timestamp: 20,
            clock: 4,
        };
        let incoming = Snapshot {
            users: vec![newer.clone()],
            ..Snapshot::default()
        };
        store.apply_replication(event_from("server_a", 20, ReplicationPayload::Sync(incoming)), &mut clock);

        assert_eq!(store.snapshot().users, vec![newer]);
    }

    #[test]
    fn sync_merges_messages_and_sorts_by_clock() {
        let backing = InMemoryStore::with_snapshot(Snapshot {
            messages: vec![publish(1000, 8), publish(1001, 2)],
            ..Snapshot::default()
        });
        let mut store = store_for("server_b", &backing);
        let mut clock = LogicalClock::new();

        let incoming = Snapshot {
            messages: vec![publish(1000, 8), publish(1002, 5)],
            ..Snapshot::default()
        };
        store.apply_replication(event_from("server_a", 20, ReplicationPayload::Sync(incoming)), &mut clock);

        let clocks: Vec<_> = store.snapshot().messages.iter().map(|m| m.clock).collect();
        assert_eq!(clocks, vec![2, 5, 8]);
        assert_eq!(backing.snapshot().messages.len(), 3);
    }

    #[test]
    fn sync_request_is_reported_to_caller() {
        let mut store = store_for("server_b", &InMemoryStore::new());
        let mut clock = LogicalClock::new();

        let outcome = store.apply_replication(event_from("server_c", 4, ReplicationPayload::SyncRequest), &mut clock);
        assert_eq!(
            outcome,
            ApplyOutcome::SyncRequested {
                origin_server: "server_c".into()
            }
        );
        assert_eq!(clock.current(), 5);
    }
}
