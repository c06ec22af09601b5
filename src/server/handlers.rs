use crate::clock::{now_millis, now_seconds};
use crate::model::{ChannelRecord, MessageKind, MessageRecord, UserRecord};
use crate::server::ChatServer;
use crate::wire::{ClientReply, ClientRequest};

/// Status carried by a successful `login` or `channel` reply.
pub(crate) const CREATED_STATUS: &str = "success";
/// Status carried by a successful `publish` or `message` reply.
pub(crate) const DELIVERED_STATUS: &str = "OK";

/// Every this many counted mutations, the server syncs its clock with the coordinator.
const MUTATIONS_PER_CLOCK_SYNC: u64 = 10;

/// Timestamps below this are taken to be seconds (or missing) rather than milliseconds.
const MILLIS_TIMESTAMP_FLOOR: u64 = 10_000_000_000;

impl ChatServer {
    pub(crate) fn handle_client_request(&mut self, request: ClientRequest) -> ClientReply {
        slog::debug!(self.logger, "ServerWire - {:?}", request);
        self.clock.observe(request.clock());

        match request {
            ClientRequest::Login { user, timestamp, .. } => self.login(user, timestamp),
            ClientRequest::Users { .. } => {
                let names = self.replication.user_names();
                self.names_reply("users", names)
            }
            ClientRequest::Channel { channel, timestamp, .. } => self.create_channel(channel, timestamp),
            ClientRequest::Channels { .. } => {
                let names = self.replication.channel_names();
                self.names_reply("channels", names)
            }
            ClientRequest::Publish {
                user,
                channel,
                message,
                timestamp,
                ..
            } => self.publish(user, channel, message, timestamp),
            ClientRequest::Message {
                src,
                dst,
                message,
                timestamp,
                ..
            } => self.direct_message(src, dst, message, timestamp),
        }
    }

    fn login(&mut self, user: String, timestamp: u64) -> ClientReply {
        if user.is_empty() {
            return self.client_error("login", "User name must not be empty");
        }
        if self.replication.has_user(&user) {
            return self.client_error("login", "User already exists");
        }

        let record = UserRecord {
            user,
            timestamp,
            clock: self.clock.tick(),
        };
        slog::info!(self.logger, "New user '{}'", record.user);
        let event = self.replication.add_user(record, &mut self.clock);
        self.publish_replication(&event);

        self.status_reply("login", CREATED_STATUS)
    }

    fn create_channel(&mut self, channel: String, timestamp: u64) -> ClientReply {
        if channel.is_empty() {
            return self.client_error("channel", "Channel name must not be empty");
        }
        if self.replication.has_channel(&channel) {
            return self.client_error("channel", "Channel already exists");
        }

        let record = ChannelRecord {
            channel,
            timestamp,
            clock: self.clock.tick(),
        };
        slog::info!(self.logger, "New channel '{}'", record.channel);
        let event = self.replication.add_channel(record, &mut self.clock);
        self.publish_replication(&event);

        self.status_reply("channel", CREATED_STATUS)
    }

    fn publish(&mut self, user: String, channel: String, message: String, timestamp: u64) -> ClientReply {
        if !self.replication.has_channel(&channel) {
            return self.client_error("publish", "Channel does not exist");
        }

        let timestamp = if timestamp < MILLIS_TIMESTAMP_FLOOR {
            now_millis()
        } else {
            timestamp
        };
        let record = MessageRecord {
            kind: MessageKind::Publish {
                user,
                channel: channel.clone(),
            },
            message,
            timestamp,
            clock: self.clock.tick(),
        };

        self.store_and_deliver(&channel, record);
        self.status_reply("publish", DELIVERED_STATUS)
    }

    fn direct_message(&mut self, src: String, dst: String, message: String, timestamp: u64) -> ClientReply {
        if !self.replication.has_user(&dst) {
            return self.client_error("message", "Destination user does not exist");
        }

        let record = MessageRecord {
            kind: MessageKind::Direct { src, dst: dst.clone() },
            message,
            timestamp,
            clock: self.clock.tick(),
        };

        self.store_and_deliver(&dst, record);
        self.status_reply("message", DELIVERED_STATUS)
    }

    fn store_and_deliver(&mut self, channel_or_user: &str, record: MessageRecord) {
        let event = self.replication.append_message(record.clone(), &mut self.clock);
        self.publish_replication(&event);
        self.deliver(channel_or_user, record);
        self.count_mutation();
    }

    fn count_mutation(&mut self) {
        self.mutation_count += 1;
        if self.mutation_count % MUTATIONS_PER_CLOCK_SYNC == 0 {
            slog::debug!(self.logger, "{} mutations processed", self.mutation_count);
            self.trigger_clock_sync();
        }
    }

    fn status_reply(&mut self, service: &str, status: &str) -> ClientReply {
        ClientReply::Status {
            service: service.to_string(),
            status: status.to_string(),
            timestamp: now_seconds(),
            clock: self.clock.tick(),
        }
    }

    fn names_reply(&mut self, service: &str, names: Vec<String>) -> ClientReply {
        ClientReply::Names {
            service: service.to_string(),
            names,
            timestamp: now_seconds(),
            clock: self.clock.tick(),
        }
    }

    fn client_error(&mut self, service: &str, description: &str) -> ClientReply {
        ClientReply::Error(self.error_reply(service, description.to_string()))
    }
}
