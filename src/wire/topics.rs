//! Envelopes published on the pub/sub topics rather than exchanged as request/reply.
use crate::model::{ChannelRecord, MessageKind, MessageRecord, Snapshot, UserRecord};
use crate::wire::directory::non_empty;
use crate::wire::proto::{
    proto_delivery, proto_message_record, proto_replication_event, proto_servers_message, ProtoAnnouncement,
    ProtoChannelRecord, ProtoDelivery, ProtoDirectKind, ProtoDirectMessageReq, ProtoMessageRecord, ProtoPublishKind,
    ProtoPublishReq, ProtoReplicationEvent, ProtoServersMessage, ProtoSnapshot, ProtoSyncRequest, ProtoUserRecord,
};
use crate::wire::{DecodeError, WireFormat};

/// Coordinator announcement on the `servers` topic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Announcement {
    pub coordinator: String,
    pub timestamp: u64,
    pub clock: u64,
}

/// One event on the `replication` topic. `origin_server` lets receivers drop their own events.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplicationEvent {
    pub origin_server: String,
    pub timestamp: u64,
    pub clock: u64,
    pub payload: ReplicationPayload,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplicationPayload {
    User(UserRecord),
    Channel(ChannelRecord),
    Message(MessageRecord),
    Sync(Snapshot),
    SyncRequest,
}

impl ReplicationPayload {
    pub fn data_type(&self) -> &'static str {
        match self {
            ReplicationPayload::User(_) => "user",
            ReplicationPayload::Channel(_) => "channel",
            ReplicationPayload::Message(_) => "message",
            ReplicationPayload::Sync(_) => "sync",
            ReplicationPayload::SyncRequest => "sync_request",
        }
    }
}

/// A chat message pushed to subscribers of a channel or of a user's inbox.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery(pub MessageRecord);

impl WireFormat for Announcement {
    type Proto = ProtoServersMessage;

    fn to_proto(&self) -> Self::Proto {
        ProtoServersMessage {
            service: Some(proto_servers_message::Service::Election(ProtoAnnouncement {
                coordinator: self.coordinator.clone(),
                timestamp: self.timestamp,
                clock: self.clock,
            })),
        }
    }

    fn try_from_proto(proto: Self::Proto) -> Result<Self, DecodeError> {
        match proto.service {
            Some(proto_servers_message::Service::Election(announcement)) => Ok(Announcement {
                coordinator: non_empty(announcement.coordinator, "coordinator")?,
                timestamp: announcement.timestamp,
                clock: announcement.clock,
            }),
            None => Err(DecodeError::UnknownService),
        }
    }
}

impl WireFormat for ReplicationEvent {
    type Proto = ProtoReplicationEvent;

    fn to_proto(&self) -> Self::Proto {
        let data_type = match &self.payload {
            ReplicationPayload::User(user) => proto_replication_event::DataType::User(user_to_proto(user)),
            ReplicationPayload::Channel(channel) => {
                proto_replication_event::DataType::Channel(channel_to_proto(channel))
            }
            ReplicationPayload::Message(message) => {
                proto_replication_event::DataType::Message(message_to_proto(message))
            }
            ReplicationPayload::Sync(snapshot) => proto_replication_event::DataType::Sync(ProtoSnapshot {
                users: snapshot.users.iter().map(user_to_proto).collect(),
                channels: snapshot.channels.iter().map(channel_to_proto).collect(),
                messages: snapshot.messages.iter().map(message_to_proto).collect(),
            }),
            ReplicationPayload::SyncRequest => proto_replication_event::DataType::SyncRequest(ProtoSyncRequest {}),
        };

        ProtoReplicationEvent {
            origin_server: self.origin_server.clone(),
            timestamp: self.timestamp,
            clock: self.clock,
            data_type: Some(data_type),
        }
    }

    fn try_from_proto(proto: Self::Proto) -> Result<Self, DecodeError> {
        let payload = match proto.data_type {
            Some(proto_replication_event::DataType::User(user)) => ReplicationPayload::User(user_from_proto(user)?),
            Some(proto_replication_event::DataType::Channel(channel)) => {
                ReplicationPayload::Channel(channel_from_proto(channel)?)
            }
            Some(proto_replication_event::DataType::Message(message)) => {
                ReplicationPayload::Message(message_from_proto(message)?)
            }
            Some(proto_replication_event::DataType::Sync(snapshot)) => ReplicationPayload::Sync(Snapshot {
                users: snapshot
                    .users
                    .into_iter()
                    .map(user_from_proto)
                    .collect::<Result<_, _>>()?,
                channels: snapshot
                    .channels
                    .into_iter()
                    .map(channel_from_proto)
                    .collect::<Result<_, _>>()?,
                messages: snapshot
                    .messages
                    .into_iter()
                    .map(message_from_proto)
                    .collect::<Result<_, _>>()?,
            }),
            Some(proto_replication_event::DataType::SyncRequest(_)) => ReplicationPayload::SyncRequest,
            None => return Err(DecodeError::UnknownService),
        };

        Ok(ReplicationEvent {
            origin_server: non_empty(proto.origin_server, "origin_server")?,
            timestamp: proto.timestamp,
            clock: proto.clock,
            payload,
        })
    }
}

impl WireFormat for Delivery {
    type Proto = ProtoDelivery;

    fn to_proto(&self) -> Self::Proto {
        let record = &self.0;
        let service = match &record.kind {
            MessageKind::Publish { user, channel } => proto_delivery::Service::Publish(ProtoPublishReq {
                user: user.clone(),
                channel: channel.clone(),
                message: record.message.clone(),
                timestamp: record.timestamp,
                clock: record.clock,
            }),
            MessageKind::Direct { src, dst } => proto_delivery::Service::Message(ProtoDirectMessageReq {
                src: src.clone(),
                dst: dst.clone(),
                message: record.message.clone(),
                timestamp: record.timestamp,
                clock: record.clock,
            }),
        };

        ProtoDelivery { service: Some(service) }
    }

    fn try_from_proto(proto: Self::Proto) -> Result<Self, DecodeError> {
        let record = match proto.service {
            Some(proto_delivery::Service::Publish(req)) => MessageRecord {
                kind: MessageKind::Publish {
                    user: req.user,
                    channel: non_empty(req.channel, "channel")?,
                },
                message: req.message,
                timestamp: req.timestamp,
                clock: req.clock,
            },
            Some(proto_delivery::Service::Message(req)) => MessageRecord {
                kind: MessageKind::Direct {
                    src: req.src,
                    dst: non_empty(req.dst, "dst")?,
                },
                message: req.message,
                timestamp: req.timestamp,
                clock: req.clock,
            },
            None => return Err(DecodeError::UnknownService),
        };

        Ok(Delivery(record))
    }
}

fn user_to_proto(user: &UserRecord) -> ProtoUserRecord {
    ProtoUserRecord {
        user: user.user.clone(),
        timestamp: user.timestamp,
        clock: user.clock,
    }
}

fn user_from_proto(proto: ProtoUserRecord) -> Result<UserRecord, DecodeError> {
    Ok(UserRecord {
        user: non_empty(proto.user, "user")?,
        timestamp: proto.timestamp,
        clock: proto.clock,
    })
}

fn channel_to_proto(channel: &ChannelRecord) -> ProtoChannelRecord {
    ProtoChannelRecord {
        channel: channel.channel.clone(),
        timestamp: channel.timestamp,
        clock: channel.clock,
    }
}

fn channel_from_proto(proto: ProtoChannelRecord) -> Result<ChannelRecord, DecodeError> {
    Ok(ChannelRecord {
        channel: non_empty(proto.channel, "channel")?,
        timestamp: proto.timestamp,
        clock: proto.clock,
    })
}

fn message_to_proto(message: &MessageRecord) -> ProtoMessageRecord {
    let kind = match &message.kind {
        MessageKind::Publish { user, channel } => proto_message_record::Kind::Publish(ProtoPublishKind {
            user: user.clone(),
            channel: channel.clone(),
        }),
        MessageKind::Direct { src, dst } => proto_message_record::Kind::Direct(ProtoDirectKind {
            src: src.clone(),
            dst: dst.clone(),
        }),
    };

    ProtoMessageRecord {
        message: message.message.clone(),
        timestamp: message.timestamp,
        clock: message.clock,
        kind: Some(kind),
    }
}

fn message_from_proto(proto: ProtoMessageRecord) -> Result<MessageRecord, DecodeError> {
    let kind = match proto.kind {
        Some(proto_message_record::Kind::Publish(publish)) => MessageKind::Publish {
            user: publish.user,
            channel: publish.channel,
        },
        Some(proto_message_record::Kind::Direct(direct)) => MessageKind::Direct {
            src: direct.src,
            dst: direct.dst,
        },
        None => return Err(DecodeError::MissingField("kind")),
    };

    Ok(MessageRecord {
        kind,
        message: proto.message,
        timestamp: proto.timestamp,
        clock: proto.clock,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{decode, encode};

    #[test]
    fn sync_event_carries_full_snapshot() {
        let snapshot = Snapshot {
            users: vec![UserRecord {
                user: "alice".into(),
                timestamp: 10,
                clock: 2,
            }],
            channels: vec![ChannelRecord {
                channel: "general".into(),
                timestamp: 11,
                clock: 3,
            }],
            messages: vec![MessageRecord {
                kind: MessageKind::Direct {
                    src: "alice".into(),
                    dst: "bob".into(),
                },
                message: "hey".into(),
                timestamp: 1_700_000_000_000,
                clock: 4,
            }],
        };
        let event = ReplicationEvent {
            origin_server: "server_1".into(),
            timestamp: 12,
            clock: 5,
            payload: ReplicationPayload::Sync(snapshot),
        };

        let decoded: ReplicationEvent = decode(&encode(&event)).unwrap();
        assert_eq!(decoded, event);
        assert_eq!(decoded.payload.data_type(), "sync");
    }

    #[test]
    fn replication_event_without_origin_is_rejected() {
        let event = ReplicationEvent {
            origin_server: String::new(),
            timestamp: 1,
            clock: 1,
            payload: ReplicationPayload::SyncRequest,
        };

        match decode::<ReplicationEvent>(&encode(&event)) {
            Err(DecodeError::MissingField("origin_server")) => {}
            other => panic!("Unexpected decode result: {:?}", other),
        }
    }

    #[test]
    fn announcement_requires_a_coordinator() {
        let announcement = Announcement {
            coordinator: String::new(),
            timestamp: 1,
            clock: 1,
        };

        assert!(decode::<Announcement>(&encode(&announcement)).is_err());
    }
}
