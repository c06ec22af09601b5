use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user: String,
    pub timestamp: u64,
    pub clock: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub channel: String,
    pub timestamp: u64,
    pub clock: u64,
}

/// MessageRecord is append-only. Stored on disk with a `type` tag of `publish` or `message`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    #[serde(flatten)]
    pub kind: MessageKind,
    pub message: String,
    pub timestamp: u64,
    pub clock: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MessageKind {
    #[serde(rename = "publish")]
    Publish { user: String, channel: String },
    #[serde(rename = "message")]
    Direct { src: String, dst: String },
}

impl MessageKind {
    pub fn type_tag(&self) -> &'static str {
        match self {
            MessageKind::Publish { .. } => "publish",
            MessageKind::Direct { .. } => "message",
        }
    }
}

impl MessageRecord {
    /// Identity used when a single replicated message event arrives: `(type, timestamp, clock)`.
    pub fn is_same_event(&self, other: &MessageRecord) -> bool {
        self.kind.type_tag() == other.kind.type_tag()
            && self.timestamp == other.timestamp
            && self.clock == other.clock
    }

    /// Identity used during a full-state merge. Also compares the participants.
    pub fn is_same_message(&self, other: &MessageRecord) -> bool {
        self.is_same_event(other) && self.kind == other.kind
    }
}

/// Snapshot is the whole replicated state of one server.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub users: Vec<UserRecord>,
    pub channels: Vec<ChannelRecord>,
    pub messages: Vec<MessageRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn publish(user: &str, timestamp: u64, clock: u64) -> MessageRecord {
        MessageRecord {
            kind: MessageKind::Publish {
                user: user.to_string(),
                channel: "general".to_string(),
            },
            message: "hi".to_string(),
            timestamp,
            clock,
        }
    }

    #[test]
    fn event_identity_ignores_participants() {
        let a = publish("alice", 1000, 5);
        let b = publish("bob", 1000, 5);

        assert!(a.is_same_event(&b));
        assert!(!a.is_same_message(&b));
        assert!(a.is_same_message(&a.clone()));
    }

    #[test]
    fn direct_and_publish_never_collide() {
        let a = publish("alice", 1000, 5);
        let b = MessageRecord {
            kind: MessageKind::Direct {
                src: "alice".to_string(),
                dst: "bob".to_string(),
            },
            ..a.clone()
        };

        assert!(!a.is_same_event(&b));
    }

    #[test]
    fn message_json_carries_type_tag() {
        let json = serde_json::to_value(&publish("alice", 1000, 5)).unwrap();
        assert_eq!(json["type"], "publish");
        assert_eq!(json["user"], "alice");
        assert_eq!(json["channel"], "general");

        let parsed: MessageRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, publish("alice", 1000, 5));
    }
}
