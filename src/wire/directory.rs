use crate::model::RosterEntry;
use crate::wire::proto::{
    proto_directory_reply, proto_directory_request, ProtoDirectoryReply, ProtoDirectoryRequest, ProtoHeartbeatReply,
    ProtoHeartbeatReq, ProtoListReply, ProtoListReq, ProtoRankReply, ProtoRankReq, ProtoRosterEntry,
};
use crate::wire::{DecodeError, ErrorReply, WireFormat};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DirectoryRequest {
    Rank { name: String, timestamp: u64, clock: u64 },
    Heartbeat { name: String, timestamp: u64, clock: u64 },
    List { timestamp: u64, clock: u64 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DirectoryReply {
    Rank { rank: u64, timestamp: u64, clock: u64 },
    Heartbeat { timestamp: u64, clock: u64 },
    List { roster: Vec<RosterEntry>, timestamp: u64, clock: u64 },
    Error(ErrorReply),
}

impl DirectoryRequest {
    pub fn service_name(&self) -> &'static str {
        match self {
            DirectoryRequest::Rank { .. } => "rank",
            DirectoryRequest::Heartbeat { .. } => "heartbeat",
            DirectoryRequest::List { .. } => "list",
        }
    }
}

impl WireFormat for DirectoryRequest {
    type Proto = ProtoDirectoryRequest;

    fn to_proto(&self) -> Self::Proto {
        let service = match self {
            DirectoryRequest::Rank { name, timestamp, clock } => {
                proto_directory_request::Service::Rank(ProtoRankReq {
                    name: name.clone(),
                    timestamp: *timestamp,
                    clock: *clock,
                })
            }
            DirectoryRequest::Heartbeat { name, timestamp, clock } => {
                proto_directory_request::Service::Heartbeat(ProtoHeartbeatReq {
                    name: name.clone(),
                    timestamp: *timestamp,
                    clock: *clock,
                })
            }
            DirectoryRequest::List { timestamp, clock } => proto_directory_request::Service::List(ProtoListReq {
                timestamp: *timestamp,
                clock: *clock,
            }),
        };

        ProtoDirectoryRequest { service: Some(service) }
    }

    fn try_from_proto(proto: Self::Proto) -> Result<Self, DecodeError> {
        match proto.service {
            Some(proto_directory_request::Service::Rank(req)) => Ok(DirectoryRequest::Rank {
                name: non_empty(req.name, "name")?,
                timestamp: req.timestamp,
                clock: req.clock,
            }),
            Some(proto_directory_request::Service::Heartbeat(req)) => Ok(DirectoryRequest::Heartbeat {
                name: non_empty(req.name, "name")?,
                timestamp: req.timestamp,
                clock: req.clock,
            }),
            Some(proto_directory_request::Service::List(req)) => Ok(DirectoryRequest::List {
                timestamp: req.timestamp,
                clock: req.clock,
            }),
            None => Err(DecodeError::UnknownService),
        }
    }
}

impl WireFormat for DirectoryReply {
    type Proto = ProtoDirectoryReply;

    fn to_proto(&self) -> Self::Proto {
        let service = match self {
            DirectoryReply::Rank { rank, timestamp, clock } => proto_directory_reply::Service::Rank(ProtoRankReply {
                rank: *rank,
                timestamp: *timestamp,
                clock: *clock,
            }),
            DirectoryReply::Heartbeat { timestamp, clock } => {
                proto_directory_reply::Service::Heartbeat(ProtoHeartbeatReply {
                    timestamp: *timestamp,
                    clock: *clock,
                })
            }
            DirectoryReply::List {
                roster,
                timestamp,
                clock,
            } => proto_directory_reply::Service::List(ProtoListReply {
                list: roster
                    .iter()
                    .map(|entry| ProtoRosterEntry {
                        name: entry.name.clone(),
                        rank: entry.rank,
                    })
                    .collect(),
                timestamp: *timestamp,
                clock: *clock,
            }),
            DirectoryReply::Error(error) => proto_directory_reply::Service::Error(error.to_proto()),
        };

        ProtoDirectoryReply { service: Some(service) }
    }

    fn try_from_proto(proto: Self::Proto) -> Result<Self, DecodeError> {
        match proto.service {
            Some(proto_directory_reply::Service::Rank(reply)) => {
                // Ranks start at 1. A zero rank means the field was never set.
                if reply.rank == 0 {
                    return Err(DecodeError::MissingField("rank"));
                }
                Ok(DirectoryReply::Rank {
                    rank: reply.rank,
                    timestamp: reply.timestamp,
                    clock: reply.clock,
                })
            }
            Some(proto_directory_reply::Service::Heartbeat(reply)) => Ok(DirectoryReply::Heartbeat {
                timestamp: reply.timestamp,
                clock: reply.clock,
            }),
            Some(proto_directory_reply::Service::List(reply)) => Ok(DirectoryReply::List {
                roster: reply
                    .list
                    .into_iter()
                    .map(|entry| RosterEntry {
                        name: entry.name,
                        rank: entry.rank,
                    })
                    .collect(),
                timestamp: reply.timestamp,
                clock: reply.clock,
            }),
            Some(proto_directory_reply::Service::Error(reply)) => Ok(DirectoryReply::Error(ErrorReply::from_proto(reply))),
            None => Err(DecodeError::UnknownService),
        }
    }
}

pub(super) fn non_empty(value: String, field: &'static str) -> Result<String, DecodeError> {
    if value.is_empty() {
        Err(DecodeError::MissingField(field))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{decode, encode};

    #[test]
    fn list_reply_keeps_roster_order() {
        let reply = DirectoryReply::List {
            roster: vec![
                RosterEntry {
                    name: "server_a".into(),
                    rank: 1,
                },
                RosterEntry {
                    name: "server_b".into(),
                    rank: 2,
                },
            ],
            timestamp: 17,
            clock: 9,
        };

        let decoded: DirectoryReply = decode(&encode(&reply)).unwrap();
        assert_eq!(decoded, reply);
    }

    #[test]
    fn rank_request_without_name_is_rejected() {
        let bytes = encode(&DirectoryRequest::Rank {
            name: String::new(),
            timestamp: 1,
            clock: 1,
        });

        match decode::<DirectoryRequest>(&bytes) {
            Err(DecodeError::MissingField("name")) => {}
            other => panic!("Unexpected decode result: {:?}", other),
        }
    }

    #[test]
    fn empty_envelope_has_no_service() {
        match decode::<DirectoryRequest>(&[]) {
            Err(DecodeError::UnknownService) => {}
            other => panic!("Unexpected decode result: {:?}", other),
        }
    }
}
