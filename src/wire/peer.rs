use crate::wire::directory::non_empty;
use crate::wire::proto::{
    proto_peer_reply, proto_peer_request, ProtoClockReply, ProtoClockReq, ProtoElectionReply, ProtoElectionReq,
    ProtoPeerReply, ProtoPeerRequest,
};
use crate::wire::{DecodeError, ErrorReply, WireFormat};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PeerRequest {
    Clock(ClockRequest),
    Election(ElectionRequest),
}

/// Ask the coordinator for its time. `coordinator` names who the requester believes the
/// coordinator is, so a misrouted request can be refused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClockRequest {
    pub timestamp: u64,
    pub clock: u64,
    pub coordinator: Option<String>,
    pub requesting_server: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElectionRequest {
    pub timestamp: u64,
    pub clock: u64,
    pub requesting_server: String,
    pub requesting_rank: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PeerReply {
    Clock(ClockReply),
    Election(ElectionReply),
    Error(ErrorReply),
}

/// `time` is wall clock milliseconds, `timestamp` is wall clock seconds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClockReply {
    pub time: u64,
    pub timestamp: u64,
    pub clock: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElectionReply {
    pub election: String,
    pub timestamp: u64,
    pub clock: u64,
}

impl PeerRequest {
    pub fn service_name(&self) -> &'static str {
        match self {
            PeerRequest::Clock(_) => "clock",
            PeerRequest::Election(_) => "election",
        }
    }
}

impl PeerReply {
    pub fn clock(&self) -> u64 {
        match self {
            PeerReply::Clock(reply) => reply.clock,
            PeerReply::Election(reply) => reply.clock,
            PeerReply::Error(error) => error.clock,
        }
    }
}

impl WireFormat for PeerRequest {
    type Proto = ProtoPeerRequest;

    fn to_proto(&self) -> Self::Proto {
        let service = match self {
            PeerRequest::Clock(req) => proto_peer_request::Service::Clock(ProtoClockReq {
                timestamp: req.timestamp,
                clock: req.clock,
                coordinator: req.coordinator.clone().unwrap_or_default(),
                requesting_server: req.requesting_server.clone().unwrap_or_default(),
            }),
            PeerRequest::Election(req) => proto_peer_request::Service::Election(ProtoElectionReq {
                timestamp: req.timestamp,
                clock: req.clock,
                requesting_server: req.requesting_server.clone(),
                requesting_rank: req.requesting_rank,
            }),
        };

        ProtoPeerRequest { service: Some(service) }
    }

    fn try_from_proto(proto: Self::Proto) -> Result<Self, DecodeError> {
        match proto.service {
            Some(proto_peer_request::Service::Clock(req)) => Ok(PeerRequest::Clock(ClockRequest {
                timestamp: req.timestamp,
                clock: req.clock,
                coordinator: Some(req.coordinator).filter(|c| !c.is_empty()),
                requesting_server: Some(req.requesting_server).filter(|s| !s.is_empty()),
            })),
            Some(proto_peer_request::Service::Election(req)) => Ok(PeerRequest::Election(ElectionRequest {
                timestamp: req.timestamp,
                clock: req.clock,
                requesting_server: non_empty(req.requesting_server, "requesting_server")?,
                requesting_rank: req.requesting_rank,
            })),
            None => Err(DecodeError::UnknownService),
        }
    }
}

impl WireFormat for PeerReply {
    type Proto = ProtoPeerReply;

    fn to_proto(&self) -> Self::Proto {
        let service = match self {
            PeerReply::Clock(reply) => proto_peer_reply::Service::Clock(ProtoClockReply {
                time: reply.time,
                timestamp: reply.timestamp,
                clock: reply.clock,
            }),
            PeerReply::Election(reply) => proto_peer_reply::Service::Election(ProtoElectionReply {
                election: reply.election.clone(),
                timestamp: reply.timestamp,
                clock: reply.clock,
            }),
            PeerReply::Error(error) => proto_peer_reply::Service::Error(error.to_proto()),
        };

        ProtoPeerReply { service: Some(service) }
    }

    fn try_from_proto(proto: Self::Proto) -> Result<Self, DecodeError> {
        match proto.service {
            Some(proto_peer_reply::Service::Clock(reply)) => {
                if reply.time == 0 {
                    return Err(DecodeError::MissingField("time"));
                }
                Ok(PeerReply::Clock(ClockReply {
                    time: reply.time,
                    timestamp: reply.timestamp,
                    clock: reply.clock,
                }))
            }
            Some(proto_peer_reply::Service::Election(reply)) => Ok(PeerReply::Election(ElectionReply {
                election: reply.election,
                timestamp: reply.timestamp,
                clock: reply.clock,
            })),
            Some(proto_peer_reply::Service::Error(reply)) => Ok(PeerReply::Error(ErrorReply::from_proto(reply))),
            None => Err(DecodeError::UnknownService),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{decode, encode};

    #[test]
    fn clock_request_optional_fields_survive_the_wire() {
        let anonymous = PeerRequest::Clock(ClockRequest {
            timestamp: 100,
            clock: 3,
            coordinator: None,
            requesting_server: None,
        });
        let addressed = PeerRequest::Clock(ClockRequest {
            timestamp: 100,
            clock: 3,
            coordinator: Some("server_1".into()),
            requesting_server: Some("server_2".into()),
        });

        assert_eq!(decode::<PeerRequest>(&encode(&anonymous)).unwrap(), anonymous);
        assert_eq!(decode::<PeerRequest>(&encode(&addressed)).unwrap(), addressed);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let result = decode::<PeerRequest>(&[0xff, 0xff, 0xff, 0xff]);
        assert!(matches!(result, Err(DecodeError::Malformed(_))), "{:?}", result);
    }
}
