use crate::wire::proto::{
    proto_client_reply, proto_client_request, ProtoChannelReq, ProtoClientReply, ProtoClientRequest,
    ProtoDirectMessageReq, ProtoListNamesReq, ProtoLoginReq, ProtoNamesReply, ProtoPublishReq, ProtoStatusReply,
};
use crate::wire::{DecodeError, ErrorReply, WireFormat};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientRequest {
    Login {
        user: String,
        timestamp: u64,
        clock: u64,
    },
    Users {
        timestamp: u64,
        clock: u64,
    },
    Channel {
        channel: String,
        timestamp: u64,
        clock: u64,
    },
    Channels {
        timestamp: u64,
        clock: u64,
    },
    Publish {
        user: String,
        channel: String,
        message: String,
        timestamp: u64,
        clock: u64,
    },
    Message {
        src: String,
        dst: String,
        message: String,
        timestamp: u64,
        clock: u64,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientReply {
    Status {
        service: String,
        status: String,
        timestamp: u64,
        clock: u64,
    },
    Names {
        service: String,
        names: Vec<String>,
        timestamp: u64,
        clock: u64,
    },
    Error(ErrorReply),
}

impl ClientRequest {
    pub fn service_name(&self) -> &'static str {
        match self {
            ClientRequest::Login { .. } => "login",
            ClientRequest::Users { .. } => "users",
            ClientRequest::Channel { .. } => "channel",
            ClientRequest::Channels { .. } => "channels",
            ClientRequest::Publish { .. } => "publish",
            ClientRequest::Message { .. } => "message",
        }
    }

    pub fn clock(&self) -> u64 {
        match self {
            ClientRequest::Login { clock, .. }
            | ClientRequest::Users { clock, .. }
            | ClientRequest::Channel { clock, .. }
            | ClientRequest::Channels { clock, .. }
            | ClientRequest::Publish { clock, .. }
            | ClientRequest::Message { clock, .. } => *clock,
        }
    }
}

impl ClientReply {
    pub fn clock(&self) -> u64 {
        match self {
            ClientReply::Status { clock, .. } | ClientReply::Names { clock, .. } => *clock,
            ClientReply::Error(error) => error.clock,
        }
    }
}

// Emptiness of names is a business rule answered with a structured reply, so the
// client codec does not reject empty strings.
impl WireFormat for ClientRequest {
    type Proto = ProtoClientRequest;

    fn to_proto(&self) -> Self::Proto {
        let service = match self.clone() {
            ClientRequest::Login { user, timestamp, clock } => {
                proto_client_request::Service::Login(ProtoLoginReq { user, timestamp, clock })
            }
            ClientRequest::Users { timestamp, clock } => {
                proto_client_request::Service::Users(ProtoListNamesReq { timestamp, clock })
            }
            ClientRequest::Channel {
                channel,
                timestamp,
                clock,
            } => proto_client_request::Service::Channel(ProtoChannelReq {
                channel,
                timestamp,
                clock,
            }),
            ClientRequest::Channels { timestamp, clock } => {
                proto_client_request::Service::Channels(ProtoListNamesReq { timestamp, clock })
            }
            ClientRequest::Publish {
                user,
                channel,
                message,
                timestamp,
                clock,
            } => proto_client_request::Service::Publish(ProtoPublishReq {
                user,
                channel,
                message,
                timestamp,
                clock,
            }),
            ClientRequest::Message {
                src,
                dst,
                message,
                timestamp,
                clock,
            } => proto_client_request::Service::Message(ProtoDirectMessageReq {
                src,
                dst,
                message,
                timestamp,
                clock,
            }),
        };

        ProtoClientRequest { service: Some(service) }
    }

    fn try_from_proto(proto: Self::Proto) -> Result<Self, DecodeError> {
        let request = match proto.service.ok_or(DecodeError::UnknownService)? {
            proto_client_request::Service::Login(req) => ClientRequest::Login {
                user: req.user,
                timestamp: req.timestamp,
                clock: req.clock,
            },
            proto_client_request::Service::Users(req) => ClientRequest::Users {
                timestamp: req.timestamp,
                clock: req.clock,
            },
            proto_client_request::Service::Channel(req) => ClientRequest::Channel {
                channel: req.channel,
                timestamp: req.timestamp,
                clock: req.clock,
            },
            proto_client_request::Service::Channels(req) => ClientRequest::Channels {
                timestamp: req.timestamp,
                clock: req.clock,
            },
            proto_client_request::Service::Publish(req) => ClientRequest::Publish {
                user: req.user,
                channel: req.channel,
                message: req.message,
                timestamp: req.timestamp,
                clock: req.clock,
            },
            proto_client_request::Service::Message(req) => ClientRequest::Message {
                src: req.src,
                dst: req.dst,
                message: req.message,
                timestamp: req.timestamp,
                clock: req.clock,
            },
        };

        Ok(request)
    }
}

impl WireFormat for ClientReply {
    type Proto = ProtoClientReply;

    fn to_proto(&self) -> Self::Proto {
        let body = match self.clone() {
            ClientReply::Status {
                service,
                status,
                timestamp,
                clock,
            } => proto_client_reply::Body::Status(ProtoStatusReply {
                service,
                status,
                timestamp,
                clock,
            }),
            ClientReply::Names {
                service,
                names,
                timestamp,
                clock,
            } => proto_client_reply::Body::Names(ProtoNamesReply {
                service,
                names,
                timestamp,
                clock,
            }),
            ClientReply::Error(error) => proto_client_reply::Body::Error(error.to_proto()),
        };

        ProtoClientReply { body: Some(body) }
    }

    fn try_from_proto(proto: Self::Proto) -> Result<Self, DecodeError> {
        match proto.body {
            Some(proto_client_reply::Body::Status(reply)) => Ok(ClientReply::Status {
                service: reply.service,
                status: reply.status,
                timestamp: reply.timestamp,
                clock: reply.clock,
            }),
            Some(proto_client_reply::Body::Names(reply)) => Ok(ClientReply::Names {
                service: reply.service,
                names: reply.names,
                timestamp: reply.timestamp,
                clock: reply.clock,
            }),
            Some(proto_client_reply::Body::Error(reply)) => Ok(ClientReply::Error(ErrorReply::from_proto(reply))),
            None => Err(DecodeError::UnknownService),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{decode, encode};

    #[test]
    fn login_with_empty_name_still_decodes() {
        let request = ClientRequest::Login {
            user: String::new(),
            timestamp: 5,
            clock: 1,
        };

        let decoded: ClientRequest = decode(&encode(&request)).unwrap();
        assert_eq!(decoded, request);
        assert_eq!(decoded.service_name(), "login");
    }

    #[test]
    fn error_reply_keeps_description() {
        let reply = ClientReply::Error(ErrorReply {
            service: "channel".into(),
            description: "channel already exists".into(),
            timestamp: 10,
            clock: 8,
        });

        let decoded: ClientReply = decode(&encode(&reply)).unwrap();
        assert_eq!(decoded, reply);
        assert_eq!(decoded.clock(), 8);
    }
}
