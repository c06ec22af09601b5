//! Binary envelopes exchanged over the transport.
//!
//! Every envelope is a tagged union with one variant per service name. Decoding validates the
//! payload of each variant, so the rest of the crate never probes fields of an untyped map.
mod client;
mod codec;
mod directory;
mod peer;
mod proto;
mod topics;

pub use client::ClientReply;
pub use client::ClientRequest;
pub use codec::decode;
pub use codec::encode;
pub use codec::DecodeError;
pub use codec::WireFormat;
pub use directory::DirectoryReply;
pub use directory::DirectoryRequest;
pub use peer::ClockReply;
pub use peer::ClockRequest;
pub use peer::ElectionReply;
pub use peer::ElectionRequest;
pub use peer::PeerReply;
pub use peer::PeerRequest;
pub use topics::Announcement;
pub use topics::Delivery;
pub use topics::ReplicationEvent;
pub use topics::ReplicationPayload;

/// `status` value carried by every error reply.
pub const ERROR_STATUS: &str = "erro";

/// `election` value a peer answers an election probe with.
pub const ELECTION_OK: &str = "OK";

/// ErrorReply is the structured error every request/reply service answers with when it cannot
/// serve a request: an undecodable envelope, an unrecognized service, or a request that was
/// routed to the wrong server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorReply {
    pub service: String,
    pub description: String,
    pub timestamp: u64,
    pub clock: u64,
}

impl ErrorReply {
    fn to_proto(&self) -> proto::ProtoErrorReply {
        proto::ProtoErrorReply {
            service: self.service.clone(),
            status: ERROR_STATUS.to_string(),
            description: self.description.clone(),
            timestamp: self.timestamp,
            clock: self.clock,
        }
    }

    fn from_proto(proto: proto::ProtoErrorReply) -> Self {
        ErrorReply {
            service: proto.service,
            description: proto.description,
            timestamp: proto.timestamp,
            clock: proto.clock,
        }
    }
}
