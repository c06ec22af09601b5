// ---------- Directory authority ----------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoDirectoryRequest {
    #[prost(oneof="proto_directory_request::Service", tags="1, 2, 3")]
    pub service: ::core::option::Option<proto_directory_request::Service>,
}
/// Nested message and enum types in `ProtoDirectoryRequest`.
pub mod proto_directory_request {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Service {
        #[prost(message, tag="1")]
        Rank(super::ProtoRankReq),
        #[prost(message, tag="2")]
        Heartbeat(super::ProtoHeartbeatReq),
        #[prost(message, tag="3")]
        List(super::ProtoListReq),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoRankReq {
    #[prost(string, tag="1")]
    pub name: ::prost::alloc::string::String,
    #[prost(uint64, tag="2")]
    pub timestamp: u64,
    #[prost(uint64, tag="3")]
    pub clock: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoHeartbeatReq {
    #[prost(string, tag="1")]
    pub name: ::prost::alloc::string::String,
    #[prost(uint64, tag="2")]
    pub timestamp: u64,
    #[prost(uint64, tag="3")]
    pub clock: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoListReq {
    #[prost(uint64, tag="1")]
    pub timestamp: u64,
    #[prost(uint64, tag="2")]
    pub clock: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoDirectoryReply {
    #[prost(oneof="proto_directory_reply::Service", tags="1, 2, 3, 4")]
    pub service: ::core::option::Option<proto_directory_reply::Service>,
}
/// Nested message and enum types in `ProtoDirectoryReply`.
pub mod proto_directory_reply {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Service {
        #[prost(message, tag="1")]
        Rank(super::ProtoRankReply),
        #[prost(message, tag="2")]
        Heartbeat(super::ProtoHeartbeatReply),
        #[prost(message, tag="3")]
        List(super::ProtoListReply),
        #[prost(message, tag="4")]
        Error(super::ProtoErrorReply),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoRankReply {
    #[prost(uint64, tag="1")]
    pub rank: u64,
    #[prost(uint64, tag="2")]
    pub timestamp: u64,
    #[prost(uint64, tag="3")]
    pub clock: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoHeartbeatReply {
    #[prost(uint64, tag="1")]
    pub timestamp: u64,
    #[prost(uint64, tag="2")]
    pub clock: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoListReply {
    #[prost(message, repeated, tag="1")]
    pub list: ::prost::alloc::vec::Vec<ProtoRosterEntry>,
    #[prost(uint64, tag="2")]
    pub timestamp: u64,
    #[prost(uint64, tag="3")]
    pub clock: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoRosterEntry {
    #[prost(string, tag="1")]
    pub name: ::prost::alloc::string::String,
    #[prost(uint64, tag="2")]
    pub rank: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoErrorReply {
    #[prost(string, tag="1")]
    pub service: ::prost::alloc::string::String,
    #[prost(string, tag="2")]
    pub status: ::prost::alloc::string::String,
    #[prost(string, tag="3")]
    pub description: ::prost::alloc::string::String,
    #[prost(uint64, tag="4")]
    pub timestamp: u64,
    #[prost(uint64, tag="5")]
    pub clock: u64,
}
// ---------- Peer to peer ----------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoPeerRequest {
    #[prost(oneof="proto_peer_request::Service", tags="1, 2")]
    pub service: ::core::option::Option<proto_peer_request::Service>,
}
/// Nested message and enum types in `ProtoPeerRequest`.
pub mod proto_peer_request {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Service {
        #[prost(message, tag="1")]
        Clock(super::ProtoClockReq),
        #[prost(message, tag="2")]
        Election(super::ProtoElectionReq),
    }
}
/// Empty `coordinator` / `requesting_server` means not given.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoClockReq {
    #[prost(uint64, tag="1")]
    pub timestamp: u64,
    #[prost(uint64, tag="2")]
    pub clock: u64,
    #[prost(string, tag="3")]
    pub coordinator: ::prost::alloc::string::String,
    #[prost(string, tag="4")]
    pub requesting_server: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoElectionReq {
    #[prost(uint64, tag="1")]
    pub timestamp: u64,
    #[prost(uint64, tag="2")]
    pub clock: u64,
    #[prost(string, tag="3")]
    pub requesting_server: ::prost::alloc::string::String,
    #[prost(uint64, tag="4")]
    pub requesting_rank: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoPeerReply {
    #[prost(oneof="proto_peer_reply::Service", tags="1, 2, 3")]
    pub service: ::core::option::Option<proto_peer_reply::Service>,
}
/// Nested message and enum types in `ProtoPeerReply`.
pub mod proto_peer_reply {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Service {
        #[prost(message, tag="1")]
        Clock(super::ProtoClockReply),
        #[prost(message, tag="2")]
        Election(super::ProtoElectionReply),
        #[prost(message, tag="3")]
        Error(super::ProtoErrorReply),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoClockReply {
    #[prost(uint64, tag="1")]
    pub time: u64,
    #[prost(uint64, tag="2")]
    pub timestamp: u64,
    #[prost(uint64, tag="3")]
    pub clock: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoElectionReply {
    #[prost(string, tag="1")]
    pub election: ::prost::alloc::string::String,
    #[prost(uint64, tag="2")]
    pub timestamp: u64,
    #[prost(uint64, tag="3")]
    pub clock: u64,
}
// ---------- "servers" topic ----------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoServersMessage {
    #[prost(oneof="proto_servers_message::Service", tags="1")]
    pub service: ::core::option::Option<proto_servers_message::Service>,
}
/// Nested message and enum types in `ProtoServersMessage`.
pub mod proto_servers_message {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Service {
        #[prost(message, tag="1")]
        Election(super::ProtoAnnouncement),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoAnnouncement {
    #[prost(string, tag="1")]
    pub coordinator: ::prost::alloc::string::String,
    #[prost(uint64, tag="2")]
    pub timestamp: u64,
    #[prost(uint64, tag="3")]
    pub clock: u64,
}
// ---------- "replication" topic ----------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoReplicationEvent {
    #[prost(string, tag="1")]
    pub origin_server: ::prost::alloc::string::String,
    #[prost(uint64, tag="2")]
    pub timestamp: u64,
    #[prost(uint64, tag="3")]
    pub clock: u64,
    #[prost(oneof="proto_replication_event::DataType", tags="4, 5, 6, 7, 8")]
    pub data_type: ::core::option::Option<proto_replication_event::DataType>,
}
/// Nested message and enum types in `ProtoReplicationEvent`.
pub mod proto_replication_event {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum DataType {
        #[prost(message, tag="4")]
        User(super::ProtoUserRecord),
        #[prost(message, tag="5")]
        Channel(super::ProtoChannelRecord),
        #[prost(message, tag="6")]
        Message(super::ProtoMessageRecord),
        #[prost(message, tag="7")]
        Sync(super::ProtoSnapshot),
        #[prost(message, tag="8")]
        SyncRequest(super::ProtoSyncRequest),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoUserRecord {
    #[prost(string, tag="1")]
    pub user: ::prost::alloc::string::String,
    #[prost(uint64, tag="2")]
    pub timestamp: u64,
    #[prost(uint64, tag="3")]
    pub clock: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoChannelRecord {
    #[prost(string, tag="1")]
    pub channel: ::prost::alloc::string::String,
    #[prost(uint64, tag="2")]
    pub timestamp: u64,
    #[prost(uint64, tag="3")]
    pub clock: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoMessageRecord {
    #[prost(string, tag="1")]
    pub message: ::prost::alloc::string::String,
    #[prost(uint64, tag="2")]
    pub timestamp: u64,
    #[prost(uint64, tag="3")]
    pub clock: u64,
    #[prost(oneof="proto_message_record::Kind", tags="4, 5")]
    pub kind: ::core::option::Option<proto_message_record::Kind>,
}
/// Nested message and enum types in `ProtoMessageRecord`.
pub mod proto_message_record {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Kind {
        #[prost(message, tag="4")]
        Publish(super::ProtoPublishKind),
        #[prost(message, tag="5")]
        Direct(super::ProtoDirectKind),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoPublishKind {
    #[prost(string, tag="1")]
    pub user: ::prost::alloc::string::String,
    #[prost(string, tag="2")]
    pub channel: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoDirectKind {
    #[prost(string, tag="1")]
    pub src: ::prost::alloc::string::String,
    #[prost(string, tag="2")]
    pub dst: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoSnapshot {
    #[prost(message, repeated, tag="1")]
    pub users: ::prost::alloc::vec::Vec<ProtoUserRecord>,
    #[prost(message, repeated, tag="2")]
    pub channels: ::prost::alloc::vec::Vec<ProtoChannelRecord>,
    #[prost(message, repeated, tag="3")]
    pub messages: ::prost::alloc::vec::Vec<ProtoMessageRecord>,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoSyncRequest {
}
// ---------- Client facing ----------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoClientRequest {
    #[prost(oneof="proto_client_request::Service", tags="1, 2, 3, 4, 5, 6")]
    pub service: ::core::option::Option<proto_client_request::Service>,
}
/// Nested message and enum types in `ProtoClientRequest`.
pub mod proto_client_request {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Service {
        #[prost(message, tag="1")]
        Login(super::ProtoLoginReq),
        #[prost(message, tag="2")]
        Users(super::ProtoListNamesReq),
        #[prost(message, tag="3")]
        Channel(super::ProtoChannelReq),
        #[prost(message, tag="4")]
        Channels(super::ProtoListNamesReq),
        #[prost(message, tag="5")]
        Publish(super::ProtoPublishReq),
        #[prost(message, tag="6")]
        Message(super::ProtoDirectMessageReq),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoLoginReq {
    #[prost(string, tag="1")]
    pub user: ::prost::alloc::string::String,
    #[prost(uint64, tag="2")]
    pub timestamp: u64,
    #[prost(uint64, tag="3")]
    pub clock: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoListNamesReq {
    #[prost(uint64, tag="1")]
    pub timestamp: u64,
    #[prost(uint64, tag="2")]
    pub clock: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoChannelReq {
    #[prost(string, tag="1")]
    pub channel: ::prost::alloc::string::String,
    #[prost(uint64, tag="2")]
    pub timestamp: u64,
    #[prost(uint64, tag="3")]
    pub clock: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoPublishReq {
    #[prost(string, tag="1")]
    pub user: ::prost::alloc::string::String,
    #[prost(string, tag="2")]
    pub channel: ::prost::alloc::string::String,
    #[prost(string, tag="3")]
    pub message: ::prost::alloc::string::String,
    #[prost(uint64, tag="4")]
    pub timestamp: u64,
    #[prost(uint64, tag="5")]
    pub clock: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoDirectMessageReq {
    #[prost(string, tag="1")]
    pub src: ::prost::alloc::string::String,
    #[prost(string, tag="2")]
    pub dst: ::prost::alloc::string::String,
    #[prost(string, tag="3")]
    pub message: ::prost::alloc::string::String,
    #[prost(uint64, tag="4")]
    pub timestamp: u64,
    #[prost(uint64, tag="5")]
    pub clock: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoClientReply {
    #[prost(oneof="proto_client_reply::Body", tags="1, 2, 3")]
    pub body: ::core::option::Option<proto_client_reply::Body>,
}
/// Nested message and enum types in `ProtoClientReply`.
pub mod proto_client_reply {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Body {
        #[prost(message, tag="1")]
        Status(super::ProtoStatusReply),
        #[prost(message, tag="2")]
        Names(super::ProtoNamesReply),
        #[prost(message, tag="3")]
        Error(super::ProtoErrorReply),
    }
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoStatusReply {
    #[prost(string, tag="1")]
    pub service: ::prost::alloc::string::String,
    #[prost(string, tag="2")]
    pub status: ::prost::alloc::string::String,
    #[prost(uint64, tag="3")]
    pub timestamp: u64,
    #[prost(uint64, tag="4")]
    pub clock: u64,
}
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoNamesReply {
    #[prost(string, tag="1")]
    pub service: ::prost::alloc::string::String,
    #[prost(string, repeated, tag="2")]
    pub names: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(uint64, tag="3")]
    pub timestamp: u64,
    #[prost(uint64, tag="4")]
    pub clock: u64,
}
// ---------- Channel / user delivery topics ----------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoDelivery {
    #[prost(oneof="proto_delivery::Service", tags="1, 2")]
    pub service: ::core::option::Option<proto_delivery::Service>,
}
/// Nested message and enum types in `ProtoDelivery`.
pub mod proto_delivery {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Service {
        #[prost(message, tag="1")]
        Publish(super::ProtoPublishReq),
        #[prost(message, tag="2")]
        Message(super::ProtoDirectMessageReq),
    }
}
