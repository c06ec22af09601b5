mod api;
mod local;

pub use api::client_address;
pub use api::delivery_topic;
pub use api::peer_address;
pub use api::request_with_timeout;
pub use api::PendingRequest;
pub use api::ReplyEndpoint;
pub use api::Responder;
pub use api::Subscription;
pub use api::Transport;
pub use api::TransportError;
pub use api::DIRECTORY_ADDRESS;
pub use api::REPLICATION_TOPIC;
pub use api::SERVERS_TOPIC;
pub use local::LocalNetwork;
