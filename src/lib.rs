mod actor;
mod api;
mod clock;
mod directory;
mod listener;
mod model;
mod server;
mod storage;
mod timers;
mod transport;
mod wire;

pub use actor::ActorExited;
pub use api::try_create_chat_server;
pub use api::try_create_chat_server_with_store;
pub use api::ChatClient;
pub use api::ChatServerHandle;
pub use api::ClientError;
pub use api::CoordinatorEvent;
pub use api::CoordinatorEventListener;
pub use api::DeliveryStream;
pub use api::FollowerEventData;
pub use api::ServerConfig;
pub use api::ServerCreationError;
pub use api::ServerOptions;
pub use clock::LogicalClock;
pub use directory::DirectoryAuthority;
pub use directory::DirectoryAuthorityHandle;
pub use directory::DirectoryAuthorityOptions;
pub use directory::DirectoryError;
pub use model::ChannelRecord;
pub use model::MessageKind;
pub use model::MessageRecord;
pub use model::RosterEntry;
pub use model::ServerIdentity;
pub use model::Snapshot;
pub use model::UserRecord;
pub use server::ServerStatus;
pub use storage::DurableStore;
pub use storage::InMemoryStore;
pub use storage::JsonFileStore;
pub use storage::StoreError;
pub use transport::LocalNetwork;
pub use transport::PendingRequest;
pub use transport::ReplyEndpoint;
pub use transport::Responder;
pub use transport::Subscription;
pub use transport::Transport;
pub use transport::TransportError;
pub use transport::{client_address, delivery_topic, peer_address, DIRECTORY_ADDRESS, REPLICATION_TOPIC, SERVERS_TOPIC};
pub use wire::decode;
pub use wire::encode;
pub use wire::Announcement;
pub use wire::ClientReply;
pub use wire::ClientRequest;
pub use wire::ClockReply;
pub use wire::ClockRequest;
pub use wire::DecodeError;
pub use wire::Delivery;
pub use wire::DirectoryReply;
pub use wire::DirectoryRequest;
pub use wire::ElectionReply;
pub use wire::ElectionRequest;
pub use wire::ErrorReply;
pub use wire::PeerReply;
pub use wire::PeerRequest;
pub use wire::ReplicationEvent;
pub use wire::ReplicationPayload;
pub use wire::WireFormat;

// Learning 1: `create::{root_mod}` should not have any code. Just `mod` and `pub use` statements.
// Learning 2: All `mod` statements, anywhere, should not be `pub`. Only export `pub` via individual
//             use statements.
