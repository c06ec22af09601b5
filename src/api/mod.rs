//! This mod is meant to hold most of the code for the library's client-facing API.
mod client;
mod event_bus;
mod handle;
mod options;
mod wiring;

pub use client::ChatClient;
pub use client::ClientError;
pub use client::DeliveryStream;
pub use event_bus::CoordinatorEvent;
pub use event_bus::CoordinatorEventListener;
pub use event_bus::FollowerEventData;
pub use handle::ChatServerHandle;
pub use options::ServerOptions;
pub use wiring::try_create_chat_server;
pub use wiring::try_create_chat_server_with_store;
pub use wiring::ServerConfig;
pub use wiring::ServerCreationError;
