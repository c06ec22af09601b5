mod api;
mod in_memory;
mod json_file;

pub use api::DurableStore;
pub use api::StoreError;
pub use in_memory::InMemoryStore;
pub use json_file::JsonFileStore;
