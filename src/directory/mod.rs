mod authority;
mod client;

pub use authority::DirectoryAuthority;
pub use authority::DirectoryAuthorityHandle;
pub use authority::DirectoryAuthorityOptions;
pub use client::DirectoryError;
pub(crate) use client::DirectoryResponse;
pub(crate) use client::PeerDirectoryClient;
