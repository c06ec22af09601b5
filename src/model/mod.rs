mod identity;
mod records;

pub use identity::RosterEntry;
pub use identity::ServerIdentity;
pub use records::ChannelRecord;
pub use records::MessageKind;
pub use records::MessageRecord;
pub use records::Snapshot;
pub use records::UserRecord;
