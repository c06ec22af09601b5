use crate::model::{ChannelRecord, MessageRecord, Snapshot, UserRecord};
use crate::storage::{DurableStore, StoreError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const USERS_FILE: &str = "users.json";
const CHANNELS_FILE: &str = "channels.json";
const MESSAGES_FILE: &str = "messages.json";

/// JsonFileStore keeps one pretty-printed JSON array per table in a per-server directory.
pub struct JsonFileStore {
    directory: PathBuf,
}

impl JsonFileStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        JsonFileStore {
            directory: directory.into(),
        }
    }

    fn path(&self, file_name: &str) -> PathBuf {
        self.directory.join(file_name)
    }

    fn read_list<T: DeserializeOwned>(&self, file_name: &str) -> Result<Vec<T>, StoreError> {
        let path = self.path(file_name);
        let contents = match fs::read(&path) {
            Ok(contents) => contents,
            // First boot.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        serde_json::from_slice(&contents).map_err(|source| StoreError::Malformed { path, source })
    }

    fn write_list<T: Serialize>(&self, file_name: &str, list: &[T]) -> Result<(), StoreError> {
        idempotent_create_dir(&self.directory)?;

        let path = self.path(file_name);
        let contents = serde_json::to_vec_pretty(list).map_err(|source| StoreError::Malformed {
            path: path.clone(),
            source,
        })?;

        // Write-then-rename so a crash mid-write never leaves a truncated table behind.
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, contents).map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &path).map_err(|source| StoreError::Io { path, source })
    }
}

impl DurableStore for JsonFileStore {
    fn load(&mut self) -> Result<Snapshot, StoreError> {
        Ok(Snapshot {
            users: self.read_list(USERS_FILE)?,
            channels: self.read_list(CHANNELS_FILE)?,
            messages: self.read_list(MESSAGES_FILE)?,
        })
    }

    fn save_users(&mut self, users: &[UserRecord]) -> Result<(), StoreError> {
        self.write_list(USERS_FILE, users)
    }

    fn save_channels(&mut self, channels: &[ChannelRecord]) -> Result<(), StoreError> {
        self.write_list(CHANNELS_FILE, channels)
    }

    fn save_messages(&mut self, messages: &[MessageRecord]) -> Result<(), StoreError> {
        self.write_list(MESSAGES_FILE, messages)
    }
}

fn idempotent_create_dir(path: &Path) -> Result<(), StoreError> {
    match fs::create_dir_all(path) {
        Ok(_) => Ok(()),
        Err(e) => match e.kind() {
            ErrorKind::AlreadyExists => Ok(()),
            _ => Err(StoreError::Io {
                path: path.to_path_buf(),
                source: e,
            }),
        },
    }
}
