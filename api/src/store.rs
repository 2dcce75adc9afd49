use crate::User;
use crate::client::{ApiError, ApiResult};
use log::warn;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const USER_KEY: &str = "user";

/// Key-value storage for the two persisted client entries: the access token
/// and the serialized user record.
pub trait CredentialStore: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> ApiResult<()>;
    fn remove(&self, key: &str) -> ApiResult<()>;

    /// Stores every entry or, where the backend allows it, none of them.
    fn set_many(&self, entries: &[(&str, &str)]) -> ApiResult<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    fn token(&self) -> Option<String> {
        self.get(ACCESS_TOKEN_KEY).filter(|t| !t.trim().is_empty())
    }

    /// `Err` when a user entry exists but does not deserialize.
    fn user(&self) -> ApiResult<Option<User>> {
        let Some(raw) = self.get(USER_KEY) else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| ApiError::Storage(format!("stored user record is corrupt: {e}")))
    }

    fn save(&self, token: &str, user: &User) -> ApiResult<()> {
        let raw = serde_json::to_string(user)
            .map_err(|e| ApiError::Storage(format!("serialize user failed: {e}")))?;
        self.set_many(&[(ACCESS_TOKEN_KEY, token), (USER_KEY, raw.as_str())])
    }

    fn clear(&self) -> ApiResult<()> {
        self.remove(ACCESS_TOKEN_KEY)?;
        self.remove(USER_KEY)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> ApiResult<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> ApiResult<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}

/// JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// A missing file is an empty store. An unreadable one is logged and
    /// replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("ignoring unreadable session file {}: {e}", path.display());
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> ApiResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| ApiError::Storage(format!("create dir failed: {e}")))?;
        }
        let payload = serde_json::to_string_pretty(entries)
            .map_err(|e| ApiError::Storage(format!("serialize session failed: {e}")))?;
        std::fs::write(&self.path, payload)
            .map_err(|e| ApiError::Storage(format!("write session failed: {e}")))?;
        restrict_permissions(&self.path);
        Ok(())
    }
}

impl CredentialStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> ApiResult<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_owned(), value.to_owned());
        self.persist(&entries)
    }

    /// One file write for the whole batch. The in-memory map is only updated
    /// once that write succeeds.
    fn set_many(&self, batch: &[(&str, &str)]) -> ApiResult<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let mut next = (*entries).clone();
        for (key, value) in batch {
            next.insert((*key).to_owned(), (*value).to_owned());
        }
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> ApiResult<()> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.persist(&entries)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
        warn!("could not restrict permissions on {}: {e}", path.display());
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;

    fn lebron() -> User {
        User {
            id: 23,
            username: "lebron".into(),
            email: "bron@example.com".into(),
            created_at: None,
            is_active: true,
        }
    }

    #[test]
    fn memory_store_round_trip_and_clear() {
        let store = MemoryStore::new();
        assert_eq!(store.token(), None);
        store.save("tok", &lebron()).unwrap();
        assert_eq!(store.token().as_deref(), Some("tok"));
        assert_eq!(store.user().unwrap(), Some(lebron()));
        store.clear().unwrap();
        assert_eq!(store.token(), None);
        assert_eq!(store.user().unwrap(), None);
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let store = MemoryStore::new();
        store.set(ACCESS_TOKEN_KEY, "  ").unwrap();
        assert_eq!(store.token(), None);
    }

    #[test]
    fn corrupt_user_entry_is_an_error() {
        let store = MemoryStore::new();
        store.set(USER_KEY, "{not json").unwrap();
        assert!(matches!(store.user(), Err(ApiError::Storage(_))));
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hoopstui").join("session.json");

        let store = FileStore::open(&path);
        store.save("abc", &lebron()).unwrap();

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.token().as_deref(), Some("abc"));
        assert_eq!(reopened.user().unwrap().map(|u| u.id), Some(23));

        reopened.clear().unwrap();
        let cleared = FileStore::open(&path);
        assert_eq!(cleared.token(), None);
    }

    #[test]
    fn file_store_ignores_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "garbage").unwrap();
        let store = FileStore::open(&path);
        assert_eq!(store.token(), None);
    }

    #[test]
    fn failed_save_leaves_no_half_written_session() {
        let dir = tempfile::tempdir().unwrap();
        // The parent "directory" is a plain file, so every write fails.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let store = FileStore::open(blocker.join("session.json"));

        assert!(matches!(store.save("abc", &lebron()), Err(ApiError::Storage(_))));
        assert_eq!(store.token(), None);
        assert_eq!(store.user().unwrap(), None);
    }

    #[test]
    fn save_writes_token_and_user_together() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        FileStore::open(&path).save("abc", &lebron()).unwrap();

        let on_disk: BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.get(ACCESS_TOKEN_KEY).map(String::as_str), Some("abc"));
        assert!(on_disk.contains_key(USER_KEY));
    }
}
