use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::{env, fs, io};

use directories::BaseDirs;
use tracing::warn;

/// Store key holding the raw bearer token.
pub const TOKEN_KEY: &str = "token";

/// Store key holding the JSON-encoded user record.
pub const USER_KEY: &str = "user";

/// Durable key-value store for the two session entries.
///
/// No expiry semantics: entries live until explicitly removed. The token
/// is stored in plain text, an accepted risk at this scope. Backends must
/// tolerate concurrent access from multiple clones of the client.
pub trait SessionStore: Send + Sync {
    /// Look up a value, `None` when absent.
    fn get(&self, key: &str) -> Option<String>;

    /// Insert or replace a value.
    fn set(&self, key: &str, value: &str);

    /// Remove a value. Removing an absent key is a no-op.
    fn remove(&self, key: &str);
}

/// Write both session entries in one logical operation.
pub fn write_session(store: &dyn SessionStore, token: &str, user_json: &str) {
    store.set(TOKEN_KEY, token);
    store.set(USER_KEY, user_json);
}

/// Remove both session entries. Safe to call when already cleared.
pub fn clear_session(store: &dyn SessionStore) {
    store.remove(TOKEN_KEY);
    store.remove(USER_KEY);
}

/// Read both entries, enforcing co-presence: when only one of the two is
/// present the store is treated as corrupt and cleared.
pub fn read_session(store: &dyn SessionStore) -> Option<(String, String)> {
    match (store.get(TOKEN_KEY), store.get(USER_KEY)) {
        (Some(token), Some(user_json)) => Some((token, user_json)),
        (None, None) => None,
        _ => {
            warn!("session store holds only one of its two entries, clearing both");
            clear_session(store);
            None
        }
    }
}

/// In-memory store for tests and sessions that should not outlive the
/// process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

/// File-backed store holding the session entries as one small JSON object
/// under the user's configuration directory.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Default location of the session file, honoring the
    /// `REPOMARKET_SESSION_FILE` override.
    #[must_use]
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("REPOMARKET_SESSION_FILE") {
            return PathBuf::from(path);
        }
        BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("repomarket").join("session.json"))
            .unwrap_or_else(|| PathBuf::from("./session.json"))
    }

    /// Open the store at the default per-user location.
    ///
    /// # Errors
    /// Returns an error when the parent directory cannot be created.
    pub fn open_default() -> io::Result<Self> {
        Self::at(Self::default_path())
    }

    /// Open the store at an explicit path.
    ///
    /// # Errors
    /// Returns an error when the parent directory cannot be created.
    pub fn at(path: PathBuf) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    /// Path this store persists to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn load(&self) -> HashMap<String, String> {
        let Ok(contents) = fs::read_to_string(&self.path) else {
            return HashMap::new();
        };
        match serde_json::from_str(&contents) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "session file is unreadable, treating as empty"
                );
                HashMap::new()
            }
        }
    }

    fn persist(&self, entries: &HashMap<String, String>) {
        let serialized = match serde_json::to_string_pretty(entries) {
            Ok(serialized) => serialized,
            Err(err) => {
                warn!(error = %err, "failed to serialize session entries");
                return;
            }
        };
        if let Err(err) = fs::write(&self.path, serialized) {
            warn!(
                path = %self.path.display(),
                error = %err,
                "failed to write session file"
            );
            return;
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(err) = fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600)) {
                warn!(error = %err, "failed to restrict session file permissions");
            }
        }
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.load().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.load();
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.load();
        if entries.remove(key).is_some() || self.path.exists() {
            self.persist(&entries);
        }
    }
}
