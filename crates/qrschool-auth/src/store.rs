//! Token persistence.
//!
//! Sessions must survive restarts. [`FileTokenStore`] keeps them as JSON on
//! disk; [`MemoryTokenStore`] keeps them for the lifetime of the process.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use qrschool_config::StorageConfig;
use qrschool_core::SyncError;
use qrschool_models::Session;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// Durable storage for the session tokens.
///
/// `save` must be write-through: once it returns `Ok`, the session is what a
/// later `load` (in this or a future process) will see.
pub trait TokenStore: Send + Sync + 'static {
    /// Load the stored session. An empty store yields `Session::default()`.
    fn load(&self) -> impl Future<Output = Result<Session, SyncError>> + Send;

    fn save(&self, session: &Session) -> impl Future<Output = Result<(), SyncError>> + Send;

    fn clear(&self) -> impl Future<Output = Result<(), SyncError>> + Send;
}

/// JSON file store.
///
/// Writes go to a sibling temp file that is synced and renamed over the
/// target, so a crash never leaves a half-written session. On Unix the file is
/// readable by the owner only.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.token_path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "session.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn storage_error(action: &str, path: &Path, err: std::io::Error) -> SyncError {
    SyncError::storage(format!("{action} {}: {err}", path.display()))
}

impl TokenStore for FileTokenStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Result<Session, SyncError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Session::default()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                SyncError::storage(format!("corrupt session file {}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No stored session");
                Ok(Session::default())
            }
            Err(e) => Err(storage_error("read", &self.path, e)),
        }
    }

    #[instrument(skip(self, session), fields(path = %self.path.display()))]
    async fn save(&self, session: &Session) -> Result<(), SyncError> {
        let bytes = serde_json::to_vec_pretty(session)
            .map_err(|e| SyncError::storage(format!("serialize session: {e}")))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error("create directory", parent, e))?;
        }

        let temp = self.temp_path();
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options
            .open(&temp)
            .await
            .map_err(|e| storage_error("open", &temp, e))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| storage_error("write", &temp, e))?;
        file.sync_all()
            .await
            .map_err(|e| storage_error("sync", &temp, e))?;
        drop(file);

        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| storage_error("replace", &self.path, e))?;
        debug!("Session persisted");
        Ok(())
    }

    async fn clear(&self) -> Result<(), SyncError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error("remove", &self.path, e)),
        }
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    session: Mutex<Session>,
}

impl MemoryTokenStore {
    pub fn new(session: Session) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }

    pub async fn snapshot(&self) -> Session {
        self.session.lock().await.clone()
    }
}

impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Session, SyncError> {
        Ok(self.session.lock().await.clone())
    }

    async fn save(&self, session: &Session) -> Result<(), SyncError> {
        *self.session.lock().await = session.clone();
        Ok(())
    }

    async fn clear(&self) -> Result<(), SyncError> {
        *self.session.lock().await = Session::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> FileTokenStore {
        let dir = std::env::temp_dir().join(format!("qrschool-test-{}", uuid::Uuid::new_v4()));
        FileTokenStore::new(dir.join("session.json"))
    }

    fn session() -> Session {
        Session {
            access_token: Some("access-1".into()),
            refresh_token: Some("refresh-1".into()),
            role: Some("student".into()),
        }
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty_session() {
        let store = temp_store();
        let loaded = store.load().await.unwrap();
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_survives_new_store_instance() {
        let store = temp_store();
        store.save(&session()).await.unwrap();

        let reopened = FileTokenStore::new(store.path());
        assert_eq!(reopened.load().await.unwrap(), session());
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn test_clear_removes_file_and_tolerates_missing() {
        let store = temp_store();
        store.save(&session()).await.unwrap();
        store.clear().await.unwrap();
        assert!(!store.path().exists());
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_storage_error() {
        let store = temp_store();
        tokio::fs::create_dir_all(store.path().parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(store.path(), b"{ nope").await.unwrap();
        let err = store.load().await.unwrap_err();
        assert_eq!(err.kind(), qrschool_core::ErrorKind::Storage);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let store = temp_store();
        store.save(&session()).await.unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryTokenStore::default();
        assert!(store.load().await.unwrap().is_empty());
        store.save(&session()).await.unwrap();
        assert_eq!(store.snapshot().await, session());
        store.clear().await.unwrap();
        assert!(store.snapshot().await.is_empty());
    }
}
