use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use tokio::fs;
use tokio::sync::RwLock;

use crate::errors::{AuthError, Result};
use crate::session::Session;
use crate::store::SessionStore;

/// File-backed session store
///
/// Persists the single session record as plain JSON, the on-disk equivalent
/// of the key-value storage the web storefront kept per tab. One file per
/// process, last writer wins.
///
/// # Directory Structure
/// ```text
/// ~/.config/bookswap/
/// ├── lock            # Advisory lock file
/// └── session.json    # Current session (tokens, profile, admin flag)
/// ```
#[derive(Debug)]
pub struct FileSessionStore {
    session_file: PathBuf,
    lock_file: PathBuf,
    /// In-memory copy of the last loaded/saved session
    cache: Arc<RwLock<Option<Session>>>,
}

impl FileSessionStore {
    /// Create a store rooted at `storage_dir`, creating it if needed
    pub async fn new(storage_dir: impl AsRef<Path>) -> Result<Self> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        let session_file = storage_dir.join("session.json");
        let lock_file = storage_dir.join("lock");

        fs::create_dir_all(&storage_dir).await?;

        // Tokens live in this directory; keep it private (Unix only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            std::fs::set_permissions(&storage_dir, perms)?;
        }

        Ok(Self {
            session_file,
            lock_file,
            cache: Arc::new(RwLock::new(None)),
        })
    }

    /// Get default storage directory for the current platform
    pub fn default_storage_dir() -> Result<PathBuf> {
        let project_dirs = directories::ProjectDirs::from("", "", "bookswap").ok_or_else(|| {
            AuthError::InvalidResponse("Could not determine config directory".to_string())
        })?;

        Ok(project_dirs.config_dir().to_path_buf())
    }

    /// Acquire an exclusive lock on the storage
    fn acquire_lock(&self) -> Result<std::fs::File> {
        let lock_file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .open(&self.lock_file)?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| AuthError::LockTimeout)?;

        Ok(lock_file)
    }

    async fn load_from_disk(&self) -> Result<Option<Session>> {
        if !self.session_file.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.session_file).await?;
        let session: Session = serde_json::from_str(&content)
            .map_err(|e| AuthError::InvalidResponse(format!("Invalid session data: {}", e)))?;

        Ok(Some(session))
    }

    async fn save_to_disk(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string_pretty(session)?;

        // Atomic write: write to temp file, then rename
        let temp_path = self.session_file.with_extension("tmp");
        fs::write(&temp_path, json).await?;

        let file = std::fs::File::open(&temp_path)?;
        file.sync_all()?;

        fs::rename(&temp_path, &self.session_file).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.session_file, perms)?;
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Option<Session> {
        // Check cache first
        {
            let cache = self.cache.read().await;
            if let Some(session) = cache.as_ref() {
                return Some(session.clone());
            }
        }

        match self.load_from_disk().await {
            Ok(Some(session)) => {
                *self.cache.write().await = Some(session.clone());
                Some(session)
            }
            Ok(None) => None,
            Err(e) => {
                // An unreadable session file means an anonymous start, not a crash
                tracing::error!("Failed to load stored session: {}", e);
                None
            }
        }
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let _lock = self.acquire_lock()?;

        self.save_to_disk(session).await?;
        *self.cache.write().await = Some(session.clone());

        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let _lock = self.acquire_lock()?;

        if self.session_file.exists() {
            fs::remove_file(&self.session_file).await?;
        }
        *self.cache.write().await = None;

        Ok(())
    }
}
