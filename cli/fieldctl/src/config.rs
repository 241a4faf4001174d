//! Local state: where the session store lives and what the CLI keeps in it.
//!
//! Everything is one JSON map (`store.json`) shared with the client
//! library, which owns the `token` and `APP_ENV` keys. The CLI adds the
//! logged-in user's id and the current agent chat session.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use fieldlink_client::{FileStore, Session, SessionStore};

/// Session store file name.
const STORE_FILE: &str = "store.json";

/// Key for the id of the logged-in user.
pub const USER_ID_KEY: &str = "userId";

/// Key for the agent conversation to continue.
pub const CHAT_SESSION_KEY: &str = "agentSessionId";

/// Get the default state directory path.
fn default_state_dir() -> Result<PathBuf> {
    ProjectDirs::from("com", "fieldlink", "fieldctl")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

/// Persistent CLI state on top of the session store.
#[derive(Debug, Clone)]
pub struct LocalState {
    store: Arc<FileStore>,
}

impl LocalState {
    /// Open the store in `dir`, or in the platform config directory.
    pub fn open(dir: Option<&Path>) -> Result<Self> {
        let dir = match dir {
            Some(dir) => dir.to_path_buf(),
            None => default_state_dir()?,
        };
        let path = dir.join(STORE_FILE);

        let store = FileStore::open(&path)
            .with_context(|| format!("Failed to open session store at {:?}", path))?;

        Ok(Self {
            store: Arc::new(store),
        })
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Session view over the same store.
    pub fn session(&self) -> Session {
        Session::new(self.store.clone())
    }

    pub fn user_id(&self) -> Option<i64> {
        self.store.get(USER_ID_KEY)?.parse().ok()
    }

    pub fn set_user_id(&self, user_id: i64) -> Result<()> {
        self.store
            .set(USER_ID_KEY, &user_id.to_string())
            .context("Failed to save user id")
    }

    pub fn chat_session(&self) -> Option<String> {
        self.store.get(CHAT_SESSION_KEY).filter(|id| !id.is_empty())
    }

    pub fn set_chat_session(&self, session_id: &str) -> Result<()> {
        self.store
            .set(CHAT_SESSION_KEY, session_id)
            .context("Failed to save chat session")
    }

    /// Drop everything tied to the logged-in user.
    pub fn clear_user(&self) -> Result<()> {
        self.session().logout().context("Failed to clear token")?;
        self.store.remove(USER_ID_KEY)?;
        self.store.remove(CHAT_SESSION_KEY)?;
        Ok(())
    }
}
