//! Session persistence

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use hilq_core::{Result, Session};

/// Where finished sessions are kept
pub trait SessionStore {
    fn insert(&self, session: &Session) -> Result<()>;

    /// Every stored session, oldest first
    fn all(&self) -> Result<Vec<Session>>;

    fn get(&self, session_id: &str) -> Result<Option<Session>> {
        Ok(self
            .all()?
            .into_iter()
            .find(|s| s.session_id == session_id))
    }
}

/// Sessions kept as a pretty-printed JSON array in a single file
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_all(&self, sessions: &[Session]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(sessions)?;

        // replace the store atomically
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SessionStore for JsonFileStore {
    fn insert(&self, session: &Session) -> Result<()> {
        let mut sessions = self.all()?;
        sessions.push(session.clone());
        self.write_all(&sessions)?;
        info!(
            "Session {} stored in {} ({} total)",
            session.session_id,
            self.path.display(),
            sessions.len()
        );
        Ok(())
    }

    fn all(&self) -> Result<Vec<Session>> {
        if !self.path.exists() {
            debug!("No session store at {}", self.path.display());
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }
}
