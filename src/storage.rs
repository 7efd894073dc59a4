use crate::constants::CONFIG_DIR_NAME;
use crate::models::TokenPair;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const SESSION_FILE: &str = "session.yaml";

/// Persists the signed-in token pair between runs
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store at `~/.stash/session.yaml`
    pub fn new() -> Self {
        let config_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR_NAME);
        Self::in_dir(config_dir)
    }

    pub fn in_dir(config_dir: impl Into<PathBuf>) -> Self {
        SessionStore {
            path: config_dir.into().join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved pair, or `None` when nothing has been saved yet
    pub fn load(&self) -> Result<Option<TokenPair>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let pair = serde_yaml::from_str(&content)
            .with_context(|| format!("corrupt session file {}", self.path.display()))?;
        Ok(Some(pair))
    }

    pub fn save(&self, pair: &TokenPair) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        let content = serde_yaml::to_string(pair)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
