//! Token persistence.
//!
//! Tokens live under the fixed keys [`ACCESS_TOKEN_KEY`] and
//! [`REFRESH_TOKEN_KEY`]. The session pair is always read and written through
//! the multi-key operations, which each implementation performs atomically, so
//! no reader sees a new access token next to an old refresh token.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::types::{Session, TokenPair};

/// Storage key of the access token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage key of the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Default token file name within the data directory.
pub const TOKEN_FILE: &str = "tokens.json";

// ============================================================================
// TokenStore Trait
// ============================================================================

/// Asynchronous string key-value storage for tokens.
#[async_trait]
pub trait TokenStore: Send + Sync + std::fmt::Debug {
    /// Read several keys in one consistent snapshot.
    async fn get_many(&self, keys: &[&str]) -> StoreResult<Vec<Option<String>>>;

    /// Write several keys as one atomic update.
    async fn set_many(&self, entries: &[(&str, &str)]) -> StoreResult<()>;

    /// Remove several keys as one atomic update.
    async fn remove_many(&self, keys: &[&str]) -> StoreResult<()>;

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.get_many(&[key]).await?.pop().flatten())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.set_many(&[(key, value)]).await
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.remove_many(&[key]).await
    }

    /// Read the stored session.
    async fn load_session(&self) -> StoreResult<Session> {
        let mut values = self
            .get_many(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY])
            .await?
            .into_iter();
        Ok(Session {
            access_token: values.next().flatten(),
            refresh_token: values.next().flatten(),
        })
    }

    /// Replace both tokens.
    async fn save_session(&self, tokens: &TokenPair) -> StoreResult<()> {
        self.set_many(&[
            (ACCESS_TOKEN_KEY, tokens.access_token.as_str()),
            (REFRESH_TOKEN_KEY, tokens.refresh_token.as_str()),
        ])
        .await
    }

    /// Forget both tokens.
    async fn clear_session(&self) -> StoreResult<()> {
        self.remove_many(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY])
            .await
    }
}

/// Shared token store for use across async contexts.
pub type SharedTokenStore = Arc<dyn TokenStore>;

fn lookup(map: &HashMap<String, String>, keys: &[&str]) -> Vec<Option<String>> {
    keys.iter().map(|k| map.get(*k).cloned()).collect()
}

// ============================================================================
// FileTokenStore
// ============================================================================

/// JSON-file token store.
///
/// Writes go to a sibling temp file which is then renamed over the original,
/// so a crash mid-write leaves the previous pair intact.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    cached: RwLock<Option<HashMap<String, String>>>,
}

impl FileTokenStore {
    /// Store tokens in [`TOKEN_FILE`] under `data_dir`.
    pub fn new(data_dir: &Path) -> Self {
        Self::with_path(data_dir.join(TOKEN_FILE))
    }

    /// Store tokens at an explicit file path.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            cached: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn read_file(&self) -> StoreResult<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_file(&self, map: &HashMap<String, String>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let json = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        Ok(())
    }

    async fn update<F>(&self, apply: F) -> StoreResult<()>
    where
        F: FnOnce(&mut HashMap<String, String>) + Send,
    {
        let mut cache = self.cached.write().await;
        let mut map = match cache.as_ref() {
            Some(map) => map.clone(),
            None => self.read_file()?,
        };
        apply(&mut map);
        self.write_file(&map)?;
        *cache = Some(map);
        Ok(())
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get_many(&self, keys: &[&str]) -> StoreResult<Vec<Option<String>>> {
        {
            let cache = self.cached.read().await;
            if let Some(map) = cache.as_ref() {
                return Ok(lookup(map, keys));
            }
        }

        let mut cache = self.cached.write().await;
        if cache.is_none() {
            *cache = Some(self.read_file()?);
        }
        Ok(cache.as_ref().map(|m| lookup(m, keys)).unwrap_or_default())
    }

    async fn set_many(&self, entries: &[(&str, &str)]) -> StoreResult<()> {
        self.update(|map| {
            for (key, value) in entries {
                map.insert((*key).to_string(), (*value).to_string());
            }
        })
        .await?;
        tracing::debug!(path = %self.path.display(), keys = entries.len(), "tokens saved");
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> StoreResult<()> {
        self.update(|map| {
            for key in keys {
                map.remove(*key);
            }
        })
        .await
    }
}

// ============================================================================
// MemoryTokenStore (for testing)
// ============================================================================

/// In-memory token store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    values: RwLock<HashMap<String, String>>,
    write_count: AtomicU32,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with both tokens stored.
    pub fn with_session(access_token: &str, refresh_token: &str) -> Self {
        let values = HashMap::from([
            (ACCESS_TOKEN_KEY.to_string(), access_token.to_string()),
            (REFRESH_TOKEN_KEY.to_string(), refresh_token.to_string()),
        ]);
        Self {
            values: RwLock::new(values),
            write_count: AtomicU32::new(0),
        }
    }

    /// Number of `set_many`/`remove_many` calls so far.
    pub fn write_count(&self) -> u32 {
        self.write_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get_many(&self, keys: &[&str]) -> StoreResult<Vec<Option<String>>> {
        let values = self.values.read().await;
        Ok(lookup(&values, keys))
    }

    async fn set_many(&self, entries: &[(&str, &str)]) -> StoreResult<()> {
        let mut values = self.values.write().await;
        for (key, value) in entries {
            values.insert((*key).to_string(), (*value).to_string());
        }
        self.write_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> StoreResult<()> {
        let mut values = self.values.write().await;
        for key in keys {
            values.remove(*key);
        }
        self.write_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
