//! On-disk OAuth token cache.
//!
//! Stores a single bearer token together with its expiry time. A cached token
//! is only handed out while it is still valid; unreadable or corrupt cache
//! files are treated as empty.

use chrono::{DateTime, Duration, Utc};
use listing_core::config::TokenConfig;
use listing_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Cache file contents.
#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    oauth_token: String,
    token_expiry: DateTime<Utc>,
}

/// Default cache location under the platform config directory.
pub fn default_token_path() -> PathBuf {
    if let Some(config) = dirs::config_dir() {
        config.join("listing-stats").join("ebay_token.json")
    } else {
        PathBuf::from("ebay_config.json")
    }
}

/// File-backed token cache.
pub struct TokenCache {
    path: PathBuf,
    lifetime: Duration,
}

impl TokenCache {
    /// Create a cache at `path` assigning `expiry_hours` to saved tokens.
    pub fn new(path: impl Into<PathBuf>, expiry_hours: u32) -> Self {
        Self {
            path: path.into(),
            lifetime: Duration::hours(i64::from(expiry_hours)),
        }
    }

    /// Create a cache from configuration.
    pub fn from_config(config: &TokenConfig) -> Self {
        let path = config.cache_path.clone().unwrap_or_else(default_token_path);
        Self::new(path, config.expiry_hours)
    }

    /// Cache file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached token if it has not expired.
    pub fn load(&self) -> Option<String> {
        self.load_at(Utc::now())
    }

    /// Load the cached token if it is still valid at `now`.
    pub fn load_at(&self, now: DateTime<Utc>) -> Option<String> {
        if !self.path.exists() {
            return None;
        }

        let stored: StoredToken = match fs::read_to_string(&self.path)
            .map_err(Error::from)
            .and_then(|text| serde_json::from_str(&text).map_err(Error::from))
        {
            Ok(stored) => stored,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable token cache");
                return None;
            }
        };

        if stored.token_expiry > now {
            Some(stored.oauth_token)
        } else {
            debug!(expired_at = %stored.token_expiry, "cached token expired");
            None
        }
    }

    /// Store a token, valid from now for the configured lifetime.
    pub fn save(&self, token: &str) -> Result<DateTime<Utc>> {
        self.save_at(token, Utc::now())
    }

    /// Store a token valid from `now`. Returns its expiry.
    pub fn save_at(&self, token: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::token("refusing to cache an empty token"));
        }

        let stored = StoredToken {
            oauth_token: token.to_string(),
            token_expiry: now + self.lifetime,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string(&stored)?)?;
        restrict_permissions(&self.path)?;

        debug!(path = %self.path.display(), expires = %stored.token_expiry, "cached token");
        Ok(stored.token_expiry)
    }

    /// Remove the cache file. Returns whether a file was removed.
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
