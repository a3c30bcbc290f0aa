//
//  bugz-cli
//  auth/cache.rs
//

//! Durable per-connection token storage.
//!
//! Tokens live in `~/.bugz_tokens`, one section per connection:
//!
//! ```toml
//! [gentoo]
//! token = "abcd1234"
//! ```
//!
//! A missing or unreadable file means "no token"; saving rewrites the whole
//! file atomically and pins the permissions to owner read/write only.

use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use toml::Table;

use crate::error::{BugzError, Result};

/// Token file name under the home directory.
const TOKEN_FILE: &str = ".bugz_tokens";

/// On-disk cache of one bearer token per connection.
pub struct CredentialCache {
    path: PathBuf,
    tokens: Table,
}

impl CredentialCache {
    /// Opens the cache at the default location (`~/.bugz_tokens`).
    ///
    /// A missing file is an empty cache. A file that exists but cannot be
    /// parsed is treated the same way: the worst outcome of a corrupt cache
    /// is one extra login round trip.
    pub fn open() -> Result<Self> {
        let home = BaseDirs::new()
            .ok_or_else(|| BugzError::config("cannot determine home directory"))?;
        Ok(Self::open_at(home.home_dir().join(TOKEN_FILE)))
    }

    /// Opens a cache backed by an explicit path.
    pub fn open_at(path: PathBuf) -> Self {
        let tokens = fs::read_to_string(&path)
            .ok()
            .and_then(|text| text.parse::<Table>().ok())
            .unwrap_or_default();
        Self { path, tokens }
    }

    /// The token stored for `connection`, if any.
    pub fn load(&self, connection: &str) -> Option<String> {
        self.tokens
            .get(connection)
            .and_then(|section| section.get("token"))
            .and_then(|value| value.as_str())
            .map(str::to_string)
    }

    /// Stores a token for `connection` and persists the cache.
    pub fn save(&mut self, connection: &str, token: &str) -> Result<()> {
        let mut section = Table::new();
        section.insert("token".to_string(), toml::Value::String(token.to_string()));
        self.tokens
            .insert(connection.to_string(), toml::Value::Table(section));
        self.write()
    }

    /// Removes the token for `connection`. Idempotent; removing an absent
    /// token rewrites nothing.
    pub fn destroy(&mut self, connection: &str) -> Result<()> {
        if self.tokens.remove(connection).is_some() {
            self.write()?;
        }
        Ok(())
    }

    /// Rewrites the token file and restricts it to the owner.
    ///
    /// The write goes through a temporary file in the same directory so a
    /// crash mid-write never leaves a truncated cache. The permission change
    /// is mandatory; a token file readable by other users is an error.
    fn write(&self) -> Result<()> {
        let text = toml::to_string(&self.tokens)
            .map_err(|e| BugzError::config(format!("cannot serialize token cache: {e}")))?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, text).map_err(|e| {
            BugzError::config(format!("cannot write {}: {e}", tmp.display()))
        })?;
        restrict_permissions(&tmp)?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            BugzError::config(format!("cannot write {}: {e}", self.path.display()))
        })?;
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| {
        BugzError::config(format!(
            "cannot restrict permissions on {}: {e}",
            path.display()
        ))
    })
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
