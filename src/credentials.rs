//! Bearer-token storage behind a small trait, so the API client never knows
//! where the token lives.

use std::fmt;
use std::path::PathBuf;
#[cfg(test)]
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{AppError, Result};

/// Login sessions last one day.
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone, PartialEq, Eq)]
pub struct Token(Zeroizing<String>);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

pub trait CredentialProvider: Send + Sync {
    /// The stored token, or None when absent or expired.
    fn get(&self) -> Result<Option<Token>>;
    fn set(&self, token: Token, ttl: Duration) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

#[derive(Serialize, Deserialize)]
struct StoredToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl StoredToken {
    fn new(token: &Token, ttl: Duration) -> Result<Self> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| AppError::Credentials(format!("invalid ttl: {e}")))?;
        Ok(Self {
            token: token.expose().to_string(),
            expires_at: Utc::now() + ttl,
        })
    }

    fn into_live_token(self) -> Option<Token> {
        let token = Zeroizing::new(self.token);
        if self.expires_at <= Utc::now() {
            return None;
        }
        Some(Token(token))
    }
}

// ---------------------------------------------------------------------------
// File store
// ---------------------------------------------------------------------------

/// JSON file in the config dir, readable only by the owner.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_location() -> Self {
        Self::new(crate::settings::config_dir().join("session.json"))
    }
}

impl CredentialProvider for FileCredentialStore {
    fn get(&self) -> Result<Option<Token>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => Zeroizing::new(c),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredToken = match serde_json::from_str(&content) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring corrupt session file");
                return Ok(None);
            }
        };
        Ok(stored.into_live_token())
    }

    fn set(&self, token: Token, ttl: Duration) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = Zeroizing::new(serde_json::to_string(&StoredToken::new(&token, ttl)?)?);
        write_private(&self.path, json.as_bytes())?;
        tracing::debug!(path = %self.path.display(), "session stored");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
fn write_private(path: &std::path::Path, bytes: &[u8]) -> Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(bytes)?;
    Ok(())
}

#[cfg(not(unix))]
fn write_private(path: &std::path::Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[cfg(test)]
#[derive(Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<(Token, DateTime<Utc>)>>,
}

#[cfg(test)]
impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        let store = Self::new();
        if let Ok(mut slot) = store.slot.lock() {
            *slot = Some((Token::new(token), Utc::now() + chrono::Duration::days(1)));
        }
        store
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<(Token, DateTime<Utc>)>>> {
        self.slot
            .lock()
            .map_err(|_| AppError::Credentials("credential store poisoned".into()))
    }
}

#[cfg(test)]
impl CredentialProvider for MemoryCredentialStore {
    fn get(&self) -> Result<Option<Token>> {
        let slot = self.lock()?;
        Ok(slot
            .as_ref()
            .filter(|(_, expires_at)| *expires_at > Utc::now())
            .map(|(token, _)| token.clone()))
    }

    fn set(&self, token: Token, ttl: Duration) -> Result<()> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| AppError::Credentials(format!("invalid ttl: {e}")))?;
        *self.lock()? = Some((token, Utc::now() + ttl));
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.lock()? = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// OS keychain
// ---------------------------------------------------------------------------

#[cfg(feature = "keyring")]
pub struct KeyringCredentialStore {
    entry: keyring::Entry,
}

#[cfg(feature = "keyring")]
impl KeyringCredentialStore {
    pub fn new(user: &str) -> Result<Self> {
        let entry = keyring::Entry::new("gapakerem", user)
            .map_err(|e| AppError::Credentials(e.to_string()))?;
        Ok(Self { entry })
    }
}

#[cfg(feature = "keyring")]
impl CredentialProvider for KeyringCredentialStore {
    fn get(&self) -> Result<Option<Token>> {
        match self.entry.get_password() {
            Ok(secret) => {
                let secret = Zeroizing::new(secret);
                let stored: StoredToken = serde_json::from_str(&secret)?;
                Ok(stored.into_live_token())
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(AppError::Credentials(e.to_string())),
        }
    }

    fn set(&self, token: Token, ttl: Duration) -> Result<()> {
        let json = Zeroizing::new(serde_json::to_string(&StoredToken::new(&token, ttl)?)?);
        self.entry
            .set_password(&json)
            .map_err(|e| AppError::Credentials(e.to_string()))
    }

    fn clear(&self) -> Result<()> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(AppError::Credentials(e.to_string())),
        }
    }
}

/// The store used by the binary: the keychain when built with it, else the session file.
pub fn default_store() -> Box<dyn CredentialProvider> {
    #[cfg(feature = "keyring")]
    {
        match KeyringCredentialStore::new("admin") {
            Ok(store) => return Box::new(store),
            Err(e) => tracing::warn!(error = %e, "keychain unavailable, using session file"),
        }
    }
    Box::new(FileCredentialStore::default_location())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_debug_is_redacted() {
        let t = Token::new("secret-jwt");
        assert_eq!(format!("{t:?}"), "Token(***)");
        assert_eq!(t.expose(), "secret-jwt");
    }

    #[test]
    fn test_file_store_roundtrip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("cfg").join("session.json"));
        assert!(store.get().unwrap().is_none());

        store.set(Token::new("abc"), SESSION_TTL).unwrap();
        assert_eq!(store.get().unwrap().unwrap().expose(), "abc");

        store.clear().unwrap();
        assert!(store.get().unwrap().is_none());
        // clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_expired_token_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let json = r#"{"token":"old","expires_at":"2020-01-01T00:00:00Z"}"#;
        std::fs::write(&path, json).unwrap();
        let store = FileCredentialStore::new(path);
        assert!(store.get().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_session_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(FileCredentialStore::new(path).get().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        FileCredentialStore::new(path.clone())
            .set(Token::new("abc"), SESSION_TTL)
            .unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_memory_store_ttl() {
        let store = MemoryCredentialStore::new();
        store.set(Token::new("t"), Duration::from_secs(60)).unwrap();
        assert!(store.get().unwrap().is_some());
        store.set(Token::new("t"), Duration::ZERO).unwrap();
        assert!(store.get().unwrap().is_none());
        assert!(MemoryCredentialStore::with_token("x").get().unwrap().is_some());
    }
}
