//! Bearer-token session and its persistence.
//!
//! # Design
//! The token lives in an explicit `Session` value owned by the `ApiClient`
//! rather than in ambient global storage. Persistence is a separate concern:
//! hosts load the token from a `TokenStore` at startup and save it after a
//! successful login or register. Stores key the token under the fixed name
//! [`TOKEN_KEY`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::error::ApiError;

/// Name the token is stored under.
pub const TOKEN_KEY: &str = "token";

/// In-memory authentication state attached to every outgoing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn set(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn clear(&mut self) {
        self.token = None;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Guard for protected views: without a token the caller is treated as
    /// logged out and should send the user to the login screen.
    pub fn require(&self) -> Result<(), ApiError> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(ApiError::Unauthorized(None))
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode session store: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persistent storage for the session token.
pub trait TokenStore {
    fn load(&self) -> Result<Option<String>, StoreError>;
    fn save(&mut self, token: &str) -> Result<(), StoreError>;
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// Store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Option<String>,
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.token.clone())
    }

    fn save(&mut self, token: &str) -> Result<(), StoreError> {
        self.token = Some(token.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.token = None;
        Ok(())
    }
}

/// JSON object on disk; the token sits under [`TOKEN_KEY`] and other keys are
/// preserved across writes.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when the file exists but does not hold a JSON object; callers
    /// treat that as an empty store and overwrite it on the next write.
    fn read_map(&self) -> Result<Option<Map<String, Value>>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Some(Map::new())),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Some(Map::new()));
        }
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(Some(map)),
            Ok(other) => {
                warn!(path = %self.path.display(), kind = json_kind(&other), "session file is not an object, ignoring it");
                Ok(None)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "session file is not valid JSON, ignoring it");
                Ok(None)
            }
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(map)?)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        let map = self.read_map()?.unwrap_or_default();
        Ok(map
            .get(TOKEN_KEY)
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    fn save(&mut self, token: &str) -> Result<(), StoreError> {
        let mut map = self.read_map()?.unwrap_or_default();
        map.insert(TOKEN_KEY.to_string(), Value::String(token.to_string()));
        self.write_map(&map)
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        match self.read_map()? {
            Some(mut map) => {
                if map.remove(TOKEN_KEY).is_some() {
                    self.write_map(&map)?;
                }
                Ok(())
            }
            None => self.write_map(&Map::new()),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Build a `Session` from whatever the store currently holds.
pub fn restore(store: &dyn TokenStore) -> Result<Session, StoreError> {
    Ok(match store.load()? {
        Some(token) => Session::with_token(token),
        None => Session::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_fails_without_token() {
        let mut session = Session::new();
        assert!(session.require().unwrap_err().is_unauthorized());
        session.set("abc");
        assert!(session.require().is_ok());
        session.clear();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn file_store_roundtrip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileTokenStore::new(dir.path().join("nested").join("session.json"));
        assert_eq!(store.load().unwrap(), None);

        store.save("tok-1").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("tok-1"));
        assert_eq!(restore(&store).unwrap().token(), Some("tok-1"));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn file_store_keeps_unrelated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, r#"{"theme":"dark"}"#).unwrap();

        let mut store = FileTokenStore::new(&path);
        store.save("tok").unwrap();
        store.clear().unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["theme"], "dark");
        assert!(raw.get(TOKEN_KEY).is_none());
    }

    #[test]
    fn unreadable_file_counts_as_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        for junk in ["[]", "\"tok\"", "{not json"] {
            let path = dir.path().join("session.json");
            fs::write(&path, junk).unwrap();

            let mut store = FileTokenStore::new(&path);
            assert_eq!(store.load().unwrap(), None, "{junk}");
            assert!(!restore(&store).unwrap().is_authenticated());

            store.clear().unwrap();
            let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
            assert_eq!(raw, Value::Object(Map::new()));

            fs::write(&path, junk).unwrap();
            store.save("fresh").unwrap();
            assert_eq!(store.load().unwrap().as_deref(), Some("fresh"));
        }
    }

    #[test]
    fn memory_store_restores_session() {
        let mut store = MemoryTokenStore::default();
        assert!(!restore(&store).unwrap().is_authenticated());
        store.save("t").unwrap();
        assert_eq!(restore(&store).unwrap().token(), Some("t"));
    }
}
