//! Storage for the access and refresh tokens.
//!
//! # Design
//! Two slots, each an optional opaque string. Concurrent writers race with
//! last-writer-wins semantics: every write is a plain assignment of the
//! freshest token seen, and a read never observes a half-written value
//! because both slots sit behind one `RwLock`.
//!
//! `FileTokenStore` keeps the same in-memory view and mirrors it to a JSON
//! file while still holding the write lock, so the file and the cache never
//! disagree.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::error::TokenStoreError;

pub trait TokenStore: Send + Sync {
    fn access_token(&self) -> Option<String>;
    fn refresh_token(&self) -> Option<String>;
    fn set_access_token(&self, token: &str) -> Result<(), TokenStoreError>;
    fn set_refresh_token(&self, token: &str) -> Result<(), TokenStoreError>;
    /// Empty both slots (sign-out).
    fn clear(&self) -> Result<(), TokenStoreError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tokens {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<Tokens>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: Tokens) -> Self {
        Self {
            tokens: RwLock::new(tokens),
        }
    }

    pub fn snapshot(&self) -> Tokens {
        read(&self.tokens).clone()
    }
}

impl TokenStore for MemoryTokenStore {
    fn access_token(&self) -> Option<String> {
        read(&self.tokens).access_token.clone()
    }

    fn refresh_token(&self) -> Option<String> {
        read(&self.tokens).refresh_token.clone()
    }

    fn set_access_token(&self, token: &str) -> Result<(), TokenStoreError> {
        write(&self.tokens).access_token = Some(token.to_string());
        Ok(())
    }

    fn set_refresh_token(&self, token: &str) -> Result<(), TokenStoreError> {
        write(&self.tokens).refresh_token = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        *write(&self.tokens) = Tokens::default();
        Ok(())
    }
}

/// Tokens persisted as `{"accessToken": .., "refreshToken": ..}` on disk.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    tokens: RwLock<Tokens>,
}

impl FileTokenStore {
    /// Load `path` if it exists; otherwise start empty. The file is created
    /// on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, TokenStoreError> {
        let path = path.into();
        let tokens = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => Tokens::default(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Tokens::default(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), "opened token file");
        Ok(Self {
            path,
            tokens: RwLock::new(tokens),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update(&self, apply: impl FnOnce(&mut Tokens)) -> Result<(), TokenStoreError> {
        let mut guard = write(&self.tokens);
        let mut next = guard.clone();
        apply(&mut next);
        persist(&self.path, &next)?;
        *guard = next;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn access_token(&self) -> Option<String> {
        read(&self.tokens).access_token.clone()
    }

    fn refresh_token(&self) -> Option<String> {
        read(&self.tokens).refresh_token.clone()
    }

    fn set_access_token(&self, token: &str) -> Result<(), TokenStoreError> {
        self.update(|t| t.access_token = Some(token.to_string()))
    }

    fn set_refresh_token(&self, token: &str) -> Result<(), TokenStoreError> {
        self.update(|t| t.refresh_token = Some(token.to_string()))
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        self.update(|t| *t = Tokens::default())
    }
}

fn persist(path: &Path, tokens: &Tokens) -> Result<(), TokenStoreError> {
    let json = serde_json::to_string_pretty(tokens)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn read(lock: &RwLock<Tokens>) -> RwLockReadGuard<'_, Tokens> {
    lock.read().unwrap_or_else(|poisoned| {
        tracing::error!("token store lock poisoned; recovering");
        PoisonError::into_inner(poisoned)
    })
}

fn write(lock: &RwLock<Tokens>) -> RwLockWriteGuard<'_, Tokens> {
    lock.write().unwrap_or_else(|poisoned| {
        tracing::error!("token store lock poisoned; recovering");
        PoisonError::into_inner(poisoned)
    })
}
