use crate::error::Result;
use crate::path::ShortPath;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A stored code: what a path points to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeRecord {
    /// URL or literal text, opaque to the allocator.
    pub payload: String,
    /// `true` serves `payload` verbatim, `false` redirects to it.
    pub is_literal: bool,
    /// When the code was accepted.
    pub created_at: Timestamp,
}

/// A read-only view of a code store.
#[async_trait]
pub trait ReadCodeStore: Send + Sync + 'static {
    /// Retrieves the record for a given path.
    /// Returns `None` if the path does not exist.
    async fn get(&self, path: &ShortPath) -> Result<Option<CodeRecord>>;

    /// Checks whether a path has already been assigned.
    async fn exists(&self, path: &ShortPath) -> Result<bool>;
}

/// Holds assigned codes and enforces path uniqueness.
#[async_trait]
pub trait CodeStore: ReadCodeStore {
    /// Inserts a new record.
    ///
    /// Returns `Err(StorageError::Conflict)` if the path is already taken,
    /// even when an earlier [`ReadCodeStore::exists`] call said otherwise.
    async fn insert(&self, path: &ShortPath, record: CodeRecord) -> Result<()>;
}
