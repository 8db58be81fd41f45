use async_trait::async_trait;
use burrow_core::code_store::{CodeRecord, CodeStore, ReadCodeStore};
use burrow_core::error::{Result, StorageError};
use burrow_core::sequence::{Advance, SequenceSeed, SequenceState, SequenceStore};
use burrow_core::ShortPath;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::{Mutex, MutexGuard};

/// In-memory code store backed by a `DashMap`.
///
/// Inserts go through the entry API, so the uniqueness check and the write
/// happen under the same shard lock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCodeStore {
    codes: DashMap<String, CodeRecord>,
}

impl InMemoryCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored codes.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[async_trait]
impl ReadCodeStore for InMemoryCodeStore {
    async fn get(&self, path: &ShortPath) -> Result<Option<CodeRecord>> {
        Ok(self.codes.get(path.as_str()).map(|entry| entry.clone()))
    }

    async fn exists(&self, path: &ShortPath) -> Result<bool> {
        Ok(self.codes.contains_key(path.as_str()))
    }
}

#[async_trait]
impl CodeStore for InMemoryCodeStore {
    async fn insert(&self, path: &ShortPath, record: CodeRecord) -> Result<()> {
        match self.codes.entry(path.as_str().to_owned()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(path.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }
}

/// In-memory sequence row.
///
/// A single mutex makes every advance a compare-and-swap, matching the
/// conditional update a shared database performs.
#[derive(Debug, Default)]
pub struct InMemorySequenceStore {
    row: Mutex<Option<SequenceSeed>>,
}

impl InMemorySequenceStore {
    /// Creates an uninitialized store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `seed`.
    pub fn with_seed(seed: SequenceSeed) -> Self {
        Self {
            row: Mutex::new(Some(seed)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<SequenceSeed>>> {
        self.row
            .lock()
            .map_err(|_| StorageError::Unavailable("sequence lock is poisoned".to_string()))
    }
}

#[async_trait]
impl SequenceStore for InMemorySequenceStore {
    async fn ensure_initialized(&self, seed: SequenceSeed) -> Result<SequenceSeed> {
        let mut row = self.lock()?;
        Ok(*row.get_or_insert(seed))
    }

    async fn read_state(&self) -> Result<SequenceState> {
        let row = *self.lock()?;
        row.map(|seed| seed.state).ok_or(StorageError::Uninitialized)
    }

    async fn advance(&self, observed: SequenceState, next_output: u64) -> Result<Advance> {
        let mut row = self.lock()?;
        let seed = row.as_mut().ok_or(StorageError::Uninitialized)?;

        if seed.state != observed {
            return Ok(Advance::Stale);
        }

        seed.state = SequenceState {
            counter: observed.counter + 1,
            last_output: next_output,
        };
        Ok(Advance::Committed(seed.state.counter))
    }
}
