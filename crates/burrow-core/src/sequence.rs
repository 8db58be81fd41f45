use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The mutable half of the persisted sequence row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceState {
    /// Allocation attempts made so far, including burned ones.
    pub counter: u64,
    /// Most recent permutation output.
    pub last_output: u64,
}

/// The whole sequence row: permutation constants plus state.
///
/// `a` and `b` are written once. Changing them on a live deployment changes
/// every code produced afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceSeed {
    pub a: u64,
    pub b: u64,
    pub state: SequenceState,
}

/// Outcome of a conditional advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The row matched and now holds the new state; carries the new counter.
    Committed(u64),
    /// Another caller advanced the row first. Nothing was written.
    Stale,
}

/// Holds the single persisted counter/last-output row.
///
/// Implementations must make [`SequenceStore::advance`] atomic with respect
/// to every other caller, including other processes sharing the backend.
#[async_trait]
pub trait SequenceStore: Send + Sync + 'static {
    /// Creates the row from `seed` if it does not exist yet and returns the
    /// row as stored. Calling it again never overwrites an existing row.
    async fn ensure_initialized(&self, seed: SequenceSeed) -> Result<SequenceSeed>;

    /// Reads the current counter and last output.
    ///
    /// Returns `Err(StorageError::Uninitialized)` before bootstrap.
    async fn read_state(&self) -> Result<SequenceState>;

    /// Sets `counter = observed.counter + 1` and `last_output = next_output`,
    /// but only if the row still equals `observed`.
    async fn advance(&self, observed: SequenceState, next_output: u64) -> Result<Advance>;
}
