//! Store implementations for burrow.
//!
//! The in-memory stores back tests and single-process runs; [`MySqlStore`]
//! is the shared backend for multi-instance deployments.

pub mod memory;
pub mod mysql;

pub use burrow_core::code_store::{CodeStore, ReadCodeStore};
pub use burrow_core::error::StorageError;
pub use burrow_core::sequence::SequenceStore;
pub use memory::{InMemoryCodeStore, InMemorySequenceStore};
pub use mysql::MySqlStore;
