//! Core types and traits for burrow.
//!
//! This crate holds the domain types shared by the generator, the stores
//! and the allocation service, together with the store traits the service
//! is written against.

pub mod allocator;
pub mod code_store;
pub mod error;
pub mod path;
pub mod reserved;
pub mod sequence;

pub use allocator::{AllocateParams, Allocator};
pub use code_store::{CodeRecord, CodeStore, ReadCodeStore};
pub use error::{AllocationError, StorageError};
pub use path::ShortPath;
pub use reserved::ReservedNames;
pub use sequence::{Advance, SequenceSeed, SequenceState, SequenceStore};
