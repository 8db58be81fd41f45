//! The allocation protocol.
//!
//! [`AllocatorService`] turns persisted sequence state into obfuscated,
//! collision-free paths, and validates caller-chosen ones. Domain types and
//! store traits are re-exported from `burrow_core`.

pub mod service;

pub use burrow_core::{AllocateParams, AllocationError, Allocator};
pub use service::{AllocatorService, AllocatorSettings, DEFAULT_RETRY_WARN_THRESHOLD};
