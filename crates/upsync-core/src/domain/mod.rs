//! Domain entities
//!
//! This module contains the core domain types for upsync:
//! - Newtypes for validated paths, user names and timestamps
//! - Listing entries for both sides of a sync
//! - Operator-facing sync events
//! - The per-run sync session
//! - Domain-specific error types

pub mod entry;
pub mod errors;
pub mod event;
pub mod newtypes;
pub mod session;

// Re-export commonly used types
pub use entry::{DirEntry, EntryKind, LocalEntry};
pub use errors::DomainError;
pub use event::SyncEvent;
pub use newtypes::*;
pub use session::SyncSession;
