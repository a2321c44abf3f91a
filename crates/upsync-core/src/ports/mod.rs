//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the sync engine
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteDirectory`] - Remote store listing, transfer and metadata
//! - [`ILocalFileSystem`] - Local filesystem listing, transfer and metadata
//! - [`IProgressReporter`] - Operator progress lines

pub mod local_filesystem;
pub mod progress;
pub mod remote_directory;

pub use local_filesystem::ILocalFileSystem;
pub use progress::{CollectingReporter, IProgressReporter};
pub use remote_directory::IRemoteDirectory;
