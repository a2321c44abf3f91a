//! upsync Core - Domain types, ports and configuration
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `RelPath`, `RemotePath`, `SyncPath`, `DirEntry`, `LocalEntry`, `SyncSession`
//! - **Port definitions** - Traits for adapters: `IRemoteDirectory`, `ILocalFileSystem`, `IProgressReporter`
//! - **Configuration** - The YAML-backed [`config::Config`]
//!
//! # Architecture
//!
//! The domain module contains pure data types with no I/O.
//! Ports define trait interfaces that adapter crates implement.
//! The sync engine (in `upsync-sync`) drives domain values through the ports.

pub mod config;
pub mod domain;
pub mod ports;
