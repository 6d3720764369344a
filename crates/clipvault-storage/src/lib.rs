//! Clipvault Storage Library
//!
//! This crate provides the remote store abstraction used by the archive pipeline and its
//! implementations for Dropbox and the local filesystem.
//!
//! # Path format
//!
//! Remote paths are absolute and slash-separated, e.g. `/audio/Clip #0001.mp3`. Backends must
//! reject paths containing `..` segments. Every commit uses add + autorename semantics, so an
//! existing object is never overwritten.

pub mod dropbox;
pub mod factory;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use clipvault_core::StorageBackend;
pub use dropbox::DropboxStore;
pub use factory::create_store;
pub use local::LocalStore;
pub use traits::{FolderStatus, RemoteStore, StoreError, StoreResult};
