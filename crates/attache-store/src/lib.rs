//! # attache-store
//!
//! Filesystem layer for attache: the two-root file store.
//!
//! This crate provides:
//! - Transient name allocation (random hex, no filesystem touch)
//! - Upload intake with atomic temp-write-then-rename materialization
//! - Resolution of client-supplied transient names behind an injection guard
//! - Promotion (rename, with a cross-device fallback) and idempotent deletion
//! - A startup round-trip probe for both roots

pub mod store;

pub use store::{FileStore, StoreConfig};

// Re-export core types
pub use attache_core::{Error, FileRef, PersistentFile, Result, TransientFile};
