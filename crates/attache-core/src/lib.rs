//! # attache-core
//!
//! Core types, errors, and naming rules for the attache library.
//!
//! This crate provides the foundational pieces the other attache crates
//! depend on: file reference value types, the error taxonomy, the
//! persistent-name template language, and the name validation rules that
//! guard the filesystem boundary.

pub mod defaults;
pub mod error;
pub mod file;
pub mod logging;
pub mod naming;
pub mod template;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use file::{FileRef, PersistentFile, TransientFile};
pub use naming::{split_extension, validate_persistent_name, validate_transient_name};
pub use template::NameTemplate;
