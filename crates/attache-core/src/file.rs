//! File reference value types.
//!
//! A file reference is an immutable `(root, name)` pair. It never performs
//! filesystem mutations itself; the store owns those. The only I/O here is
//! the lazy [`FileRef::size`] stat, which treats a missing backing file as
//! "no size" so references to already-deleted files remain usable as display
//! values.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::error::Result;

/// Common surface of transient and persistent file references.
#[async_trait]
pub trait FileRef: Send + Sync {
    /// Root directory this reference lives under.
    fn root(&self) -> &Path;

    /// Name relative to the root. Persistent names may contain `/`.
    fn name(&self) -> &str;

    /// Absolute location of the backing file.
    fn path(&self) -> PathBuf {
        self.root().join(self.name())
    }

    /// Size of the backing file in bytes.
    ///
    /// Returns `Ok(None)` when the file does not exist; other I/O failures
    /// are surfaced as errors.
    async fn size(&self) -> Result<Option<u64>> {
        match fs::metadata(self.path()).await {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// A staged file under the transient root, not yet bound to any record.
///
/// Created by the file store (`new_transient` / `create_transient` /
/// `get_transient`); survives at most until its session promotes or abandons
/// it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransientFile {
    root: PathBuf,
    name: String,
}

impl TransientFile {
    /// Build a reference from a root and a flat name.
    ///
    /// Normally produced by the file store; the name is expected to have
    /// passed [`crate::naming::validate_transient_name`].
    pub fn new(root: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            name: name.into(),
        }
    }
}

#[async_trait]
impl FileRef for TransientFile {
    fn root(&self) -> &Path {
        &self.root
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TransientFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A committed file under the persistent root, bound to a record.
///
/// Created by promotion (`FileStore::promote`) or reconstructed from a stored
/// column value (`FileStore::get_persistent`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PersistentFile {
    root: PathBuf,
    name: String,
}

impl PersistentFile {
    /// Build a reference from a root and a template-derived name.
    ///
    /// Normally produced by the file store; the name is expected to have
    /// passed [`crate::naming::validate_persistent_name`].
    pub fn new(root: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            name: name.into(),
        }
    }
}

#[async_trait]
impl FileRef for PersistentFile {
    fn root(&self) -> &Path {
        &self.root
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for PersistentFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
