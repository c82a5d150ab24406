//! Two-root file store: staged transient files and durable persistent files.
//!
//! The store owns a pair of directory trees:
//! - the **transient root** holds files staged during form processing, named
//!   by random hex tokens;
//! - the **persistent root** holds files bound to committed records, named by
//!   server-side templates.
//!
//! Promotion moves a file from the first tree to the second by rename. The
//! store performs primitive operations only; ordering them around a database
//! transaction is the session layer's job.
//!
//! ## Example
//!
//! ```rust,ignore
//! use attache_store::FileStore;
//!
//! let store = FileStore::new("/srv/app/transient", "/srv/app/media");
//! store.validate().await?;
//!
//! // Stage an upload; the client-supplied name only contributes its extension.
//! let staged = store.create_transient_from_bytes(&data, "photo.jpg").await?;
//!
//! // After the owning transaction commits:
//! let durable = store.promote(&staged, "photos/42.jpg").await?;
//! ```

use std::path::{Path, PathBuf};

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};

use attache_core::defaults::{COPY_BUFFER_BYTES, TEMP_SUFFIX, TRANSIENT_NAME_RANDOM_BYTES};
use attache_core::naming::{split_extension, validate_persistent_name, validate_transient_name};
use attache_core::{Error, FileRef, PersistentFile, Result, TransientFile};

/// File store configuration.
///
/// A plain carrier so deployments can read the two roots from a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding staged (transient) files.
    pub transient_root: PathBuf,
    /// Directory holding committed (persistent) files.
    pub persistent_root: PathBuf,
}

impl StoreConfig {
    /// Create a configuration from the two root directories.
    pub fn new(transient_root: impl Into<PathBuf>, persistent_root: impl Into<PathBuf>) -> Self {
        Self {
            transient_root: transient_root.into(),
            persistent_root: persistent_root.into(),
        }
    }
}

/// The file store.
///
/// Cheap to clone behind an `Arc` if shared; all methods take `&self`.
#[derive(Debug, Clone)]
pub struct FileStore {
    transient_root: PathBuf,
    persistent_root: PathBuf,
}

impl FileStore {
    /// Create a store over the two roots.
    ///
    /// The directories are created lazily on first write, not here;
    /// [`validate`](Self::validate) probes them eagerly at startup.
    pub fn new(transient_root: impl Into<PathBuf>, persistent_root: impl Into<PathBuf>) -> Self {
        Self {
            transient_root: transient_root.into(),
            persistent_root: persistent_root.into(),
        }
    }

    /// Create a store from a [`StoreConfig`].
    pub fn from_config(config: StoreConfig) -> Self {
        Self {
            transient_root: config.transient_root,
            persistent_root: config.persistent_root,
        }
    }

    /// Directory holding staged files.
    pub fn transient_root(&self) -> &Path {
        &self.transient_root
    }

    /// Directory holding committed files.
    pub fn persistent_root(&self) -> &Path {
        &self.persistent_root
    }

    /// Allocate a fresh transient name without touching the filesystem.
    ///
    /// `ext` is appended verbatim and normally carries its leading dot
    /// (`".png"`). The name is 8 random bytes from the OS generator,
    /// hex-encoded, so collisions within one root are not a practical
    /// concern.
    pub fn new_transient(&self, ext: &str) -> TransientFile {
        let mut entropy = [0u8; TRANSIENT_NAME_RANDOM_BYTES];
        OsRng.fill_bytes(&mut entropy);
        let name = format!("{}{}", hex::encode(entropy), ext);
        TransientFile::new(&self.transient_root, name)
    }

    /// Stage an uploaded byte stream as a transient file.
    ///
    /// `original_name` is the client-supplied file name; only its extension
    /// survives into the stored name. The stream is written through a
    /// `<name>.tmp` sibling and renamed into place, so a partially written
    /// file is never visible under a valid transient name.
    pub async fn create_transient(
        &self,
        reader: impl AsyncRead + Unpin,
        original_name: &str,
    ) -> Result<TransientFile> {
        let (_, ext) = split_extension(original_name);
        let file = self.new_transient(ext);
        // A hostile extension must not reach the filesystem as part of a path.
        validate_transient_name(file.name())?;

        fs::create_dir_all(&self.transient_root).await.map_err(|e| {
            warn!(
                subsystem = "store",
                op = "create_transient",
                root = %self.transient_root.display(),
                error = %e,
                "create_dir_all failed"
            );
            e
        })?;

        let final_path = file.path();
        let temp_path = self
            .transient_root
            .join(format!("{}.{}", file.name(), TEMP_SUFFIX));

        let written = match write_stream(&temp_path, reader).await {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&temp_path).await;
                warn!(
                    subsystem = "store",
                    op = "create_transient",
                    file_name = %file.name(),
                    error = %e,
                    "streamed write failed"
                );
                return Err(e.into());
            }
        };

        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            let _ = fs::remove_file(&temp_path).await;
            warn!(
                subsystem = "store",
                op = "create_transient",
                file_name = %file.name(),
                error = %e,
                "rename into place failed"
            );
            return Err(e.into());
        }

        // Set permissions to 0644 (rw-r--r--, no execute)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(
                &final_path,
                std::fs::Permissions::from_mode(attache_core::defaults::FILE_MODE),
            )
            .await?;
        }

        debug!(
            subsystem = "store",
            op = "create_transient",
            file_name = %file.name(),
            size_bytes = written,
            "Transient file materialized"
        );
        Ok(file)
    }

    /// Convenience wrapper over [`create_transient`](Self::create_transient)
    /// for data already in memory.
    pub async fn create_transient_from_bytes(
        &self,
        data: &[u8],
        original_name: &str,
    ) -> Result<TransientFile> {
        self.create_transient(data, original_name).await
    }

    /// Resolve a transient name received from a client back into a reference.
    ///
    /// The name is validated before any filesystem access; separators and
    /// traversal components are [`Error::IllegalName`]. A valid name whose
    /// backing file is gone (expired staging area, lost resubmission) is
    /// [`Error::NotFound`].
    pub async fn get_transient(&self, name: &str) -> Result<TransientFile> {
        validate_transient_name(name)?;
        let file = TransientFile::new(&self.transient_root, name);
        match fs::metadata(file.path()).await {
            Ok(meta) if meta.is_file() => Ok(file),
            Ok(_) => Err(Error::NotFound(format!(
                "transient file has been lost: {}",
                name
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound(format!(
                "transient file has been lost: {}",
                name
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Reconstruct a persistent reference from a stored column value.
    ///
    /// Validates the name's shape only; existence is not checked, so
    /// references to already-deleted files still work as display values.
    pub fn get_persistent(&self, name: &str) -> Result<PersistentFile> {
        validate_persistent_name(name)?;
        Ok(PersistentFile::new(&self.persistent_root, name))
    }

    /// Promote a staged file to its final persistent name.
    ///
    /// Implemented as a rename. When the two roots span filesystems, falls
    /// back to copy, length verification, rename into place, and removal of
    /// the source. On success the transient path no longer exists and the
    /// persistent file holds the same bytes; on failure the transient file
    /// is left where it was.
    pub async fn promote(
        &self,
        transient: &TransientFile,
        persistent_name: &str,
    ) -> Result<PersistentFile> {
        validate_persistent_name(persistent_name)?;
        let dest = PersistentFile::new(&self.persistent_root, persistent_name);
        let src_path = transient.path();
        let dest_path = dest.path();

        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(
                    subsystem = "store",
                    op = "promote",
                    parent = %parent.display(),
                    error = %e,
                    "create_dir_all failed"
                );
                e
            })?;
        }

        match fs::rename(&src_path, &dest_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
                debug!(
                    subsystem = "store",
                    op = "promote",
                    transient_name = %transient.name(),
                    persistent_name = %persistent_name,
                    "roots span filesystems, copying"
                );
                copy_verified(&src_path, &dest_path).await?;
                fs::remove_file(&src_path).await?;
            }
            Err(e) => {
                warn!(
                    subsystem = "store",
                    op = "promote",
                    transient_name = %transient.name(),
                    persistent_name = %persistent_name,
                    error = %e,
                    "rename failed"
                );
                return Err(e.into());
            }
        }

        debug!(
            subsystem = "store",
            op = "promote",
            transient_name = %transient.name(),
            persistent_name = %persistent_name,
            "Transient file promoted"
        );
        Ok(dest)
    }

    /// Delete the backing file of a reference.
    ///
    /// An already-absent file is success: deletion is idempotent. Any other
    /// failure is surfaced, not swallowed.
    pub async fn delete<F>(&self, file: &F) -> Result<()>
    where
        F: FileRef + ?Sized,
    {
        match fs::remove_file(file.path()).await {
            Ok(()) => {
                debug!(
                    subsystem = "store",
                    op = "delete",
                    file_name = %file.name(),
                    "File deleted"
                );
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(
                    subsystem = "store",
                    op = "delete",
                    file_name = %file.name(),
                    "File already absent"
                );
                Ok(())
            }
            Err(e) => {
                warn!(
                    subsystem = "store",
                    op = "delete",
                    file_name = %file.name(),
                    error = %e,
                    "delete failed"
                );
                Err(e.into())
            }
        }
    }

    /// Validate that both roots can be written, read, and cleaned up.
    ///
    /// Performs a full round-trip probe at startup to catch filesystem issues
    /// (overlayfs quirks, permission errors, read-only mounts) early.
    pub async fn validate(&self) -> Result<()> {
        probe_root(&self.transient_root, "transient root").await?;
        probe_root(&self.persistent_root, "persistent root").await?;
        Ok(())
    }
}

/// Stream a reader to `path`, fsync, and report bytes written.
async fn write_stream(
    path: &Path,
    mut reader: impl AsyncRead + Unpin,
) -> std::io::Result<u64> {
    let mut out = fs::File::create(path).await?;
    let mut buf = vec![0u8; COPY_BUFFER_BYTES];
    let mut written: u64 = 0;
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n]).await?;
        written += n as u64;
    }
    out.sync_all().await?;
    Ok(written)
}

/// Cross-device promotion fallback: copy through a temp sibling in the
/// destination tree, verify the length, rename into place.
async fn copy_verified(src: &Path, dest_path: &Path) -> Result<()> {
    let mut os = dest_path.as_os_str().to_os_string();
    os.push(".");
    os.push(TEMP_SUFFIX);
    let temp_path = PathBuf::from(os);

    let expected = fs::metadata(src).await?.len();
    let mut reader = fs::File::open(src).await?;
    let mut writer = match fs::File::create(&temp_path).await {
        Ok(f) => f,
        Err(e) => return Err(e.into()),
    };

    let copied = match tokio::io::copy(&mut reader, &mut writer).await {
        Ok(n) => n,
        Err(e) => {
            drop(writer);
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
    };
    if let Err(e) = writer.sync_all().await {
        drop(writer);
        let _ = fs::remove_file(&temp_path).await;
        return Err(e.into());
    }
    drop(writer);

    if copied != expected {
        let _ = fs::remove_file(&temp_path).await;
        return Err(Error::Io(std::io::Error::other(format!(
            "cross-device copy wrote {} of {} bytes",
            copied, expected
        ))));
    }

    if let Err(e) = fs::rename(&temp_path, dest_path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e.into());
    }
    Ok(())
}

/// Write/read/delete round-trip in one root.
async fn probe_root(root: &Path, label: &str) -> Result<()> {
    let test_dir = root.join(".health-check");
    let test_file = test_dir.join("probe.bin");

    fs::create_dir_all(&test_dir)
        .await
        .map_err(|e| Error::Config(format!("{}: create_dir_all({:?}): {}", label, test_dir, e)))?;

    let data = b"attache-health-check";
    fs::write(&test_file, data)
        .await
        .map_err(|e| Error::Config(format!("{}: write({:?}): {}", label, test_file, e)))?;

    let read_back = fs::read(&test_file)
        .await
        .map_err(|e| Error::Config(format!("{}: read({:?}): {}", label, test_file, e)))?;
    if read_back != data {
        return Err(Error::Config(format!("{}: read-back mismatch", label)));
    }

    fs::remove_file(&test_file)
        .await
        .map_err(|e| Error::Config(format!("{}: remove_file({:?}): {}", label, test_file, e)))?;
    let _ = fs::remove_dir(&test_dir).await; // Best-effort cleanup

    Ok(())
}
