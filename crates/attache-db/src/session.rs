//! The file-aware unit of work.
//!
//! A [`FileSession`] wraps one database transaction together with the file
//! store and a table of bound file attributes. Callers run their own row SQL
//! through [`FileSession::executor`]; the session contributes the parts SQL
//! cannot give you:
//!
//! - column values for file attributes at flush time, including deferred
//!   naming for templates that contain the record id
//! - the post-commit filesystem phase: deletions of superseded persistent
//!   files first, then promotions of staged files
//!
//! Nothing under the persistent root is touched until the database commit
//! has returned. A rollback therefore has no filesystem effect at all; any
//! staged files simply stay in the transient root until swept.

use std::sync::Arc;

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, info, warn};

use attache_core::{
    Error, FileRef, NameTemplate, PersistentFile, Result, TransientFile,
};
use attache_store::FileStore;

use crate::bound::{BoundFile, FlushValue};
use crate::pool::{create_pool, create_pool_with_config, PoolConfig};

/// Handle addressing one bound file attribute.
///
/// Only meaningful for the session that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSlot(usize);

/// Builds file sessions over a shared pool and store.
///
/// Cheap to clone; clones share the pool and the store.
#[derive(Debug, Clone)]
pub struct FileSessionFactory {
    pool: SqlitePool,
    store: Arc<FileStore>,
}

impl FileSessionFactory {
    /// Wrap an existing pool and store.
    pub fn new(pool: SqlitePool, store: Arc<FileStore>) -> Self {
        Self { pool, store }
    }

    /// Connect to `database_url` with default pool settings.
    pub async fn connect(database_url: &str, store: FileStore) -> Result<Self> {
        let pool = create_pool(database_url).await?;
        Ok(Self::new(pool, Arc::new(store)))
    }

    /// Connect to `database_url` with explicit pool settings.
    pub async fn connect_with_config(
        database_url: &str,
        config: PoolConfig,
        store: FileStore,
    ) -> Result<Self> {
        let pool = create_pool_with_config(database_url, config).await?;
        Ok(Self::new(pool, Arc::new(store)))
    }

    /// The shared file store.
    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a unit of work.
    pub async fn begin(&self) -> Result<FileSession> {
        let tx = self.pool.begin().await?;
        debug!(
            subsystem = "database",
            component = "session",
            op = "begin",
            "Unit of work started"
        );
        Ok(FileSession {
            tx,
            store: Arc::clone(&self.store),
            attrs: Vec::new(),
        })
    }
}

/// One database transaction plus the file attributes staged under it.
///
/// Consumed by [`commit`](FileSession::commit) or
/// [`rollback`](FileSession::rollback). Dropping a session without either
/// rolls the transaction back and, like an explicit rollback, leaves the
/// filesystem untouched.
pub struct FileSession {
    tx: Transaction<'static, Sqlite>,
    store: Arc<FileStore>,
    attrs: Vec<BoundFile>,
}

impl FileSession {
    /// The file store this session promotes into.
    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// The transaction connection, for running row SQL.
    pub fn executor(&mut self) -> &mut SqliteConnection {
        &mut *self.tx
    }

    /// Bind an attribute that currently holds no file.
    pub fn attach(&mut self, template: NameTemplate) -> FileSlot {
        self.attrs.push(BoundFile::new(template));
        FileSlot(self.attrs.len() - 1)
    }

    /// Bind an attribute primed with the file its record currently points at.
    ///
    /// Use this when updating or deleting an existing record, so a later
    /// [`assign`](FileSession::assign) knows which persistent file it
    /// supersedes.
    pub fn attach_committed(&mut self, template: NameTemplate, current: PersistentFile) -> FileSlot {
        self.attrs.push(BoundFile::with_committed(template, current));
        FileSlot(self.attrs.len() - 1)
    }

    fn attr_mut(&mut self, slot: FileSlot) -> Result<&mut BoundFile> {
        self.attrs
            .get_mut(slot.0)
            .ok_or_else(|| Error::InvalidInput(format!("unknown file slot: {}", slot.0)))
    }

    /// Stage a new file for the attribute, or stage removal with `None`.
    ///
    /// Staging has no filesystem effect. Reassigning before commit replaces
    /// the previously staged file, which is abandoned in the transient root.
    pub fn assign(&mut self, slot: FileSlot, value: Option<TransientFile>) -> Result<()> {
        let staged = value.as_ref().map(|t| t.name().to_string());
        let attr = self.attr_mut(slot)?;
        attr.assign(value);
        debug!(
            subsystem = "database",
            component = "session",
            op = "assign",
            slot = slot.0,
            transient_name = staged.as_deref().unwrap_or("<clear>"),
            "Attribute staged"
        );
        Ok(())
    }

    /// The value the attribute's column should hold when the row is written.
    ///
    /// Call with `None` before an INSERT. [`FlushValue::Ready`] is the exact
    /// column value; [`FlushValue::Deferred`] means the name template needs
    /// the record's primary key: insert the row with an empty column, then
    /// call again with `Some(id)` and UPDATE the column inside this same
    /// transaction. The first resolution sticks, so repeated calls are safe.
    pub fn flush_value(&mut self, slot: FileSlot, id: Option<i64>) -> Result<FlushValue> {
        let attr = self.attr_mut(slot)?;
        let value = attr.flush_value(id)?;
        debug!(
            subsystem = "database",
            component = "session",
            op = "flush",
            slot = slot.0,
            record_id = ?id,
            deferred = matches!(value, FlushValue::Deferred),
            "Column value resolved"
        );
        Ok(value)
    }

    /// Commit the transaction, then apply the derived filesystem changes.
    ///
    /// Fails without durable effect when a staged attribute was never
    /// resolved to a name, and with `Error::Database` when the database
    /// commit itself fails. Once the commit has returned, filesystem work is
    /// best effort: superseded persistent files are deleted first, staged
    /// files are promoted second, and any failures are logged and collected
    /// on the [`CommitOutcome`] instead of being raised. The database is the
    /// source of truth either way.
    pub async fn commit(mut self) -> Result<CommitOutcome> {
        for attr in &mut self.attrs {
            attr.ensure_resolved()?;
        }

        let mut deletes: Vec<(usize, PersistentFile)> = Vec::new();
        let mut promotes: Vec<(usize, TransientFile, String)> = Vec::new();
        for (slot, attr) in self.attrs.iter().enumerate() {
            let pending = attr.pending()?;
            if let Some(file) = pending.delete {
                deletes.push((slot, file));
            }
            if let Some((transient, name)) = pending.promote {
                promotes.push((slot, transient, name));
            }
        }

        self.tx.commit().await?;

        info!(
            subsystem = "database",
            component = "session",
            op = "commit",
            pending_deletes = deletes.len(),
            pending_promotes = promotes.len(),
            "Transaction committed, applying filesystem changes"
        );

        let mut files: Vec<Option<PersistentFile>> = self
            .attrs
            .iter()
            .map(|attr| attr.terminal(self.store.persistent_root()))
            .collect();
        let mut errors = Vec::new();

        // Superseded files go first: with a fixed-name template the old file
        // occupies the exact path the promotion targets.
        for (slot, superseded) in &deletes {
            if let Err(e) = self.store.delete(superseded).await {
                warn!(
                    subsystem = "database",
                    component = "session",
                    op = "commit",
                    slot = *slot,
                    persistent_name = %superseded.name(),
                    error = %e,
                    "Post-commit delete failed"
                );
                errors.push(e);
            }
        }

        for (slot, transient, name) in &promotes {
            match self.store.promote(transient, name).await {
                Ok(promoted) => files[*slot] = Some(promoted),
                Err(e) => {
                    warn!(
                        subsystem = "database",
                        component = "session",
                        op = "commit",
                        slot = *slot,
                        transient_name = %transient.name(),
                        persistent_name = %name,
                        error = %e,
                        "Post-commit promotion failed"
                    );
                    errors.push(e);
                }
            }
        }

        debug!(
            subsystem = "database",
            component = "session",
            op = "commit",
            error_count = errors.len(),
            "Unit of work finished"
        );
        Ok(CommitOutcome { files, errors })
    }

    /// Roll the transaction back. No filesystem effect.
    pub async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        debug!(
            subsystem = "database",
            component = "session",
            op = "rollback",
            "Unit of work rolled back, filesystem untouched"
        );
        Ok(())
    }
}

/// Result of a committed unit of work.
#[derive(Debug)]
pub struct CommitOutcome {
    files: Vec<Option<PersistentFile>>,
    errors: Vec<Error>,
}

impl CommitOutcome {
    /// The persistent file an attribute's column points at after the commit,
    /// or `None` when the column ended up empty.
    ///
    /// Reflects the durable database state even when the matching promotion
    /// failed; consult [`errors`](CommitOutcome::errors) for those.
    pub fn file(&self, slot: FileSlot) -> Option<&PersistentFile> {
        self.files.get(slot.0).and_then(|f| f.as_ref())
    }

    /// Filesystem failures encountered after the commit.
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// True when every post-commit filesystem operation succeeded.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
