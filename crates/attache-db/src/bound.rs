//! Bound file attribute state machine.
//!
//! One [`BoundFile`] tracks one file-bearing column of one record within a
//! single unit of work. It answers two questions without touching the
//! filesystem: which value the column should hold at flush time, and which
//! filesystem operations become due once the transaction commits.
//!
//! However many times an attribute is reassigned before commit, the pending
//! operations are derived from the final state alone. Intermediate staged
//! files are simply abandoned in the transient root and are never promoted
//! or deleted.

use std::path::Path;

use attache_core::{
    split_extension, Error, FileRef, NameTemplate, PersistentFile, Result, TransientFile,
};

/// Outcome of resolving an attribute's column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushValue {
    /// The exact value the file column should hold (`None` means SQL NULL).
    Ready(Option<String>),
    /// The name template needs the record's primary key. Write the row with
    /// an empty column, then call again with the generated id and update the
    /// column inside the same transaction.
    Deferred,
}

/// Attribute state within one unit of work.
#[derive(Debug, Clone)]
enum AttrState {
    /// No file bound and none staged.
    Unset,
    /// The value loaded from the record, untouched so far.
    Committed(PersistentFile),
    /// A staged first value or replacement.
    StagedNew {
        transient: TransientFile,
        /// The committed file this staging supersedes, if any. Survives
        /// reassignment: only the originally committed file is ever deleted.
        prior: Option<PersistentFile>,
        /// The final name, once computed. Sticky for this staged file.
        resolved: Option<String>,
    },
    /// The committed value is staged for removal.
    StagedClear { prior: PersistentFile },
}

/// Filesystem work due after a successful database commit.
#[derive(Debug, Clone)]
pub(crate) struct Pending {
    pub(crate) delete: Option<PersistentFile>,
    pub(crate) promote: Option<(TransientFile, String)>,
}

/// One file-bearing attribute bound to a name template.
#[derive(Debug, Clone)]
pub(crate) struct BoundFile {
    template: NameTemplate,
    state: AttrState,
}

impl BoundFile {
    /// Attribute for a record (or column) that currently holds no file.
    pub(crate) fn new(template: NameTemplate) -> Self {
        Self {
            template,
            state: AttrState::Unset,
        }
    }

    /// Attribute primed with the file the record currently points at.
    pub(crate) fn with_committed(template: NameTemplate, current: PersistentFile) -> Self {
        Self {
            template,
            state: AttrState::Committed(current),
        }
    }

    /// Stage a new file, or stage removal with `None`.
    ///
    /// Reassignment replaces any previously staged file and clears its name
    /// resolution; the superseded committed file, if any, is retained so the
    /// commit phase still deletes it.
    pub(crate) fn assign(&mut self, value: Option<TransientFile>) {
        let state = std::mem::replace(&mut self.state, AttrState::Unset);
        self.state = match (state, value) {
            (AttrState::Unset, Some(t)) => AttrState::StagedNew {
                transient: t,
                prior: None,
                resolved: None,
            },
            (AttrState::Unset, None) => AttrState::Unset,
            (AttrState::Committed(p), Some(t)) => AttrState::StagedNew {
                transient: t,
                prior: Some(p),
                resolved: None,
            },
            (AttrState::Committed(p), None) => AttrState::StagedClear { prior: p },
            (AttrState::StagedNew { prior, .. }, Some(t)) => AttrState::StagedNew {
                transient: t,
                prior,
                resolved: None,
            },
            (AttrState::StagedNew { prior: Some(p), .. }, None) => {
                AttrState::StagedClear { prior: p }
            }
            (AttrState::StagedNew { prior: None, .. }, None) => AttrState::Unset,
            (AttrState::StagedClear { prior }, Some(t)) => AttrState::StagedNew {
                transient: t,
                prior: Some(prior),
                resolved: None,
            },
            (AttrState::StagedClear { prior }, None) => AttrState::StagedClear { prior },
        };
    }

    /// The value the file column should hold when the row is written.
    ///
    /// For a staged file this computes the persistent name from the template,
    /// taking the extension from the staged file. Pass the record's primary
    /// key once it is known; until then a template containing `{id}` yields
    /// [`FlushValue::Deferred`]. The first successful resolution is recorded
    /// and returned verbatim on every later call.
    pub(crate) fn flush_value(&mut self, id: Option<i64>) -> Result<FlushValue> {
        match &mut self.state {
            AttrState::Unset | AttrState::StagedClear { .. } => Ok(FlushValue::Ready(None)),
            AttrState::Committed(p) => Ok(FlushValue::Ready(Some(p.name().to_string()))),
            AttrState::StagedNew {
                transient,
                resolved,
                ..
            } => {
                if let Some(name) = resolved {
                    return Ok(FlushValue::Ready(Some(name.clone())));
                }
                if self.template.requires_id() && id.is_none() {
                    return Ok(FlushValue::Deferred);
                }
                let (_, ext) = split_extension(transient.name());
                let name = self.template.render(id, ext)?;
                *resolved = Some(name.clone());
                Ok(FlushValue::Ready(Some(name)))
            }
        }
    }

    /// Fail if a staged file still has no name.
    ///
    /// Resolves on the spot when the template permits it; a template that
    /// needs the record id cannot be resolved here and the commit must not
    /// proceed.
    pub(crate) fn ensure_resolved(&mut self) -> Result<()> {
        match self.flush_value(None)? {
            FlushValue::Ready(_) => Ok(()),
            FlushValue::Deferred => Err(Error::InvalidInput(format!(
                "staged file was never resolved: template '{}' needs the record id, \
                 call flush_value with the id before commit",
                self.template.source()
            ))),
        }
    }

    /// Derive the post-commit filesystem operations from the final state.
    pub(crate) fn pending(&self) -> Result<Pending> {
        match &self.state {
            AttrState::Unset | AttrState::Committed(_) => Ok(Pending {
                delete: None,
                promote: None,
            }),
            AttrState::StagedClear { prior } => Ok(Pending {
                delete: Some(prior.clone()),
                promote: None,
            }),
            AttrState::StagedNew {
                transient,
                prior,
                resolved,
            } => {
                let name = resolved.as_ref().ok_or_else(|| {
                    Error::InvalidInput(format!(
                        "staged file was never resolved: {}",
                        transient.name()
                    ))
                })?;
                Ok(Pending {
                    delete: prior.clone(),
                    promote: Some((transient.clone(), name.clone())),
                })
            }
        }
    }

    /// The file the column points at once the transaction is durable, or
    /// `None` for an empty column.
    pub(crate) fn terminal(&self, persistent_root: &Path) -> Option<PersistentFile> {
        match &self.state {
            AttrState::Unset | AttrState::StagedClear { .. } => None,
            AttrState::Committed(p) => Some(p.clone()),
            AttrState::StagedNew {
                resolved: Some(name),
                ..
            } => Some(PersistentFile::new(persistent_root, name.clone())),
            AttrState::StagedNew { resolved: None, .. } => None,
        }
    }
}
