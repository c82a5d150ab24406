//! File name rules shared by the store and the session layer.
//!
//! Two classes of names exist:
//! - **transient names** are flat tokens handed out to clients and round-tripped
//!   through untrusted input (form resubmission), so they get the strict
//!   injection guard;
//! - **persistent names** are derived from server-side templates and may contain
//!   `/` subdirectories, but still must stay inside their root.
//!
//! Validation rejects, never sanitizes: a bad name is an error carrying the
//! offending input, raised before any filesystem access.

use crate::defaults::FILENAME_MAX_LENGTH;
use crate::error::{Error, Result};

/// Split a client-supplied file name into `(stem, extension)`.
///
/// The extension includes the leading dot and is empty when the name has none.
/// Leading dots do not start an extension (`.bashrc` has no extension), and a
/// dot inside a directory prefix is ignored (`a.b/c` has no extension).
///
/// ```
/// use attache_core::naming::split_extension;
///
/// assert_eq!(split_extension("photo.jpg"), ("photo", ".jpg"));
/// assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
/// assert_eq!(split_extension("README"), ("README", ""));
/// assert_eq!(split_extension(".bashrc"), (".bashrc", ""));
/// ```
pub fn split_extension(name: &str) -> (&str, &str) {
    // Browsers occasionally send a full client path; only the last component
    // can carry an extension.
    let base_start = name
        .rfind(['/', '\\'])
        .map(|i| i + 1)
        .unwrap_or(0);
    let base = &name[base_start..];

    let Some(dot) = base.rfind('.') else {
        return (name, "");
    };

    // A name made of nothing but leading dots before the final dot has no
    // extension ("..." or ".bashrc").
    if base[..dot].chars().all(|c| c == '.') {
        return (name, "");
    }

    let split_at = base_start + dot;
    (&name[..split_at], &name[split_at..])
}

/// Validate a transient file name received from a client.
///
/// Transient names are flat: a single path component with no separators.
/// Anything that could escape the transient root is rejected with
/// [`Error::IllegalName`] before the filesystem is touched.
pub fn validate_transient_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::IllegalName("empty name".to_string()));
    }
    if name.len() > FILENAME_MAX_LENGTH {
        let head: String = name.chars().take(32).collect();
        return Err(Error::IllegalName(format!("{}... (too long)", head)));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(Error::IllegalName(format!("{} (path separator)", name)));
    }
    if name == "." || name == ".." {
        return Err(Error::IllegalName(format!("{} (relative component)", name)));
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(Error::IllegalName(format!(
            "{} (control character)",
            name.escape_debug()
        )));
    }
    Ok(())
}

/// Validate a persistent file name (a template-derived path under the
/// persistent root).
///
/// Subdirectories are allowed; absolute paths, backslashes, empty segments
/// and `.`/`..` segments are not.
pub fn validate_persistent_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::IllegalName("empty name".to_string()));
    }
    if name.contains('\\') {
        return Err(Error::IllegalName(format!("{} (backslash)", name)));
    }
    if name.starts_with('/') {
        return Err(Error::IllegalName(format!("{} (absolute path)", name)));
    }
    if name.chars().any(|c| c.is_control()) {
        return Err(Error::IllegalName(format!(
            "{} (control character)",
            name.escape_debug()
        )));
    }
    for segment in name.split('/') {
        if segment.is_empty() {
            return Err(Error::IllegalName(format!("{} (empty segment)", name)));
        }
        if segment == "." || segment == ".." {
            return Err(Error::IllegalName(format!(
                "{} (relative segment)",
                name
            )));
        }
        if segment.len() > FILENAME_MAX_LENGTH {
            let head: String = segment.chars().take(32).collect();
            return Err(Error::IllegalName(format!("{}... (segment too long)", head)));
        }
    }
    Ok(())
}
