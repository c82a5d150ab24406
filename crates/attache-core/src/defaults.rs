//! Centralized default constants for attache.
//!
//! **This module is the single source of truth** for shared default values.
//! All crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// TRANSIENT NAMES
// =============================================================================

/// Random bytes of entropy in a generated transient name.
///
/// Hex-encoded to twice as many characters. 64 bits keeps collisions
/// probabilistically impossible within a single transient root.
pub const TRANSIENT_NAME_RANDOM_BYTES: usize = 8;

// =============================================================================
// FILE STORE
// =============================================================================

/// Suffix appended to a file's final path while it is being written.
///
/// Writes go to `<name>.tmp` and are renamed into place, so a half-written
/// file is never visible under a valid name.
pub const TEMP_SUFFIX: &str = "tmp";

/// Buffer size for streaming copies (upload intake, cross-device promotion).
pub const COPY_BUFFER_BYTES: usize = 64 * 1024;

/// Unix permission bits applied to materialized files (rw-r--r--, no execute).
#[cfg(unix)]
pub const FILE_MODE: u32 = 0o644;

// =============================================================================
// NAME LIMITS
// =============================================================================

/// Maximum file name length in bytes (ext4/NTFS compatible).
pub const FILENAME_MAX_LENGTH: usize = 255;
