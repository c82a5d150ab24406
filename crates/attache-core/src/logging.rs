//! Structured logging schema and field name constants for attache.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized field names across
//! every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | WARN  | Best-effort filesystem operation failed after commit |
//! | INFO  | Lifecycle events (pool creation, commit outcomes) |
//! | DEBUG | Individual store operations, state transitions |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "store", "database"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "pool", "session"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "create_transient", "promote", "delete", "commit"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Name of the file being operated on, relative to its root.
pub const FILE_NAME: &str = "file_name";

/// Transient name a staged file was allocated under.
pub const TRANSIENT_NAME: &str = "transient_name";

/// Final persistent name a file was promoted to.
pub const PERSISTENT_NAME: &str = "persistent_name";

/// Slot index of a bound attribute within its session.
pub const SLOT: &str = "slot";

/// Primary key of the owning record, once known.
pub const RECORD_ID: &str = "record_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Byte length of a materialized file.
pub const SIZE_BYTES: &str = "size_bytes";

/// Number of superseded files scheduled for deletion at commit.
pub const PENDING_DELETES: &str = "pending_deletes";

/// Number of staged files scheduled for promotion at commit.
pub const PENDING_PROMOTES: &str = "pending_promotes";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
