//! # attache-db
//!
//! SQLite unit of work for attache.
//!
//! This crate provides:
//! - Connection pool management
//! - The bound file attribute state machine
//! - File sessions: one transaction plus the staged file operations that
//!   run only after it commits
//!
//! ## Example
//!
//! ```rust,ignore
//! use attache_db::{FileSessionFactory, FileStore, FlushValue};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = FileStore::new("/srv/app/transient", "/srv/app/media");
//!     let factory = FileSessionFactory::connect("sqlite:app.db", store).await?;
//!
//!     let mut session = factory.begin().await?;
//!     let staged = session
//!         .store()
//!         .create_transient_from_bytes(b"\x89PNG...", "photo.png")
//!         .await?;
//!
//!     let slot = session.attach("obj/{id}{ext}".parse()?);
//!     session.assign(slot, Some(staged))?;
//!
//!     // The template needs the generated id: insert first, then fill the
//!     // column inside the same transaction.
//!     assert!(matches!(session.flush_value(slot, None)?, FlushValue::Deferred));
//!     let id = sqlx::query("INSERT INTO obj (file_name) VALUES (NULL)")
//!         .execute(session.executor())
//!         .await?
//!         .last_insert_rowid();
//!     if let FlushValue::Ready(Some(name)) = session.flush_value(slot, Some(id))? {
//!         sqlx::query("UPDATE obj SET file_name = ?1 WHERE id = ?2")
//!             .bind(&name)
//!             .bind(id)
//!             .execute(session.executor())
//!             .await?;
//!     }
//!
//!     let outcome = session.commit().await?;
//!     println!("bound file: {:?}", outcome.file(slot));
//!     Ok(())
//! }
//! ```
pub mod bound;
pub mod pool;
pub mod session;

// Re-export core types
pub use attache_core::*;

// Re-export the store so callers need only this crate
pub use attache_store::{FileStore, StoreConfig};

pub use bound::FlushValue;
pub use pool::{
    create_memory_pool, create_pool, create_pool_with_config, log_pool_metrics, PoolConfig,
};
pub use session::{CommitOutcome, FileSession, FileSessionFactory, FileSlot};
