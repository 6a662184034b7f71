//! File-backed collection store.
//!
//! # Data Flow
//! ```text
//! request for <user>
//!     → locks.rs (per-user mutex, held until the response is built)
//!     → user.rs (UserContext: username + collection + directory)
//!     → collection.rs (in-memory CRUD, id allocation)
//!     → disk.rs (data/<user>/<id>.json, atomic per-file writes)
//! ```
//!
//! # Design Decisions
//! - No in-memory cache across requests; disk is the source of truth
//! - Every operation returns `Result<_, StoreError>`
//! - Per-file faults during load/save are logged and skipped

pub mod collection;
pub mod disk;
pub mod error;
pub mod locks;
pub mod user;

pub use collection::Collection;
pub use disk::UserDir;
pub use error::StoreError;
pub use locks::UserLocks;
pub use user::UserContext;
