//! Store error definitions.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the collection store.
///
/// `NotFound` and `Duplicate` are expected outcomes of client requests;
/// the remaining variants are storage faults.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No item with this id in the collection.
    #[error("Funko with ID {0} not found")]
    NotFound(String),

    /// An item with this id already exists.
    #[error("Funko with ID {0} already exists")]
    Duplicate(String),

    /// The numeric id space of this collection is used up.
    #[error("No free Funko ID left")]
    IdsExhausted,

    /// Item id cannot be used as a file name.
    #[error("Invalid Funko ID: {0:?}")]
    InvalidId(String),

    /// Username cannot be used as a directory name.
    #[error("Invalid username: {0:?}")]
    InvalidUsername(String),

    /// Filesystem operation failed.
    #[error("Storage error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Item could not be encoded as JSON.
    #[error("Failed to encode Funko {id}: {source}")]
    Encode {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// Some item files could not be written.
    #[error("Failed to save {failed} of {total} Funkos")]
    PartialSave { failed: usize, total: usize },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is a storage fault rather than a client-facing outcome.
    pub fn is_storage_fault(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::Encode { .. } | Self::InvalidId(_) | Self::PartialSave { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
