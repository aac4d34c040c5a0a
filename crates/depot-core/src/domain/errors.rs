//! Error taxonomy for the artifact lifecycle.

use thiserror::Error;

/// Errors surfaced by the store ports and the service layer.
///
/// Design notes:
/// - `DuplicateIdentifier` is the metadata store's dedup signal. The service
///   consumes it during ingest (re-upload of identical content resolves to
///   the existing artifact) and never surfaces it as a hard error.
/// - `ConsistencyRollbackFailure` means the two stores have diverged and
///   out-of-band repair is required; callers must log it, never swallow it.
#[derive(Debug, Error)]
pub enum DepotError {
    #[error("artifact not found")]
    NotFound,

    #[error("content already stored")]
    DuplicateIdentifier,

    #[error("tag already present")]
    DuplicateTag,

    #[error("tag not found")]
    TagNotFound,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid retention deadline: {0}")]
    InvalidDeadline(String),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("storage backend failure: {0}")]
    StorageFailure(String),

    #[error("rollback failed for artifact {id}: {cause} (metadata row has no backing blob)")]
    ConsistencyRollbackFailure { id: String, cause: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
