//! Storage error types.

use beads_core::idgen::IdError;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested entity was not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g., "issue", "config").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// The database has not been initialized.
    #[error("database not initialized: {reason}")]
    NotInitialized {
        /// Why the database is considered uninitialized.
        reason: String,
    },

    /// An issue ID does not match the configured prefix.
    #[error("issue {id} does not match configured prefix {prefix}")]
    PrefixMismatch {
        /// The issue ID.
        id: String,
        /// The expected prefix.
        prefix: String,
    },

    /// A validation constraint was violated.
    #[error("validation error: {message}")]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// Adding a dependency would create a cycle in the dependency graph.
    #[error("adding this dependency would create a cycle")]
    CycleDetected,

    /// A dependency edge refers to an endpoint that does not exist.
    #[error("dependency endpoint not found: {0} -> {1}")]
    MissingEndpoint(String, String),

    /// Import encountered a dependency edge whose endpoint is missing and
    /// the configured orphan mode is `strict`.
    #[error("orphan dependency {from} -> {to}: endpoint does not exist")]
    OrphanDependency {
        /// Source issue of the edge.
        from: String,
        /// Missing target issue.
        to: String,
    },

    /// An import/export operation would overwrite a non-empty store with
    /// zero records, and `--force` was not given.
    #[error("refusing to overwrite a non-empty store with an empty import (use --force)")]
    EmptyStoreOverwrite,

    /// The local store is stale relative to the sync log and `--allow-stale`
    /// was not given.
    #[error("local store is stale relative to the sync log (use --allow-stale)")]
    Stale,

    /// An advisory lock could not be acquired (held by another live process).
    #[error("lock contention: {0}")]
    LockContention(String),

    /// A dependency or id string used a kind/prefix not accepted by the
    /// closed configuration surface.
    #[error("invalid kind: {0}")]
    InvalidKind(String),

    /// An id string failed [`beads_core::idgen::parse_id`] or
    /// [`beads_core::idgen::validate_prefix`].
    #[error("malformed id: {0}")]
    MalformedId(String),

    /// An id prefix failed [`beads_core::idgen::validate_prefix`].
    #[error("invalid prefix: {0}")]
    InvalidPrefix(String),

    /// Catch-all for malformed caller input that isn't a validation rule
    /// violation (e.g. an empty batch, a negative limit).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The database is locked by another process.
    #[error("database locked: {0}")]
    DatabaseLocked(String),

    /// Failed to establish or maintain a database connection.
    #[error("connection error: {0}")]
    Connection(String),

    /// A transaction operation failed.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// A schema migration failed.
    #[error("migration {name} failed: {reason}")]
    Migration {
        /// Name of the migration that failed.
        name: String,
        /// Underlying error description.
        reason: String,
    },

    /// A raw SQLite query error.
    #[error("query error: {0}")]
    Query(#[from] rusqlite::Error),

    /// JSON serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Catch-all for unexpected internal errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience alias used throughout the storage crate.
pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    // -- Constructors --------------------------------------------------------

    /// Creates a [`StorageError::NotFound`] for the given entity kind and id.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a [`StorageError::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    // -- Predicates ----------------------------------------------------------

    /// Returns `true` if this is a [`StorageError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if the error is transient and the operation may succeed
    /// on retry (e.g., database locked, connection errors).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DatabaseLocked(_) | Self::Connection(_) | Self::Transaction(_) | Self::LockContention(_)
        )
    }
}

impl From<IdError> for StorageError {
    fn from(e: IdError) -> Self {
        match e {
            IdError::InvalidPrefix(s) => Self::InvalidPrefix(s),
            IdError::MalformedId(s) => Self::MalformedId(s),
        }
    }
}
