//! Error types for the record store and the circulation manager.

use std::fmt;
use thiserror::Error;

/// Error type for record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Corrupt store file {path}: {reason}")]
    Corruption { path: String, reason: String },

    #[error("Store is locked by another process")]
    Locked,

    #[error("Store not initialized")]
    NotInitialized,

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// The kind of entity an identifier refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Book,
    Member,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Book => "book",
            EntityKind::Member => "member",
        };
        f.write_str(name)
    }
}

/// A circulation rule that rejected an otherwise well-formed request.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StateViolation {
    #[error("book not available: {0}")]
    BookNotAvailable(String),

    #[error("member inactive: {0}")]
    MemberInactive(String),

    #[error("no active loan for this book: {0}")]
    NoActiveLoan(String),
}

/// Error type for circulation operations.
///
/// Everything except [`CirculationError::Persistence`] and
/// [`CirculationError::CorruptRecord`] is a rejected request that left the
/// store untouched.
#[derive(Debug, Error)]
pub enum CirculationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid email address: {0}")]
    InvalidFormat(String),

    #[error("{kind} already exists: {id}")]
    DuplicateIdentifier { kind: EntityKind, id: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("{0}")]
    InvalidState(StateViolation),

    /// The store could not be written.
    #[error("persistence failure: {0}")]
    Persistence(StoreError),

    /// A stored record could not be decoded into its model.
    #[error("corrupt record: {0}")]
    CorruptRecord(String),
}

impl CirculationError {
    /// True when the request was rejected by validation rather than by the store.
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            CirculationError::Persistence(_) | CirculationError::CorruptRecord(_)
        )
    }
}

impl From<StoreError> for CirculationError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Deserialization(reason) => CirculationError::CorruptRecord(reason),
            other => CirculationError::Persistence(other),
        }
    }
}

impl From<StateViolation> for CirculationError {
    fn from(v: StateViolation) -> Self {
        CirculationError::InvalidState(v)
    }
}

/// Result type for circulation operations.
pub type CirculationResult<T> = std::result::Result<T, CirculationError>;
