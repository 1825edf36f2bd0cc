use thiserror::Error;

/// A record failed schema checks. Always names the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("expected an object, found {found}")]
    NotAnObject { found: &'static str },

    #[error("missing required field `{field}`")]
    Missing { field: &'static str },

    #[error("field `{field}` must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("field `{field}` has unknown value {value:?}")]
    UnknownVariant { field: &'static str, value: String },

    #[error("title must be at least {min} characters")]
    TitleTooShort { min: usize },

    #[error("field `{field}` is not a valid date: {value}")]
    InvalidDate { field: &'static str, value: String },

    #[error("createdAt is later than updatedAt")]
    TimestampsOutOfOrder,
}

/// Failure of a task store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("task {0} not found")]
    NotFound(u32),

    #[error("no task ids left to assign")]
    IdsExhausted,
}

/// Failure reported by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("storage is unavailable: {0}")]
    Unavailable(String),

    #[error("failed to write slot `{key}`: {reason}")]
    Write { key: String, reason: String },
}

/// Problems found while decoding the persisted slot. None of these are fatal;
/// the store skips what it can't read and keeps going.
#[derive(Debug, Error)]
pub enum PersistedStateCorrupt {
    #[error("slot contents are not valid JSON: {0}")]
    Unparsable(#[from] serde_json::Error),

    #[error("slot contents are not a sequence of tasks")]
    NotASequence,

    #[error("entry {index} is invalid: {source}")]
    InvalidEntry {
        index: usize,
        #[source]
        source: ValidationError,
    },

    #[error("entry {index} repeats task id {id}")]
    DuplicateId { index: usize, id: u32 },
}
