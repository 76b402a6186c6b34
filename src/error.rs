/// Error types for sqlx-sqlbind
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A pairwise modifier such as `variables()` received an odd or empty argument list
    #[error("{modifier}() must have a positive, even number of args, got {count}")]
    ModifierArguments {
        modifier: &'static str,
        count: usize,
    },

    /// The parameter source has a shape that cannot provide named fields
    #[error("Unsupported parameter source: {0}")]
    UnsupportedSource(String),

    /// No field is mapped to the requested name
    #[error("Field '{0}' not found")]
    FieldNotFound(String),

    /// The field exists but cannot be written to (e.g. it lives in an absent embedded record)
    #[error("Cannot get a writable reference to field '{0}'")]
    NotAddressable(String),

    /// The cursor had no row to scan
    #[error("No rows in result set")]
    NoRows,

    /// A decoded column value does not fit the destination field
    #[error("Cannot assign {found} value to {expected} field")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// A value that cannot be sent to the driver as a single parameter
    #[error("Unsupported parameter value: {0}")]
    UnsupportedValue(String),

    /// A placeholder style name that is not recognized
    #[error("Unknown placeholder style '{0}'")]
    UnknownStyle(String),

    /// Broken internal invariant
    #[error("Internal error: {0}")]
    Internal(&'static str),

    /// Error from SQLx database operations
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type alias for sqlx-sqlbind operations
pub type Result<T> = std::result::Result<T, Error>;
