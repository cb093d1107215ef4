use std::fmt;

// === StoreError ===

/// Errors related to the underlying bookmark storage.
///
/// A `StoreError` means the store is unavailable or corrupt; callers must
/// surface it rather than silently dropping the write.
#[derive(Debug)]
pub enum StoreError {
    /// A SQLite operation failed.
    Database(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Database(msg) => write!(f, "Bookmark store database error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

// === ValidationError ===

/// Errors for malformed input, rejected before any store or network call.
#[derive(Debug)]
pub enum ValidationError {
    /// The URL is not a parseable http/https URL.
    InvalidUrl(String),
    /// A required field was empty.
    EmptyField(String),
    /// A folder with the same name (case-insensitive) already exists.
    DuplicateFolder(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidUrl(url) => write!(f, "Invalid URL: {}", url),
            ValidationError::EmptyField(field) => write!(f, "Required field is empty: {}", field),
            ValidationError::DuplicateFolder(name) => {
                write!(f, "Folder already exists: {}", name)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

// === ServiceError ===

/// Errors surfaced by the `BookmarkService` facade.
///
/// Enrichment failures never appear here — the enrichment chain degrades
/// to defaults instead of erroring.
#[derive(Debug)]
pub enum ServiceError {
    /// Input was rejected before touching the store or the network.
    Validation(ValidationError),
    /// The record store failed.
    Store(StoreError),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Validation(e) => write!(f, "{}", e),
            ServiceError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<ValidationError> for ServiceError {
    fn from(e: ValidationError) -> Self {
        ServiceError::Validation(e)
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        ServiceError::Store(e)
    }
}
