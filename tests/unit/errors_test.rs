//! Unit tests for Handymarks error types.
//!
//! Verifies Display formatting, the std::error::Error impl, and the
//! conversions that let store and validation failures flow into
//! `ServiceError` with `?`.

use handymarks::types::errors::{ServiceError, StoreError, ValidationError};

#[test]
fn store_error_display_includes_message() {
    let err = StoreError::Database("disk I/O error".to_string());
    assert_eq!(
        err.to_string(),
        "Bookmark store database error: disk I/O error"
    );
}

#[test]
fn validation_error_display_variants() {
    assert_eq!(
        ValidationError::InvalidUrl("ftp://host".to_string()).to_string(),
        "Invalid URL: ftp://host"
    );
    assert_eq!(
        ValidationError::EmptyField("url".to_string()).to_string(),
        "Required field is empty: url"
    );
    assert_eq!(
        ValidationError::DuplicateFolder("Work".to_string()).to_string(),
        "Folder already exists: Work"
    );
}

#[test]
fn errors_implement_std_error() {
    fn assert_error<E: std::error::Error>(_: &E) {}
    assert_error(&StoreError::Database("x".to_string()));
    assert_error(&ValidationError::InvalidUrl("x".to_string()));
    assert_error(&ServiceError::Store(StoreError::Database("x".to_string())));
}

#[test]
fn rusqlite_error_converts_to_store_error() {
    let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
    let StoreError::Database(msg) = err;
    assert!(!msg.is_empty());
}

#[test]
fn service_error_from_validation_and_store() {
    let v: ServiceError = ValidationError::InvalidUrl("bad".to_string()).into();
    assert!(matches!(v, ServiceError::Validation(_)));
    assert_eq!(v.to_string(), "Invalid URL: bad");

    let s: ServiceError = StoreError::Database("locked".to_string()).into();
    assert!(matches!(s, ServiceError::Store(_)));
    assert_eq!(s.to_string(), "Bookmark store database error: locked");
}
