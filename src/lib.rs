//! Handymarks — a bookmark persistence store with an asynchronous
//! metadata-enrichment pipeline.
//!
//! This library crate exposes all modules for use by a presentation layer
//! and integration tests. Saving a bookmark is always synchronous and
//! network-free; title and favicon resolution runs as a best-effort
//! background task that backfills the record once it settles.

pub mod database;
pub mod enrichment;
pub mod service;
pub mod store;
pub mod types;
