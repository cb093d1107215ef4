// Handymarks enrichment pipeline
// Best-effort resolution of page titles and favicons from untrusted
// external sources. Nothing in here may block a bookmark save, and no
// source failure is ever surfaced to the caller.

pub mod debounce;
pub mod orchestrator;
pub mod sources;

pub use debounce::UrlDebouncer;
pub use orchestrator::Enricher;
pub use sources::{FaviconSource, TitleSource};
