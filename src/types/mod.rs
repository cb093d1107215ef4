// Handymarks shared type definitions
// Each submodule defines types used across the library.

pub mod bookmark;
pub mod enrichment;
pub mod errors;
