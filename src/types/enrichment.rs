/// Outcome of running the enrichment chain for one URL.
///
/// Transient — never persisted directly. Only the winning candidate's
/// fields are merged back into a stored bookmark.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    /// Resolved page title, if any source (or the hostname fallback) produced one.
    pub title: Option<String>,
    /// Resolved favicon URL, if any source (or the backstop) produced one.
    pub favicon: Option<String>,
    /// Which sources produced the winning candidates.
    pub provenance: Provenance,
}

impl Enrichment {
    /// An enrichment carrying nothing — returned for URLs that are not
    /// eligible for enrichment (non-http/https). Not an error.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Names of the sources that produced each winning field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Provenance {
    pub title_source: Option<String>,
    pub favicon_source: Option<String>,
}
