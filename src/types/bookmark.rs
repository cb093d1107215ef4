use serde::{Deserialize, Serialize};

/// Represents a saved bookmark.
///
/// `folder` is a weak by-value reference to [`Folder::name`]: deleting a
/// folder leaves the reference dangling rather than cascading. Timestamps
/// are UNIX milliseconds; `created <= last_updated` and
/// `created <= last_accessed` always hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub title: String,
    pub url: String,
    pub folder: Option<String>,
    pub favicon: Option<String>,
    pub description: Option<String>,
    pub created: i64,
    pub last_updated: i64,
    pub last_accessed: i64,
}

/// Represents a folder for organizing bookmarks.
///
/// Folder names are unique under case-insensitive comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub date_created: i64,
}

/// User-supplied input for creating a bookmark. The title may be empty;
/// a placeholder derived from the URL hostname is used until enrichment
/// resolves the real page title.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookmarkDraft {
    pub title: String,
    pub url: String,
    pub folder: Option<String>,
    pub description: Option<String>,
}

/// Export/import bundle holding the full contents of a store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookmarkData {
    pub bookmarks: Vec<Bookmark>,
    pub folders: Vec<Folder>,
}
