//! Bookmark record store for Handymarks.
//!
//! Implements `BookmarkStoreTrait` — CRUD, listing, search and
//! export/import for bookmarks and folders, backed by SQLite via
//! `rusqlite`. Interested parties (a reactive UI layer, typically)
//! subscribe to change notifications instead of polling.

use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::params;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::database::Database;
use crate::types::bookmark::{Bookmark, BookmarkData, Folder};
use crate::types::errors::StoreError;

/// Change notification published after every successful mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    BookmarksChanged,
    FoldersChanged,
}

/// Trait defining record store operations.
pub trait BookmarkStoreTrait {
    /// Inserts a new bookmark, generating its id and all three timestamps.
    fn add_bookmark(
        &self,
        title: &str,
        url: &str,
        folder: Option<&str>,
        favicon: Option<&str>,
        description: Option<&str>,
    ) -> Result<Bookmark, StoreError>;
    /// Insert-or-replace preserving the caller's id and timestamps (import path).
    fn upsert_bookmark(&self, bookmark: &Bookmark) -> Result<(), StoreError>;
    /// Full-record update; only `last_updated` advances.
    fn update_bookmark(&self, bookmark: &Bookmark) -> Result<Bookmark, StoreError>;
    /// Backfills enrichment results. Sets only title/favicon (never url or
    /// description) and is a silent no-op if the record has been deleted.
    fn merge_enrichment(
        &self,
        id: &str,
        title: Option<&str>,
        favicon: Option<&str>,
    ) -> Result<(), StoreError>;
    fn get_bookmark(&self, id: &str) -> Result<Option<Bookmark>, StoreError>;
    /// Removes a bookmark. Idempotent — deleting a missing id is not an error.
    fn delete_bookmark(&self, id: &str) -> Result<(), StoreError>;
    /// Lists bookmarks in the named folder, or unfiled bookmarks for `None`.
    /// Ordered by `last_accessed` descending.
    fn list_bookmarks(&self, folder: Option<&str>) -> Result<Vec<Bookmark>, StoreError>;
    /// Every bookmark regardless of folder, `last_accessed` descending.
    fn all_bookmarks(&self) -> Result<Vec<Bookmark>, StoreError>;
    /// Bumps `last_accessed` to now; no-op if the id is absent.
    fn touch_access(&self, id: &str) -> Result<(), StoreError>;
    /// Case-insensitive substring match over title, url and description.
    fn search_bookmarks(&self, query: &str) -> Result<Vec<Bookmark>, StoreError>;
    fn add_folder(&self, name: &str) -> Result<Folder, StoreError>;
    /// True if a folder with this name exists under case-insensitive comparison.
    fn folder_exists(&self, name: &str) -> Result<bool, StoreError>;
    /// Removes a folder. Idempotent, and deliberately does NOT cascade:
    /// bookmarks keep their (now dangling) folder reference.
    fn delete_folder(&self, id: &str) -> Result<(), StoreError>;
    /// All folders ordered by `date_created` descending.
    fn list_folders(&self) -> Result<Vec<Folder>, StoreError>;
    fn export_all(&self) -> Result<BookmarkData, StoreError>;
    /// Upserts folders first, then bookmarks, keyed by identifier.
    fn import_all(&self, data: &BookmarkData) -> Result<(), StoreError>;
}

/// Record store backed by a shared SQLite connection.
///
/// Cloning yields a handle to the same store; clones share the change
/// notification channel.
#[derive(Clone)]
pub struct BookmarkStore {
    db: Database,
    events: broadcast::Sender<StoreEvent>,
}

const BOOKMARK_COLUMNS: &str =
    "id, title, url, folder, favicon, description, created, last_updated, last_accessed";

impl BookmarkStore {
    /// Creates a store over the given database handle.
    pub fn new(db: Database) -> Self {
        let (events, _) = broadcast::channel(64);
        Self { db, events }
    }

    /// Subscribes to change notifications. Each successful mutation
    /// publishes one event after it is durable.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn notify(&self, event: StoreEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }

    /// Returns the current UNIX timestamp in milliseconds.
    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }

    /// Reads a single bookmark row into a struct.
    fn row_to_bookmark(row: &rusqlite::Row) -> rusqlite::Result<Bookmark> {
        Ok(Bookmark {
            id: row.get(0)?,
            title: row.get(1)?,
            url: row.get(2)?,
            folder: row.get(3)?,
            favicon: row.get(4)?,
            description: row.get(5)?,
            created: row.get(6)?,
            last_updated: row.get(7)?,
            last_accessed: row.get(8)?,
        })
    }

    fn row_to_folder(row: &rusqlite::Row) -> rusqlite::Result<Folder> {
        Ok(Folder {
            id: row.get(0)?,
            name: row.get(1)?,
            date_created: row.get(2)?,
        })
    }

    fn query_bookmarks(
        &self,
        sql: &str,
        query_params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<Bookmark>, StoreError> {
        self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map(query_params, Self::row_to_bookmark)?;
            let mut results = Vec::new();
            for row in rows {
                results.push(row?);
            }
            Ok(results)
        })
    }
}

impl BookmarkStoreTrait for BookmarkStore {
    fn add_bookmark(
        &self,
        title: &str,
        url: &str,
        folder: Option<&str>,
        favicon: Option<&str>,
        description: Option<&str>,
    ) -> Result<Bookmark, StoreError> {
        let now = Self::now();
        let bookmark = Bookmark {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            url: url.to_string(),
            folder: folder.map(str::to_string),
            favicon: favicon.map(str::to_string),
            description: description.map(str::to_string),
            created: now,
            last_updated: now,
            last_accessed: now,
        };

        self.db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO bookmarks (id, title, url, folder, favicon, description, created, last_updated, last_accessed) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    bookmark.id,
                    bookmark.title,
                    bookmark.url,
                    bookmark.folder,
                    bookmark.favicon,
                    bookmark.description,
                    bookmark.created,
                    bookmark.last_updated,
                    bookmark.last_accessed
                ],
            )?;
            Ok(())
        })?;

        debug!(id = %bookmark.id, url = %bookmark.url, "bookmark added");
        self.notify(StoreEvent::BookmarksChanged);
        Ok(bookmark)
    }

    fn upsert_bookmark(&self, bookmark: &Bookmark) -> Result<(), StoreError> {
        self.db.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO bookmarks (id, title, url, folder, favicon, description, created, last_updated, last_accessed) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    bookmark.id,
                    bookmark.title,
                    bookmark.url,
                    bookmark.folder,
                    bookmark.favicon,
                    bookmark.description,
                    bookmark.created,
                    bookmark.last_updated,
                    bookmark.last_accessed
                ],
            )?;
            Ok(())
        })?;
        self.notify(StoreEvent::BookmarksChanged);
        Ok(())
    }

    fn update_bookmark(&self, bookmark: &Bookmark) -> Result<Bookmark, StoreError> {
        let mut updated = bookmark.clone();
        updated.last_updated = Self::now();

        self.db.with_connection(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO bookmarks (id, title, url, folder, favicon, description, created, last_updated, last_accessed) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    updated.id,
                    updated.title,
                    updated.url,
                    updated.folder,
                    updated.favicon,
                    updated.description,
                    updated.created,
                    updated.last_updated,
                    updated.last_accessed
                ],
            )?;
            Ok(())
        })?;
        self.notify(StoreEvent::BookmarksChanged);
        Ok(updated)
    }

    fn merge_enrichment(
        &self,
        id: &str,
        title: Option<&str>,
        favicon: Option<&str>,
    ) -> Result<(), StoreError> {
        if title.is_none() && favicon.is_none() {
            return Ok(());
        }
        let now = Self::now();
        // One statement, so a concurrent reader never sees a partial merge
        let affected = self.db.with_connection(|conn| {
            Ok(conn.execute(
                "UPDATE bookmarks SET title = COALESCE(?1, title), favicon = COALESCE(?2, favicon), last_updated = ?3 \
                 WHERE id = ?4",
                params![title, favicon, now, id],
            )?)
        })?;

        if affected > 0 {
            debug!(id = %id, "enrichment merged into bookmark");
            self.notify(StoreEvent::BookmarksChanged);
        } else {
            // Record deleted while enrichment was in flight; drop the result
            debug!(id = %id, "enrichment arrived for deleted bookmark, discarded");
        }
        Ok(())
    }

    fn get_bookmark(&self, id: &str) -> Result<Option<Bookmark>, StoreError> {
        self.db.with_connection(|conn| {
            let result = conn.query_row(
                &format!("SELECT {} FROM bookmarks WHERE id = ?1", BOOKMARK_COLUMNS),
                params![id],
                Self::row_to_bookmark,
            );
            match result {
                Ok(bookmark) => Ok(Some(bookmark)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn delete_bookmark(&self, id: &str) -> Result<(), StoreError> {
        let affected = self.db.with_connection(|conn| {
            Ok(conn.execute("DELETE FROM bookmarks WHERE id = ?1", params![id])?)
        })?;
        if affected > 0 {
            self.notify(StoreEvent::BookmarksChanged);
        }
        Ok(())
    }

    fn list_bookmarks(&self, folder: Option<&str>) -> Result<Vec<Bookmark>, StoreError> {
        match folder {
            Some(name) => self.query_bookmarks(
                &format!(
                    "SELECT {} FROM bookmarks WHERE folder = ?1 \
                     ORDER BY last_accessed DESC, created DESC, id",
                    BOOKMARK_COLUMNS
                ),
                &[&name],
            ),
            None => self.query_bookmarks(
                &format!(
                    "SELECT {} FROM bookmarks WHERE folder IS NULL OR folder = '' \
                     ORDER BY last_accessed DESC, created DESC, id",
                    BOOKMARK_COLUMNS
                ),
                &[],
            ),
        }
    }

    fn all_bookmarks(&self) -> Result<Vec<Bookmark>, StoreError> {
        self.query_bookmarks(
            &format!(
                "SELECT {} FROM bookmarks ORDER BY last_accessed DESC, created DESC, id",
                BOOKMARK_COLUMNS
            ),
            &[],
        )
    }

    fn touch_access(&self, id: &str) -> Result<(), StoreError> {
        let now = Self::now();
        let affected = self.db.with_connection(|conn| {
            Ok(conn.execute(
                "UPDATE bookmarks SET last_accessed = ?1 WHERE id = ?2",
                params![now, id],
            )?)
        })?;
        if affected > 0 {
            self.notify(StoreEvent::BookmarksChanged);
        }
        Ok(())
    }

    fn search_bookmarks(&self, query: &str) -> Result<Vec<Bookmark>, StoreError> {
        let pattern = format!("%{}%", query.to_lowercase());
        self.query_bookmarks(
            &format!(
                "SELECT {} FROM bookmarks \
                 WHERE lower(title) LIKE ?1 OR lower(url) LIKE ?1 OR lower(COALESCE(description, '')) LIKE ?1 \
                 ORDER BY last_accessed DESC, created DESC, id",
                BOOKMARK_COLUMNS
            ),
            &[&pattern],
        )
    }

    fn add_folder(&self, name: &str) -> Result<Folder, StoreError> {
        let folder = Folder {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            date_created: Self::now(),
        };
        self.db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO folders (id, name, date_created) VALUES (?1, ?2, ?3)",
                params![folder.id, folder.name, folder.date_created],
            )?;
            Ok(())
        })?;
        self.notify(StoreEvent::FoldersChanged);
        Ok(folder)
    }

    fn folder_exists(&self, name: &str) -> Result<bool, StoreError> {
        self.db.with_connection(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM folders WHERE name = ?1 COLLATE NOCASE",
                params![name],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    fn delete_folder(&self, id: &str) -> Result<(), StoreError> {
        // No cascade: bookmarks referencing this folder keep the name
        let affected = self.db.with_connection(|conn| {
            Ok(conn.execute("DELETE FROM folders WHERE id = ?1", params![id])?)
        })?;
        if affected > 0 {
            self.notify(StoreEvent::FoldersChanged);
        }
        Ok(())
    }

    fn list_folders(&self) -> Result<Vec<Folder>, StoreError> {
        self.db.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, date_created FROM folders ORDER BY date_created DESC, id",
            )?;
            let rows = stmt.query_map([], Self::row_to_folder)?;
            let mut results = Vec::new();
            for row in rows {
                results.push(row?);
            }
            Ok(results)
        })
    }

    fn export_all(&self) -> Result<BookmarkData, StoreError> {
        Ok(BookmarkData {
            bookmarks: self.all_bookmarks()?,
            folders: self.list_folders()?,
        })
    }

    fn import_all(&self, data: &BookmarkData) -> Result<(), StoreError> {
        self.db.with_connection(|conn| {
            // Folders first, then bookmarks, in one transaction
            conn.execute_batch("BEGIN")?;
            let result = (|| -> Result<(), StoreError> {
                for folder in &data.folders {
                    conn.execute(
                        "INSERT OR REPLACE INTO folders (id, name, date_created) VALUES (?1, ?2, ?3)",
                        params![folder.id, folder.name, folder.date_created],
                    )?;
                }
                for bookmark in &data.bookmarks {
                    conn.execute(
                        "INSERT OR REPLACE INTO bookmarks (id, title, url, folder, favicon, description, created, last_updated, last_accessed) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                        params![
                            bookmark.id,
                            bookmark.title,
                            bookmark.url,
                            bookmark.folder,
                            bookmark.favicon,
                            bookmark.description,
                            bookmark.created,
                            bookmark.last_updated,
                            bookmark.last_accessed
                        ],
                    )?;
                }
                Ok(())
            })();
            match result {
                Ok(()) => {
                    conn.execute_batch("COMMIT")?;
                    Ok(())
                }
                Err(e) => {
                    let _ = conn.execute_batch("ROLLBACK");
                    Err(e)
                }
            }
        })?;

        debug!(
            bookmarks = data.bookmarks.len(),
            folders = data.folders.len(),
            "import complete"
        );
        self.notify(StoreEvent::FoldersChanged);
        self.notify(StoreEvent::BookmarksChanged);
        Ok(())
    }
}
