//! Bookmark service facade for Handymarks.
//!
//! This is the surface the presentation layer talks to. Saves validate
//! and hit the store synchronously — with a placeholder title and the
//! backstop favicon — while the real title/favicon resolution runs as a
//! detached background task that backfills the record. Enrichment
//! failures never reach the caller; store failures always do.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tracing::warn;

use crate::database::Database;
use crate::enrichment::debounce::UrlDebouncer;
use crate::enrichment::orchestrator::{parse_web_url, Enricher};
use crate::store::{BookmarkStore, BookmarkStoreTrait, StoreEvent};
use crate::types::bookmark::{Bookmark, BookmarkData, BookmarkDraft, Folder};
use crate::types::enrichment::Enrichment;
use crate::types::errors::{ServiceError, ValidationError};

/// Facade over the record store and the enrichment orchestrator.
/// Constructed once per process; dropping it tears everything down.
pub struct BookmarkService {
    store: BookmarkStore,
    enricher: Arc<Enricher>,
}

impl BookmarkService {
    /// Creates a service with the default enrichment source chains.
    pub fn new(db: Database) -> Self {
        Self::with_enricher(db, Enricher::new())
    }

    /// Creates a service with a custom orchestrator (tests, alternate chains).
    pub fn with_enricher(db: Database, enricher: Enricher) -> Self {
        Self {
            store: BookmarkStore::new(db),
            enricher: Arc::new(enricher),
        }
    }

    /// Direct access to the record store.
    pub fn store(&self) -> &BookmarkStore {
        &self.store
    }

    /// Subscribes to store change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.store.subscribe()
    }

    /// Saves a bookmark.
    ///
    /// Validation happens before any store or network call: the URL must
    /// be a parseable http/https URL. The returned record already carries
    /// a non-empty title (the user's, or the hostname placeholder) and a
    /// favicon reference (the backstop), so the save never waits on the
    /// network. A background task then runs the full source chains and
    /// merges the winner back in.
    pub async fn add_bookmark(&self, draft: &BookmarkDraft) -> Result<Bookmark, ServiceError> {
        let url = draft.url.trim();
        if url.is_empty() {
            return Err(ValidationError::EmptyField("url".to_string()).into());
        }
        let parsed =
            parse_web_url(url).ok_or_else(|| ValidationError::InvalidUrl(url.to_string()))?;

        let user_title = draft.title.trim();
        let placeholder = if user_title.is_empty() {
            parsed.host_str().unwrap_or(url).to_string()
        } else {
            user_title.to_string()
        };
        let favicon = Enricher::backstop_favicon(url);
        let folder = normalize(draft.folder.as_deref());
        let description = normalize(draft.description.as_deref());

        let bookmark =
            self.store
                .add_bookmark(&placeholder, url, folder, favicon.as_deref(), description)?;

        // Backfill: never overwrite a title the user typed themselves
        let store = self.store.clone();
        let enricher = Arc::clone(&self.enricher);
        let id = bookmark.id.clone();
        let target = url.to_string();
        let keep_user_title = !user_title.is_empty();
        tokio::spawn(async move {
            let enrichment = enricher.enrich(&target).await;
            let title = if keep_user_title {
                None
            } else {
                enrichment.title.as_deref()
            };
            if let Err(e) = store.merge_enrichment(&id, title, enrichment.favicon.as_deref()) {
                warn!(id = %id, error = %e, "enrichment backfill failed");
            }
        });

        Ok(bookmark)
    }

    /// Updates an existing bookmark in full. The URL must still be valid
    /// and the title non-empty.
    pub fn update_bookmark(&self, bookmark: &Bookmark) -> Result<Bookmark, ServiceError> {
        if parse_web_url(&bookmark.url).is_none() {
            return Err(ValidationError::InvalidUrl(bookmark.url.clone()).into());
        }
        if bookmark.title.trim().is_empty() {
            return Err(ValidationError::EmptyField("title".to_string()).into());
        }
        Ok(self.store.update_bookmark(bookmark)?)
    }

    pub fn get_bookmark(&self, id: &str) -> Result<Option<Bookmark>, ServiceError> {
        Ok(self.store.get_bookmark(id)?)
    }

    /// Deletes a bookmark; idempotent.
    pub fn delete_bookmark(&self, id: &str) -> Result<(), ServiceError> {
        Ok(self.store.delete_bookmark(id)?)
    }

    /// Records that a bookmark was opened.
    pub fn touch_access(&self, id: &str) -> Result<(), ServiceError> {
        Ok(self.store.touch_access(id)?)
    }

    /// Lists bookmarks in the named folder, or unfiled ones for `None`.
    pub fn list_bookmarks(&self, folder: Option<&str>) -> Result<Vec<Bookmark>, ServiceError> {
        Ok(self.store.list_bookmarks(folder)?)
    }

    /// Case-insensitive substring search over title, url and description.
    pub fn search_bookmarks(&self, query: &str) -> Result<Vec<Bookmark>, ServiceError> {
        Ok(self.store.search_bookmarks(query)?)
    }

    /// Creates a folder. Names are unique case-insensitively.
    pub fn add_folder(&self, name: &str) -> Result<Folder, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyField("name".to_string()).into());
        }
        if self.store.folder_exists(name)? {
            return Err(ValidationError::DuplicateFolder(name.to_string()).into());
        }
        Ok(self.store.add_folder(name)?)
    }

    /// Deletes a folder; idempotent. Bookmarks keep their folder reference.
    pub fn delete_folder(&self, id: &str) -> Result<(), ServiceError> {
        Ok(self.store.delete_folder(id)?)
    }

    pub fn list_folders(&self) -> Result<Vec<Folder>, ServiceError> {
        Ok(self.store.list_folders()?)
    }

    pub fn export_all(&self) -> Result<BookmarkData, ServiceError> {
        Ok(self.store.export_all()?)
    }

    /// Imports a bundle: folders first, then bookmarks, upsert by id.
    pub fn import_all(&self, data: &BookmarkData) -> Result<(), ServiceError> {
        Ok(self.store.import_all(data)?)
    }

    /// Wires a debounced intake to the orchestrator: raw URL-field edits
    /// go into the returned debouncer, and at most one [`Enrichment`] per
    /// quiet window comes out of the receiver (for prefilling a form —
    /// this path never writes to the store). Dropping the debouncer or
    /// the receiver cancels the whole pipeline.
    pub fn debounced_enrichment(
        &self,
        quiet: Duration,
    ) -> (UrlDebouncer, mpsc::Receiver<Enrichment>) {
        let (debouncer, mut urls) = UrlDebouncer::spawn(quiet);
        let (tx, rx) = mpsc::channel(16);
        let enricher = Arc::clone(&self.enricher);
        tokio::spawn(async move {
            while let Some(url) = urls.recv().await {
                let enrichment = enricher.enrich(&url).await;
                if tx.send(enrichment).await.is_err() {
                    break;
                }
            }
        });
        (debouncer, rx)
    }
}

fn normalize(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
