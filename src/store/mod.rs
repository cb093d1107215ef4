// Handymarks record store
// The store is the single unit of truth for bookmarks and folders.

pub mod bookmark_store;

pub use bookmark_store::{BookmarkStore, BookmarkStoreTrait, StoreEvent};
