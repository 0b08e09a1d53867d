//! Storage abstraction for documents.
//!
//! [`DocumentStore`] is the seam between the document service and its
//! backing store. [`PgDocumentStore`] runs against PostgreSQL through
//! [`DocumentRepo`](crate::repositories::DocumentRepo); [`MemoryDocumentStore`]
//! keeps an in-process adjacency list for tests and local demos.

mod memory;
mod postgres;

use async_trait::async_trait;
use notebook_core::document::FlagChange;
use notebook_core::tree::TreeEdge;
use notebook_core::types::DocumentId;

use crate::models::document::{CreateDocument, Document, UpdateDocument};

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A write would break the parent/child structure (e.g. delete a parent
    /// while keeping a child).
    #[error("Integrity violation: {0}")]
    Integrity(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations the document service relies on.
///
/// Single-document methods return `None` when the id does not exist; they do
/// not check ownership. Owner-scoped methods take the owner's `user_id`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Confirm the store is reachable.
    async fn ping(&self) -> StoreResult<()>;

    async fn insert(&self, user_id: &str, input: &CreateDocument) -> StoreResult<Document>;

    async fn find_by_id(&self, id: DocumentId) -> StoreResult<Option<Document>>;

    async fn update(&self, id: DocumentId, input: &UpdateDocument)
        -> StoreResult<Option<Document>>;

    async fn set_flag(&self, id: DocumentId, change: FlagChange) -> StoreResult<Option<Document>>;

    /// Unarchive one document, clearing its parent when `detach` is set.
    async fn restore(&self, id: DocumentId, detach: bool) -> StoreResult<Option<Document>>;

    async fn clear_icon(&self, id: DocumentId) -> StoreResult<Option<Document>>;

    async fn clear_cover_image(&self, id: DocumentId) -> StoreResult<Option<Document>>;

    /// Edges of every document below `root` owned by `user_id`.
    async fn subtree_edges(&self, user_id: &str, root: DocumentId) -> StoreResult<Vec<TreeEdge>>;

    /// Apply `change` to every listed document the change applies to.
    /// Returns the number of documents written.
    async fn set_flag_many(
        &self,
        user_id: &str,
        ids: &[DocumentId],
        change: FlagChange,
    ) -> StoreResult<u64>;

    /// Delete the listed documents atomically; `ids` is in deletion order.
    async fn delete_many(&self, user_id: &str, ids: &[DocumentId]) -> StoreResult<u64>;

    /// Direct, non-archived children of `parent`, or roots when `None`.
    async fn list_sidebar(
        &self,
        user_id: &str,
        parent: Option<DocumentId>,
    ) -> StoreResult<Vec<Document>>;

    async fn list_by_archived(&self, user_id: &str, is_archived: bool)
        -> StoreResult<Vec<Document>>;

    /// Published, non-archived direct children of `parent`, any owner.
    async fn list_public_children(&self, parent: DocumentId) -> StoreResult<Vec<Document>>;
}
