use async_trait::async_trait;
use notebook_core::document::FlagChange;
use notebook_core::tree::TreeEdge;
use notebook_core::types::DocumentId;
use sqlx::PgPool;

use super::{DocumentStore, StoreResult};
use crate::models::document::{CreateDocument, Document, UpdateDocument};
use crate::repositories::DocumentRepo;

/// [`DocumentStore`] backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn ping(&self) -> StoreResult<()> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }

    async fn insert(&self, user_id: &str, input: &CreateDocument) -> StoreResult<Document> {
        Ok(DocumentRepo::create(&self.pool, user_id, input).await?)
    }

    async fn find_by_id(&self, id: DocumentId) -> StoreResult<Option<Document>> {
        Ok(DocumentRepo::find_by_id(&self.pool, id).await?)
    }

    async fn update(
        &self,
        id: DocumentId,
        input: &UpdateDocument,
    ) -> StoreResult<Option<Document>> {
        Ok(DocumentRepo::update(&self.pool, id, input).await?)
    }

    async fn set_flag(&self, id: DocumentId, change: FlagChange) -> StoreResult<Option<Document>> {
        Ok(DocumentRepo::set_flag(&self.pool, id, change).await?)
    }

    async fn restore(&self, id: DocumentId, detach: bool) -> StoreResult<Option<Document>> {
        Ok(DocumentRepo::restore(&self.pool, id, detach).await?)
    }

    async fn clear_icon(&self, id: DocumentId) -> StoreResult<Option<Document>> {
        Ok(DocumentRepo::clear_icon(&self.pool, id).await?)
    }

    async fn clear_cover_image(&self, id: DocumentId) -> StoreResult<Option<Document>> {
        Ok(DocumentRepo::clear_cover_image(&self.pool, id).await?)
    }

    async fn subtree_edges(&self, user_id: &str, root: DocumentId) -> StoreResult<Vec<TreeEdge>> {
        Ok(DocumentRepo::subtree_edges(&self.pool, user_id, root).await?)
    }

    async fn set_flag_many(
        &self,
        user_id: &str,
        ids: &[DocumentId],
        change: FlagChange,
    ) -> StoreResult<u64> {
        Ok(DocumentRepo::set_flag_many(&self.pool, user_id, ids, change).await?)
    }

    async fn delete_many(&self, user_id: &str, ids: &[DocumentId]) -> StoreResult<u64> {
        Ok(DocumentRepo::delete_many(&self.pool, user_id, ids).await?)
    }

    async fn list_sidebar(
        &self,
        user_id: &str,
        parent: Option<DocumentId>,
    ) -> StoreResult<Vec<Document>> {
        Ok(DocumentRepo::list_sidebar(&self.pool, user_id, parent).await?)
    }

    async fn list_by_archived(
        &self,
        user_id: &str,
        is_archived: bool,
    ) -> StoreResult<Vec<Document>> {
        Ok(DocumentRepo::list_by_archived(&self.pool, user_id, is_archived).await?)
    }

    async fn list_public_children(&self, parent: DocumentId) -> StoreResult<Vec<Document>> {
        Ok(DocumentRepo::list_public_children(&self.pool, parent).await?)
    }
}
