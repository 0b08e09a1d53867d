use std::sync::Arc;

use notebook_core::document::{self, FlagChange, REMOVED_MESSAGE};
use notebook_core::error::CoreError;
use notebook_core::tree::Subtree;
use notebook_core::types::DocumentId;
use notebook_db::models::document::{CreateDocument, Document, UpdateDocument};
use notebook_db::store::DocumentStore;
use serde::Serialize;
use uuid::Uuid;

use super::propagation::{PropagationTicket, PropagationTracker};
use crate::error::{AppError, AppResult};

/// Acknowledgement returned by [`DocumentService::remove`].
#[derive(Debug, Clone, Serialize)]
pub struct RemoveAck {
    pub success: bool,
    pub message: &'static str,
}

/// Document operations with identity passed explicitly by the caller.
///
/// Owner-scoped methods take the caller's subject; `get_by_id_preview` and
/// `get_children` take none. Archive, restore, and publish return the patched
/// document together with the ticket of the descendant propagation.
pub struct DocumentService {
    store: Arc<dyn DocumentStore>,
    propagation: Arc<PropagationTracker>,
}

impl DocumentService {
    pub fn new(store: Arc<dyn DocumentStore>, propagation: Arc<PropagationTracker>) -> Self {
        Self { store, propagation }
    }

    pub fn propagation(&self) -> &Arc<PropagationTracker> {
        &self.propagation
    }

    pub async fn create(&self, user_id: &str, input: &CreateDocument) -> AppResult<Document> {
        document::validate_title(&input.title)?;
        if let Some(parent) = input.parent_document {
            self.load_owned(user_id, parent).await?;
        }

        let doc = self.store.insert(user_id, input).await?;
        tracing::info!(document_id = %doc.id, user_id = %user_id, parent_document = ?doc.parent_document, "Document created");
        Ok(doc)
    }

    pub async fn get_by_id(&self, user_id: &str, id: DocumentId) -> AppResult<Document> {
        self.load_owned(user_id, id).await
    }

    /// Public read of a published, non-archived document.
    pub async fn get_by_id_preview(&self, id: DocumentId) -> AppResult<Document> {
        let doc = self.load(id).await?;
        if !document::is_preview_visible(doc.is_published, doc.is_archived) {
            return Err(CoreError::NotAvailable("Document is not available".into()).into());
        }
        Ok(doc)
    }

    /// Published, non-archived children of a preview-visible document.
    pub async fn get_children(&self, parent: DocumentId) -> AppResult<Vec<Document>> {
        self.get_by_id_preview(parent).await?;
        Ok(self.store.list_public_children(parent).await?)
    }

    pub async fn get_sidebar(
        &self,
        user_id: &str,
        parent: Option<DocumentId>,
    ) -> AppResult<Vec<Document>> {
        Ok(self.store.list_sidebar(user_id, parent).await?)
    }

    pub async fn get_trash(&self, user_id: &str) -> AppResult<Vec<Document>> {
        Ok(self.store.list_by_archived(user_id, true).await?)
    }

    pub async fn get_search(&self, user_id: &str) -> AppResult<Vec<Document>> {
        Ok(self.store.list_by_archived(user_id, false).await?)
    }

    /// Patch the supplied fields.
    ///
    /// Without a caller this is a silent no-op returning `None`: autosave
    /// keeps firing while a session expires and must not surface errors.
    pub async fn update(
        &self,
        user_id: Option<&str>,
        id: DocumentId,
        input: &UpdateDocument,
    ) -> AppResult<Option<Document>> {
        let Some(user_id) = user_id else {
            tracing::debug!(document_id = %id, "Ignoring unauthenticated update");
            return Ok(None);
        };
        if let Some(title) = &input.title {
            document::validate_title(title)?;
        }
        self.load_owned(user_id, id).await?;

        let doc = self
            .store
            .update(id, input)
            .await?
            .ok_or_else(|| not_found(id))?;
        Ok(Some(doc))
    }

    pub async fn archive(
        &self,
        user_id: &str,
        id: DocumentId,
    ) -> AppResult<(Document, PropagationTicket)> {
        self.load_owned(user_id, id).await?;
        let change = FlagChange::Archived(true);
        let doc = self
            .store
            .set_flag(id, change)
            .await?
            .ok_or_else(|| not_found(id))?;
        let ticket = self.propagation.spawn(user_id, id, change).await;
        tracing::info!(document_id = %id, user_id = %user_id, ticket_id = %ticket.id, "Document archived");
        Ok((doc, ticket))
    }

    /// Unarchive a document and its descendants. A document whose parent is
    /// still archived becomes a root.
    pub async fn restore(
        &self,
        user_id: &str,
        id: DocumentId,
    ) -> AppResult<(Document, PropagationTicket)> {
        let current = self.load_owned(user_id, id).await?;
        let parent_is_archived = match current.parent_document {
            Some(parent) => self.store.find_by_id(parent).await?.map(|p| p.is_archived),
            None => None,
        };
        let detach = document::detach_on_restore(parent_is_archived);

        let doc = self
            .store
            .restore(id, detach)
            .await?
            .ok_or_else(|| not_found(id))?;
        let ticket = self
            .propagation
            .spawn(user_id, id, FlagChange::Archived(false))
            .await;
        tracing::info!(document_id = %id, user_id = %user_id, detached = detach, ticket_id = %ticket.id, "Document restored");
        Ok((doc, ticket))
    }

    pub async fn publish(
        &self,
        user_id: &str,
        id: DocumentId,
        is_published: bool,
    ) -> AppResult<(Document, PropagationTicket)> {
        self.load_owned(user_id, id).await?;
        let change = FlagChange::Published(is_published);
        let doc = self
            .store
            .set_flag(id, change)
            .await?
            .ok_or_else(|| not_found(id))?;
        let ticket = self.propagation.spawn(user_id, id, change).await;
        tracing::info!(document_id = %id, user_id = %user_id, is_published, ticket_id = %ticket.id, "Document publish state changed");
        Ok((doc, ticket))
    }

    /// Delete a document and its whole subtree, children before parents.
    pub async fn remove(&self, user_id: &str, id: DocumentId) -> AppResult<RemoveAck> {
        self.load_owned(user_id, id).await?;
        let edges = self.store.subtree_edges(user_id, id).await?;
        let order = Subtree::new(id, edges).deletion_order();

        let deleted = self.store.delete_many(user_id, &order).await?;
        tracing::info!(document_id = %id, user_id = %user_id, deleted, "Document subtree removed");
        Ok(RemoveAck {
            success: true,
            message: REMOVED_MESSAGE,
        })
    }

    pub async fn remove_icon(&self, user_id: &str, id: DocumentId) -> AppResult<Document> {
        self.load_owned(user_id, id).await?;
        self.store
            .clear_icon(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn remove_cover_image(&self, user_id: &str, id: DocumentId) -> AppResult<Document> {
        self.load_owned(user_id, id).await?;
        self.store
            .clear_cover_image(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Look up a propagation ticket owned by the caller, optionally waiting
    /// for it to finish.
    pub async fn ticket(&self, user_id: &str, id: Uuid, wait: bool) -> AppResult<PropagationTicket> {
        let missing = || CoreError::NotFound {
            entity: "Propagation",
            id,
        };
        let ticket = self.propagation.get(id).await.ok_or_else(missing)?;
        document::ensure_owner(&ticket.user_id, user_id)?;
        Ok(self.settle(ticket, wait).await)
    }

    /// Wait for `ticket` to reach a terminal status when `wait` is set.
    pub async fn settle(&self, ticket: PropagationTicket, wait: bool) -> PropagationTicket {
        if !wait || ticket.status.is_terminal() {
            return ticket;
        }
        match self.propagation.wait(ticket.id).await {
            Some(done) => done,
            // Pruned while we waited.
            None => ticket,
        }
    }

    async fn load(&self, id: DocumentId) -> AppResult<Document> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn load_owned(&self, user_id: &str, id: DocumentId) -> AppResult<Document> {
        let doc = self.load(id).await?;
        document::ensure_owner(&doc.user_id, user_id)?;
        Ok(doc)
    }
}

fn not_found(id: DocumentId) -> AppError {
    CoreError::NotFound {
        entity: document::ENTITY,
        id,
    }
    .into()
}
