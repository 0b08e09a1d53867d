use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use notebook_core::document::FlagChange;
use notebook_core::tree::{walk_descendants, Adjacency, TreeEdge};
use notebook_core::types::DocumentId;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DocumentStore, StoreError, StoreResult};
use crate::models::document::{CreateDocument, Document, UpdateDocument};

/// In-process [`DocumentStore`]: documents by id plus an adjacency list from
/// parent id to child ids.
///
/// Listings are newest-first by insertion sequence.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
    documents: HashMap<DocumentId, Entry>,
    children: Adjacency,
    next_seq: u64,
}

#[derive(Debug)]
struct Entry {
    seq: u64,
    document: Document,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents across all owners.
    pub async fn len(&self) -> usize {
        self.state.read().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl State {
    fn patch<F>(&mut self, id: DocumentId, apply: F) -> Option<Document>
    where
        F: FnOnce(&mut Document),
    {
        let entry = self.documents.get_mut(&id)?;
        apply(&mut entry.document);
        entry.document.updated_at = Utc::now();
        Some(entry.document.clone())
    }

    fn owned_children(&self, user_id: &str, parent: DocumentId) -> Vec<DocumentId> {
        self.children
            .get(&parent)
            .map(|ids| {
                ids.iter()
                    .copied()
                    .filter(|id| {
                        self.documents
                            .get(id)
                            .is_some_and(|e| e.document.user_id == user_id)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn unlink(&mut self, id: DocumentId, parent: DocumentId) {
        if let Some(siblings) = self.children.get_mut(&parent) {
            siblings.retain(|child| *child != id);
            if siblings.is_empty() {
                self.children.remove(&parent);
            }
        }
    }

    fn newest_first<P>(&self, predicate: P) -> Vec<Document>
    where
        P: Fn(&Document) -> bool,
    {
        let mut entries: Vec<&Entry> = self
            .documents
            .values()
            .filter(|e| predicate(&e.document))
            .collect();
        entries.sort_by(|a, b| b.seq.cmp(&a.seq));
        entries.into_iter().map(|e| e.document.clone()).collect()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert(&self, user_id: &str, input: &CreateDocument) -> StoreResult<Document> {
        let mut state = self.state.write().await;
        if let Some(parent) = input.parent_document {
            if !state.documents.contains_key(&parent) {
                return Err(StoreError::Integrity(format!(
                    "parent document {parent} does not exist"
                )));
            }
        }

        let now = Utc::now();
        let document = Document {
            id: Uuid::now_v7(),
            title: input.title.clone(),
            content: None,
            cover_image: None,
            icon: None,
            is_archived: false,
            is_published: false,
            user_id: user_id.to_string(),
            parent_document: input.parent_document,
            created_at: now,
            updated_at: now,
        };

        let seq = state.next_seq;
        state.next_seq += 1;
        if let Some(parent) = document.parent_document {
            state.children.entry(parent).or_default().push(document.id);
        }
        state.documents.insert(
            document.id,
            Entry {
                seq,
                document: document.clone(),
            },
        );
        Ok(document)
    }

    async fn find_by_id(&self, id: DocumentId) -> StoreResult<Option<Document>> {
        let state = self.state.read().await;
        Ok(state.documents.get(&id).map(|e| e.document.clone()))
    }

    async fn update(
        &self,
        id: DocumentId,
        input: &UpdateDocument,
    ) -> StoreResult<Option<Document>> {
        let mut state = self.state.write().await;
        Ok(state.patch(id, |doc| {
            if let Some(title) = &input.title {
                doc.title = title.clone();
            }
            if let Some(content) = &input.content {
                doc.content = Some(content.clone());
            }
            if let Some(cover_image) = &input.cover_image {
                doc.cover_image = Some(cover_image.clone());
            }
            if let Some(icon) = &input.icon {
                doc.icon = Some(icon.clone());
            }
            if let Some(is_published) = input.is_published {
                doc.is_published = is_published;
            }
        }))
    }

    async fn set_flag(&self, id: DocumentId, change: FlagChange) -> StoreResult<Option<Document>> {
        let mut state = self.state.write().await;
        Ok(state.patch(id, |doc| apply_flag(doc, change)))
    }

    async fn restore(&self, id: DocumentId, detach: bool) -> StoreResult<Option<Document>> {
        let mut state = self.state.write().await;
        let parent = match state.documents.get(&id) {
            Some(entry) => entry.document.parent_document,
            None => return Ok(None),
        };
        if detach {
            if let Some(parent) = parent {
                state.unlink(id, parent);
            }
        }
        Ok(state.patch(id, |doc| {
            doc.is_archived = false;
            if detach {
                doc.parent_document = None;
            }
        }))
    }

    async fn clear_icon(&self, id: DocumentId) -> StoreResult<Option<Document>> {
        let mut state = self.state.write().await;
        Ok(state.patch(id, |doc| doc.icon = None))
    }

    async fn clear_cover_image(&self, id: DocumentId) -> StoreResult<Option<Document>> {
        let mut state = self.state.write().await;
        Ok(state.patch(id, |doc| doc.cover_image = None))
    }

    async fn subtree_edges(&self, user_id: &str, root: DocumentId) -> StoreResult<Vec<TreeEdge>> {
        let state = self.state.read().await;
        let ids = walk_descendants(root, |id| state.owned_children(user_id, id));
        Ok(ids
            .into_iter()
            .filter_map(|id| {
                let parent = state.documents.get(&id)?.document.parent_document?;
                Some(TreeEdge { id, parent })
            })
            .collect())
    }

    async fn set_flag_many(
        &self,
        user_id: &str,
        ids: &[DocumentId],
        change: FlagChange,
    ) -> StoreResult<u64> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut written = 0;
        for id in ids {
            let Some(entry) = state.documents.get_mut(id) else {
                continue;
            };
            let doc = &mut entry.document;
            if doc.user_id != user_id || !change.applies_to(doc.is_archived) {
                continue;
            }
            apply_flag(doc, change);
            doc.updated_at = now;
            written += 1;
        }
        Ok(written)
    }

    async fn delete_many(&self, user_id: &str, ids: &[DocumentId]) -> StoreResult<u64> {
        let mut state = self.state.write().await;
        let doomed: HashSet<DocumentId> = ids
            .iter()
            .copied()
            .filter(|id| {
                state
                    .documents
                    .get(id)
                    .is_some_and(|e| e.document.user_id == user_id)
            })
            .collect();

        // Validate before touching anything so a rejected delete leaves no trace.
        for parent in &doomed {
            let orphan = state
                .children
                .get(parent)
                .into_iter()
                .flatten()
                .find(|child| !doomed.contains(child));
            if let Some(child) = orphan {
                return Err(StoreError::Integrity(format!(
                    "document {parent} still has child {child}"
                )));
            }
        }

        for id in ids {
            if !doomed.contains(id) {
                continue;
            }
            if let Some(entry) = state.documents.remove(id) {
                if let Some(parent) = entry.document.parent_document {
                    state.unlink(*id, parent);
                }
            }
            state.children.remove(id);
        }
        Ok(doomed.len() as u64)
    }

    async fn list_sidebar(
        &self,
        user_id: &str,
        parent: Option<DocumentId>,
    ) -> StoreResult<Vec<Document>> {
        let state = self.state.read().await;
        Ok(state.newest_first(|doc| {
            doc.user_id == user_id && doc.parent_document == parent && !doc.is_archived
        }))
    }

    async fn list_by_archived(
        &self,
        user_id: &str,
        is_archived: bool,
    ) -> StoreResult<Vec<Document>> {
        let state = self.state.read().await;
        Ok(state.newest_first(|doc| doc.user_id == user_id && doc.is_archived == is_archived))
    }

    async fn list_public_children(&self, parent: DocumentId) -> StoreResult<Vec<Document>> {
        let state = self.state.read().await;
        Ok(state.newest_first(|doc| {
            doc.parent_document == Some(parent) && doc.is_published && !doc.is_archived
        }))
    }
}

fn apply_flag(doc: &mut Document, change: FlagChange) {
    match change {
        FlagChange::Archived(value) => doc.is_archived = value,
        FlagChange::Published(value) => doc.is_published = value,
    }
}
