//! Background propagation of flag changes down a document subtree.
//!
//! Archive, restore, and publish patch the target document inline and hand
//! the descendants to [`PropagationTracker::spawn`]. The tracker walks the
//! subtree, writes the change in batches, and records progress on a
//! [`PropagationTicket`] that callers can poll or await.
//!
//! Jobs of one owner run one after another in spawn order. A job stops
//! between batches when the tracker is shut down or when a newer job on the
//! same root and flag replaces it. Batches already written stay written;
//! there is no rollback.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use notebook_core::document::FlagChange;
use notebook_core::tree::Subtree;
use notebook_core::types::{DocumentId, Timestamp, UserId};
use notebook_db::store::DocumentStore;
use serde::Serialize;
use tokio::sync::{watch, RwLock};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use uuid::Uuid;

/// Lifecycle of a propagation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PropagationStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl PropagationStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PropagationStatus::Pending)
    }
}

/// Pollable record of one propagation job.
#[derive(Debug, Clone, Serialize)]
pub struct PropagationTicket {
    pub id: Uuid,
    /// Root of the propagated subtree.
    pub document_id: DocumentId,
    /// `archive`, `restore`, `publish`, or `unpublish`.
    pub kind: &'static str,
    pub status: PropagationStatus,
    /// Descendants found below the root; `None` until the walk finishes.
    pub total: Option<usize>,
    /// Descendants written so far. Publishing skips archived ones, so this
    /// can end below `total`.
    pub affected: u64,
    pub error: Option<String>,
    pub started_at: Timestamp,
    pub finished_at: Option<Timestamp>,
    #[serde(skip)]
    pub user_id: UserId,
}

type TicketCell = Arc<watch::Sender<PropagationTicket>>;

struct Entry {
    cell: TicketCell,
    cancel: CancellationToken,
    change: FlagChange,
}

#[derive(Default)]
struct Registry {
    tickets: HashMap<Uuid, Entry>,
    /// Most recent job per owner. Each new job waits for it before writing.
    lanes: HashMap<UserId, watch::Receiver<PropagationTicket>>,
}

/// Runs propagation jobs and keeps their tickets.
///
/// Jobs of one owner write in the order they were spawned. A new job on the
/// same root and flag cancels the pending one it replaces.
pub struct PropagationTracker {
    store: Arc<dyn DocumentStore>,
    batch_size: usize,
    registry: RwLock<Registry>,
    tasks: TaskTracker,
    cancel: CancellationToken,
}

impl PropagationTracker {
    pub fn new(store: Arc<dyn DocumentStore>, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
            registry: RwLock::new(Registry::default()),
            tasks: TaskTracker::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Register a ticket and start applying `change` to every descendant of
    /// `root`. Returns the ticket as it stands right after registration.
    pub async fn spawn(
        &self,
        user_id: &str,
        root: DocumentId,
        change: FlagChange,
    ) -> PropagationTicket {
        let ticket = PropagationTicket {
            id: Uuid::new_v4(),
            document_id: root,
            kind: change.kind(),
            status: PropagationStatus::Pending,
            total: None,
            affected: 0,
            error: None,
            started_at: Utc::now(),
            finished_at: None,
            user_id: user_id.to_string(),
        };
        let (sender, _) = watch::channel(ticket.clone());
        let cell: TicketCell = Arc::new(sender);
        let cancel = self.cancel.child_token();

        let previous = {
            let mut registry = self.registry.write().await;
            for entry in registry.tickets.values() {
                let superseded = {
                    let older = entry.cell.borrow();
                    !older.status.is_terminal()
                        && older.user_id == user_id
                        && older.document_id == root
                        && entry.change.same_flag(change)
                };
                if superseded {
                    entry.cancel.cancel();
                }
            }
            registry.tickets.insert(
                ticket.id,
                Entry {
                    cell: Arc::clone(&cell),
                    cancel: cancel.clone(),
                    change,
                },
            );
            registry
                .lanes
                .insert(user_id.to_string(), cell.subscribe())
        };

        if cancel.is_cancelled() {
            finish(&cell, PropagationStatus::Cancelled, None);
            return cell.borrow().clone();
        }

        let job = Job {
            store: Arc::clone(&self.store),
            batch_size: self.batch_size,
            cancel,
            previous,
            user_id: user_id.to_string(),
            root,
            change,
            cell,
        };
        self.tasks.spawn(job.run());

        ticket
    }

    /// Current state of a ticket.
    pub async fn get(&self, id: Uuid) -> Option<PropagationTicket> {
        let registry = self.registry.read().await;
        registry
            .tickets
            .get(&id)
            .map(|entry| entry.cell.borrow().clone())
    }

    /// Wait until the ticket reaches a terminal status and return it.
    pub async fn wait(&self, id: Uuid) -> Option<PropagationTicket> {
        let mut rx = {
            let registry = self.registry.read().await;
            registry.tickets.get(&id)?.cell.subscribe()
        };
        // Pruning only drops terminal tickets, and wait_for checks the
        // current value before it looks at a closed channel.
        let ticket = rx
            .wait_for(|t| t.status.is_terminal())
            .await
            .map(|t| t.clone())
            .ok();
        ticket
    }

    /// Drop terminal tickets that finished more than `max_age` ago.
    /// Returns how many were removed.
    pub async fn prune_finished(&self, max_age: Duration) -> usize {
        let max_age =
            chrono::Duration::from_std(max_age).unwrap_or_else(|_| chrono::Duration::days(3650));
        let cutoff = Utc::now() - max_age;
        let mut registry = self.registry.write().await;
        let before = registry.tickets.len();
        registry.tickets.retain(|_, entry| {
            let ticket = entry.cell.borrow();
            !matches!(ticket.finished_at, Some(at) if at < cutoff)
        });
        registry
            .lanes
            .retain(|_, last| !last.borrow().status.is_terminal());
        before - registry.tickets.len()
    }

    /// Number of jobs still running.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Cancel running jobs and wait up to `timeout` for them to stop.
    pub async fn shutdown(&self, timeout: Duration) {
        self.cancel.cancel();
        self.tasks.close();
        if tokio::time::timeout(timeout, self.tasks.wait()).await.is_err() {
            tracing::warn!(
                in_flight = self.tasks.len(),
                "Propagation jobs still running at shutdown deadline"
            );
        }
    }
}

struct Job {
    store: Arc<dyn DocumentStore>,
    batch_size: usize,
    cancel: CancellationToken,
    /// The owner's previous job, if any.
    previous: Option<watch::Receiver<PropagationTicket>>,
    user_id: UserId,
    root: DocumentId,
    change: FlagChange,
    cell: TicketCell,
}

impl Job {
    async fn run(mut self) {
        let ticket_id = self.cell.borrow().id;
        let kind = self.change.kind();

        // A closed channel means the previous ticket was pruned, so it is done.
        if let Some(mut previous) = self.previous.take() {
            let _ = previous.wait_for(|t| t.status.is_terminal()).await;
        }

        if self.cancel.is_cancelled() {
            tracing::warn!(%ticket_id, document_id = %self.root, kind, "Propagation cancelled before start");
            finish(&self.cell, PropagationStatus::Cancelled, None);
            return;
        }

        let edges = match self.store.subtree_edges(&self.user_id, self.root).await {
            Ok(edges) => edges,
            Err(e) => {
                tracing::error!(%ticket_id, document_id = %self.root, kind, error = %e, "Propagation walk failed");
                finish(&self.cell, PropagationStatus::Failed, Some(e.to_string()));
                return;
            }
        };
        let ids = Subtree::new(self.root, edges).descendants();
        self.cell.send_modify(|t| t.total = Some(ids.len()));

        for batch in ids.chunks(self.batch_size) {
            if self.cancel.is_cancelled() {
                tracing::warn!(%ticket_id, document_id = %self.root, kind, "Propagation cancelled");
                finish(&self.cell, PropagationStatus::Cancelled, None);
                return;
            }
            match self.store.set_flag_many(&self.user_id, batch, self.change).await {
                Ok(written) => self.cell.send_modify(|t| t.affected += written),
                Err(e) => {
                    tracing::error!(%ticket_id, document_id = %self.root, kind, error = %e, "Propagation batch failed");
                    finish(&self.cell, PropagationStatus::Failed, Some(e.to_string()));
                    return;
                }
            }
        }

        let affected = self.cell.borrow().affected;
        tracing::debug!(%ticket_id, document_id = %self.root, kind, descendants = ids.len(), affected, "Propagation completed");
        finish(&self.cell, PropagationStatus::Completed, None);
    }
}

fn finish(cell: &TicketCell, status: PropagationStatus, error: Option<String>) {
    cell.send_modify(|t| {
        t.status = status;
        t.error = error;
        t.finished_at = Some(Utc::now());
    });
}

#[cfg(test)]
mod tests {
    use notebook_db::models::document::CreateDocument;
    use notebook_db::store::MemoryDocumentStore;

    use super::*;

    const OWNER: &str = "user_owner";

    async fn chain(store: &MemoryDocumentStore, depth: usize) -> Vec<DocumentId> {
        let mut ids = Vec::new();
        let mut parent = None;
        for i in 0..depth {
            let doc = store
                .insert(
                    OWNER,
                    &CreateDocument {
                        title: format!("level {i}"),
                        parent_document: parent,
                    },
                )
                .await
                .unwrap();
            parent = Some(doc.id);
            ids.push(doc.id);
        }
        ids
    }

    #[tokio::test]
    async fn test_archive_propagation_completes_in_batches() {
        let store = Arc::new(MemoryDocumentStore::new());
        let ids = chain(&store, 7).await;
        let tracker = PropagationTracker::new(store.clone(), 2);

        let ticket = tracker.spawn(OWNER, ids[0], FlagChange::Archived(true)).await;
        assert_eq!(ticket.kind, "archive");

        let done = tracker.wait(ticket.id).await.unwrap();
        assert_eq!(done.status, PropagationStatus::Completed);
        assert_eq!(done.total, Some(6));
        assert_eq!(done.affected, 6);
        assert!(done.finished_at.is_some());

        for id in &ids[1..] {
            assert!(store.find_by_id(*id).await.unwrap().unwrap().is_archived);
        }
        // The root is the caller's job, not the tracker's.
        assert!(!store.find_by_id(ids[0]).await.unwrap().unwrap().is_archived);
    }

    #[tokio::test]
    async fn test_leaf_propagation_has_nothing_to_do() {
        let store = Arc::new(MemoryDocumentStore::new());
        let ids = chain(&store, 1).await;
        let tracker = PropagationTracker::new(store, 10);

        let ticket = tracker.spawn(OWNER, ids[0], FlagChange::Published(true)).await;
        let done = tracker.wait(ticket.id).await.unwrap();
        assert_eq!(done.status, PropagationStatus::Completed);
        assert_eq!(done.total, Some(0));
        assert_eq!(done.affected, 0);
    }

    #[tokio::test]
    async fn test_spawn_after_shutdown_is_cancelled() {
        let store = Arc::new(MemoryDocumentStore::new());
        let ids = chain(&store, 3).await;
        let tracker = PropagationTracker::new(store.clone(), 10);
        tracker.shutdown(Duration::from_secs(1)).await;

        let ticket = tracker.spawn(OWNER, ids[0], FlagChange::Archived(true)).await;
        assert_eq!(ticket.status, PropagationStatus::Cancelled);
        assert!(!store.find_by_id(ids[1]).await.unwrap().unwrap().is_archived);
    }

    #[tokio::test]
    async fn test_newer_job_on_same_root_supersedes_pending_one() {
        let store = Arc::new(MemoryDocumentStore::new());
        let ids = chain(&store, 4).await;
        let tracker = PropagationTracker::new(store.clone(), 1);

        let archive = tracker.spawn(OWNER, ids[0], FlagChange::Archived(true)).await;
        let restore = tracker.spawn(OWNER, ids[0], FlagChange::Archived(false)).await;

        let restore = tracker.wait(restore.id).await.unwrap();
        let archive = tracker.wait(archive.id).await.unwrap();
        assert_eq!(restore.status, PropagationStatus::Completed);
        assert_eq!(archive.status, PropagationStatus::Cancelled);
        for id in &ids[1..] {
            assert!(!store.find_by_id(*id).await.unwrap().unwrap().is_archived);
        }
    }

    #[tokio::test]
    async fn test_jobs_of_one_owner_apply_in_spawn_order() {
        let store = Arc::new(MemoryDocumentStore::new());
        let ids = chain(&store, 4).await;
        let tracker = PropagationTracker::new(store.clone(), 1);

        let archive = tracker.spawn(OWNER, ids[0], FlagChange::Archived(true)).await;
        let restore = tracker.spawn(OWNER, ids[1], FlagChange::Archived(false)).await;

        let restore = tracker.wait(restore.id).await.unwrap();
        let archive = tracker.wait(archive.id).await.unwrap();
        assert_eq!(archive.status, PropagationStatus::Completed);
        assert_eq!(restore.status, PropagationStatus::Completed);
        assert!(archive.finished_at <= restore.finished_at);

        assert!(store.find_by_id(ids[1]).await.unwrap().unwrap().is_archived);
        assert!(!store.find_by_id(ids[2]).await.unwrap().unwrap().is_archived);
        assert!(!store.find_by_id(ids[3]).await.unwrap().unwrap().is_archived);
    }

    #[tokio::test]
    async fn test_different_flag_on_same_root_is_not_superseded() {
        let store = Arc::new(MemoryDocumentStore::new());
        let ids = chain(&store, 3).await;
        let tracker = PropagationTracker::new(store.clone(), 1);

        let publish = tracker.spawn(OWNER, ids[0], FlagChange::Published(true)).await;
        let archive = tracker.spawn(OWNER, ids[0], FlagChange::Archived(true)).await;

        let archive = tracker.wait(archive.id).await.unwrap();
        let publish = tracker.wait(publish.id).await.unwrap();
        assert_eq!(publish.status, PropagationStatus::Completed);
        assert_eq!(publish.affected, 2);
        assert_eq!(archive.status, PropagationStatus::Completed);
        for id in &ids[1..] {
            let doc = store.find_by_id(*id).await.unwrap().unwrap();
            assert!(doc.is_published && doc.is_archived);
        }
    }

    #[tokio::test]
    async fn test_unknown_ticket() {
        let tracker = PropagationTracker::new(Arc::new(MemoryDocumentStore::new()), 10);
        assert!(tracker.get(Uuid::new_v4()).await.is_none());
        assert!(tracker.wait(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_prune_drops_only_old_finished_tickets() {
        let store = Arc::new(MemoryDocumentStore::new());
        let ids = chain(&store, 2).await;
        let tracker = PropagationTracker::new(store, 10);

        let ticket = tracker.spawn(OWNER, ids[0], FlagChange::Archived(true)).await;
        tracker.wait(ticket.id).await.unwrap();

        assert_eq!(tracker.prune_finished(Duration::from_secs(3600)).await, 0);
        assert!(tracker.get(ticket.id).await.is_some());

        assert_eq!(tracker.prune_finished(Duration::ZERO).await, 1);
        assert!(tracker.get(ticket.id).await.is_none());
    }
}
