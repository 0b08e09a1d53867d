use std::sync::Arc;

use notebook_db::store::DocumentStore;

use crate::config::ServerConfig;
use crate::documents::DocumentService;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Backing document store.
    pub store: Arc<dyn DocumentStore>,
    /// Server configuration (read by the auth extractors).
    pub config: Arc<ServerConfig>,
    /// Document operations and their propagation tracker.
    pub documents: Arc<DocumentService>,
}

impl AppState {
    /// Wire the document service and its propagation tracker over `store`.
    pub fn new(store: Arc<dyn DocumentStore>, config: ServerConfig) -> Self {
        let propagation = Arc::new(crate::documents::PropagationTracker::new(
            Arc::clone(&store),
            config.propagation_batch_size,
        ));
        let documents = Arc::new(DocumentService::new(Arc::clone(&store), propagation));
        Self {
            store,
            config: Arc::new(config),
            documents,
        }
    }
}
