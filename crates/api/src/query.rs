//! Shared query parameter types for API handlers.

use notebook_core::types::DocumentId;
use serde::Deserialize;

/// `?wait=true` makes a propagating mutation respond only after every
/// descendant has been updated.
#[derive(Debug, Default, Deserialize)]
pub struct WaitParams {
    #[serde(default)]
    pub wait: bool,
}

/// `?parent_document=` for the sidebar listing; omitted means roots.
#[derive(Debug, Deserialize)]
pub struct SidebarParams {
    pub parent_document: Option<DocumentId>,
}
