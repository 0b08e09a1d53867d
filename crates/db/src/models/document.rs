//! Document entity model and DTOs.

use notebook_core::types::{DocumentId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A document row from the `documents` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    /// Serialized rich-text payload, opaque to the service.
    pub content: Option<String>,
    pub cover_image: Option<String>,
    pub icon: Option<String>,
    pub is_archived: bool,
    pub is_published: bool,
    pub user_id: UserId,
    pub parent_document: Option<DocumentId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new document. The owner comes from the caller's identity.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDocument {
    pub title: String,
    pub parent_document: Option<DocumentId>,
}

/// DTO for patching a document. All fields are optional; `None` leaves the
/// column untouched. Clearing `icon` or `cover_image` has dedicated routes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDocument {
    pub title: Option<String>,
    pub content: Option<String>,
    pub cover_image: Option<String>,
    pub icon: Option<String>,
    pub is_published: Option<bool>,
}
