//! Ownership, visibility, and propagation rules for documents.

use crate::error::CoreError;

/// Entity name used in `NotFound` errors.
pub const ENTITY: &str = "Document";

/// Longest title accepted on create or update, in characters.
pub const MAX_TITLE_LEN: usize = 512;

/// Message returned by a successful subtree removal.
pub const REMOVED_MESSAGE: &str = "Document and its children deleted";

/// Validate a document title. Empty titles are allowed.
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    let len = title.chars().count();
    if len > MAX_TITLE_LEN {
        return Err(CoreError::Validation(format!(
            "title must be at most {MAX_TITLE_LEN} characters (got {len})"
        )));
    }
    Ok(())
}

/// Reject callers that do not own the document.
pub fn ensure_owner(owner: &str, caller: &str) -> Result<(), CoreError> {
    if owner == caller {
        Ok(())
    } else {
        Err(CoreError::Forbidden(
            "Not authorised to access this document".into(),
        ))
    }
}

/// Whether an unauthenticated reader may see the document.
pub fn is_preview_visible(is_published: bool, is_archived: bool) -> bool {
    is_published && !is_archived
}

/// Restoring a document whose parent is still in the trash promotes it to a
/// root, otherwise it would stay hidden under an archived ancestor.
pub fn detach_on_restore(parent_is_archived: Option<bool>) -> bool {
    parent_is_archived.unwrap_or(false)
}

/// A flag change applied to a document and then to its descendants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagChange {
    Archived(bool),
    Published(bool),
}

impl FlagChange {
    /// Whether a descendant in the given archive state receives the change.
    ///
    /// Publishing never touches archived descendants.
    pub fn applies_to(self, is_archived: bool) -> bool {
        match self {
            FlagChange::Archived(_) => true,
            FlagChange::Published(_) => !is_archived,
        }
    }

    /// Short name used in logs and propagation tickets.
    pub fn kind(self) -> &'static str {
        match self {
            FlagChange::Archived(true) => "archive",
            FlagChange::Archived(false) => "restore",
            FlagChange::Published(true) => "publish",
            FlagChange::Published(false) => "unpublish",
        }
    }

    /// Whether both changes write the same column.
    pub fn same_flag(self, other: FlagChange) -> bool {
        std::mem::discriminant(&self) == std::mem::discriminant(&other)
    }
}
