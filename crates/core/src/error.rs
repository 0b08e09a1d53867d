use crate::types::DocumentId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound {
        entity: &'static str,
        id: DocumentId,
    },

    /// The document exists but is not publicly visible.
    #[error("Not available: {0}")]
    NotAvailable(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// No (valid) identity was presented.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The caller is authenticated but does not own the target.
    #[error("Forbidden: {0}")]
    Forbidden(String),
}
