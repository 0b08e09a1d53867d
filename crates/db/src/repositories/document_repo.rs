//! Repository for the `documents` table.

use notebook_core::document::FlagChange;
use notebook_core::tree::TreeEdge;
use notebook_core::types::DocumentId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::document::{CreateDocument, Document, UpdateDocument};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, content, cover_image, icon, is_archived, is_published, \
                       user_id, parent_document, created_at, updated_at";

/// Newest-first ordering used by every listing.
const NEWEST_FIRST: &str = "ORDER BY created_at DESC, id DESC";

/// Provides CRUD and subtree operations for documents.
pub struct DocumentRepo;

impl DocumentRepo {
    /// Insert a new unarchived, unpublished document owned by `user_id`.
    pub async fn create(
        pool: &PgPool,
        user_id: &str,
        input: &CreateDocument,
    ) -> Result<Document, sqlx::Error> {
        let query = format!(
            "INSERT INTO documents (id, title, user_id, parent_document, is_archived, is_published)
             VALUES ($1, $2, $3, $4, FALSE, FALSE)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(Uuid::now_v7())
            .bind(&input.title)
            .bind(user_id)
            .bind(input.parent_document)
            .fetch_one(pool)
            .await
    }

    /// Find a document by id regardless of owner or flags.
    pub async fn find_by_id(pool: &PgPool, id: DocumentId) -> Result<Option<Document>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM documents WHERE id = $1");
        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Update a document. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DocumentId,
        input: &UpdateDocument,
    ) -> Result<Option<Document>, sqlx::Error> {
        let query = format!(
            "UPDATE documents SET
                title = COALESCE($2, title),
                content = COALESCE($3, content),
                cover_image = COALESCE($4, cover_image),
                icon = COALESCE($5, icon),
                is_published = COALESCE($6, is_published),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.content)
            .bind(&input.cover_image)
            .bind(&input.icon)
            .bind(input.is_published)
            .fetch_optional(pool)
            .await
    }

    /// Apply a flag change to a single document.
    pub async fn set_flag(
        pool: &PgPool,
        id: DocumentId,
        change: FlagChange,
    ) -> Result<Option<Document>, sqlx::Error> {
        let (column, value) = flag_column(change);
        let query = format!(
            "UPDATE documents SET {column} = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .bind(value)
            .fetch_optional(pool)
            .await
    }

    /// Clear `is_archived`, and detach from the parent when `detach` is set.
    pub async fn restore(
        pool: &PgPool,
        id: DocumentId,
        detach: bool,
    ) -> Result<Option<Document>, sqlx::Error> {
        let query = format!(
            "UPDATE documents SET
                is_archived = FALSE,
                parent_document = CASE WHEN $2 THEN NULL ELSE parent_document END,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .bind(detach)
            .fetch_optional(pool)
            .await
    }

    /// Set `icon` to NULL.
    pub async fn clear_icon(pool: &PgPool, id: DocumentId) -> Result<Option<Document>, sqlx::Error> {
        let query = format!(
            "UPDATE documents SET icon = NULL, updated_at = NOW() WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Set `cover_image` to NULL.
    pub async fn clear_cover_image(
        pool: &PgPool,
        id: DocumentId,
    ) -> Result<Option<Document>, sqlx::Error> {
        let query = format!(
            "UPDATE documents SET cover_image = NULL, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Every `(child, parent)` edge below `root` owned by `user_id`.
    ///
    /// `UNION` (not `UNION ALL`) discards repeated rows, so the recursion
    /// stops even if the parent chain loops.
    pub async fn subtree_edges(
        pool: &PgPool,
        user_id: &str,
        root: DocumentId,
    ) -> Result<Vec<TreeEdge>, sqlx::Error> {
        let rows = sqlx::query_as::<_, (Uuid, Uuid)>(
            "WITH RECURSIVE subtree (id, parent_document) AS (
                SELECT id, parent_document FROM documents
                 WHERE user_id = $1 AND parent_document = $2
                UNION
                SELECT d.id, d.parent_document FROM documents d
                  JOIN subtree s ON d.parent_document = s.id
                 WHERE d.user_id = $1
             )
             SELECT id, parent_document FROM subtree",
        )
        .bind(user_id)
        .bind(root)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, parent)| TreeEdge { id, parent })
            .collect())
    }

    /// Apply a flag change to many documents at once. Returns rows affected.
    ///
    /// Publishing skips archived rows.
    pub async fn set_flag_many(
        pool: &PgPool,
        user_id: &str,
        ids: &[DocumentId],
        change: FlagChange,
    ) -> Result<u64, sqlx::Error> {
        let (column, value) = flag_column(change);
        let archived_filter = match change {
            FlagChange::Published(_) => " AND is_archived = FALSE",
            FlagChange::Archived(_) => "",
        };
        let query = format!(
            "UPDATE documents SET {column} = $3, updated_at = NOW()
             WHERE user_id = $1 AND id = ANY($2){archived_filter}"
        );
        let result = sqlx::query(&query)
            .bind(user_id)
            .bind(ids)
            .bind(value)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Permanently delete the given documents in one transaction.
    ///
    /// `ids` must hold a whole subtree (children included), otherwise the
    /// `parent_document` foreign key rejects the statement and nothing is
    /// removed.
    pub async fn delete_many(
        pool: &PgPool,
        user_id: &str,
        ids: &[DocumentId],
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let result = sqlx::query("DELETE FROM documents WHERE user_id = $1 AND id = ANY($2)")
            .bind(user_id)
            .bind(ids)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::debug!(
            requested = ids.len(),
            deleted = result.rows_affected(),
            "Deleted document subtree"
        );
        Ok(result.rows_affected())
    }

    /// Direct, non-archived children of `parent` (roots when `None`).
    pub async fn list_sidebar(
        pool: &PgPool,
        user_id: &str,
        parent: Option<DocumentId>,
    ) -> Result<Vec<Document>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM documents
             WHERE user_id = $1
               AND parent_document IS NOT DISTINCT FROM $2
               AND is_archived = FALSE
             {NEWEST_FIRST}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(user_id)
            .bind(parent)
            .fetch_all(pool)
            .await
    }

    /// All documents of one owner with the given archive state.
    pub async fn list_by_archived(
        pool: &PgPool,
        user_id: &str,
        is_archived: bool,
    ) -> Result<Vec<Document>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM documents
             WHERE user_id = $1 AND is_archived = $2
             {NEWEST_FIRST}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(user_id)
            .bind(is_archived)
            .fetch_all(pool)
            .await
    }

    /// Published, non-archived direct children of `parent`.
    pub async fn list_public_children(
        pool: &PgPool,
        parent: DocumentId,
    ) -> Result<Vec<Document>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM documents
             WHERE parent_document = $1 AND is_published = TRUE AND is_archived = FALSE
             {NEWEST_FIRST}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(parent)
            .fetch_all(pool)
            .await
    }
}

/// Column and value a flag change writes.
fn flag_column(change: FlagChange) -> (&'static str, bool) {
    match change {
        FlagChange::Archived(value) => ("is_archived", value),
        FlagChange::Published(value) => ("is_published", value),
    }
}
