use uuid::Uuid;

use crate::{
    api::error,
    modules::document::{
        access::Permission,
        model::NewDocument,
        repository::{DocumentRepository, ShareRepository},
        schema::{DocumentEntity, ShareEntity, ShareUserRow, SharedDocumentRow},
    },
};

#[derive(Clone)]
pub struct DocumentRepositoryPg {
    pool: sqlx::PgPool,
}

impl DocumentRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl DocumentRepository for DocumentRepositoryPg {
    async fn create(&self, document: &NewDocument) -> Result<DocumentEntity, error::SystemError> {
        let entity = sqlx::query_as::<_, DocumentEntity>(
            r#"
            INSERT INTO documents (id, filename, original_name, file_type, size, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&document.filename)
        .bind(&document.original_name)
        .bind(&document.file_type)
        .bind(document.size)
        .bind(document.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(entity)
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<DocumentEntity>, error::SystemError> {
        let document = sqlx::query_as::<_, DocumentEntity>("SELECT * FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(document)
    }

    async fn find_by_owner(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<DocumentEntity>, error::SystemError> {
        let documents = sqlx::query_as::<_, DocumentEntity>(
            "SELECT * FROM documents WHERE user_id = $1 ORDER BY upload_date DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(documents)
    }

    async fn update_size(&self, id: &Uuid, size: i64) -> Result<(), error::SystemError> {
        let rows = sqlx::query("UPDATE documents SET size = $2 WHERE id = $1")
            .bind(id)
            .bind(size)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(error::SystemError::not_found("Document not found"));
        }
        Ok(())
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, error::SystemError> {
        let rows = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows > 0)
    }
}

#[async_trait::async_trait]
impl ShareRepository for DocumentRepositoryPg {
    async fn find_share(
        &self,
        document_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<Option<ShareEntity>, error::SystemError> {
        let share = sqlx::query_as::<_, ShareEntity>(
            "SELECT * FROM document_shares WHERE document_id = $1 AND user_id = $2",
        )
        .bind(document_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(share)
    }

    async fn find_shared_with(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<SharedDocumentRow>, error::SystemError> {
        let rows = sqlx::query_as::<_, SharedDocumentRow>(
            r#"
            SELECT
                s.id            AS share_id,
                s.permission    AS permission,
                d.id            AS document_id,
                d.filename      AS filename,
                d.original_name AS original_name,
                d.file_type     AS file_type,
                d.size          AS size,
                d.upload_date   AS upload_date,
                d.user_id       AS owner_id
            FROM document_shares s
            LEFT JOIN documents d ON d.id = s.document_id
            WHERE s.user_id = $1
            ORDER BY d.upload_date DESC NULLS LAST
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_shares_for_document(
        &self,
        document_id: &Uuid,
    ) -> Result<Vec<ShareUserRow>, error::SystemError> {
        let rows = sqlx::query_as::<_, ShareUserRow>(
            r#"
            SELECT s.user_id, u.username, s.permission, s.created_at
            FROM document_shares s
            JOIN users u ON u.id = s.user_id
            WHERE s.document_id = $1
            ORDER BY s.created_at
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn upsert_share(
        &self,
        document_id: &Uuid,
        user_id: &Uuid,
        permission: Permission,
    ) -> Result<ShareEntity, error::SystemError> {
        let share = sqlx::query_as::<_, ShareEntity>(
            r#"
            INSERT INTO document_shares (id, document_id, user_id, permission)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (document_id, user_id)
            DO UPDATE SET permission = EXCLUDED.permission
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(document_id)
        .bind(user_id)
        .bind(permission.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(share)
    }

    async fn delete_share(
        &self,
        document_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<bool, error::SystemError> {
        let rows =
            sqlx::query("DELETE FROM document_shares WHERE document_id = $1 AND user_id = $2")
                .bind(document_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?
                .rows_affected();

        Ok(rows > 0)
    }

    async fn delete_shares(&self, share_ids: &[Uuid]) -> Result<u64, error::SystemError> {
        if share_ids.is_empty() {
            return Ok(0);
        }

        let rows = sqlx::query("DELETE FROM document_shares WHERE id = ANY($1)")
            .bind(share_ids)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows)
    }
}
