use serde::Serialize;
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Document metadata. The bytes live in the blob store under `filename`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DocumentEntity {
    pub id: Uuid,
    pub filename: String,
    pub original_name: String,
    pub file_type: String,
    pub size: i64,
    pub upload_date: chrono::DateTime<chrono::Utc>,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, FromRow)]
pub struct ShareEntity {
    pub id: Uuid,
    pub document_id: Uuid,
    pub user_id: Uuid,
    pub permission: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A share joined (left) with its document; the document columns are empty
/// when the share is orphaned.
#[derive(Debug, Clone, FromRow)]
pub struct SharedDocumentRow {
    pub share_id: Uuid,
    pub permission: String,
    pub document_id: Option<Uuid>,
    pub filename: Option<String>,
    pub original_name: Option<String>,
    pub file_type: Option<String>,
    pub size: Option<i64>,
    pub upload_date: Option<chrono::DateTime<chrono::Utc>>,
    pub owner_id: Option<Uuid>,
}

impl SharedDocumentRow {
    pub fn document(&self) -> Option<DocumentEntity> {
        Some(DocumentEntity {
            id: self.document_id?,
            filename: self.filename.clone()?,
            original_name: self.original_name.clone()?,
            file_type: self.file_type.clone()?,
            size: self.size?,
            upload_date: self.upload_date?,
            user_id: self.owner_id?,
        })
    }
}

/// A share on one document together with the grantee's username.
#[derive(Debug, Clone, FromRow)]
pub struct ShareUserRow {
    pub user_id: Uuid,
    pub username: String,
    pub permission: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
