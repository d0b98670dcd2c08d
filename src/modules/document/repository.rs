use uuid::Uuid;

use crate::api::error;
use crate::modules::document::{
    access::Permission,
    model::NewDocument,
    schema::{DocumentEntity, ShareEntity, ShareUserRow, SharedDocumentRow},
};

#[async_trait::async_trait]
pub trait DocumentRepository {
    async fn create(&self, document: &NewDocument) -> Result<DocumentEntity, error::SystemError>;

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<DocumentEntity>, error::SystemError>;

    /// Newest upload first.
    async fn find_by_owner(&self, user_id: &Uuid)
    -> Result<Vec<DocumentEntity>, error::SystemError>;

    async fn update_size(&self, id: &Uuid, size: i64) -> Result<(), error::SystemError>;

    /// Shares go with the document.
    async fn delete(&self, id: &Uuid) -> Result<bool, error::SystemError>;
}

#[async_trait::async_trait]
pub trait ShareRepository {
    async fn find_share(
        &self,
        document_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<Option<ShareEntity>, error::SystemError>;

    /// Every share held by `user_id`, including orphaned ones.
    async fn find_shared_with(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<SharedDocumentRow>, error::SystemError>;

    async fn find_shares_for_document(
        &self,
        document_id: &Uuid,
    ) -> Result<Vec<ShareUserRow>, error::SystemError>;

    /// Creates the share or replaces the permission of the existing one.
    async fn upsert_share(
        &self,
        document_id: &Uuid,
        user_id: &Uuid,
        permission: Permission,
    ) -> Result<ShareEntity, error::SystemError>;

    async fn delete_share(
        &self,
        document_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<bool, error::SystemError>;

    async fn delete_shares(&self, share_ids: &[Uuid]) -> Result<u64, error::SystemError>;
}

pub trait DocumentRepo: DocumentRepository + ShareRepository + Send + Sync {}

impl<T> DocumentRepo for T where T: DocumentRepository + ShareRepository + Send + Sync {}
