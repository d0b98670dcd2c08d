//! In-memory repositories shared by the document service and handler tests.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::api::error;
use crate::modules::document::access::Permission;
use crate::modules::document::model::{NewDocument, UploadConfig};
use crate::modules::document::repository::{DocumentRepository, ShareRepository};
use crate::modules::document::schema::{
    DocumentEntity, ShareEntity, ShareUserRow, SharedDocumentRow,
};
use crate::modules::document::service::DocumentService;
use crate::modules::storage::LocalStore;
use crate::modules::user::model::InsertUser;
use crate::modules::user::repository::UserRepository;
use crate::modules::user::testing::FakeUsers;

/// In-memory document and share tables.
#[derive(Default)]
pub struct FakeDocs {
    pub documents: Mutex<Vec<DocumentEntity>>,
    pub shares: Mutex<Vec<ShareEntity>>,
    pub usernames: Mutex<HashMap<Uuid, String>>,
}

#[async_trait::async_trait]
impl DocumentRepository for FakeDocs {
    async fn create(&self, document: &NewDocument) -> Result<DocumentEntity, error::SystemError> {
        let entity = DocumentEntity {
            id: Uuid::now_v7(),
            filename: document.filename.clone(),
            original_name: document.original_name.clone(),
            file_type: document.file_type.clone(),
            size: document.size,
            upload_date: chrono::Utc::now(),
            user_id: document.user_id,
        };
        self.documents.lock().unwrap().push(entity.clone());
        Ok(entity)
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<DocumentEntity>, error::SystemError> {
        Ok(self.documents.lock().unwrap().iter().find(|d| d.id == *id).cloned())
    }

    async fn find_by_owner(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<DocumentEntity>, error::SystemError> {
        let mut docs: Vec<_> = self
            .documents
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.user_id == *user_id)
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(docs)
    }

    async fn update_size(&self, id: &Uuid, size: i64) -> Result<(), error::SystemError> {
        let mut docs = self.documents.lock().unwrap();
        let doc = docs
            .iter_mut()
            .find(|d| d.id == *id)
            .ok_or_else(|| error::SystemError::not_found("Document not found"))?;
        doc.size = size;
        Ok(())
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, error::SystemError> {
        let mut docs = self.documents.lock().unwrap();
        let before = docs.len();
        docs.retain(|d| d.id != *id);
        self.shares.lock().unwrap().retain(|s| s.document_id != *id);
        Ok(docs.len() < before)
    }
}

#[async_trait::async_trait]
impl ShareRepository for FakeDocs {
    async fn find_share(
        &self,
        document_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<Option<ShareEntity>, error::SystemError> {
        Ok(self
            .shares
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.document_id == *document_id && s.user_id == *user_id)
            .cloned())
    }

    async fn find_shared_with(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<SharedDocumentRow>, error::SystemError> {
        let docs = self.documents.lock().unwrap();
        Ok(self
            .shares
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == *user_id)
            .map(|s| {
                let d = docs.iter().find(|d| d.id == s.document_id);
                SharedDocumentRow {
                    share_id: s.id,
                    permission: s.permission.clone(),
                    document_id: d.map(|d| d.id),
                    filename: d.map(|d| d.filename.clone()),
                    original_name: d.map(|d| d.original_name.clone()),
                    file_type: d.map(|d| d.file_type.clone()),
                    size: d.map(|d| d.size),
                    upload_date: d.map(|d| d.upload_date),
                    owner_id: d.map(|d| d.user_id),
                }
            })
            .collect())
    }

    async fn find_shares_for_document(
        &self,
        document_id: &Uuid,
    ) -> Result<Vec<ShareUserRow>, error::SystemError> {
        let names = self.usernames.lock().unwrap();
        Ok(self
            .shares
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.document_id == *document_id)
            .map(|s| ShareUserRow {
                user_id: s.user_id,
                username: names.get(&s.user_id).cloned().unwrap_or_default(),
                permission: s.permission.clone(),
                created_at: s.created_at,
            })
            .collect())
    }

    async fn upsert_share(
        &self,
        document_id: &Uuid,
        user_id: &Uuid,
        permission: Permission,
    ) -> Result<ShareEntity, error::SystemError> {
        let mut shares = self.shares.lock().unwrap();
        if let Some(share) =
            shares.iter_mut().find(|s| s.document_id == *document_id && s.user_id == *user_id)
        {
            share.permission = permission.as_str().to_string();
            return Ok(share.clone());
        }
        let share = ShareEntity {
            id: Uuid::now_v7(),
            document_id: *document_id,
            user_id: *user_id,
            permission: permission.as_str().to_string(),
            created_at: chrono::Utc::now(),
        };
        shares.push(share.clone());
        Ok(share)
    }

    async fn delete_share(
        &self,
        document_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<bool, error::SystemError> {
        let mut shares = self.shares.lock().unwrap();
        let before = shares.len();
        shares.retain(|s| !(s.document_id == *document_id && s.user_id == *user_id));
        Ok(shares.len() < before)
    }

    async fn delete_shares(&self, share_ids: &[Uuid]) -> Result<u64, error::SystemError> {
        let mut shares = self.shares.lock().unwrap();
        let before = shares.len();
        shares.retain(|s| !share_ids.contains(&s.id));
        Ok((before - shares.len()) as u64)
    }
}

pub struct Fixture {
    pub _dir: tempfile::TempDir,
    pub docs: Arc<FakeDocs>,
    pub store: Arc<LocalStore>,
    pub service: DocumentService<FakeDocs, FakeUsers>,
    pub alice: Uuid,
    pub bob: Uuid,
    pub carol: Uuid,
}

/// Three users and an upload limit of 1 KiB, blobs in a temp dir.
pub async fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let docs = Arc::new(FakeDocs::default());
    let users = Arc::new(FakeUsers::default());
    let store = Arc::new(LocalStore::new(dir.path()));

    let mut ids = Vec::new();
    for name in ["alice", "bob", "carol"] {
        let id = users
            .create(&InsertUser {
                username: name.to_string(),
                email: format!("{name}@example.com"),
                hash_password: String::new(),
            })
            .await
            .unwrap();
        docs.usernames.lock().unwrap().insert(id, name.to_string());
        ids.push(id);
    }

    let service = DocumentService::with_dependencies(
        docs.clone(),
        users,
        store.clone(),
        UploadConfig::default().with_max_file_size(1024),
    );

    Fixture { _dir: dir, docs, store, service, alice: ids[0], bob: ids[1], carol: ids[2] }
}
