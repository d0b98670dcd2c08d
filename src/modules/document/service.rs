use std::sync::Arc;
use uuid::Uuid;

use crate::api::error;
use crate::modules::document::{
    access::{Access, Permission},
    model::{
        display_name, file_extension, DashboardResponse, DocumentDetailResponse,
        DocumentResponse, EditorKind, EditorResponse, NewDocument, ShareResponse,
        SharedDocumentResponse, UploadConfig, MAX_ORIGINAL_NAME_CHARS,
    },
    repository::DocumentRepo,
    schema::{DocumentEntity, ShareUserRow},
};
use crate::modules::storage::{html_sidecar, BlobStore};
use crate::modules::user::repository::UserRepository;
use crate::utils::format_size;

#[derive(Clone)]
pub struct DocumentService<D, U>
where
    D: DocumentRepo,
    U: UserRepository + Send + Sync,
{
    doc_repo: Arc<D>,
    user_repo: Arc<U>,
    storage: Arc<dyn BlobStore>,
    config: UploadConfig,
}

impl<D, U> DocumentService<D, U>
where
    D: DocumentRepo,
    U: UserRepository + Send + Sync,
{
    pub fn with_dependencies(
        doc_repo: Arc<D>,
        user_repo: Arc<U>,
        storage: Arc<dyn BlobStore>,
        config: UploadConfig,
    ) -> Self {
        log::info!("DocumentService initialized with {} storage", storage.backend());
        DocumentService { doc_repo, user_repo, storage, config }
    }

    pub fn max_file_size(&self) -> usize {
        self.config.max_file_size
    }

    async fn load(&self, document_id: &Uuid) -> Result<DocumentEntity, error::SystemError> {
        self.doc_repo
            .find_by_id(document_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Document not found"))
    }

    async fn resolve_access(
        &self,
        document: &DocumentEntity,
        user_id: &Uuid,
    ) -> Result<Access, error::SystemError> {
        if document.user_id == *user_id {
            return Ok(Access::Owner);
        }
        let share = self.doc_repo.find_share(&document.id, user_id).await?;
        let permission = share.map(|s| s.permission.parse::<Permission>().unwrap_or_default());
        Ok(Access::resolve(&document.user_id, user_id, permission))
    }

    /// Loads the document and the caller's access to it.
    pub async fn access(
        &self,
        user_id: Uuid,
        document_id: Uuid,
    ) -> Result<(DocumentEntity, Access), error::SystemError> {
        let document = self.load(&document_id).await?;
        let access = self.resolve_access(&document, &user_id).await?;
        Ok((document, access))
    }

    async fn require_read(
        &self,
        user_id: Uuid,
        document_id: Uuid,
    ) -> Result<(DocumentEntity, Access), error::SystemError> {
        let (document, access) = self.access(user_id, document_id).await?;
        if !access.can_read() {
            return Err(error::SystemError::forbidden(
                "You don't have permission to access this document",
            ));
        }
        Ok((document, access))
    }

    async fn require_write(
        &self,
        user_id: Uuid,
        document_id: Uuid,
    ) -> Result<DocumentEntity, error::SystemError> {
        let (document, access) = self.access(user_id, document_id).await?;
        if !access.can_write() {
            return Err(error::SystemError::forbidden(
                "You don't have permission to edit this document",
            ));
        }
        Ok(document)
    }

    async fn require_owner(
        &self,
        user_id: Uuid,
        document_id: Uuid,
    ) -> Result<DocumentEntity, error::SystemError> {
        let document = self.load(&document_id).await?;
        if document.user_id != user_id {
            return Err(error::SystemError::forbidden("Only the owner can do this"));
        }
        Ok(document)
    }

    /// Owned documents plus documents shared with the user. Shares whose
    /// document is gone are deleted on the way.
    pub async fn dashboard(&self, user_id: Uuid) -> Result<DashboardResponse, error::SystemError> {
        let owned = self.doc_repo.find_by_owner(&user_id).await?;
        let rows = self.doc_repo.find_shared_with(&user_id).await?;

        let mut shared = Vec::with_capacity(rows.len());
        let mut orphaned = Vec::new();
        for row in rows {
            match row.document() {
                Some(document) => shared.push(SharedDocumentResponse {
                    document: DocumentResponse::from(document),
                    permission: row.permission.parse().unwrap_or_default(),
                }),
                None => orphaned.push(row.share_id),
            }
        }

        if !orphaned.is_empty() {
            let removed = self.doc_repo.delete_shares(&orphaned).await?;
            log::info!("Pruned {} orphaned share(s) for user {}", removed, user_id);
        }

        Ok(DashboardResponse {
            owned: owned.into_iter().map(DocumentResponse::from).collect(),
            shared,
        })
    }

    pub async fn upload(
        &self,
        user_id: Uuid,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<DocumentResponse, error::SystemError> {
        let original_name = display_name(filename);
        if original_name.is_empty() {
            return Err(error::SystemError::bad_request("No file selected"));
        }
        if original_name.chars().count() > MAX_ORIGINAL_NAME_CHARS {
            return Err(error::SystemError::bad_request(format!(
                "File name must be at most {MAX_ORIGINAL_NAME_CHARS} characters long"
            )));
        }

        let file_type = file_extension(original_name)
            .filter(|ext| self.config.is_allowed(ext))
            .ok_or_else(|| error::SystemError::bad_request("File type is not allowed"))?;

        if bytes.len() > self.config.max_file_size {
            return Err(error::SystemError::payload_too_large(format!(
                "File size exceeds maximum allowed size of {} bytes",
                self.config.max_file_size
            )));
        }

        let stored_name = format!("{}.{}", Uuid::now_v7().simple(), file_type);
        self.storage.put(&stored_name, &bytes).await?;

        match self.storage.size(&stored_name).await {
            Ok(stored) if stored == bytes.len() as u64 => {}
            Ok(stored) => {
                return Err(error::SystemError::InternalError(
                    format!("Stored file {stored_name} has {stored} bytes, expected {}", bytes.len())
                        .into(),
                ));
            }
            Err(error::SystemError::NotFound(_)) => {
                return Err(error::SystemError::InternalError(
                    format!("Stored file {stored_name} missing after write").into(),
                ));
            }
            Err(e) => return Err(e),
        }

        let new_document = NewDocument {
            filename: stored_name,
            original_name: original_name.to_string(),
            file_type,
            size: bytes.len() as i64,
            user_id,
        };

        let document = match self.doc_repo.create(&new_document).await {
            Ok(document) => document,
            Err(e) => {
                // no metadata row, so the blob would be unreachable
                if let Err(cleanup) = self.storage.delete(&new_document.filename).await {
                    log::warn!("Failed to remove {}: {:?}", new_document.filename, cleanup);
                }
                return Err(e);
            }
        };

        log::info!(
            "User {} uploaded {} ({}) to {} storage",
            user_id,
            document.original_name,
            format_size(bytes.len() as u64),
            self.storage.backend()
        );
        Ok(DocumentResponse::from(document))
    }

    pub async fn detail(
        &self,
        user_id: Uuid,
        document_id: Uuid,
    ) -> Result<DocumentDetailResponse, error::SystemError> {
        let (document, access) = self.require_read(user_id, document_id).await?;
        Ok(DocumentDetailResponse {
            document: DocumentResponse::from(document),
            is_owner: access.is_owner(),
            can_edit: access.can_write(),
        })
    }

    pub async fn download(
        &self,
        user_id: Uuid,
        document_id: Uuid,
    ) -> Result<(DocumentEntity, Vec<u8>), error::SystemError> {
        let (document, _) = self.require_read(user_id, document_id).await?;
        let bytes = self.storage.get(&document.filename).await?;
        Ok((document, bytes))
    }

    /// Owner only. Blob cleanup failures are logged; the row is removed
    /// regardless.
    pub async fn delete(&self, user_id: Uuid, document_id: Uuid) -> Result<(), error::SystemError> {
        let document = self.require_owner(user_id, document_id).await?;

        for name in [document.filename.clone(), html_sidecar(&document.filename)] {
            if let Err(e) = self.storage.delete(&name).await {
                log::error!("Error deleting {} from {} storage: {:?}", name, self.storage.backend(), e);
            }
        }

        self.doc_repo.delete(&document.id).await?;
        log::info!("User {} deleted document {}", user_id, document.id);
        Ok(())
    }

    pub async fn open_editor(
        &self,
        user_id: Uuid,
        document_id: Uuid,
    ) -> Result<EditorResponse, error::SystemError> {
        let document = self.require_write(user_id, document_id).await?;

        if !self.config.is_editable(&document.file_type) {
            return Err(error::SystemError::bad_request(
                "This file type cannot be edited online",
            ));
        }

        if !self.storage.exists(&document.filename).await? {
            log::warn!("Document {} has no stored bytes, removing the record", document.id);
            if let Err(e) = self.doc_repo.delete(&document.id).await {
                log::error!("Error cleaning up ghost document {}: {:?}", document.id, e);
            }
            return Err(error::SystemError::not_found("File does not exist or has been deleted"));
        }

        let editor = EditorKind::for_type(&document.file_type);
        Ok(EditorResponse { document: DocumentResponse::from(document), editor })
    }

    pub async fn read_content(
        &self,
        user_id: Uuid,
        document_id: Uuid,
    ) -> Result<String, error::SystemError> {
        let (document, _) = self.require_read(user_id, document_id).await?;
        let bytes = self.storage.get(&document.filename).await?;
        String::from_utf8(bytes).map_err(|_| error::SystemError::bad_request("Cannot read binary file"))
    }

    pub async fn write_content(
        &self,
        user_id: Uuid,
        document_id: Uuid,
        content: String,
    ) -> Result<DocumentResponse, error::SystemError> {
        let document = self.require_write(user_id, document_id).await?;
        self.overwrite(document, content.as_bytes(), None).await
    }

    /// Replaces the bytes wholesale, optionally with a rendered HTML sidecar.
    pub async fn save_blob(
        &self,
        user_id: Uuid,
        document_id: Uuid,
        bytes: Vec<u8>,
        html_content: Option<String>,
    ) -> Result<DocumentResponse, error::SystemError> {
        let document = self.require_write(user_id, document_id).await?;
        self.overwrite(document, &bytes, html_content).await
    }

    async fn overwrite(
        &self,
        mut document: DocumentEntity,
        bytes: &[u8],
        html_content: Option<String>,
    ) -> Result<DocumentResponse, error::SystemError> {
        if bytes.len() > self.config.max_file_size {
            return Err(error::SystemError::payload_too_large(format!(
                "File size exceeds maximum allowed size of {} bytes",
                self.config.max_file_size
            )));
        }

        self.storage.put(&document.filename, bytes).await?;
        if let Some(html) = html_content {
            self.storage.put(&html_sidecar(&document.filename), html.as_bytes()).await?;
        }

        let size = bytes.len() as i64;
        self.doc_repo.update_size(&document.id, size).await?;
        document.size = size;
        Ok(DocumentResponse::from(document))
    }

    pub async fn word_html(
        &self,
        user_id: Uuid,
        document_id: Uuid,
    ) -> Result<Option<String>, error::SystemError> {
        let (document, _) = self.require_read(user_id, document_id).await?;
        let sidecar = html_sidecar(&document.filename);

        if !self.storage.exists(&sidecar).await? {
            return Ok(None);
        }
        let bytes = self.storage.get(&sidecar).await?;
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }

    pub async fn share(
        &self,
        owner_id: Uuid,
        document_id: Uuid,
        username: &str,
        permission: Permission,
    ) -> Result<ShareResponse, error::SystemError> {
        let document = self.require_owner(owner_id, document_id).await?;

        let target = self
            .user_repo
            .find_by_username(username.trim())
            .await?
            .ok_or_else(|| error::SystemError::not_found("User not found"))?;

        if target.id == owner_id {
            return Err(error::SystemError::bad_request("Cannot share with yourself"));
        }

        let share = self.doc_repo.upsert_share(&document.id, &target.id, permission).await?;
        log::info!(
            "Document {} shared with {} ({})",
            document.id,
            target.username,
            permission.as_str()
        );

        Ok(ShareResponse::from_row(
            document.id,
            ShareUserRow {
                user_id: target.id,
                username: target.username,
                permission: share.permission,
                created_at: share.created_at,
            },
        ))
    }

    pub async fn list_shares(
        &self,
        owner_id: Uuid,
        document_id: Uuid,
    ) -> Result<Vec<ShareResponse>, error::SystemError> {
        let document = self.require_owner(owner_id, document_id).await?;
        let rows = self.doc_repo.find_shares_for_document(&document.id).await?;
        Ok(rows.into_iter().map(|row| ShareResponse::from_row(document.id, row)).collect())
    }

    pub async fn revoke_share(
        &self,
        owner_id: Uuid,
        document_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), error::SystemError> {
        let document = self.require_owner(owner_id, document_id).await?;
        if !self.doc_repo.delete_share(&document.id, &user_id).await? {
            return Err(error::SystemError::not_found("Share not found"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::document::repository::DocumentRepository;
    use crate::modules::document::schema::ShareEntity;
    use crate::modules::document::testing::fixture;

    #[actix_web::test]
    async fn test_upload_stores_bytes_and_metadata() {
        let f = fixture().await;
        let doc = f.service.upload(f.alice, "Notes.MD", b"# hi".to_vec()).await.unwrap();

        assert_eq!(doc.original_name, "Notes.MD");
        assert_eq!(doc.file_type, "md");
        assert_eq!(doc.size, 4);
        assert_eq!(doc.owner_id, f.alice);

        let entity = f.docs.find_by_id(&doc.id).await.unwrap().unwrap();
        assert!(entity.filename.ends_with(".md"));
        assert_ne!(entity.filename, "Notes.MD");
        assert_eq!(f.store.get(&entity.filename).await.unwrap(), b"# hi");
    }

    #[actix_web::test]
    async fn test_upload_rejections() {
        let f = fixture().await;

        let empty = f.service.upload(f.alice, "", b"x".to_vec()).await;
        assert!(matches!(empty, Err(error::SystemError::BadRequest(_))));

        let exe = f.service.upload(f.alice, "run.exe", b"x".to_vec()).await;
        assert!(matches!(exe, Err(error::SystemError::BadRequest(_))));

        let no_ext = f.service.upload(f.alice, "Makefile", b"x".to_vec()).await;
        assert!(matches!(no_ext, Err(error::SystemError::BadRequest(_))));

        let big = f.service.upload(f.alice, "big.txt", vec![b'a'; 2048]).await;
        assert!(matches!(big, Err(error::SystemError::PayloadTooLarge(_))));

        assert!(f.docs.documents.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_upload_rejects_overlong_name_before_storing() {
        let f = fixture().await;

        let long = format!("{}.txt", "é".repeat(MAX_ORIGINAL_NAME_CHARS));
        let result = f.service.upload(f.alice, &long, b"x".to_vec()).await;
        assert!(matches!(result, Err(error::SystemError::BadRequest(_))));
        assert!(f.docs.documents.lock().unwrap().is_empty());
        assert_eq!(std::fs::read_dir(f._dir.path()).unwrap().count(), 0);

        // multibyte names are counted in characters, not bytes
        let fits = format!("{}.txt", "é".repeat(MAX_ORIGINAL_NAME_CHARS - 4));
        let doc = f.service.upload(f.alice, &fits, b"x".to_vec()).await.unwrap();
        assert_eq!(doc.original_name.chars().count(), MAX_ORIGINAL_NAME_CHARS);
    }

    #[actix_web::test]
    async fn test_read_requires_owner_or_share() {
        let f = fixture().await;
        let doc = f.service.upload(f.alice, "a.txt", b"hello".to_vec()).await.unwrap();

        assert_eq!(f.service.read_content(f.alice, doc.id).await.unwrap(), "hello");
        assert!(matches!(
            f.service.read_content(f.bob, doc.id).await,
            Err(error::SystemError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.download(f.bob, doc.id).await,
            Err(error::SystemError::Forbidden(_))
        ));

        f.service.share(f.alice, doc.id, "bob", Permission::View).await.unwrap();
        assert_eq!(f.service.read_content(f.bob, doc.id).await.unwrap(), "hello");
        let (entity, bytes) = f.service.download(f.bob, doc.id).await.unwrap();
        assert_eq!(entity.original_name, "a.txt");
        assert_eq!(bytes, b"hello");
    }

    #[actix_web::test]
    async fn test_write_requires_edit_share() {
        let f = fixture().await;
        let doc = f.service.upload(f.alice, "a.txt", b"hello".to_vec()).await.unwrap();

        f.service.share(f.alice, doc.id, "bob", Permission::View).await.unwrap();
        assert!(matches!(
            f.service.write_content(f.bob, doc.id, "changed".to_string()).await,
            Err(error::SystemError::Forbidden(_))
        ));

        // re-sharing updates the permission in place
        f.service.share(f.alice, doc.id, "bob", Permission::Edit).await.unwrap();
        assert_eq!(f.docs.shares.lock().unwrap().len(), 1);

        let updated = f.service.write_content(f.bob, doc.id, "changed!".to_string()).await.unwrap();
        assert_eq!(updated.size, 8);
        assert_eq!(f.service.read_content(f.alice, doc.id).await.unwrap(), "changed!");
        assert_eq!(f.docs.find_by_id(&doc.id).await.unwrap().unwrap().size, 8);
    }

    #[actix_web::test]
    async fn test_binary_content_is_rejected() {
        let f = fixture().await;
        let doc = f.service.upload(f.alice, "pic.png", vec![0xff, 0xfe, 0x00]).await.unwrap();
        assert!(matches!(
            f.service.read_content(f.alice, doc.id).await,
            Err(error::SystemError::BadRequest(_))
        ));
    }

    #[actix_web::test]
    async fn test_delete_is_owner_only_and_cascades() {
        let f = fixture().await;
        let doc = f.service.upload(f.alice, "a.docx", b"doc".to_vec()).await.unwrap();
        f.service.share(f.alice, doc.id, "bob", Permission::Edit).await.unwrap();
        f.service
            .save_blob(f.bob, doc.id, b"doc2".to_vec(), Some("<p>doc2</p>".to_string()))
            .await
            .unwrap();
        let filename = f.docs.find_by_id(&doc.id).await.unwrap().unwrap().filename;

        assert!(matches!(
            f.service.delete(f.bob, doc.id).await,
            Err(error::SystemError::Forbidden(_))
        ));

        f.service.delete(f.alice, doc.id).await.unwrap();
        assert!(f.docs.find_by_id(&doc.id).await.unwrap().is_none());
        assert!(f.docs.shares.lock().unwrap().is_empty());
        assert!(!f.store.exists(&filename).await.unwrap());
        assert!(!f.store.exists(&html_sidecar(&filename)).await.unwrap());

        assert!(matches!(
            f.service.delete(f.alice, doc.id).await,
            Err(error::SystemError::NotFound(_))
        ));
    }

    #[actix_web::test]
    async fn test_editor_kind_and_editable_check() {
        let f = fixture().await;
        let sheet = f.service.upload(f.alice, "data.csv", b"a,b".to_vec()).await.unwrap();
        let pdf = f.service.upload(f.alice, "paper.pdf", b"%PDF".to_vec()).await.unwrap();

        let editor = f.service.open_editor(f.alice, sheet.id).await.unwrap();
        assert_eq!(editor.editor, EditorKind::Spreadsheet);

        assert!(matches!(
            f.service.open_editor(f.alice, pdf.id).await,
            Err(error::SystemError::BadRequest(_))
        ));

        f.service.share(f.alice, sheet.id, "bob", Permission::View).await.unwrap();
        assert!(matches!(
            f.service.open_editor(f.bob, sheet.id).await,
            Err(error::SystemError::Forbidden(_))
        ));
    }

    #[actix_web::test]
    async fn test_editor_removes_ghost_document() {
        let f = fixture().await;
        let doc = f.service.upload(f.alice, "gone.txt", b"x".to_vec()).await.unwrap();
        let filename = f.docs.find_by_id(&doc.id).await.unwrap().unwrap().filename;
        f.store.delete(&filename).await.unwrap();

        assert!(matches!(
            f.service.open_editor(f.alice, doc.id).await,
            Err(error::SystemError::NotFound(_))
        ));
        assert!(f.docs.find_by_id(&doc.id).await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn test_word_html_sidecar() {
        let f = fixture().await;
        let doc = f.service.upload(f.alice, "memo.docx", b"PK".to_vec()).await.unwrap();

        assert_eq!(f.service.word_html(f.alice, doc.id).await.unwrap(), None);

        f.service
            .save_blob(f.alice, doc.id, b"PK2".to_vec(), Some("<h1>Memo</h1>".to_string()))
            .await
            .unwrap();
        assert_eq!(
            f.service.word_html(f.alice, doc.id).await.unwrap().as_deref(),
            Some("<h1>Memo</h1>")
        );

        // a blob save without html keeps the previous sidecar
        f.service.save_blob(f.alice, doc.id, b"PK3".to_vec(), None).await.unwrap();
        assert!(f.service.word_html(f.alice, doc.id).await.unwrap().is_some());
    }

    #[actix_web::test]
    async fn test_share_rules() {
        let f = fixture().await;
        let doc = f.service.upload(f.alice, "a.txt", b"x".to_vec()).await.unwrap();

        assert!(matches!(
            f.service.share(f.alice, doc.id, "nobody", Permission::View).await,
            Err(error::SystemError::NotFound(_))
        ));
        assert!(matches!(
            f.service.share(f.alice, doc.id, "alice", Permission::View).await,
            Err(error::SystemError::BadRequest(_))
        ));
        assert!(matches!(
            f.service.share(f.bob, doc.id, "carol", Permission::View).await,
            Err(error::SystemError::Forbidden(_))
        ));

        let share = f.service.share(f.alice, doc.id, "carol", Permission::Edit).await.unwrap();
        assert_eq!(share.user_id, f.carol);
        assert_eq!(share.permission, Permission::Edit);

        let shares = f.service.list_shares(f.alice, doc.id).await.unwrap();
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].username, "carol");

        f.service.revoke_share(f.alice, doc.id, f.carol).await.unwrap();
        assert!(matches!(
            f.service.read_content(f.carol, doc.id).await,
            Err(error::SystemError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.revoke_share(f.alice, doc.id, f.carol).await,
            Err(error::SystemError::NotFound(_))
        ));
    }

    #[actix_web::test]
    async fn test_dashboard_lists_and_prunes_orphans() {
        let f = fixture().await;
        let mine = f.service.upload(f.alice, "mine.txt", b"1".to_vec()).await.unwrap();
        let theirs = f.service.upload(f.bob, "theirs.txt", b"2".to_vec()).await.unwrap();
        f.service.share(f.bob, theirs.id, "alice", Permission::Edit).await.unwrap();

        // a share pointing at a document that no longer exists
        f.docs.shares.lock().unwrap().push(ShareEntity {
            id: Uuid::now_v7(),
            document_id: Uuid::now_v7(),
            user_id: f.alice,
            permission: "view".to_string(),
            created_at: chrono::Utc::now(),
        });

        let dashboard = f.service.dashboard(f.alice).await.unwrap();
        assert_eq!(dashboard.owned.len(), 1);
        assert_eq!(dashboard.owned[0].id, mine.id);
        assert_eq!(dashboard.shared.len(), 1);
        assert_eq!(dashboard.shared[0].document.id, theirs.id);
        assert_eq!(dashboard.shared[0].permission, Permission::Edit);

        let remaining: Vec<_> = f
            .docs
            .shares
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == f.alice)
            .map(|s| s.document_id)
            .collect();
        assert_eq!(remaining, vec![theirs.id]);
    }

    #[actix_web::test]
    async fn test_detail_reports_capabilities() {
        let f = fixture().await;
        let doc = f.service.upload(f.alice, "a.txt", b"x".to_vec()).await.unwrap();
        f.service.share(f.alice, doc.id, "bob", Permission::View).await.unwrap();

        let owner = f.service.detail(f.alice, doc.id).await.unwrap();
        assert!(owner.is_owner && owner.can_edit);

        let viewer = f.service.detail(f.bob, doc.id).await.unwrap();
        assert!(!viewer.is_owner && !viewer.can_edit);

        assert!(matches!(
            f.service.detail(f.carol, doc.id).await,
            Err(error::SystemError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.detail(f.alice, Uuid::now_v7()).await,
            Err(error::SystemError::NotFound(_))
        ));
    }
}
