use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::modules::document::{
    access::Permission,
    schema::{DocumentEntity, ShareUserRow},
};

/// Metadata for a freshly stored upload.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub filename: String,
    pub original_name: String,
    pub file_type: String,
    pub size: i64,
    pub user_id: Uuid,
}

/// Upload limits and the extension allow-lists.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_file_size: usize,
    pub allowed_extensions: Vec<&'static str>,
    pub editable_extensions: Vec<&'static str>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: 16 * 1024 * 1024, // 16MB
            allowed_extensions: vec![
                "txt", "pdf", "png", "jpg", "jpeg", "gif", "doc", "docx", "xls", "xlsx", "ppt",
                "pptx", "zip", "rar", "md", "py", "csv",
            ],
            editable_extensions: vec![
                "txt", "md", "py", "html", "css", "js", "json", "xml", "yml", "yaml", "xls",
                "xlsx", "csv", "doc", "docx",
            ],
        }
    }
}

impl UploadConfig {
    pub fn with_max_file_size(mut self, max_file_size: usize) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn is_allowed(&self, extension: &str) -> bool {
        self.allowed_extensions.contains(&extension)
    }

    pub fn is_editable(&self, extension: &str) -> bool {
        self.editable_extensions.contains(&extension)
    }
}

/// Width of the `original_name` column.
pub const MAX_ORIGINAL_NAME_CHARS: usize = 255;

/// Lowercased extension after the last dot; `None` without one.
pub fn file_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Browsers sometimes send a full client path; keep only the last segment.
pub fn display_name(filename: &str) -> &str {
    filename.rsplit(['/', '\\']).next().unwrap_or(filename).trim()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorKind {
    Text,
    Spreadsheet,
    Word,
}

impl EditorKind {
    pub fn for_type(file_type: &str) -> Self {
        match file_type {
            "xls" | "xlsx" | "csv" => EditorKind::Spreadsheet,
            "doc" | "docx" => EditorKind::Word,
            _ => EditorKind::Text,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub original_name: String,
    pub file_type: String,
    pub size: i64,
    pub upload_date: chrono::DateTime<chrono::Utc>,
    pub owner_id: Uuid,
}

impl From<DocumentEntity> for DocumentResponse {
    fn from(entity: DocumentEntity) -> Self {
        DocumentResponse {
            id: entity.id,
            original_name: entity.original_name,
            file_type: entity.file_type,
            size: entity.size,
            upload_date: entity.upload_date,
            owner_id: entity.user_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SharedDocumentResponse {
    #[serde(flatten)]
    pub document: DocumentResponse,
    pub permission: Permission,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub owned: Vec<DocumentResponse>,
    pub shared: Vec<SharedDocumentResponse>,
}

/// Metadata plus what the caller may do with it.
#[derive(Debug, Serialize)]
pub struct DocumentDetailResponse {
    #[serde(flatten)]
    pub document: DocumentResponse,
    pub is_owner: bool,
    pub can_edit: bool,
}

#[derive(Debug, Serialize)]
pub struct EditorResponse {
    pub document: DocumentResponse,
    pub editor: EditorKind,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ContentBody {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ContentResponse {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct WordContentResponse {
    pub html: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ShareBody {
    #[validate(length(min = 1, message = "Username cannot be empty"))]
    pub username: String,
    #[serde(default)]
    pub permission: Permission,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShareResponse {
    pub document_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub permission: Permission,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ShareResponse {
    pub fn from_row(document_id: Uuid, row: ShareUserRow) -> Self {
        ShareResponse {
            document_id,
            user_id: row.user_id,
            username: row.username,
            permission: row.permission.parse().unwrap_or_default(),
            created_at: row.created_at,
        }
    }
}
