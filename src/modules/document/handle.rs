use actix::Addr;
use actix_multipart::Multipart;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::TryStreamExt;
use uuid::Uuid;

use crate::api::{error, success};
use crate::middlewares::get_claims;
use crate::modules::document::{model, repository::DocumentRepo, service::DocumentService};
use crate::modules::user::repository::UserRepository;
use crate::modules::websocket::events::{
    BroadcastToRoom, CloseRoom, RevokeAccess, ShareChanged,
};
use crate::modules::websocket::message::ServerMessage;
use crate::modules::websocket::server::WebSocketServer;
use crate::utils::ValidatedJson;

type Service<D, U> = web::Data<DocumentService<D, U>>;

/// Parts of a multipart body this API understands.
#[derive(Default)]
struct UploadForm {
    file: Option<(String, Vec<u8>)>,
    html_content: Option<String>,
}

async fn read_form(mut payload: Multipart, limit: usize) -> Result<UploadForm, error::Error> {
    let mut form = UploadForm::default();

    while let Some(mut field) =
        payload.try_next().await.map_err(|_| error::Error::bad_request("Malformed multipart body"))?
    {
        let Some(disposition) = field.content_disposition().cloned() else {
            continue;
        };

        let mut bytes = Vec::new();
        while let Some(chunk) =
            field.try_next().await.map_err(|_| error::Error::bad_request("Malformed multipart body"))?
        {
            if bytes.len() + chunk.len() > limit {
                return Err(error::Error::PayloadTooLarge(
                    format!("File size exceeds maximum allowed size of {limit} bytes").into(),
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        match disposition.get_name() {
            Some("file") => {
                let filename = disposition.get_filename().unwrap_or_default().to_string();
                form.file = Some((filename, bytes));
            }
            Some("html_content") => {
                let html = String::from_utf8(bytes)
                    .map_err(|_| error::Error::bad_request("html_content must be UTF-8"))?;
                form.html_content = Some(html);
            }
            _ => {}
        }
    }

    Ok(form)
}

fn notify_saved(
    server: &Addr<WebSocketServer>,
    user_id: Uuid,
    document: &model::DocumentResponse,
) {
    server.do_send(BroadcastToRoom {
        document_id: document.id,
        message: ServerMessage::DocumentSaved {
            document_id: document.id,
            user_id,
            size: document.size,
        },
    });
}

pub async fn list_documents<D, U>(
    req: HttpRequest,
    service: Service<D, U>,
) -> Result<success::Success<model::DashboardResponse>, error::Error>
where
    D: DocumentRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let user_id = get_claims(&req)?.sub;
    let dashboard = service.dashboard(user_id).await?;
    Ok(success::Success::ok(Some(dashboard)))
}

pub async fn upload_document<D, U>(
    req: HttpRequest,
    payload: Multipart,
    service: Service<D, U>,
) -> Result<success::Success<model::DocumentResponse>, error::Error>
where
    D: DocumentRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let user_id = get_claims(&req)?.sub;
    let form = read_form(payload, service.max_file_size()).await?;

    let (filename, bytes) =
        form.file.ok_or_else(|| error::Error::bad_request("No file part in the request"))?;

    let document = service.upload(user_id, &filename, bytes).await?;
    Ok(success::Success::created(Some(document)).message("File uploaded successfully"))
}

pub async fn get_document<D, U>(
    req: HttpRequest,
    document_id: web::Path<Uuid>,
    service: Service<D, U>,
) -> Result<success::Success<model::DocumentDetailResponse>, error::Error>
where
    D: DocumentRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let user_id = get_claims(&req)?.sub;
    let detail = service.detail(user_id, document_id.into_inner()).await?;
    Ok(success::Success::ok(Some(detail)))
}

pub async fn download_document<D, U>(
    req: HttpRequest,
    document_id: web::Path<Uuid>,
    service: Service<D, U>,
) -> Result<HttpResponse, error::Error>
where
    D: DocumentRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let user_id = get_claims(&req)?.sub;
    let (document, bytes) = service.download(user_id, document_id.into_inner()).await?;

    let mime = mime_guess::from_path(&document.original_name).first_or_octet_stream();

    Ok(HttpResponse::Ok()
        .content_type(mime.as_ref())
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(document.original_name)],
        })
        .body(bytes))
}

pub async fn delete_document<D, U>(
    req: HttpRequest,
    document_id: web::Path<Uuid>,
    service: Service<D, U>,
    server: web::Data<Addr<WebSocketServer>>,
) -> Result<success::Success<()>, error::Error>
where
    D: DocumentRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let user_id = get_claims(&req)?.sub;
    let document_id = document_id.into_inner();
    service.delete(user_id, document_id).await?;

    server.do_send(CloseRoom { document_id });
    Ok(success::Success::no_content())
}

pub async fn open_editor<D, U>(
    req: HttpRequest,
    document_id: web::Path<Uuid>,
    service: Service<D, U>,
) -> Result<success::Success<model::EditorResponse>, error::Error>
where
    D: DocumentRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let user_id = get_claims(&req)?.sub;
    let editor = service.open_editor(user_id, document_id.into_inner()).await?;
    Ok(success::Success::ok(Some(editor)))
}

pub async fn get_content<D, U>(
    req: HttpRequest,
    document_id: web::Path<Uuid>,
    service: Service<D, U>,
) -> Result<success::Success<model::ContentResponse>, error::Error>
where
    D: DocumentRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let user_id = get_claims(&req)?.sub;
    let content = service.read_content(user_id, document_id.into_inner()).await?;
    Ok(success::Success::ok(Some(model::ContentResponse { content })))
}

pub async fn save_content<D, U>(
    req: HttpRequest,
    document_id: web::Path<Uuid>,
    body: ValidatedJson<model::ContentBody>,
    service: Service<D, U>,
    server: web::Data<Addr<WebSocketServer>>,
) -> Result<success::Success<model::DocumentResponse>, error::Error>
where
    D: DocumentRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let user_id = get_claims(&req)?.sub;
    let document =
        service.write_content(user_id, document_id.into_inner(), body.0.content).await?;

    notify_saved(&server, user_id, &document);
    Ok(success::Success::ok(Some(document)).message("File saved successfully"))
}

pub async fn save_blob<D, U>(
    req: HttpRequest,
    document_id: web::Path<Uuid>,
    payload: Multipart,
    service: Service<D, U>,
    server: web::Data<Addr<WebSocketServer>>,
) -> Result<success::Success<model::DocumentResponse>, error::Error>
where
    D: DocumentRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let user_id = get_claims(&req)?.sub;
    let form = read_form(payload, service.max_file_size()).await?;

    let (_, bytes) =
        form.file.ok_or_else(|| error::Error::bad_request("No file part in the request"))?;

    let document =
        service.save_blob(user_id, document_id.into_inner(), bytes, form.html_content).await?;

    notify_saved(&server, user_id, &document);
    Ok(success::Success::ok(Some(document)).message("File saved successfully"))
}

pub async fn get_word_content<D, U>(
    req: HttpRequest,
    document_id: web::Path<Uuid>,
    service: Service<D, U>,
) -> Result<success::Success<model::WordContentResponse>, error::Error>
where
    D: DocumentRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let user_id = get_claims(&req)?.sub;
    let html = service.word_html(user_id, document_id.into_inner()).await?;
    Ok(success::Success::ok(Some(model::WordContentResponse { html })))
}

pub async fn share_document<D, U>(
    req: HttpRequest,
    document_id: web::Path<Uuid>,
    body: ValidatedJson<model::ShareBody>,
    service: Service<D, U>,
    server: web::Data<Addr<WebSocketServer>>,
) -> Result<success::Success<model::ShareResponse>, error::Error>
where
    D: DocumentRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let owner_id = get_claims(&req)?.sub;
    let model::ShareBody { username, permission } = body.0;

    let share = service.share(owner_id, document_id.into_inner(), &username, permission).await?;

    server.do_send(ShareChanged {
        document_id: share.document_id,
        user_id: share.user_id,
        permission: share.permission,
    });

    let message = format!("Shared with {} ({})", share.username, share.permission.as_str());
    Ok(success::Success::ok(Some(share)).message(message))
}

pub async fn list_shares<D, U>(
    req: HttpRequest,
    document_id: web::Path<Uuid>,
    service: Service<D, U>,
) -> Result<success::Success<Vec<model::ShareResponse>>, error::Error>
where
    D: DocumentRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let owner_id = get_claims(&req)?.sub;
    let shares = service.list_shares(owner_id, document_id.into_inner()).await?;
    Ok(success::Success::ok(Some(shares)))
}

pub async fn revoke_share<D, U>(
    req: HttpRequest,
    path: web::Path<(Uuid, Uuid)>,
    service: Service<D, U>,
    server: web::Data<Addr<WebSocketServer>>,
) -> Result<success::Success<()>, error::Error>
where
    D: DocumentRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    let owner_id = get_claims(&req)?.sub;
    let (document_id, user_id) = path.into_inner();
    service.revoke_share(owner_id, document_id, user_id).await?;

    server.do_send(RevokeAccess { document_id, user_id });
    Ok(success::Success::no_content())
}
