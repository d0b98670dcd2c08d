use actix_web::web;

use crate::modules::document::handle::*;
use crate::modules::document::repository::DocumentRepo;
use crate::modules::user::repository::UserRepository;

pub fn configure<D, U>(cfg: &mut web::ServiceConfig)
where
    D: DocumentRepo + 'static,
    U: UserRepository + Send + Sync + 'static,
{
    cfg.service(
        web::scope("/documents")
            .service(web::resource("").route(web::get().to(list_documents::<D, U>)))
            .service(web::resource("/upload").route(web::post().to(upload_document::<D, U>)))
            .service(
                web::resource("/{document_id}")
                    .route(web::get().to(get_document::<D, U>))
                    .route(web::delete().to(delete_document::<D, U>)),
            )
            .service(
                web::resource("/{document_id}/download")
                    .route(web::get().to(download_document::<D, U>)),
            )
            .service(
                web::resource("/{document_id}/editor").route(web::get().to(open_editor::<D, U>)),
            )
            .service(
                web::resource("/{document_id}/content")
                    .route(web::get().to(get_content::<D, U>))
                    .route(web::put().to(save_content::<D, U>)),
            )
            .service(web::resource("/{document_id}/blob").route(web::post().to(save_blob::<D, U>)))
            .service(
                web::resource("/{document_id}/word-content")
                    .route(web::get().to(get_word_content::<D, U>)),
            )
            .service(
                web::resource("/{document_id}/shares")
                    .route(web::get().to(list_shares::<D, U>))
                    .route(web::post().to(share_document::<D, U>)),
            )
            .service(
                web::resource("/{document_id}/shares/{user_id}")
                    .route(web::delete().to(revoke_share::<D, U>)),
            ),
    );
}
