pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

pub use state::AppState;

use actix_files::{Files, NamedFile};
use actix_web::dev::{fn_service, ServiceRequest, ServiceResponse};
use actix_web::web;
use crate::config::StorageConfig;
use std::path::Path;

/// Registers the API routes and the CSV download directory.
pub fn configure(cfg: &mut web::ServiceConfig, storage: &StorageConfig) {
    cfg.route("/health", web::get().to(handlers::health::health))
        .route(
            "/api/upload",
            web::post().to(handlers::upload::upload_statement),
        )
        .route(
            "/api/extract",
            web::post().to(handlers::upload::upload_statement),
        )
        .service(Files::new("/downloads", storage.downloads_dir.clone()));
}

/// Serves a built frontend at `/`, answering unknown paths with `index.html`
/// so client-side routes resolve.
pub fn frontend_service(build_dir: &Path) -> Files {
    let index = build_dir.join("index.html");
    Files::new("/", build_dir.to_path_buf())
        .index_file("index.html")
        .default_handler(fn_service(move |req: ServiceRequest| {
            let index = index.clone();
            async move {
                let (req, _) = req.into_parts();
                let file = NamedFile::open_async(index).await?;
                let res = file.into_response(&req);
                Ok::<_, actix_web::Error>(ServiceResponse::new(req, res))
            }
        }))
}
