use crate::config::StorageConfig;
use crate::error::UploadError;
use crate::state::AppState;
use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::{web, HttpResponse};
use extractors::render_csv;
use futures::TryStreamExt;
use shared_types::UploadResponse;
use std::io::Write;
use tempfile::NamedTempFile;
use tracing::{error, info};

const FILE_FIELD: &str = "file";

/// `POST /api/upload` and `POST /api/extract`
pub async fn upload_statement(
    state: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse, UploadError> {
    info!("Received statement upload");
    process_upload(&state, &mut payload).await.map_err(|e| {
        error!("Upload failed: {}", e);
        e
    })
}

async fn process_upload(
    state: &AppState,
    payload: &mut Multipart,
) -> Result<HttpResponse, UploadError> {
    let upload = receive_upload(payload, &state.storage).await?;

    let pdf = state.pdf.clone();
    let raw_text = tokio::task::spawn_blocking(move || -> Result<String, UploadError> {
        let bytes = std::fs::read(upload.path())?;
        Ok(pdf.extract_text(&bytes)?)
    })
    .await
    .map_err(|_| UploadError::Aborted)??;
    info!("Extracted {} chars of statement text", raw_text.len());

    let transactions = state
        .extractor
        .extract_transactions(&raw_text)
        .await
        .into_result()
        .map_err(UploadError::Extraction)?;

    let filename = write_csv(&state.storage, &transactions)?;

    Ok(HttpResponse::Ok().json(UploadResponse {
        success: true,
        message: "Transactions extracted".to_string(),
        count: transactions.len(),
        transactions,
        csv_url: format!("/downloads/{filename}"),
    }))
}

/// Streams the `file` field into a temp file under `uploads_dir`.
///
/// The temp file is removed when the returned handle drops.
async fn receive_upload(
    payload: &mut Multipart,
    storage: &StorageConfig,
) -> Result<NamedTempFile, UploadError> {
    let mut upload = None;

    while let Some(mut field) = payload.try_next().await.map_err(multipart_error)? {
        let is_file = field.content_disposition().get_name() == Some(FILE_FIELD);
        if !is_file || upload.is_some() {
            drain(&mut field).await?;
            continue;
        }

        let filename = field
            .content_disposition()
            .get_filename()
            .unwrap_or("statement.pdf")
            .to_string();

        std::fs::create_dir_all(&storage.uploads_dir)?;
        let mut file = tempfile::Builder::new()
            .prefix("upload_")
            .suffix(".pdf")
            .tempfile_in(&storage.uploads_dir)?;

        let mut size = 0usize;
        while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
            size += chunk.len();
            if size > storage.max_upload_bytes {
                return Err(UploadError::TooLarge {
                    limit: storage.max_upload_bytes,
                });
            }
            file.write_all(&chunk)?;
        }
        file.flush()?;

        info!("Stored upload {:?} ({} bytes)", filename, size);
        if size > 0 {
            upload = Some(file);
        }
    }

    upload.ok_or(UploadError::Missing)
}

async fn drain(field: &mut Field) -> Result<(), UploadError> {
    while field.try_next().await.map_err(multipart_error)?.is_some() {}
    Ok(())
}

/// A request that is not multipart at all carries no file
fn multipart_error(e: MultipartError) -> UploadError {
    match e {
        MultipartError::NoContentType
        | MultipartError::ParseContentType
        | MultipartError::Boundary => UploadError::Missing,
        other => UploadError::Multipart(other.to_string()),
    }
}

fn write_csv(
    storage: &StorageConfig,
    transactions: &[shared_types::TransactionRecord],
) -> Result<String, UploadError> {
    let csv = render_csv(transactions)?;
    // Millisecond names can collide under concurrent uploads
    let filename = format!("transactions_{}.csv", chrono::Utc::now().timestamp_millis());

    std::fs::create_dir_all(&storage.downloads_dir)?;
    let path = storage.downloads_dir.join(&filename);
    std::fs::write(&path, csv)?;
    info!("Wrote {} transactions to {:?}", transactions.len(), path);

    Ok(filename)
}
