use futures::StreamExt;
use lambda_http::{http::StatusCode, Body, Error as LambdaError, Response};
use std::sync::Arc;

use super::model::{check_image, StoredImage, UploadOptions};
use super::service::{delete_image, storage_path, store_thumbnail, upload_image};
use super::store::BlobStore;
use crate::clock::Clock;
use crate::respond;

/// HTTP Handler: POST /admin/uploads
///
/// Raw image bytes in the body, `Content-Type: image/*`, original file name
/// in `X-File-Name`.
pub async fn upload_image_handler(
    store: Arc<dyn BlobStore>,
    clock: &dyn Clock,
    file_name: &str,
    content_type: &str,
    body: &[u8],
) -> Result<Response<Body>, LambdaError> {
    if let Err(e) = check_image(content_type, body.len() as u64) {
        return respond::json(
            StatusCode::BAD_REQUEST,
            &serde_json::json!({"error": e.message, "field": e.field}),
        );
    }

    let path = storage_path(file_name, clock.now());
    tracing::info!(path = %path, size = body.len(), "upload started");

    let mut handle = upload_image(
        store.clone(),
        body.to_vec(),
        path.clone(),
        content_type.to_string(),
        UploadOptions::default(),
    );

    {
        let mut progress = handle.progress();
        while let Some(p) = progress.next().await {
            tracing::debug!(path = %path, sent = p.bytes_sent, total = p.total_bytes, "upload progress");
        }
    }

    let url = match handle.finish().await {
        Ok(url) => url,
        Err(e) => {
            tracing::error!(path = %path, "upload failed: {}", e);
            return respond::error(e.status_code(), e);
        }
    };

    let thumbnail = store_thumbnail(store, body.to_vec(), &path).await;

    let stored = StoredImage {
        path,
        url,
        thumbnail_path: thumbnail.as_ref().map(|(p, _)| p.clone()),
        thumbnail_url: thumbnail.map(|(_, u)| u),
    };

    respond::json(StatusCode::CREATED, &stored)
}

/// HTTP Handler: DELETE /admin/uploads/{path}
pub async fn delete_image_handler(
    store: &dyn BlobStore,
    path: &str,
) -> Result<Response<Body>, LambdaError> {
    if path.is_empty() {
        return respond::error(StatusCode::BAD_REQUEST, "Missing image path");
    }

    match delete_image(store, path).await {
        Ok(()) => respond::no_content(),
        Err(e) => {
            tracing::error!(path = %path, "delete_image failed: {}", e);
            respond::error(e.status_code(), e)
        }
    }
}
