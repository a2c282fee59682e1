use lambda_http::{http::StatusCode, Body, Error, Response};

use super::model::{ArtworkPatch, NewArtwork};
use super::service;
use super::store::ArtworkStore;
use crate::clock::Clock;
use crate::error::DataError;
use crate::respond;

fn data_error_response(context: &str, e: DataError) -> Result<Response<Body>, Error> {
    match &e {
        DataError::NotFound(_) => tracing::warn!("{}: {}", context, e),
        _ => tracing::error!("{}: {}", context, e),
    }
    respond::error(e.status_code(), e)
}

/// HTTP Handler: GET /artworks
pub async fn list_artworks_handler(store: &dyn ArtworkStore) -> Result<Response<Body>, Error> {
    match service::list_artworks(store).await {
        Ok(artworks) => respond::json(StatusCode::OK, &artworks),
        Err(e) => data_error_response("list_artworks failed", e),
    }
}

/// HTTP Handler: GET /artworks/featured
pub async fn list_featured_artworks_handler(
    store: &dyn ArtworkStore,
) -> Result<Response<Body>, Error> {
    match service::list_featured_artworks(store).await {
        Ok(artworks) => respond::json(StatusCode::OK, &artworks),
        Err(e) => data_error_response("list_featured_artworks failed", e),
    }
}

/// HTTP Handler: GET /artworks/{id}
pub async fn get_artwork_handler(
    store: &dyn ArtworkStore,
    artwork_id: &str,
) -> Result<Response<Body>, Error> {
    match service::get_artwork(store, artwork_id).await {
        Ok(artwork) => respond::json(StatusCode::OK, &artwork),
        Err(e) => data_error_response("get_artwork failed", e),
    }
}

/// HTTP Handler: POST /admin/artworks
pub async fn create_artwork_handler(
    store: &dyn ArtworkStore,
    clock: &dyn Clock,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: NewArtwork = match respond::parse_body(body) {
        Ok(payload) => payload,
        Err(resp) => return Ok(resp),
    };

    if let Err(e) = payload.validate() {
        return respond::json(
            StatusCode::BAD_REQUEST,
            &serde_json::json!({"error": e.message, "field": e.field}),
        );
    }

    match service::create_artwork(store, clock, payload).await {
        Ok(id) => respond::json(StatusCode::CREATED, &serde_json::json!({ "id": id })),
        Err(e) => data_error_response("create_artwork failed", e),
    }
}

/// HTTP Handler: PATCH /admin/artworks/{id}
pub async fn update_artwork_handler(
    store: &dyn ArtworkStore,
    clock: &dyn Clock,
    artwork_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let patch: ArtworkPatch = match respond::parse_body(body) {
        Ok(patch) => patch,
        Err(resp) => return Ok(resp),
    };

    if let Err(e) = patch.validate() {
        return respond::json(
            StatusCode::BAD_REQUEST,
            &serde_json::json!({"error": e.message, "field": e.field}),
        );
    }

    match service::update_artwork(store, clock, artwork_id, patch).await {
        Ok(artwork) => respond::json(StatusCode::OK, &artwork),
        Err(e) => data_error_response("update_artwork failed", e),
    }
}

/// HTTP Handler: DELETE /admin/artworks/{id}
pub async fn delete_artwork_handler(
    store: &dyn ArtworkStore,
    artwork_id: &str,
) -> Result<Response<Body>, Error> {
    match service::delete_artwork(store, artwork_id).await {
        Ok(()) => respond::no_content(),
        Err(e) => data_error_response("delete_artwork failed", e),
    }
}
