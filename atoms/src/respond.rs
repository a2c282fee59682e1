use lambda_http::http::header::{HeaderValue, CONTENT_TYPE};
use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Serialize;

/// JSON response with the standard headers every handler sends.
pub fn json<T: Serialize>(status: StatusCode, payload: &T) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(serde_json::to_string(payload)?.into())
        .map_err(Box::new)?)
}

/// `{"error": message}` with the given status.
pub fn error(status: StatusCode, message: impl std::fmt::Display) -> Result<Response<Body>, Error> {
    json(status, &serde_json::json!({ "error": message.to_string() }))
}

pub fn no_content() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(Body::Empty)
        .map_err(Box::new)?)
}

pub fn not_found() -> Result<Response<Body>, Error> {
    error(StatusCode::NOT_FOUND, "Not found")
}

pub fn method_not_allowed() -> Result<Response<Body>, Error> {
    error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

/// Parse a JSON request body, answering 400 on malformed input.
pub fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, Response<Body>> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::warn!("Rejected request body: {}", e);
        let mut resp = Response::new(Body::from(
            serde_json::json!({"error": format!("Invalid request body: {}", e)}).to_string(),
        ));
        *resp.status_mut() = StatusCode::BAD_REQUEST;
        resp.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        resp
    })
}
