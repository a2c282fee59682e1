use folio_atoms::error::AuthError;
use folio_atoms::session::SessionContext;
use folio_atoms::{artworks, media, respond};
use folio_shared::{auth, contact, AppState};
use folio_shared::http::{finalize_response, with_cors_headers};
use gallery_block::shell::{self, Navigation, Route, LOGIN_PATH};
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, RequestExt, Response,
};
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

type Reply = (Result<Response<Body>, Error>, Vec<String>);

fn header<'a>(event: &'a Request, name: &str) -> Option<&'a str> {
    event.headers().get(name).and_then(|v| v.to_str().ok())
}

fn query_param(event: &Request, key: &str) -> Option<String> {
    if let Some(value) = event.query_string_parameters_ref().and_then(|q| q.first(key)) {
        return Some(value.to_string());
    }
    event
        .uri()
        .query()?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.to_string())
}

/// Session context seeded from the request cookies. The bool says whether
/// the request carried any session cookies at all.
fn cookie_session(state: &AppState, event: &Request) -> (SessionContext, bool) {
    let tokens = auth::tokens_from_cookies(header(event, "Cookie"));
    let had_tokens = tokens.is_some();
    (SessionContext::new(state.identity.clone(), tokens), had_tokens)
}

/// Cookies to send back after resolving a session: fresh ones after a
/// refresh, cleared ones when the cookies no longer name a session.
fn session_cookie_updates(state: &AppState, session: &SessionContext, had_tokens: bool) -> Vec<String> {
    let domain = state.config.cookie_domain.as_deref();
    match session.session() {
        Some(current) if session.tokens_changed() => auth::session_cookies(&current.tokens, domain),
        Some(_) => Vec::new(),
        None if had_tokens => auth::clear_session_cookies(domain),
        None => Vec::new(),
    }
}

fn unauthorized() -> Result<Response<Body>, Error> {
    respond::json(
        StatusCode::UNAUTHORIZED,
        &serde_json::json!({"error": "Not authenticated", "redirect": LOGIN_PATH}),
    )
}

/// Main Lambda handler - public routes, session routes and the gated admin area
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method().clone();
    let path = event.uri().path().to_string();
    let body: &[u8] = event.body();
    let request_origin = header(&event, "Origin");
    let config = &state.config;
    tracing::info!(method = %method, path = %path, "request received");

    // Handle CORS preflight
    if method == Method::OPTIONS {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp, config, request_origin));
    }

    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    // Admin area: resolve the session before anything else
    if parts.first() == Some(&"admin") {
        let (session, had_tokens) = cookie_session(&state, &event);
        session.initialize().await;
        let cookies = session_cookie_updates(&state, &session, had_tokens);

        if !session.is_authenticated() {
            tracing::info!(path = %path, "admin request without session");
            return finalize_response(unauthorized(), config, request_origin, &cookies);
        }

        let resp = admin_route(&state, &event, &method, &parts, &path).await;
        return finalize_response(resp, config, request_origin, &cookies);
    }

    let (resp, cookies) = match (&method, parts.as_slice()) {
        (&Method::GET, ["artworks"]) => (
            artworks::list_artworks_handler(state.artworks.as_ref()).await,
            Vec::new(),
        ),
        (&Method::GET, ["artworks", "featured"]) => (
            artworks::list_featured_artworks_handler(state.artworks.as_ref()).await,
            Vec::new(),
        ),
        (&Method::GET, ["artworks", artwork_id]) => (
            artworks::get_artwork_handler(state.artworks.as_ref(), artwork_id).await,
            Vec::new(),
        ),
        (&Method::POST, ["contact"]) => (
            contact::handle_contact(state.mailer.as_ref(), body).await,
            Vec::new(),
        ),
        (&Method::POST, ["login"]) => login(&state, body).await,
        (&Method::POST, ["logout"]) => logout(&state, &event).await,
        (&Method::GET, ["session"]) => current_session(&state, &event).await,
        (&Method::GET, ["navigate"]) => navigate(&state, &event).await,
        (_, ["artworks", ..]) | (_, ["contact"]) | (_, ["login"]) | (_, ["logout"])
        | (_, ["session"]) | (_, ["navigate"]) => (respond::method_not_allowed(), Vec::new()),
        _ => (respond::not_found(), Vec::new()),
    };

    finalize_response(resp, config, request_origin, &cookies)
}

async fn admin_route(
    state: &AppState,
    event: &Request,
    method: &Method,
    parts: &[&str],
    path: &str,
) -> Result<Response<Body>, Error> {
    let body: &[u8] = event.body();

    match (method, parts) {
        (&Method::POST, ["admin", "artworks"]) => {
            artworks::create_artwork_handler(state.artworks.as_ref(), state.clock.as_ref(), body).await
        }
        (&Method::PATCH, ["admin", "artworks", artwork_id]) => {
            artworks::update_artwork_handler(
                state.artworks.as_ref(),
                state.clock.as_ref(),
                artwork_id,
                body,
            )
            .await
        }
        (&Method::DELETE, ["admin", "artworks", artwork_id]) => {
            artworks::delete_artwork_handler(state.artworks.as_ref(), artwork_id).await
        }
        (&Method::POST, ["admin", "uploads"]) => {
            let file_name = header(event, "X-File-Name").unwrap_or("image");
            let content_type = header(event, "Content-Type").unwrap_or("");
            media::upload_image_handler(
                state.blobs.clone(),
                state.clock.as_ref(),
                file_name,
                content_type,
                body,
            )
            .await
        }
        (&Method::DELETE, ["admin", "uploads", ..]) => {
            // Blob paths contain slashes; take everything after the prefix
            let raw = path.strip_prefix("/admin/uploads/").unwrap_or("");
            match percent_decode_str(raw).decode_utf8() {
                Ok(blob_path) => media::delete_image_handler(state.blobs.as_ref(), &blob_path).await,
                Err(_) => respond::error(StatusCode::BAD_REQUEST, "Invalid image path"),
            }
        }
        (_, ["admin", "artworks", ..]) | (_, ["admin", "uploads", ..]) => respond::method_not_allowed(),
        _ => respond::not_found(),
    }
}

/// POST /login
async fn login(state: &AppState, body: &[u8]) -> Reply {
    let req: LoginRequest = match respond::parse_body(body) {
        Ok(req) => req,
        Err(resp) => return (Ok(resp), Vec::new()),
    };

    if req.email.trim().is_empty() || req.password.is_empty() {
        return (
            respond::error(StatusCode::BAD_REQUEST, "Please enter both email and password"),
            Vec::new(),
        );
    }

    let session = SessionContext::new(state.identity.clone(), None);
    match session.login(req.email.trim(), &req.password).await {
        Ok(current) => (
            respond::json(StatusCode::OK, &serde_json::json!({ "user": current.identity })),
            auth::session_cookies(&current.tokens, state.config.cookie_domain.as_deref()),
        ),
        Err(AuthError::InvalidCredentials) => (
            respond::error(StatusCode::UNAUTHORIZED, "Invalid email or password"),
            Vec::new(),
        ),
        Err(e) => {
            tracing::error!("login failed: {}", e);
            (respond::error(e.status_code(), e), Vec::new())
        }
    }
}

/// POST /logout
async fn logout(state: &AppState, event: &Request) -> Reply {
    let (session, _) = cookie_session(state, event);
    session.initialize().await;

    match session.logout().await {
        Ok(()) => (
            respond::json(StatusCode::OK, &serde_json::json!({"message": "ok"})),
            auth::clear_session_cookies(state.config.cookie_domain.as_deref()),
        ),
        // Cookies stay so the browser still holds the session it could not end
        Err(e) => (respond::error(e.status_code(), e), Vec::new()),
    }
}

/// GET /session
async fn current_session(state: &AppState, event: &Request) -> Reply {
    let (session, had_tokens) = cookie_session(state, event);
    session.initialize().await;

    let cookies = session_cookie_updates(state, &session, had_tokens);
    (
        respond::json(
            StatusCode::OK,
            &serde_json::json!({ "user": session.current_identity() }),
        ),
        cookies,
    )
}

/// GET /navigate?path=...
async fn navigate(state: &AppState, event: &Request) -> Reply {
    let target = query_param(event, "path").unwrap_or_else(|| "/".to_string());
    let route = Route::parse(&target);

    let (session, had_tokens) = cookie_session(state, event);
    let mut cookies = Vec::new();
    if route.requires_session() {
        session.initialize().await;
        cookies = session_cookie_updates(state, &session, had_tokens);
    }

    let payload = match shell::navigate(route, &session) {
        Navigation::Render(route) => serde_json::json!({ "render": route }),
        Navigation::Redirect(to) => serde_json::json!({ "redirect": to }),
        Navigation::Pending => serde_json::json!({ "pending": true }),
    };
    (respond::json(StatusCode::OK, &payload), cookies)
}
