use serde::Serialize;

use folio_atoms::session::SessionContext;

pub const LOGIN_PATH: &str = "/login";

/// Every page of the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "page", rename_all = "camelCase")]
pub enum Route {
    Home,
    Gallery,
    Contact,
    Login,
    AdminDashboard,
    AdminUpload {
        #[serde(skip_serializing_if = "Option::is_none")]
        edit: Option<String>,
    },
    NotFound,
}

/// What the shell does with a route for the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    Redirect(String),
    /// The session is still being resolved; show a spinner.
    Pending,
}

fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

impl Route {
    /// Parse a path with optional query string, e.g. `/admin/upload?edit=42`.
    pub fn parse(target: &str) -> Route {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };

        match path {
            "/" => Route::Home,
            "/gallery" => Route::Gallery,
            "/contact" => Route::Contact,
            "/login" => Route::Login,
            "/admin" => Route::AdminDashboard,
            "/admin/upload" => Route::AdminUpload {
                edit: query_param(query, "edit")
                    .filter(|id| !id.is_empty())
                    .map(str::to_string),
            },
            _ => Route::NotFound,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Gallery => "/gallery".to_string(),
            Route::Contact => "/contact".to_string(),
            Route::Login => LOGIN_PATH.to_string(),
            Route::AdminDashboard => "/admin".to_string(),
            Route::AdminUpload { edit: None } => "/admin/upload".to_string(),
            Route::AdminUpload { edit: Some(id) } => format!("/admin/upload?edit={}", id),
            Route::NotFound => "/404".to_string(),
        }
    }

    pub fn requires_session(&self) -> bool {
        matches!(self, Route::AdminDashboard | Route::AdminUpload { .. })
    }
}

/// Gate admin routes on the session. Public routes always render.
pub fn navigate(route: Route, session: &SessionContext) -> Navigation {
    if !route.requires_session() {
        return Navigation::Render(route);
    }
    if session.is_loading() {
        return Navigation::Pending;
    }
    if !session.is_authenticated() {
        tracing::debug!(path = %route.path(), "no session, redirecting to login");
        return Navigation::Redirect(LOGIN_PATH.to_string());
    }
    Navigation::Render(route)
}
