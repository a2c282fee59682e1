use lambda_http::http::header::{HeaderValue, SET_COOKIE, VARY};
use lambda_http::{Body, Error, Response};

use crate::config::Config;

pub fn with_set_cookies(mut resp: Response<Body>, cookies: &[String]) -> Response<Body> {
    let headers = resp.headers_mut();
    for cookie in cookies {
        if let Ok(v) = HeaderValue::from_str(cookie) {
            headers.append(SET_COOKIE, v);
        }
    }
    resp
}

pub fn with_cors_headers(
    mut resp: Response<Body>,
    config: &Config,
    request_origin: Option<&str>,
) -> Response<Body> {
    let cors_origin = config.cors_origin(request_origin);

    let headers = resp.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_str(&cors_origin).unwrap_or_else(|_| HeaderValue::from_static("*")),
    );
    if cors_origin != "*" {
        headers.insert("Access-Control-Allow-Credentials", HeaderValue::from_static("true"));
    }
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,PATCH,DELETE,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type,X-File-Name,Cookie"),
    );
    headers.append(VARY, HeaderValue::from_static("Origin"));

    resp
}

/// CORS headers and any cookies for the outgoing response.
pub fn finalize_response(
    resp: Result<Response<Body>, Error>,
    config: &Config,
    request_origin: Option<&str>,
    cookies: &[String],
) -> Result<Response<Body>, Error> {
    resp.map(|r| with_cors_headers(with_set_cookies(r, cookies), config, request_origin))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(origins: &[&str]) -> Config {
        Config {
            table_name: "folio".to_string(),
            bucket_name: "folio-media".to_string(),
            asset_base_url: "https://cdn.example".to_string(),
            cognito_client_id: "client".to_string(),
            cognito_client_secret: None,
            contact_to_email: "studio@example.com".to_string(),
            contact_from_email: "site@example.com".to_string(),
            cors_origins: origins.iter().map(|o| o.to_string()).collect(),
            cookie_domain: None,
        }
    }

    #[test]
    fn allowed_origin_gets_credentials() {
        let resp = finalize_response(
            Ok(Response::new(Body::Empty)),
            &config(&["https://studio.example"]),
            Some("https://studio.example"),
            &["a=b; Path=/".to_string(), "c=d; Path=/".to_string()],
        )
        .unwrap();

        let headers = resp.headers();
        assert_eq!(headers["Access-Control-Allow-Origin"], "https://studio.example");
        assert_eq!(headers["Access-Control-Allow-Credentials"], "true");
        assert_eq!(headers.get_all(SET_COOKIE).iter().count(), 2);
    }

    #[test]
    fn wildcard_never_grants_credentials_to_a_caller() {
        let resp = with_cors_headers(
            Response::new(Body::Empty),
            &config(&["*"]),
            Some("https://elsewhere.example"),
        );
        assert_eq!(resp.headers()["Access-Control-Allow-Origin"], "*");
        assert!(resp.headers().get("Access-Control-Allow-Credentials").is_none());
    }

    #[test]
    fn anonymous_wildcard_has_no_credentials() {
        let resp = with_cors_headers(Response::new(Body::Empty), &config(&["*"]), None);
        assert_eq!(resp.headers()["Access-Control-Allow-Origin"], "*");
        assert!(resp.headers().get("Access-Control-Allow-Credentials").is_none());
    }
}
