use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::error::DisplayErrorContext;
use aws_sdk_cognitoidentityprovider::types::{AuthFlowType, AuthenticationResultType};
use aws_sdk_cognitoidentityprovider::Client as CognitoClient;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;

use folio_atoms::error::AuthError;
use folio_atoms::session::{Identity, IdentityProvider, Session, SessionTokens};

pub const ACCESS_TOKEN_COOKIE: &str = "folio_access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "folio_refresh_token";
pub const USERNAME_COOKIE: &str = "folio_username";

/// Refresh tokens outlive access tokens; the pool default is 30 days.
const REFRESH_TOKEN_MAX_AGE: i64 = 30 * 24 * 60 * 60;
const DEFAULT_ACCESS_MAX_AGE: i64 = 60 * 60;

type HmacSha256 = Hmac<Sha256>;

/// SECRET_HASH = Base64(HMAC_SHA256(client_secret, username + client_id))
pub fn secret_hash(username: &str, client_id: &str, client_secret: &str) -> Result<String, AuthError> {
    let mut mac = HmacSha256::new_from_slice(client_secret.as_bytes())
        .map_err(|e| AuthError::Backend(format!("invalid client secret: {}", e)))?;
    mac.update(username.as_bytes());
    mac.update(client_id.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Cognito user pool app client.
pub struct CognitoIdentityProvider {
    client: CognitoClient,
    client_id: String,
    client_secret: Option<String>,
}

impl CognitoIdentityProvider {
    pub fn new(client: CognitoClient, client_id: impl Into<String>, client_secret: Option<String>) -> Self {
        Self {
            client,
            client_id: client_id.into(),
            client_secret,
        }
    }

    fn secret_hash_for(&self, username: &str) -> Result<Option<String>, AuthError> {
        self.client_secret
            .as_deref()
            .map(|secret| secret_hash(username, &self.client_id, secret))
            .transpose()
    }

    async fn lookup(&self, access_token: &str) -> Result<Identity, AuthError> {
        let output = self
            .client
            .get_user()
            .access_token(access_token)
            .send()
            .await
            .map_err(|e| {
                let expired = e
                    .as_service_error()
                    .map(|s| s.is_not_authorized_exception())
                    .unwrap_or(false);
                if expired {
                    AuthError::SessionExpired
                } else {
                    AuthError::Backend(DisplayErrorContext(&e).to_string())
                }
            })?;

        let mut user_id = None;
        let mut email = None;
        for attribute in output.user_attributes() {
            match attribute.name() {
                "sub" => user_id = attribute.value().map(str::to_string),
                "email" => email = attribute.value().map(str::to_string),
                _ => {}
            }
        }

        let username = output.username().to_string();
        Ok(Identity {
            user_id: user_id.unwrap_or_else(|| username.clone()),
            username,
            email,
        })
    }
}

fn tokens_from_result(
    result: &AuthenticationResultType,
    username: &str,
    previous_refresh: Option<&str>,
) -> Result<SessionTokens, AuthError> {
    let access_token = result
        .access_token()
        .ok_or_else(|| AuthError::Backend("no access token in authentication result".to_string()))?;

    Ok(SessionTokens {
        access_token: access_token.to_string(),
        // Refresh responses do not repeat the refresh token
        refresh_token: result
            .refresh_token()
            .or(previous_refresh)
            .map(str::to_string),
        username: username.to_string(),
        expires_in: Some(i64::from(result.expires_in())).filter(|s| *s > 0),
    })
}

#[async_trait]
impl IdentityProvider for CognitoIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let mut request = self
            .client
            .initiate_auth()
            .auth_flow(AuthFlowType::UserPasswordAuth)
            .client_id(&self.client_id)
            .auth_parameters("USERNAME", email)
            .auth_parameters("PASSWORD", password);
        if let Some(hash) = self.secret_hash_for(email)? {
            request = request.auth_parameters("SECRET_HASH", hash);
        }

        let output = request.send().await.map_err(|e| {
            let rejected = e
                .as_service_error()
                .map(|s| s.is_not_authorized_exception() || s.is_user_not_found_exception())
                .unwrap_or(false);
            if rejected {
                AuthError::InvalidCredentials
            } else {
                tracing::error!("Cognito initiate_auth failed: {}", DisplayErrorContext(&e));
                AuthError::Backend(DisplayErrorContext(&e).to_string())
            }
        })?;

        let result = match output.authentication_result() {
            Some(result) => result,
            None => {
                let challenge = output
                    .challenge_name()
                    .map(|c| c.as_str().to_string())
                    .unwrap_or_default();
                tracing::warn!(challenge = %challenge, "sign-in needs a challenge this site does not handle");
                return Err(AuthError::Backend(format!("unsupported challenge {}", challenge)));
            }
        };

        let provisional = tokens_from_result(result, email, None)?;
        let identity = self.lookup(&provisional.access_token).await?;

        // Refresh hashes are computed over the pool username, not the login alias
        let tokens = SessionTokens {
            username: identity.username.clone(),
            ..provisional
        };
        Ok(Session { identity, tokens })
    }

    async fn sign_out(&self, tokens: &SessionTokens) -> Result<(), AuthError> {
        self.client
            .global_sign_out()
            .access_token(&tokens.access_token)
            .send()
            .await
            .map_err(|e| {
                let rejected = e
                    .as_service_error()
                    .map(|s| s.is_not_authorized_exception())
                    .unwrap_or(false);
                if rejected {
                    AuthError::NotAuthenticated
                } else {
                    AuthError::Backend(DisplayErrorContext(&e).to_string())
                }
            })?;
        Ok(())
    }

    async fn identify(&self, tokens: &SessionTokens) -> Result<Identity, AuthError> {
        if tokens.access_token.is_empty() {
            return Err(AuthError::SessionExpired);
        }
        self.lookup(&tokens.access_token).await
    }

    async fn refresh(&self, tokens: &SessionTokens) -> Result<SessionTokens, AuthError> {
        let refresh_token = tokens
            .refresh_token
            .as_deref()
            .ok_or(AuthError::NotAuthenticated)?;

        let mut request = self
            .client
            .initiate_auth()
            .auth_flow(AuthFlowType::RefreshTokenAuth)
            .client_id(&self.client_id)
            .auth_parameters("REFRESH_TOKEN", refresh_token);
        if let Some(hash) = self.secret_hash_for(&tokens.username)? {
            request = request.auth_parameters("SECRET_HASH", hash);
        }

        let output = request.send().await.map_err(|e| {
            let rejected = e
                .as_service_error()
                .map(|s| s.is_not_authorized_exception())
                .unwrap_or(false);
            if rejected {
                AuthError::NotAuthenticated
            } else {
                AuthError::Backend(DisplayErrorContext(&e).to_string())
            }
        })?;

        let result = output
            .authentication_result()
            .ok_or_else(|| AuthError::Backend("refresh returned no tokens".to_string()))?;
        tokens_from_result(result, &tokens.username, Some(refresh_token))
    }
}

/// `name -> value` for every pair in a `Cookie` header.
pub fn parse_cookies(header: Option<&str>) -> HashMap<String, String> {
    header
        .unwrap_or("")
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

/// Session tokens carried by a `Cookie` header, if any. An access cookie
/// that already expired in the browser still yields tokens so the refresh
/// cookie can be used.
pub fn tokens_from_cookies(header: Option<&str>) -> Option<SessionTokens> {
    let mut cookies = parse_cookies(header);
    let access_token = cookies.remove(ACCESS_TOKEN_COOKIE).unwrap_or_default();
    let refresh_token = cookies.remove(REFRESH_TOKEN_COOKIE).filter(|v| !v.is_empty());
    let username = cookies.remove(USERNAME_COOKIE).unwrap_or_default();

    if access_token.is_empty() && (refresh_token.is_none() || username.is_empty()) {
        return None;
    }

    Some(SessionTokens {
        access_token,
        refresh_token,
        username,
        expires_in: None,
    })
}

pub fn set_cookie(name: &str, value: &str, max_age: i64, domain: Option<&str>) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age={}",
        name, value, max_age
    );
    if let Some(domain) = domain {
        cookie.push_str("; Domain=");
        cookie.push_str(domain);
    }
    cookie
}

pub fn clear_cookie(name: &str, domain: Option<&str>) -> String {
    set_cookie(name, "", 0, domain)
}

/// `Set-Cookie` values that persist `tokens` in the browser.
pub fn session_cookies(tokens: &SessionTokens, domain: Option<&str>) -> Vec<String> {
    let access_max_age = tokens.expires_in.unwrap_or(DEFAULT_ACCESS_MAX_AGE);
    let mut cookies = vec![
        set_cookie(ACCESS_TOKEN_COOKIE, &tokens.access_token, access_max_age, domain),
        set_cookie(USERNAME_COOKIE, &tokens.username, REFRESH_TOKEN_MAX_AGE, domain),
    ];
    if let Some(refresh) = &tokens.refresh_token {
        cookies.push(set_cookie(REFRESH_TOKEN_COOKIE, refresh, REFRESH_TOKEN_MAX_AGE, domain));
    }
    cookies
}

pub fn clear_session_cookies(domain: Option<&str>) -> Vec<String> {
    [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, USERNAME_COOKIE]
        .iter()
        .map(|name| clear_cookie(name, domain))
        .collect()
}
