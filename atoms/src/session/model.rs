use serde::{Deserialize, Serialize};

/// The authenticated admin, as the identity backend describes them.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
    pub username: String,
    pub email: Option<String>,
}

/// Backend-issued proof of authentication. Carried in cookies between requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Backend username, needed to refresh when the pool uses a client secret.
    pub username: String,
    /// Access token lifetime in seconds, when known.
    pub expires_in: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: Identity,
    pub tokens: SessionTokens,
}
