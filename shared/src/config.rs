use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
}

/// Runtime settings, read once at cold start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub table_name: String,
    pub bucket_name: String,
    /// Public base URL blobs are served from.
    pub asset_base_url: String,
    pub cognito_client_id: String,
    pub cognito_client_secret: Option<String>,
    pub contact_to_email: String,
    pub contact_from_email: String,
    pub cors_origins: Vec<String>,
    pub cookie_domain: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let bucket_name = get("S3_BUCKET_NAME").unwrap_or_else(|| "folio-media".to_string());
        let asset_base_url = get("ASSET_BASE_URL")
            .unwrap_or_else(|| format!("https://{}.s3.amazonaws.com", bucket_name));

        let cors_origins = get("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .unwrap_or_else(|| vec!["*".to_string()]);

        Ok(Self {
            table_name: get("TABLE_NAME").unwrap_or_else(|| "folio".to_string()),
            bucket_name,
            asset_base_url,
            cognito_client_id: require("COGNITO_CLIENT_ID")?,
            cognito_client_secret: get("COGNITO_CLIENT_SECRET"),
            contact_to_email: require("CONTACT_TO_EMAIL")?,
            contact_from_email: require("CONTACT_FROM_EMAIL")?,
            cors_origins,
            cookie_domain: get("COOKIE_DOMAIN"),
        })
    }

    /// Value for `Access-Control-Allow-Origin`. Only origins named in the
    /// list are echoed back; `*` never is, so it never carries credentials.
    pub fn cors_origin(&self, request_origin: Option<&str>) -> String {
        let listed = |origin: &str| origin != "*" && self.cors_origins.iter().any(|o| o == origin);
        match request_origin {
            Some(origin) if listed(origin) => origin.to_string(),
            _ if self.cors_origins.iter().any(|o| o == "*") => "*".to_string(),
            _ => self.cors_origins.first().cloned().unwrap_or_default(),
        }
    }
}
