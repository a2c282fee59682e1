use std::sync::Arc;

use folio_atoms::artworks::{ArtworkStore, DynamoArtworkStore};
use folio_atoms::contact::ContactMailer;
use folio_atoms::media::{BlobStore, S3BlobStore};
use folio_atoms::session::IdentityProvider;
use folio_atoms::{Clock, SystemClock};

use crate::auth::CognitoIdentityProvider;
use crate::config::{Config, ConfigError};
use crate::email::SesMailer;

/// Everything a request handler needs, built once per cold start.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub artworks: Arc<dyn ArtworkStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub mailer: Arc<dyn ContactMailer>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Read configuration and wire the AWS clients from the default
    /// credential chain.
    pub async fn from_env() -> Result<Self, ConfigError> {
        let config = Config::from_env()?;
        let aws = aws_config::load_from_env().await;

        let artworks = DynamoArtworkStore::new(
            aws_sdk_dynamodb::Client::new(&aws),
            config.table_name.clone(),
        );
        let blobs = S3BlobStore::new(
            aws_sdk_s3::Client::new(&aws),
            config.bucket_name.clone(),
            config.asset_base_url.clone(),
        );
        let identity = CognitoIdentityProvider::new(
            aws_sdk_cognitoidentityprovider::Client::new(&aws),
            config.cognito_client_id.clone(),
            config.cognito_client_secret.clone(),
        );
        let mailer = SesMailer::new(
            aws_sdk_sesv2::Client::new(&aws),
            config.contact_to_email.clone(),
            config.contact_from_email.clone(),
        );

        tracing::info!(
            table = %config.table_name,
            bucket = %config.bucket_name,
            "application state ready"
        );

        Ok(Self {
            config,
            artworks: Arc::new(artworks),
            blobs: Arc::new(blobs),
            identity: Arc::new(identity),
            mailer: Arc::new(mailer),
            clock: Arc::new(SystemClock),
        })
    }
}
