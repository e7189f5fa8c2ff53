//! Google access tokens for service accounts.
//!
//! Service-account keys are handed to `google-cloud-auth`, which mints and
//! caches the bearer tokens. A static access token can be used instead when
//! the deployment already has one.

use std::path::Path;

use async_trait::async_trait;
use google_cloud_auth::credentials::service_account::{AccessSpecifier, Builder};
use google_cloud_auth::credentials::{CacheableResource, Credentials};
use http::Extensions;
use http::header::AUTHORIZATION;
use serde::Deserialize;
use tracing::{debug, info};
use zeroize::Zeroize;

/// OAuth2 scope covering Speech, Translation and Text-to-Speech
pub const GOOGLE_CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),
    #[error("Failed to read credentials file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to obtain access token: {0}")]
    TokenFetch(String),
}

/// A service-account key file
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(skip)]
    json: String,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"[REDACTED]")
            .field("project_id", &self.project_id)
            .finish()
    }
}

impl Drop for ServiceAccountKey {
    fn drop(&mut self) {
        self.private_key.zeroize();
        self.json.zeroize();
    }
}

/// Where credentials come from
#[derive(Debug, Clone)]
pub enum CredentialSource {
    ServiceAccount(ServiceAccountKey),
    AccessToken(String),
}

impl CredentialSource {
    /// Parse a service-account key given either as inline JSON or as a path
    /// to a key file.
    pub fn from_service_account(value: &str) -> Result<Self, AuthError> {
        let trimmed = value.trim();
        let json = if trimmed.starts_with('{') {
            trimmed.to_string()
        } else {
            std::fs::read_to_string(Path::new(trimmed))?
        };

        let mut key: ServiceAccountKey = serde_json::from_str(&json)
            .map_err(|e| AuthError::InvalidCredentials(format!("service account JSON: {e}")))?;

        if key.client_email.is_empty() || key.private_key.is_empty() {
            return Err(AuthError::InvalidCredentials(
                "service account is missing client_email or private_key".to_string(),
            ));
        }

        key.json = json;
        Ok(Self::ServiceAccount(key))
    }

    pub fn from_access_token(token: &str) -> Self {
        Self::AccessToken(token.to_string())
    }

    /// Project id embedded in the credentials, if any
    pub fn project_id(&self) -> Option<&str> {
        match self {
            Self::ServiceAccount(key) => key.project_id.as_deref(),
            Self::AccessToken(_) => None,
        }
    }
}

/// Supplies bearer tokens to Google API clients
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn get_token(&self) -> Result<String, AuthError>;
}

enum TokenSource {
    Static(String),
    Credentials(Credentials),
}

/// Bearer token client for Google APIs
pub struct GoogleAuthClient {
    source: TokenSource,
    project_id: Option<String>,
}

impl GoogleAuthClient {
    pub fn new(source: CredentialSource, scopes: &[&str]) -> Result<Self, AuthError> {
        if scopes.is_empty() {
            return Err(AuthError::InvalidCredentials(
                "at least one OAuth2 scope is required".to_string(),
            ));
        }

        let project_id = source.project_id().map(str::to_string);
        let source = match source {
            CredentialSource::AccessToken(token) => TokenSource::Static(token),
            CredentialSource::ServiceAccount(key) => {
                let value: serde_json::Value = serde_json::from_str(&key.json).map_err(|e| {
                    AuthError::InvalidCredentials(format!("service account JSON: {e}"))
                })?;
                let credentials = Builder::new(value)
                    .with_access_specifier(AccessSpecifier::from_scopes(scopes.iter().copied()))
                    .build()
                    .map_err(|e| AuthError::InvalidCredentials(e.to_string()))?;
                info!(client_email = %key.client_email, "Using Google service account credentials");
                TokenSource::Credentials(credentials)
            }
        };

        Ok(Self { source, project_id })
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }
}

#[async_trait]
impl TokenProvider for GoogleAuthClient {
    async fn get_token(&self) -> Result<String, AuthError> {
        let credentials = match &self.source {
            TokenSource::Static(token) => return Ok(token.clone()),
            TokenSource::Credentials(credentials) => credentials,
        };

        let headers = match credentials
            .headers(Extensions::new())
            .await
            .map_err(|e| AuthError::TokenFetch(e.to_string()))?
        {
            CacheableResource::New { data, .. } => data,
            CacheableResource::NotModified => {
                return Err(AuthError::TokenFetch(
                    "credentials returned no headers".to_string(),
                ));
            }
        };

        let value = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AuthError::TokenFetch("missing authorization header".to_string()))?;

        debug!("Resolved Google access token");
        value
            .strip_prefix("Bearer ")
            .map(str::to_string)
            .ok_or_else(|| AuthError::TokenFetch("unexpected authorization scheme".to_string()))
    }
}
