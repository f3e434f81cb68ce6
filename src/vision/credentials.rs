//! Credential resolution for Cloud Vision
//!
//! Deployments hand us credentials in different ways: an inline base64
//! service-account payload, a key file path, platform-managed identity, or a
//! bare API key. Sources are tried in that order and the first one that
//! produces credentials wins.

use std::future::Future;
use std::sync::Arc;

use base64::Engine;
use gcp_auth::{CustomServiceAccount, TokenProvider};

use super::provider::VisionAuth;
use crate::config::VisionConfig;

/// Where the resolved credentials came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    InlineServiceAccount,
    CredentialsFile(String),
    DefaultChain,
    ApiKey,
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InlineServiceAccount => f.write_str("inline service account"),
            Self::CredentialsFile(path) => write!(f, "credentials file {}", path),
            Self::DefaultChain => f.write_str("application default credentials"),
            Self::ApiKey => f.write_str("API key"),
        }
    }
}

#[derive(Debug)]
pub struct ResolvedCredentials {
    pub source: CredentialSource,
    pub auth: VisionAuth,
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("inline credentials are not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("inline credentials are not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("invalid service account: {0}")]
    ServiceAccount(gcp_auth::Error),

    #[error("credential discovery failed: {0}")]
    Discovery(gcp_auth::Error),
}

/// Decode a base64 service-account JSON payload into credentials
pub fn decode_inline_payload(encoded: &str) -> Result<CustomServiceAccount, CredentialError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD.decode(compact)?;
    let json = String::from_utf8(bytes)?;
    CustomServiceAccount::from_json(&json).map_err(CredentialError::ServiceAccount)
}

/// Resolve vision credentials, returning the last failure when none work
pub async fn resolve(config: &VisionConfig) -> Result<ResolvedCredentials, CredentialError> {
    resolve_with(config, default_chain).await
}

/// Platform-managed identity: well-known ADC file, metadata server, gcloud
async fn default_chain() -> Result<Arc<dyn TokenProvider>, CredentialError> {
    gcp_auth::provider().await.map_err(CredentialError::Discovery)
}

/// Walk the credential sources, using `discover` for the platform chain
pub(crate) async fn resolve_with<F, Fut>(
    config: &VisionConfig,
    discover: F,
) -> Result<ResolvedCredentials, CredentialError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Arc<dyn TokenProvider>, CredentialError>>,
{
    if let Some(encoded) = &config.credentials_json {
        match decode_inline_payload(encoded) {
            Ok(account) => {
                return Ok(ResolvedCredentials {
                    source: CredentialSource::InlineServiceAccount,
                    auth: VisionAuth::Token(Arc::new(account)),
                });
            }
            Err(e) => {
                tracing::warn!(
                    "GOOGLE_APPLICATION_CREDENTIALS_JSON unusable ({}), falling back to ambient credentials",
                    e
                );
            }
        }
    }

    let ambient = match ambient_provider(config, discover).await {
        Ok(resolved) => return Ok(resolved),
        Err(e) => e,
    };

    if let Some(key) = &config.api_key {
        tracing::warn!("Ambient credentials unavailable ({}), using API key", ambient);
        return Ok(ResolvedCredentials {
            source: CredentialSource::ApiKey,
            auth: VisionAuth::ApiKey(key.clone()),
        });
    }

    Err(ambient)
}

async fn ambient_provider<F, Fut>(
    config: &VisionConfig,
    discover: F,
) -> Result<ResolvedCredentials, CredentialError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Arc<dyn TokenProvider>, CredentialError>>,
{
    if let Some(path) = &config.credentials_path {
        match CustomServiceAccount::from_file(path) {
            Ok(account) => {
                return Ok(ResolvedCredentials {
                    source: CredentialSource::CredentialsFile(path.clone()),
                    auth: VisionAuth::Token(Arc::new(account)),
                });
            }
            Err(e) => {
                tracing::warn!("Failed to load credentials file {}: {}", path, e);
            }
        }
    }

    let provider = discover().await?;

    Ok(ResolvedCredentials {
        source: CredentialSource::DefaultChain,
        auth: VisionAuth::Token(provider),
    })
}
