use crate::error::{BqSyncError, Result};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::debug;

pub const ACCESS_TOKEN_ENV: &str = "BQ_SYNC_ACCESS_TOKEN";

/// Where bearer tokens for the Google APIs come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    Static(String),
    Gcloud,
}

impl TokenSource {
    pub fn from_env() -> Self {
        match std::env::var(ACCESS_TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => TokenSource::Static(token.trim().to_string()),
            _ => TokenSource::Gcloud,
        }
    }

    async fn fetch(&self) -> Result<String> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::Gcloud => {
                debug!("requesting access token from gcloud");
                let output = Command::new("gcloud")
                    .args(["auth", "print-access-token"])
                    .output()
                    .await
                    .map_err(|e| BqSyncError::Auth(format!("failed to run gcloud: {}", e)))?;
                if !output.status.success() {
                    return Err(BqSyncError::Auth(format!(
                        "gcloud auth print-access-token failed: {}",
                        String::from_utf8_lossy(&output.stderr).trim()
                    )));
                }
                let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if token.is_empty() {
                    return Err(BqSyncError::Auth("gcloud returned an empty token".into()));
                }
                Ok(token)
            }
        }
    }
}

/// Authenticated JSON GETs against one Google API host. The token is fetched
/// once and shared by clones.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenSource,
    token: Arc<OnceCell<String>>,
}

impl RestClient {
    pub fn new(base_url: impl Into<String>, tokens: TokenSource) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
            token: Arc::new(OnceCell::new()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) async fn bearer(&self) -> Result<&str> {
        let token = self.token.get_or_try_init(|| self.tokens.fetch()).await?;
        Ok(token.as_str())
    }

    /// GETs `<base_url>/<path>` and decodes the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let token = self.bearer().await?;
        debug!("GET {}", url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<T>().await?)
    }
}
