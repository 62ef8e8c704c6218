//! OAuth 2.0 token handling for the Google Sheets API.
//!
//! This module loads the downloaded client credentials (`client_secret.json`) and the
//! stored tokens (`token.json`), and keeps the access token fresh by exchanging the
//! refresh token against Google's token endpoint shortly before expiry.

use crate::{utils, Result};
use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Refresh the access token when it is within this margin of expiring.
const EXPIRY_MARGIN_SECONDS: i64 = 60;

/// Provides a valid Google API access token, refreshing it when needed.
///
/// The refreshed token is persisted back to `token.json` so subsequent runs can reuse
/// it without a new consent flow.
pub struct TokenProvider {
    client_secret: ClientSecret,
    token_path: PathBuf,
    token: TokenFile,
    http: reqwest::Client,
}

impl TokenProvider {
    /// Loads the credential files from their configured locations.
    pub async fn load(
        client_secret_path: impl AsRef<Path>,
        token_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let client_secret = ClientSecret::load(client_secret_path.as_ref()).await?;
        let token_path = token_path.as_ref().to_path_buf();
        let token = TokenFile::load(&token_path).await?;
        Ok(Self {
            client_secret,
            token_path,
            token,
            http: reqwest::Client::new(),
        })
    }

    /// Returns a valid access token, refreshing it first if it is expired or close to
    /// expiring.
    pub async fn token_with_refresh(&mut self) -> Result<&str> {
        let deadline = Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECONDS);
        if self.token.expiry > deadline {
            debug!("Access token valid until {}", self.token.expiry);
            return Ok(&self.token.access_token);
        }

        info!("Access token expired or expiring, refreshing");
        let response = self
            .http
            .post(&self.client_secret.token_uri)
            .form(&[
                ("client_id", self.client_secret.client_id.as_str()),
                ("client_secret", self.client_secret.client_secret.as_str()),
                ("refresh_token", self.token.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .context("Failed to send token refresh request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            anyhow::bail!("Token refresh failed with status {}: {}", status, body);
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .context("Failed to parse token refresh response")?;

        self.token.access_token = refreshed.access_token;
        self.token.expiry = Utc::now() + Duration::seconds(refreshed.expires_in);
        self.token.save(&self.token_path).await?;
        debug!("Token refreshed, valid until {}", self.token.expiry);

        Ok(&self.token.access_token)
    }
}

/// The fields we need from a downloaded OAuth client credentials file. Google wraps
/// them under either an `installed` or a `web` key.
#[derive(Debug, Clone, Deserialize)]
struct ClientSecret {
    client_id: String,
    client_secret: String,
    token_uri: String,
}

impl ClientSecret {
    async fn load(path: &Path) -> Result<Self> {
        let content = utils::read(path).await?;
        let value: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse client secret at {}", path.display()))?;
        let inner = value
            .get("installed")
            .or_else(|| value.get("web"))
            .with_context(|| {
                format!(
                    "Client secret at {} has neither an 'installed' nor a 'web' section",
                    path.display()
                )
            })?;
        serde_json::from_value(inner.clone())
            .with_context(|| format!("Client secret at {} is missing fields", path.display()))
    }
}

/// The serialization format of `token.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct TokenFile {
    access_token: String,
    refresh_token: String,
    expiry: DateTime<Utc>,
}

impl TokenFile {
    async fn load(path: &Path) -> Result<Self> {
        let content = utils::read(path)
            .await
            .context("Token file missing, run 'chitieu init' and authorize first")?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse token file at {}", path.display()))
    }

    /// Saves the token file with restrictive permissions (0600 on Unix).
    async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize token")?;
        utils::write(path, content).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, permissions)
                .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: i64,
}
