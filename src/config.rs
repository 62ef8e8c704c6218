//! Configuration file handling for chitieu.
//!
//! The configuration file is stored at `$CHITIEU_HOME/config.json` and contains the
//! Google Sheet URL, the cache TTL, the timezone offset used for date-range queries,
//! and the paths to the OAuth credential files.

use crate::{utils, Result};
use anyhow::{bail, Context};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "chitieu";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const CLIENT_SECRET_JSON: &str = "client_secret.json";
const TOKEN_JSON: &str = "token.json";
const CONFIG_JSON: &str = "config.json";

/// Snapshots served from the cache are considered fresh for this long.
const DEFAULT_CACHE_TTL_SECONDS: u64 = 30;

/// Asia/Ho_Chi_Minh.
const DEFAULT_UTC_OFFSET_HOURS: i32 = 7;

/// The `Config` object represents the configuration of the app. You instantiate it by
/// providing the path to `$CHITIEU_HOME` and from there it loads
/// `$CHITIEU_HOME/config.json`. It also resolves the paths to the OAuth credential files
/// expected in the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    spreadsheet_id: String,
}

impl Config {
    /// Creates the data directory and its secrets subdirectory, writes an initial
    /// `config.json` using `sheet_url` along with default settings, and moves
    /// `secret_file` into its default location in the data dir.
    pub async fn create(
        dir: impl Into<PathBuf>,
        secret_file: &Path,
        sheet_url: &str,
    ) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the chitieu home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets_dir = root.join(SECRETS);
        utils::make_dir(&secrets_dir).await?;

        // Move the Google OAuth client credentials file to its default location
        let secret_destination = secrets_dir.join(CLIENT_SECRET_JSON);
        utils::rename(secret_file, secret_destination).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            sheet_url: sheet_url.to_string(),
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            client_secret_path: None,
            token_path: None,
        };
        config_file.save(&config_path).await?;

        let spreadsheet_id = extract_spreadsheet_id(sheet_url)
            .context("Failed to extract spreadsheet ID from sheet URL")?
            .to_string();

        Ok(Self {
            root,
            secrets: secrets_dir,
            config_path,
            config_file,
            spreadsheet_id,
        })
    }

    /// Validates that `home` and its config file exist, loads the config file, and
    /// returns the loaded configuration object.
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        let root = utils::canonicalize(&maybe_relative).await?;

        let _ = utils::read_dir(&root)
            .await
            .context("Chitieu home is missing")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let spreadsheet_id = extract_spreadsheet_id(&config_file.sheet_url)
            .context("Failed to extract spreadsheet ID from sheet URL")?
            .to_string();

        let config = Self {
            root: root.clone(),
            secrets: root.join(SECRETS),
            config_path,
            config_file,
            spreadsheet_id,
        };
        if !config.secrets.is_dir() {
            bail!(
                "The secrets directory is missing '{}'",
                config.secrets.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn sheet_url(&self) -> &str {
        &self.config_file.sheet_url
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// How long a cached sheet snapshot stays fresh.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.config_file.cache_ttl_seconds)
    }

    /// The timezone all date-range computation happens in.
    pub fn timezone(&self) -> FixedOffset {
        // The offset is validated at load time, so this cannot be out of range.
        FixedOffset::east_opt(self.config_file.utc_offset_hours * 3600)
            .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap())
    }

    /// The current time in the configured timezone.
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.timezone())
    }

    /// Returns the stored `client_secret_path` if it is absolute, otherwise resolves it
    /// relative to the home directory.
    pub fn client_secret_path(&self) -> PathBuf {
        self.resolve_secrets_file_path(self.config_file.client_secret_path())
    }

    /// Returns the stored `token_path` if it is absolute, otherwise resolves it relative
    /// to the home directory.
    pub fn token_path(&self) -> PathBuf {
        self.resolve_secrets_file_path(self.config_file.token_path())
    }

    fn resolve_secrets_file_path(&self, p: PathBuf) -> PathBuf {
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "chitieu",
///   "config_version": 1,
///   "sheet_url": "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL",
///   "cache_ttl_seconds": 30,
///   "utc_offset_hours": 7
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "chitieu"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// URL to the Google Sheet holding the monthly expense tabs
    sheet_url: String,

    /// How long cached sheet snapshots stay fresh, in seconds
    #[serde(default = "default_cache_ttl_seconds")]
    cache_ttl_seconds: u64,

    /// The UTC offset, in hours, used for "today"/"week"/"month" boundaries
    #[serde(default = "default_utc_offset_hours")]
    utc_offset_hours: i32,

    /// Path to the OAuth 2.0 client credentials file (optional, relative to config.json
    /// or absolute). Defaults to $CHITIEU_HOME/.secrets/client_secret.json
    #[serde(skip_serializing_if = "Option::is_none")]
    client_secret_path: Option<PathBuf>,

    /// Path to the OAuth token file (optional, relative to config.json or absolute).
    /// Defaults to $CHITIEU_HOME/.secrets/token.json
    #[serde(skip_serializing_if = "Option::is_none")]
    token_path: Option<PathBuf>,
}

fn default_cache_ttl_seconds() -> u64 {
    DEFAULT_CACHE_TTL_SECONDS
}

fn default_utc_offset_hours() -> i32 {
    DEFAULT_UTC_OFFSET_HOURS
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            sheet_url: String::new(),
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            client_secret_path: None,
            token_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = utils::read(path).await?;

        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            (-12..=14).contains(&config.utc_offset_hours),
            "utc_offset_hours must be between -12 and 14, got {}",
            config.utc_offset_hours
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    /// Gets the client secret path, defaulting to `.secrets/client_secret.json`.
    fn client_secret_path(&self) -> PathBuf {
        self.client_secret_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(CLIENT_SECRET_JSON))
    }

    /// Gets the token path, defaulting to `.secrets/token.json`.
    fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(TOKEN_JSON))
    }
}

/// Extracts the spreadsheet ID from a Google Sheets URL.
///
/// Returns the spreadsheet ID or an error if the URL format is invalid. Returns an
/// empty string if the URL is empty.
fn extract_spreadsheet_id(url: &str) -> Result<&str> {
    if url.is_empty() {
        return Ok(url);
    }

    // URL format: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/...
    // or: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID?foo=bar
    let parts: Vec<&str> = url.split('/').collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "d" && i + 1 < parts.len() {
            let id_part = parts[i + 1];
            let id = id_part
                .split('?')
                .next()
                .unwrap_or(id_part)
                .split('#')
                .next()
                .unwrap_or(id_part);
            return Ok(id);
        }
    }
    Err(anyhow::anyhow!(
        "Invalid Google Sheets URL format. Expected: https://docs.google.com/spreadsheets/d/SPREADSHEET_ID"
    ))
}
