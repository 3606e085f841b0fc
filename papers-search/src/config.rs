use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use past_papers::ArchiveUrl;
use serde::Deserialize;
use serde_with::serde_as;
use sqlx::sqlite::SqliteConnectOptions;
use strum::{Display, EnumString};

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub store: StoreSettings,
    pub extractor: ExtractorSettings,
    pub search: SearchSettings,
    pub archive: ArchiveSettings,
}

#[serde_as]
#[derive(Deserialize, Clone, Debug)]
pub struct StoreSettings {
    pub path: PathBuf,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub max_connections: u32,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub acquire_timeout_secs: u64,
}

#[serde_as]
#[derive(Deserialize, Clone, Debug)]
pub struct ExtractorSettings {
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub timeout_secs: u64,
}

#[serde_as]
#[derive(Deserialize, Clone, Debug)]
pub struct SearchSettings {
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub max_attempts: u32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ArchiveSettings {
    pub base_url: String,
}

impl Settings {
    /// Reject values that would make every search fail.
    pub fn validate(self) -> Result<Self, config::ConfigError> {
        let zero = |key: &str| config::ConfigError::Message(format!("{key} must be greater than zero"));

        if self.store.max_connections == 0 {
            return Err(zero("store.max_connections"));
        }
        if self.store.acquire_timeout_secs == 0 {
            return Err(zero("store.acquire_timeout_secs"));
        }
        if self.extractor.timeout_secs == 0 {
            return Err(zero("extractor.timeout_secs"));
        }
        if self.search.max_attempts == 0 {
            return Err(zero("search.max_attempts"));
        }

        Ok(self)
    }
}

impl StoreSettings {
    /// The search core only ever reads, so the file is opened read-only and
    /// never created.
    pub fn connect_options(&self) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&self.path)
            .read_only(true)
            .create_if_missing(false)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

impl ExtractorSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ArchiveSettings {
    pub fn archive_url(&self) -> Result<ArchiveUrl, url::ParseError> {
        ArchiveUrl::new(&self.base_url)
    }
}

pub fn read_config() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| config::ConfigError::Foreign(Box::new(e)))?;
    let config_directory = base_path.join("config");

    let environment = Environment::from_str(
        std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .as_str(),
    )
    .map_err(|e| config::ConfigError::Message(format!("Failed to parse APP_ENVIRONMENT: {e}")))?;
    let environment_filename = format!("{}.yaml", environment);

    let settings = config::Config::builder()
        .add_source(config::File::from(config_directory.join("base.yaml")))
        .add_source(config::File::from(config_directory.join(environment_filename)).required(false))
        .add_source(
            config::Environment::with_prefix("PAPERS")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()?.validate()
}

#[derive(Display, Debug, EnumString, PartialEq, Eq)]
pub enum Environment {
    #[strum(ascii_case_insensitive, serialize = "local")]
    Local,
    #[strum(ascii_case_insensitive, serialize = "production")]
    Production,
}
