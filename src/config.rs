use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("DATABASE_URL is not set; copy .env.example to .env and set DATABASE_URL")]
    MissingDatabaseUrl,

    #[error("unsupported database url {0:?}: only sqlite is supported")]
    UnsupportedDatabaseUrl(String),

    #[error("config error: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    Memory,
    File(PathBuf),
}

impl DatabaseTarget {
    pub fn describe(&self) -> String {
        match self {
            DatabaseTarget::Memory => ":memory:".to_string(),
            DatabaseTarget::File(p) => p.to_string_lossy().to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
struct RawConfig {
    database_url: Option<String>,
    init_script: PathBuf,
    bulletin_dir: PathBuf,
    log_level: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseTarget,
    pub init_script: PathBuf,
    pub bulletin_dir: PathBuf,
    pub log_level: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let raw: RawConfig = config::Config::builder()
            .set_default("init_script", "db_init.sql")?
            .set_default("bulletin_dir", "bulletins")?
            .set_default("log_level", "info")?
            .add_source(config::File::with_name("config/gradebookd").required(false))
            // e.g. GRADEBOOK__BULLETIN_DIR=/tmp/out
            .add_source(config::Environment::with_prefix("GRADEBOOK").separator("__"))
            .set_override_option("database_url", std::env::var("DATABASE_URL").ok())?
            .build()?
            .try_deserialize()?;

        let url = raw
            .database_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::MissingDatabaseUrl)?;

        Ok(Self {
            database: parse_database_url(&url)?,
            init_script: raw.init_script,
            bulletin_dir: raw.bulletin_dir,
            log_level: raw.log_level,
        })
    }
}

/// Accepts `sqlite://path`, `sqlite:path`, `sqlite::memory:`, `:memory:` or a bare path.
pub fn parse_database_url(url: &str) -> Result<DatabaseTarget, ConfigError> {
    let rest = if let Some(r) = url.strip_prefix("sqlite://") {
        r
    } else if let Some(r) = url.strip_prefix("sqlite:") {
        r
    } else if url.contains("://") {
        return Err(ConfigError::UnsupportedDatabaseUrl(url.to_string()));
    } else {
        url
    };

    // Query strings like `?mode=rwc` are accepted and ignored.
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() {
        return Err(ConfigError::UnsupportedDatabaseUrl(url.to_string()));
    }
    if path == ":memory:" {
        return Ok(DatabaseTarget::Memory);
    }
    Ok(DatabaseTarget::File(PathBuf::from(path)))
}
