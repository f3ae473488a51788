use std::env;
use std::path::PathBuf;

use crate::assessment::Locale;
use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub assessment: AssessmentConfig,
}

/// Persistent storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub path: PathBuf,
    pub max_connections: u32,
    /// Prefix for envelope keys, `<namespace>:<key>`.
    pub namespace: String,
    /// Byte budget of the primary store. `None` disables the quota.
    pub quota_bytes: Option<usize>,
    /// Byte budget of the in-memory secondary tier.
    pub session_quota_bytes: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Assessment engine configuration
#[derive(Debug, Clone)]
pub struct AssessmentConfig {
    pub locale: Locale,
    pub user_id: String,
    pub history_limit: usize,
    pub history_page_size: usize,
    pub chart_max_points: usize,
}

/// Browser storage quotas sit around 5MB, so the defaults mirror that.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let storage = StorageConfig {
            path: PathBuf::from(
                env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/periodhub.db".to_string()),
            ),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            namespace: env::var("STORAGE_NAMESPACE")
                .unwrap_or_else(|_| "medicalCareGuide".to_string()),
            quota_bytes: parse_quota("STORAGE_QUOTA_BYTES"),
            session_quota_bytes: parse_quota("SESSION_QUOTA_BYTES"),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let locale = match env::var("ASSESSMENT_LOCALE") {
            Ok(raw) => raw.parse::<Locale>().map_err(|message| AppError::Config { message })?,
            Err(_) => Locale::default(),
        };

        let assessment = AssessmentConfig {
            locale,
            user_id: env::var("ASSESSMENT_USER_ID").unwrap_or_else(|_| "anonymous".to_string()),
            history_limit: env::var("HISTORY_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(50),
            history_page_size: env::var("HISTORY_PAGE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|size| *size > 0)
                .unwrap_or(10),
            chart_max_points: env::var("CHART_MAX_POINTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|points| *points > 0)
                .unwrap_or(30),
        };

        Ok(Config {
            storage,
            logging,
            assessment,
        })
    }
}

/// `0` turns the quota off; anything unparseable falls back to the default.
fn parse_quota(var: &str) -> Option<usize> {
    match env::var(var).ok().and_then(|s| s.parse::<usize>().ok()) {
        Some(0) => None,
        Some(bytes) => Some(bytes),
        None => Some(DEFAULT_QUOTA_BYTES),
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/periodhub.db"),
            max_connections: 5,
            namespace: "medicalCareGuide".to_string(),
            quota_bytes: Some(DEFAULT_QUOTA_BYTES),
            session_quota_bytes: Some(DEFAULT_QUOTA_BYTES),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            user_id: "anonymous".to_string(),
            history_limit: 50,
            history_page_size: 10,
            chart_max_points: 30,
        }
    }
}
