use std::env;
use std::time::Duration;

const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 5000;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    /// `None` selects the in-process store
    pub cache_url: Option<String>,
    pub operation_timeout: Duration,
    pub log_level: String,
    pub profile: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_env_with_profile(None)
    }

    /// Like [`Config::from_env`], with `profile` taking precedence over `PROFILE`.
    pub fn from_env_with_profile(profile: Option<&str>) -> Self {
        let profile = match profile {
            Some(profile) => profile.to_string(),
            None => env::var("PROFILE").unwrap_or_else(|_| "default".to_string()),
        };

        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| {
            if profile == "default" {
                "sqlite://datakit.db?mode=rwc".to_string()
            } else {
                format!("sqlite://datakit_{}.db?mode=rwc", profile)
            }
        });

        let timeout_ms = match env::var("OPERATION_TIMEOUT_MS") {
            Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(
                    "Invalid OPERATION_TIMEOUT_MS '{}', using {}ms",
                    raw,
                    DEFAULT_OPERATION_TIMEOUT_MS
                );
                DEFAULT_OPERATION_TIMEOUT_MS
            }),
            Err(_) => DEFAULT_OPERATION_TIMEOUT_MS,
        };

        Self {
            database_url,
            cache_url: env::var("CACHE_URL").ok().filter(|s| !s.trim().is_empty()),
            operation_timeout: Duration::from_millis(timeout_ms),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            profile,
        }
    }
}
