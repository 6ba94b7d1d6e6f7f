use std::env;
use std::time::Duration;

use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::Validator;

const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const DEFAULT_LANGUAGE: &str = "en-US";
const DEFAULT_REQUESTS_PER_SECOND: f64 = 20.0;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Catalog (TMDB) connection settings
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub api_key: String,
    pub base_url: String,
    pub language: String,
    pub requests_per_second: f64,
    pub timeout_seconds: u64,
}

impl CatalogConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_TMDB_BASE_URL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Firestore project used for favorites
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub poll_interval_ms: u64,
}

impl FirestoreConfig {
    pub fn documents_url(&self) -> String {
        format!(
            "https://firestore.googleapis.com/v1/projects/{}/databases/(default)/documents",
            self.project_id
        )
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    /// `None` keeps favorites in memory
    pub firestore: Option<FirestoreConfig>,
}

impl AppConfig {
    /// Load `.env` (if any) and read the process environment
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("TMDB_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::ConfigError("TMDB_API_KEY is not set".to_string()))?;

        let mut catalog = CatalogConfig::new(api_key);
        if let Some(base_url) = lookup("TMDB_BASE_URL") {
            catalog = catalog.with_base_url(base_url);
        }
        if let Some(language) = lookup("TMDB_LANGUAGE") {
            Validator::validate_language(&language)
                .map_err(|e| AppError::ConfigError(e.to_string()))?;
            catalog = catalog.with_language(language);
        }
        if let Some(rps) = lookup("TMDB_REQUESTS_PER_SECOND") {
            catalog.requests_per_second = parse_var("TMDB_REQUESTS_PER_SECOND", &rps)?;
            if catalog.requests_per_second <= 0.0 {
                return Err(AppError::ConfigError(
                    "TMDB_REQUESTS_PER_SECOND must be positive".to_string(),
                ));
            }
        }
        if let Some(timeout) = lookup("HTTP_TIMEOUT_SECS") {
            catalog.timeout_seconds = parse_nonzero("HTTP_TIMEOUT_SECS", &timeout)?;
        }

        let firestore = match lookup("FIRESTORE_PROJECT_ID").filter(|id| !id.trim().is_empty()) {
            Some(project_id) => {
                let poll_interval_ms = match lookup("FIRESTORE_POLL_INTERVAL_MS") {
                    Some(value) => parse_nonzero("FIRESTORE_POLL_INTERVAL_MS", &value)?,
                    None => DEFAULT_POLL_INTERVAL_MS,
                };
                Some(FirestoreConfig {
                    project_id,
                    poll_interval_ms,
                })
            }
            None => {
                log::warn!("FIRESTORE_PROJECT_ID not set, favorites are kept in memory only");
                None
            }
        };

        Ok(Self { catalog, firestore })
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> AppResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::ConfigError(format!("Invalid value for {}: '{}'", key, value)))
}

fn parse_nonzero(key: &str, value: &str) -> AppResult<u64> {
    match parse_var(key, value)? {
        0 => Err(AppError::ConfigError(format!("{} must be greater than zero", key))),
        parsed => Ok(parsed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[("TMDB_API_KEY", "abc")])).unwrap();
        assert_eq!(config.catalog.api_key, "abc");
        assert_eq!(config.catalog.base_url, "https://api.themoviedb.org/3");
        assert_eq!(config.catalog.language, "en-US");
        assert_eq!(config.catalog.timeout(), Duration::from_secs(10));
        assert!(config.firestore.is_none());
    }

    #[test]
    fn test_missing_api_key() {
        let err = AppConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("TMDB_API_KEY", "abc"),
            ("TMDB_BASE_URL", "http://localhost:9999/3/"),
            ("TMDB_LANGUAGE", "de-DE"),
            ("HTTP_TIMEOUT_SECS", "3"),
            ("FIRESTORE_PROJECT_ID", "movies-app"),
            ("FIRESTORE_POLL_INTERVAL_MS", "500"),
        ]))
        .unwrap();

        assert_eq!(config.catalog.base_url, "http://localhost:9999/3");
        assert_eq!(config.catalog.language, "de-DE");
        assert_eq!(config.catalog.timeout_seconds, 3);
        let firestore = config.firestore.unwrap();
        assert_eq!(firestore.poll_interval(), Duration::from_millis(500));
        assert_eq!(
            firestore.documents_url(),
            "https://firestore.googleapis.com/v1/projects/movies-app/databases/(default)/documents"
        );
    }

    #[test]
    fn test_invalid_values() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("TMDB_API_KEY", "abc"),
            ("HTTP_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));

        let err = AppConfig::from_lookup(lookup_from(&[
            ("TMDB_API_KEY", "abc"),
            ("TMDB_LANGUAGE", "english"),
        ]))
        .unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn test_zero_durations_are_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("TMDB_API_KEY", "abc"),
            ("HTTP_TIMEOUT_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));

        let err = AppConfig::from_lookup(lookup_from(&[
            ("TMDB_API_KEY", "abc"),
            ("FIRESTORE_PROJECT_ID", "movies-app"),
            ("FIRESTORE_POLL_INTERVAL_MS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}
