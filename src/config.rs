use std::env;
use std::path::PathBuf;

use crate::catalog::Catalog;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_DB_PATH: &str = ".versus/versus.duckdb";

/// Max concurrent outbound provider calls per process.
pub const DEFAULT_MAX_CONCURRENT: usize = 8;

pub struct Config {
    pub catalog: Catalog,
    pub provider: ProviderConfig,
    pub db_path: PathBuf,
    pub feed: FeedConfig,
}

#[derive(Clone)]
pub struct ProviderConfig {
    pub provider_name: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub max_concurrent: usize,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider_name", &self.provider_name)
            .field("base_url", &self.base_url)
            .field(
                "api_key",
                &self.api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("max_concurrent", &self.max_concurrent)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_name: "openrouter".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}

/// Defaults for the feed tools when the caller omits them.
#[derive(Debug, Clone, Copy)]
pub struct FeedConfig {
    pub page_size: u64,
    pub recent_limit: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            recent_limit: 5,
        }
    }
}

impl Config {
    /// Load from the environment (call after `.env` has been applied).
    pub fn load() -> Self {
        let api_key = env::var("OPENROUTER_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!("OPENROUTER_API_KEY not set, every generation will fail with auth errors");
        }

        let base_url = env::var("VERSUS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let catalog = match env::var("VERSUS_CATALOG") {
            Ok(path) => match Catalog::load(path.as_ref()) {
                Ok(catalog) => {
                    tracing::info!(models = catalog.len(), "loaded model catalog from {path}");
                    catalog
                }
                Err(e) => {
                    tracing::warn!("ignoring catalog {path}: {e}, using built-in models");
                    Catalog::builtin()
                }
            },
            Err(_) => Catalog::builtin(),
        };

        let db_path = env::var("VERSUS_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DB_PATH));

        let defaults = FeedConfig::default();
        let feed = FeedConfig {
            page_size: env_u64("VERSUS_PAGE_SIZE").unwrap_or(defaults.page_size),
            recent_limit: env_u64("VERSUS_RECENT_LIMIT").unwrap_or(defaults.recent_limit),
        };

        Config {
            catalog,
            provider: ProviderConfig {
                api_key,
                base_url,
                ..ProviderConfig::default()
            },
            db_path,
            feed,
        }
    }
}

/// Positive integer from the environment; anything else is ignored.
fn env_u64(key: &str) -> Option<u64> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            tracing::warn!("{key}={raw} is not a positive integer, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_config_debug_redacts_key() {
        let config = ProviderConfig {
            api_key: Some("sk-or-secret".to_string()),
            ..ProviderConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-or-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn feed_defaults() {
        let feed = FeedConfig::default();
        assert_eq!(feed.page_size, 50);
        assert_eq!(feed.recent_limit, 5);
    }
}
