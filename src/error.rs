use thiserror::Error;

use crate::store::schema::MigrationError;

/// Failure of a single provider call. Never escapes the task runner: every
/// variant ends up as the `error` text of a persisted `ModelResult`.
#[derive(Debug, Error)]
pub enum VersusError {
    #[error("timeout after {0}ms")]
    Timeout(u64),

    #[error("rate limited by {provider}")]
    RateLimited { provider: String },

    #[error("upstream error from {provider}: {message}")]
    Upstream {
        provider: String,
        message: String,
        status: Option<u16>,
    },

    #[error("auth failed for {provider}: {message}")]
    AuthFailed { provider: String, message: String },

    #[error("schema parse error: {0}")]
    SchemaParse(String),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("task panicked: {0}")]
    Panicked(String),

    #[error("task cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl VersusError {
    /// Extract provider name from structured error variants.
    /// Returns None for variants that don't carry provider context.
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::RateLimited { provider } => Some(provider),
            Self::Upstream { provider, .. } => Some(provider),
            Self::AuthFailed { provider, .. } => Some(provider),
            _ => None,
        }
    }

    /// Returns true for transient errors that may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Timeout(_) => true,
            // 5xx = server error (retryable), 4xx = client error (not retryable)
            Self::Upstream { status, .. } => status.is_some_and(|s| s >= 500),
            Self::Request(_) => true,
            _ => false,
        }
    }

    /// Short machine-readable classification used in logs and tool output.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::RateLimited { .. } => "rate_limited",
            Self::AuthFailed { .. } => "auth_failed",
            Self::Upstream {
                status: Some(404), ..
            } => "model_not_found",
            Self::Upstream { .. } => "upstream",
            Self::SchemaParse(_) => "parse_error",
            Self::Request(_) => "request",
            Self::Panicked(_) => "panic",
            Self::Cancelled => "cancelled",
            Self::Other(_) => "error",
        }
    }

    /// Sanitized message stored on the failed `ModelResult`.
    /// Does not leak internal URLs, connection details, or API keys.
    pub fn user_message(&self) -> String {
        match self {
            Self::Timeout(ms) => format!("timeout after {ms}ms"),
            Self::RateLimited { provider } => {
                format!("rate limited by {provider}, try again shortly")
            }
            Self::Upstream {
                provider, message, ..
            } => format!("upstream error from {provider}: {message}"),
            Self::AuthFailed { provider, message } => {
                format!("authentication failed for {provider}: {message}")
            }
            Self::SchemaParse(_) => "failed to parse provider response".to_string(),
            Self::Request(_) => "request to provider failed".to_string(),
            Self::Panicked(msg) => format!("task panicked: {msg}"),
            Self::Cancelled => "task cancelled".to_string(),
            Self::Other(msg) => msg.clone(),
        }
    }
}

/// Persistent store failures. These are structural: they propagate to the
/// caller of submit and the feed queries instead of being folded into data.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duckdb error: {0}")]
    Duckdb(#[from] duckdb::Error),

    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store worker is not running")]
    WorkerGone,
}

impl StoreError {
    /// Everything except a failed migration is worth retrying.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Migration(_))
    }
}
