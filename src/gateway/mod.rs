pub mod http;

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::VersusError;

/// Hard wall-clock budget for one provider call.
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(60);

/// Token counts reported by a provider for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }
}

/// Successful provider output.
#[derive(Debug, Clone)]
pub struct ProviderReply {
    pub text: String,
    /// None when the backend did not report usage; the cost is then unknown.
    pub usage: Option<TokenUsage>,
}

/// One outbound generation call to a model backend.
///
/// Implementations are stateless per call and must bound each call by
/// [`PROVIDER_TIMEOUT`]; a timeout is reported as [`VersusError::Timeout`].
pub trait Provider: Send + Sync + 'static {
    fn invoke(
        &self,
        model_id: &str,
        prompt: &str,
    ) -> impl Future<Output = Result<ProviderReply, VersusError>> + Send;
}
