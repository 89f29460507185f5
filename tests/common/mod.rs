//! Shared fixtures: a scripted provider and an in-memory stack.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use versus::catalog::{Catalog, ModelSpec};
use versus::error::VersusError;
use versus::gateway::{Provider, ProviderReply, TokenUsage};
use versus::orchestrator::Orchestrator;
use versus::runner::TaskRunner;
use versus::store::Store;

/// What the fake does for one model id.
#[derive(Clone)]
pub enum Behavior {
    Reply {
        delay: Duration,
        text: String,
        usage: Option<TokenUsage>,
    },
    Upstream { delay: Duration, status: u16 },
    Timeout { after: Duration },
    Panic,
}

impl Behavior {
    pub fn ok(delay_ms: u64, html: &str) -> Self {
        Self::Reply {
            delay: Duration::from_millis(delay_ms),
            text: format!("Here you go:\n<code>{html}</code>\nEnjoy."),
            usage: Some(TokenUsage::new(1_000, 500)),
        }
    }

    pub fn ok_unmetered(delay_ms: u64, html: &str) -> Self {
        Self::Reply {
            delay: Duration::from_millis(delay_ms),
            text: format!("<code>{html}</code>"),
            usage: None,
        }
    }
}

/// Provider scripted per model id. Unscripted models reply immediately.
pub struct FakeProvider {
    behaviors: HashMap<String, Behavior>,
    calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new(behaviors: impl IntoIterator<Item = (&'static str, Behavior)>) -> Self {
        Self {
            behaviors: behaviors
                .into_iter()
                .map(|(model, b)| (model.to_string(), b))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Provider for FakeProvider {
    async fn invoke(&self, model_id: &str, _prompt: &str) -> Result<ProviderReply, VersusError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self
            .behaviors
            .get(model_id)
            .cloned()
            .unwrap_or_else(|| Behavior::ok(0, "<p>default</p>"));

        match behavior {
            Behavior::Reply { delay, text, usage } => {
                tokio::time::sleep(delay).await;
                Ok(ProviderReply { text, usage })
            }
            Behavior::Upstream { delay, status } => {
                tokio::time::sleep(delay).await;
                Err(VersusError::Upstream {
                    provider: "fake".to_string(),
                    message: format!("{status}: scripted failure"),
                    status: Some(status),
                })
            }
            Behavior::Timeout { after } => {
                tokio::time::sleep(after).await;
                Err(VersusError::Timeout(after.as_millis() as u64))
            }
            Behavior::Panic => panic!("scripted provider panic for {model_id}"),
        }
    }
}

/// Catalog pricing `model-a` at $1/M prompt and $2/M completion tokens.
/// Every other model id is unpriced.
pub fn test_catalog() -> Catalog {
    Catalog::new(vec![ModelSpec {
        id: "model-a".to_string(),
        name: "Model A".to_string(),
        description: String::new(),
        prompt_price: 0.000_001,
        completion_price: 0.000_002,
    }])
    .unwrap()
}

pub struct Stack {
    pub provider: Arc<FakeProvider>,
    pub store: Arc<Store>,
    pub orchestrator: Orchestrator<FakeProvider>,
}

pub fn stack(provider: FakeProvider) -> Stack {
    let provider = Arc::new(provider);
    let store = Arc::new(Store::open_in_memory().unwrap());
    let runner = Arc::new(TaskRunner::new(
        provider.clone(),
        Arc::new(test_catalog()),
        store.clone(),
    ));
    let orchestrator = Orchestrator::new(runner, store.clone());
    Stack {
        provider,
        store,
        orchestrator,
    }
}

pub fn models(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}
