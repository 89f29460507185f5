use std::sync::Arc;
use std::time::Instant;

use crate::catalog::Catalog;
use crate::cost::Cost;
use crate::error::VersusError;
use crate::extract::extract;
use crate::gateway::Provider;
use crate::model::ModelResult;
use crate::prompt;
use crate::store::Store;

/// Runs one (generation, model, prompt) unit end to end: provider call,
/// extraction, pricing, persistence.
///
/// `run` always returns a result and always attempts exactly one insert.
/// Provider failures become data on the returned `ModelResult`; they never
/// propagate, so one model failing cannot disturb its siblings.
pub struct TaskRunner<P> {
    provider: Arc<P>,
    catalog: Arc<Catalog>,
    store: Arc<Store>,
}

impl<P: Provider> TaskRunner<P> {
    pub fn new(provider: Arc<P>, catalog: Arc<Catalog>, store: Arc<Store>) -> Self {
        Self {
            provider,
            catalog,
            store,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub async fn run(&self, generation_id: &str, model_id: &str, prompt: &str) -> ModelResult {
        let start = Instant::now();
        let rendered = prompt::render(prompt);

        let result = match self.provider.invoke(model_id, &rendered).await {
            Ok(reply) => {
                let payload = extract(&reply.text).to_string();
                let cost = match reply.usage {
                    Some(usage) => self.catalog.price(model_id, usage),
                    None => Cost::Unknown,
                };
                ModelResult::success(
                    generation_id,
                    model_id,
                    prompt,
                    payload,
                    start.elapsed().as_millis() as u64,
                    cost,
                )
            }
            Err(e) => {
                tracing::warn!(
                    generation_id,
                    model = model_id,
                    reason = e.reason(),
                    "generation failed: {e}"
                );
                ModelResult::failure(
                    generation_id,
                    model_id,
                    prompt,
                    e.user_message(),
                    start.elapsed().as_millis() as u64,
                )
            }
        };

        self.persist(result).await
    }

    /// Persist a failure that happened outside `run` (a panicked or
    /// cancelled task).
    pub async fn record_failure(
        &self,
        generation_id: &str,
        model_id: &str,
        prompt: &str,
        error: VersusError,
        start: Instant,
    ) -> ModelResult {
        tracing::error!(
            generation_id,
            model = model_id,
            reason = error.reason(),
            "task failed outside runner: {error}"
        );
        let result = ModelResult::failure(
            generation_id,
            model_id,
            prompt,
            error.user_message(),
            start.elapsed().as_millis() as u64,
        );
        self.persist(result).await
    }

    /// Insert failure must never lose the in-memory result.
    async fn persist(&self, result: ModelResult) -> ModelResult {
        if let Err(e) = self.store.insert_result(result.clone()).await {
            tracing::warn!(
                generation_id = %result.generation_id,
                model = %result.model_id,
                retryable = e.is_retryable(),
                "failed to persist model result: {e}"
            );
        }
        result
    }
}
