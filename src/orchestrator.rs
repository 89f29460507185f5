use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tracing::Instrument;

use crate::error::{StoreError, VersusError};
use crate::gateway::Provider;
use crate::identity::OwnerId;
use crate::model::{Generation, ModelResult};
use crate::runner::TaskRunner;
use crate::store::Store;
use crate::view::GenerationView;

/// One completed task, emitted in completion order.
#[derive(Debug, Clone, Serialize)]
pub struct ResultEvent {
    pub generation_id: String,
    pub result: ModelResult,
}

/// Outcome of awaiting every task of one dispatch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub generation_id: String,
    /// Completion order, which is not deterministic.
    pub results: Vec<ModelResult>,
    pub total_time_ms: u64,
}

impl BatchSummary {
    /// Successes by execution time ascending, then failures.
    pub fn ranked(&self) -> Vec<&ModelResult> {
        let mut successes: Vec<&ModelResult> =
            self.results.iter().filter(|r| r.is_success()).collect();
        successes.sort_by_key(|r| r.execution_time_ms);
        successes.extend(self.results.iter().filter(|r| !r.is_success()));
        successes
    }
}

/// Fan-out of N independent tasks for one generation.
///
/// Tasks are detached: dropping this handle stops observation, not work.
/// Every task still persists its result.
pub struct Dispatch {
    generation_id: String,
    models: Vec<String>,
    events: mpsc::Receiver<ResultEvent>,
    started: Instant,
}

impl Dispatch {
    pub fn generation_id(&self) -> &str {
        &self.generation_id
    }

    /// Models actually dispatched (deduplicated, in request order).
    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Empty view ready to fold this dispatch's events into.
    pub fn view(&self) -> GenerationView {
        GenerationView::new(&self.generation_id, self.models.clone())
    }

    /// Next completed task, or None once every task has reported.
    pub async fn next(&mut self) -> Option<ResultEvent> {
        self.events.recv().await
    }

    /// Await every task. The only use of the join is the total time.
    pub async fn wait_all(mut self) -> BatchSummary {
        let mut results = Vec::with_capacity(self.models.len());
        while let Some(event) = self.events.recv().await {
            results.push(event.result);
        }
        BatchSummary {
            generation_id: self.generation_id,
            results,
            total_time_ms: self.started.elapsed().as_millis() as u64,
        }
    }
}

/// A task that never returned: a panic, or cancellation at runtime shutdown.
fn join_failure(err: JoinError) -> VersusError {
    if err.is_panic() {
        VersusError::Panicked(err.to_string())
    } else {
        VersusError::Cancelled
    }
}

pub struct Orchestrator<P> {
    runner: Arc<TaskRunner<P>>,
    store: Arc<Store>,
}

impl<P: Provider> Orchestrator<P> {
    pub fn new(runner: Arc<TaskRunner<P>>, store: Arc<Store>) -> Self {
        Self { runner, store }
    }

    pub fn runner(&self) -> &Arc<TaskRunner<P>> {
        &self.runner
    }

    /// Create the generation row and return its id once it is stored.
    /// Does not dispatch anything; `model_ids` is only logged.
    pub async fn submit(
        &self,
        prompt: &str,
        model_ids: &[String],
        owner: &OwnerId,
    ) -> Result<String, StoreError> {
        let generation = Generation::new(prompt, owner.as_str());
        let id = generation.id.clone();
        self.store.insert_generation(generation).await?;
        tracing::info!(generation_id = %id, models = model_ids.len(), "generation created");
        Ok(id)
    }

    /// Start one detached task per distinct model id. Never waits.
    pub fn dispatch(&self, generation_id: &str, prompt: &str, model_ids: &[String]) -> Dispatch {
        let mut seen = HashSet::new();
        let models: Vec<String> = model_ids
            .iter()
            .filter(|m| seen.insert((*m).clone()))
            .cloned()
            .collect();

        // Capacity covers every task, so a send never waits on the consumer.
        let (tx, events) = mpsc::channel(models.len().max(1));
        let started = Instant::now();

        for model_id in &models {
            let runner = self.runner.clone();
            let tx = tx.clone();
            let generation_id = generation_id.to_string();
            let model_id = model_id.clone();
            let prompt = prompt.to_string();
            let span = tracing::info_span!("task", generation_id = %generation_id, model = %model_id);

            tokio::spawn(
                async move {
                    let start = Instant::now();
                    // Inner spawn isolates panics so the task still reports.
                    // Cancellation only happens when the runtime shuts down.
                    let inner = {
                        let runner = runner.clone();
                        let (g, m, p) = (generation_id.clone(), model_id.clone(), prompt.clone());
                        tokio::spawn(async move { runner.run(&g, &m, &p).await })
                    };
                    let result = match inner.await {
                        Ok(result) => result,
                        Err(join_err) => {
                            runner
                                .record_failure(
                                    &generation_id,
                                    &model_id,
                                    &prompt,
                                    join_failure(join_err),
                                    start,
                                )
                                .await
                        }
                    };
                    // Receiver gone means nobody is watching; the result is persisted anyway.
                    let _ = tx
                        .send(ResultEvent {
                            generation_id,
                            result,
                        })
                        .await;
                }
                .instrument(span),
            );
        }

        Dispatch {
            generation_id: generation_id.to_string(),
            models,
            events,
            started,
        }
    }

    /// Submit, dispatch, and await every task.
    pub async fn generate(
        &self,
        prompt: &str,
        model_ids: &[String],
        owner: &OwnerId,
    ) -> Result<BatchSummary, StoreError> {
        let generation_id = self.submit(prompt, model_ids, owner).await?;
        let summary = self.dispatch(&generation_id, prompt, model_ids).wait_all().await;
        tracing::info!(
            generation_id = %summary.generation_id,
            total_time_ms = summary.total_time_ms,
            succeeded = summary.results.iter().filter(|r| r.is_success()).count(),
            failed = summary.results.iter().filter(|r| !r.is_success()).count(),
            "generation complete"
        );
        Ok(summary)
    }
}
