use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::ModelResult;
use crate::orchestrator::BatchSummary;

/// Full fan-out: create a generation and run every selected model.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GenerateRequest {
    /// What to build, e.g. "a landing page for a coffee shop"
    pub prompt: String,
    /// Model ids from `listmodels` to run concurrently (at least one)
    pub models: Vec<String>,
    /// Caller identity from a previous response. Omit on first use; a new one is returned.
    pub owner_id: Option<String>,
}

/// Create a generation without dispatching; run models with `run_model`.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct InitGenerationRequest {
    /// What to build
    pub prompt: String,
    /// Model ids the caller intends to run (at least one)
    pub models: Vec<String>,
    /// Caller identity from a previous response. Omit on first use; a new one is returned.
    pub owner_id: Option<String>,
}

/// Run one model for an existing generation.
/// Fields are optional so a missing one is reported by name.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RunModelRequest {
    /// Id returned by `init_generation`
    pub generation_id: Option<String>,
    /// Model id from `listmodels`
    pub model: Option<String>,
    /// The same prompt the generation was created with
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InitGenerationResponse {
    pub generation_id: String,
    pub owner_id: String,
    pub models: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse<'a> {
    pub generation_id: &'a str,
    pub owner_id: &'a str,
    /// Successes fastest first, then failures.
    pub results: Vec<&'a ModelResult>,
    pub succeeded: usize,
    pub failed: usize,
    pub total_time_ms: u64,
}

impl<'a> GenerateResponse<'a> {
    pub fn new(summary: &'a BatchSummary, owner_id: &'a str) -> Self {
        let results = summary.ranked();
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        Self {
            generation_id: &summary.generation_id,
            owner_id,
            failed: results.len() - succeeded,
            succeeded,
            results,
            total_time_ms: summary.total_time_ms,
        }
    }
}
