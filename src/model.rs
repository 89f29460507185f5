//! Generation and ModelResult records.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::cost::Cost;

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique 16-hex-character id: sha256(nanos + pid + seq + parts)[:8].
/// Epoch nanos, PID, and an atomic counter keep ids unique across
/// concurrent tasks and concurrent processes.
pub fn new_id(parts: &[&str]) -> String {
    use sha2::{Digest, Sha256};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let pid = std::process::id();
    let seq = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut hasher = Sha256::new();
    hasher.update(format!("{nanos}:{pid}:{seq}"));
    for part in parts {
        hasher.update(b"\0");
        hasher.update(part.as_bytes());
    }
    hex::encode(&hasher.finalize()[..8])
}

pub fn epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }

    /// Unrecognized values read back as private, the more restrictive choice.
    pub fn from_column(raw: &str) -> Self {
        match raw {
            "public" => Visibility::Public,
            _ => Visibility::Private,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generation {
    pub id: String,
    pub prompt: String,
    pub owner_id: String,
    pub visibility: Visibility,
    pub created_at: i64,
}

impl Generation {
    /// New public generation. There is no private submission path.
    pub fn new(prompt: &str, owner_id: &str) -> Self {
        Self {
            id: new_id(&[owner_id, prompt]),
            prompt: prompt.to_string(),
            owner_id: owner_id.to_string(),
            visibility: Visibility::Public,
            created_at: epoch_ms(),
        }
    }
}

/// Outcome of dispatching one prompt to one model. Exactly one is
/// persisted per dispatch attempt, success or failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelResult {
    pub id: String,
    pub generation_id: String,
    pub model_id: String,
    pub prompt: String,
    pub generated_payload: String,
    pub execution_time_ms: u64,
    pub cost: Cost,
    /// Present if and only if the task failed.
    pub error: Option<String>,
    pub created_at: i64,
}

impl ModelResult {
    pub fn success(
        generation_id: &str,
        model_id: &str,
        prompt: &str,
        payload: String,
        execution_time_ms: u64,
        cost: Cost,
    ) -> Self {
        Self {
            id: new_id(&[generation_id, model_id]),
            generation_id: generation_id.to_string(),
            model_id: model_id.to_string(),
            prompt: prompt.to_string(),
            generated_payload: payload,
            execution_time_ms,
            cost,
            error: None,
            created_at: epoch_ms(),
        }
    }

    /// Failed attempt: empty payload and a known cost of zero.
    pub fn failure(
        generation_id: &str,
        model_id: &str,
        prompt: &str,
        error: String,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            id: new_id(&[generation_id, model_id]),
            generation_id: generation_id.to_string(),
            model_id: model_id.to_string(),
            prompt: prompt.to_string(),
            generated_payload: String::new(),
            execution_time_ms,
            cost: Cost::ZERO,
            error: Some(error),
            created_at: epoch_ms(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn status(&self) -> &'static str {
        if self.is_success() { "success" } else { "error" }
    }
}

/// A generation with every result persisted for it so far.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationWithResults {
    #[serde(flatten)]
    pub generation: Generation,
    pub results: Vec<ModelResult>,
}
