//! Model catalog and per-token pricing.
//!
//! Prices are USD per token, as published by OpenRouter. The catalog is
//! loaded once at startup and shared read-only by every task runner.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cost::{self, Cost};
use crate::gateway::TokenUsage;

/// One selectable model and its pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// USD per prompt token.
    pub prompt_price: f64,
    /// USD per completion token.
    pub completion_price: f64,
}

impl ModelSpec {
    fn new(
        id: &str,
        name: &str,
        description: &str,
        prompt_price: f64,
        completion_price: f64,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            prompt_price,
            completion_price,
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid catalog file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("catalog defines no models")]
    Empty,

    #[error("model {0} has a negative or non-finite price")]
    InvalidPrice(String),

    #[error("model {0} is defined more than once")]
    Duplicate(String),
}

#[derive(Deserialize)]
struct CatalogFile {
    models: Vec<ModelSpec>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    models: HashMap<String, ModelSpec>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    pub fn new(specs: Vec<ModelSpec>) -> Result<Self, CatalogError> {
        if specs.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut models = HashMap::with_capacity(specs.len());
        for spec in specs {
            let valid = |p: f64| p.is_finite() && p >= 0.0;
            if !valid(spec.prompt_price) || !valid(spec.completion_price) {
                return Err(CatalogError::InvalidPrice(spec.id));
            }
            if models.contains_key(&spec.id) {
                return Err(CatalogError::Duplicate(spec.id));
            }
            models.insert(spec.id.clone(), spec);
        }
        Ok(Self { models })
    }

    /// Parse a TOML catalog:
    ///
    /// ```toml
    /// [[models]]
    /// id = "openai/gpt-4o-mini"
    /// name = "OpenAI: GPT-4o-mini"
    /// prompt_price = 0.00000015
    /// completion_price = 0.0000006
    /// ```
    pub fn from_toml_str(raw: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(raw)?;
        Self::new(file.models)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn get(&self, model_id: &str) -> Option<&ModelSpec> {
        self.models.get(model_id)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// All models, sorted by id.
    pub fn list(&self) -> Vec<&ModelSpec> {
        let mut specs: Vec<&ModelSpec> = self.models.values().collect();
        specs.sort_by(|a, b| a.id.cmp(&b.id));
        specs
    }

    /// Cost of `usage` for `model_id`; unknown when the model has no entry.
    pub fn price(&self, model_id: &str, usage: TokenUsage) -> Cost {
        cost::price(usage, self.get(model_id))
    }

    /// The default OpenRouter lineup.
    pub fn builtin() -> Self {
        let specs = vec![
            ModelSpec::new(
                "anthropic/claude-3.5-sonnet",
                "Anthropic: Claude 3.5 Sonnet",
                "Strong at coding, data science, visual processing and agentic tasks.",
                0.000008,
                0.000015,
            ),
            ModelSpec::new(
                "google/gemini-2.0-flash-001",
                "Google: Gemini Flash 2.0",
                "Fast time to first token with quality on par with larger Gemini models.",
                0.0000001,
                0.0000004,
            ),
            ModelSpec::new(
                "x-ai/grok-2-1212",
                "xAI: Grok 2 1212",
                "Improved accuracy, instruction adherence and multilingual support.",
                0.000002,
                0.00001,
            ),
            ModelSpec::new(
                "qwen/qwen-2.5-coder-32b-instruct",
                "Qwen2.5 Coder 32B Instruct",
                "Code-specific Qwen model for generation, reasoning and fixing.",
                0.00000007,
                0.00000016,
            ),
            ModelSpec::new(
                "openai/gpt-4o-mini",
                "OpenAI: GPT-4o-mini",
                "Small, affordable multimodal model.",
                0.00000015,
                0.0000006,
            ),
            ModelSpec::new(
                "qwen/qwen-plus",
                "Qwen: Qwen-Plus",
                "131K context model balancing performance, speed and cost.",
                0.0000004,
                0.0000012,
            ),
            ModelSpec::new(
                "qwen/qwen-max",
                "Qwen: Qwen-Max",
                "Large MoE Qwen model for complex multi-step tasks.",
                0.0000016,
                0.0000064,
            ),
            ModelSpec::new(
                "google/gemini-2.0-pro-exp-02-05:free",
                "Google: Gemini Pro 2.0 Experimental (free)",
                "Experimental Gemini 2.0 Pro, heavily rate limited.",
                0.0,
                0.0,
            ),
            ModelSpec::new(
                "anthropic/claude-3.5-haiku-20241022",
                "Anthropic: Claude 3.5 Haiku (2024-10-22)",
                "Fastest Anthropic model, suited to interactive use.",
                0.0000008,
                0.000004,
            ),
            ModelSpec::new(
                "google/gemini-flash-1.5",
                "Google: Gemini Flash 1.5",
                "High-volume, low-latency multimodal model.",
                0.000000075,
                0.0000003,
            ),
            ModelSpec::new(
                "deepseek/deepseek-r1-distill-llama-70b",
                "DeepSeek: R1 Distill Llama 70B",
                "Llama 3.3 70B distilled from DeepSeek R1 outputs.",
                0.00000023,
                0.00000069,
            ),
            ModelSpec::new(
                "deepseek/deepseek-chat",
                "DeepSeek: DeepSeek V3",
                "DeepSeek V3 with strong instruction following and coding.",
                0.00000049,
                0.00000089,
            ),
            ModelSpec::new(
                "deepseek/deepseek-r1",
                "DeepSeek: R1",
                "Open reasoning model, 671B parameters with 37B active.",
                0.000003,
                0.000008,
            ),
        ];
        let mut models = HashMap::with_capacity(specs.len());
        for spec in specs {
            models.insert(spec.id.clone(), spec);
        }
        Self { models }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_the_default_lineup() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), 13);
        let mini = catalog.get("openai/gpt-4o-mini").unwrap();
        assert_eq!(mini.prompt_price, 0.00000015);
        assert_eq!(mini.completion_price, 0.0000006);
    }

    #[test]
    fn list_is_sorted_by_id() {
        let catalog = Catalog::builtin();
        let ids: Vec<&str> = catalog.list().iter().map(|m| m.id.as_str()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn parses_toml_catalog() {
        let raw = r#"
            [[models]]
            id = "a/model"
            name = "Model A"
            prompt_price = 0.000001
            completion_price = 0.000002

            [[models]]
            id = "b/free"
            name = "Free B"
            description = "costs nothing"
            prompt_price = 0.0
            completion_price = 0.0
        "#;
        let catalog = Catalog::from_toml_str(raw).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("b/free").unwrap().description, "costs nothing");
        assert!(catalog.get("a/model").unwrap().description.is_empty());
    }

    #[test]
    fn rejects_empty_catalog() {
        let err = Catalog::from_toml_str("models = []").unwrap_err();
        assert!(matches!(err, CatalogError::Empty));
    }

    #[test]
    fn rejects_negative_price() {
        let raw = r#"
            [[models]]
            id = "bad"
            name = "Bad"
            prompt_price = -1.0
            completion_price = 0.0
        "#;
        let err = Catalog::from_toml_str(raw).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidPrice(id) if id == "bad"));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let raw = r#"
            [[models]]
            id = "dup"
            name = "One"
            prompt_price = 0.0
            completion_price = 0.0

            [[models]]
            id = "dup"
            name = "Two"
            prompt_price = 0.0
            completion_price = 0.0
        "#;
        assert!(matches!(
            Catalog::from_toml_str(raw),
            Err(CatalogError::Duplicate(_))
        ));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = Catalog::load(Path::new("/nonexistent/versus/catalog.toml")).unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
    }
}
