use serde::Serialize;

use crate::catalog::ModelSpec;

#[derive(Serialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub prompt_price: f64,
    pub completion_price: f64,
}

impl From<&ModelSpec> for ModelInfo {
    fn from(spec: &ModelSpec) -> Self {
        Self {
            id: spec.id.clone(),
            name: spec.name.clone(),
            description: spec.description.clone(),
            prompt_price: spec.prompt_price,
            completion_price: spec.completion_price,
        }
    }
}

#[derive(Serialize)]
pub struct ListModelsResponse {
    pub models: Vec<ModelInfo>,
}

impl ListModelsResponse {
    /// Markdown table, prices per million tokens.
    pub fn to_markdown(&self) -> String {
        let mut out = String::from(
            "| model | name | prompt $/M | completion $/M |\n|---|---|---|---|\n",
        );
        for m in &self.models {
            out.push_str(&format!(
                "| `{}` | {} | {:.2} | {:.2} |\n",
                m.id,
                m.name,
                m.prompt_price * 1_000_000.0,
                m.completion_price * 1_000_000.0
            ));
        }
        out
    }
}
