//! Input validation at the tool boundary. Everything here runs before any
//! provider call; a failure means nothing is created or dispatched.

use std::collections::HashSet;

/// Maximum number of models per generation (prevents DoS).
pub const MAX_MODELS: usize = 20;

/// Largest page a feed request may ask for.
pub const MAX_PAGE_SIZE: u64 = 200;

pub fn validate_prompt(prompt: &str) -> Result<(), String> {
    if prompt.trim().is_empty() {
        return Err("prompt must not be empty".to_string());
    }
    Ok(())
}

/// Non-empty, non-blank model ids, deduplicated in request order.
pub fn validate_models(models: &[String]) -> Result<Vec<String>, String> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for model in models {
        let model = model.trim();
        if model.is_empty() {
            return Err("model ids must not be blank".to_string());
        }
        if seen.insert(model.to_string()) {
            unique.push(model.to_string());
        }
    }
    if unique.is_empty() {
        return Err("select at least one model".to_string());
    }
    if unique.len() > MAX_MODELS {
        return Err(format!(
            "too many models: {} (max {MAX_MODELS})",
            unique.len()
        ));
    }
    Ok(unique)
}

/// A required string field: present and not blank.
pub fn require_field(name: &str, value: Option<String>) -> Result<String, String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(format!("missing required field: {name}")),
    }
}

pub fn validate_page_size(page_size: u64) -> Result<(), String> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(format!("page_size must be between 1 and {MAX_PAGE_SIZE}"));
    }
    Ok(())
}

/// Zero is allowed and means an empty list.
pub fn validate_recent_limit(limit: u64) -> Result<(), String> {
    if limit > MAX_PAGE_SIZE {
        return Err(format!("limit must be at most {MAX_PAGE_SIZE}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_prompt_rejected() {
        assert!(validate_prompt("").is_err());
        assert!(validate_prompt(" \n\t").is_err());
        assert!(validate_prompt("Build a page").is_ok());
    }

    #[test]
    fn models_are_deduplicated_in_order() {
        let models = vec!["b".to_string(), "a".to_string(), " b ".to_string()];
        assert_eq!(validate_models(&models).unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn empty_model_set_rejected() {
        assert!(validate_models(&[]).is_err());
        assert!(validate_models(&["  ".to_string()]).is_err());
    }

    #[test]
    fn too_many_models_rejected() {
        let models: Vec<String> = (0..=MAX_MODELS).map(|i| format!("m{i}")).collect();
        let err = validate_models(&models).unwrap_err();
        assert!(err.contains("too many models"));
    }

    #[test]
    fn require_field_reports_name() {
        assert_eq!(
            require_field("generation_id", None).unwrap_err(),
            "missing required field: generation_id"
        );
        assert!(require_field("model", Some("   ".into())).is_err());
        assert_eq!(require_field("model", Some("x".into())).unwrap(), "x");
    }

    #[test]
    fn page_size_bounds() {
        assert!(validate_page_size(0).is_err());
        assert!(validate_page_size(1).is_ok());
        assert!(validate_page_size(MAX_PAGE_SIZE + 1).is_err());
    }

    #[test]
    fn recent_limit_bounds() {
        assert!(validate_recent_limit(0).is_ok());
        assert!(validate_recent_limit(MAX_PAGE_SIZE).is_ok());
        assert!(validate_recent_limit(MAX_PAGE_SIZE + 1).is_err());
        assert!(validate_recent_limit(u64::MAX).is_err());
    }
}
