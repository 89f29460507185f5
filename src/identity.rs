use serde::Serialize;

use crate::model::new_id;

/// Opaque caller identity, held by the caller and passed in explicitly.
/// Never validated beyond being non-blank, never inspected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Blank or missing ids resolve to anonymous (`None`), never an error.
    /// Anything else is kept byte for byte.
    pub fn resolve(raw: Option<&str>) -> Option<Self> {
        raw.filter(|s| !s.trim().is_empty())
            .map(|s| Self(s.to_string()))
    }

    /// Fresh id for a first-time submitter.
    pub fn mint() -> Self {
        Self(new_id(&["owner"]))
    }

    /// Resolve, or mint when anonymous. The flag is true if the id is new
    /// and must be handed back to the caller to keep.
    pub fn resolve_or_mint(raw: Option<&str>) -> (Self, bool) {
        match Self::resolve(raw) {
            Some(owner) => (owner, false),
            None => (Self::mint(), true),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
