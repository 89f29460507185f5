use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListGenerationsRequest {
    /// Caller identity; without one the feed is empty
    pub owner_id: Option<String>,
    /// 1-based page number (default: 1)
    pub page: Option<u64>,
    /// Generations per page (default: 50)
    pub page_size: Option<u64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RecentGenerationsRequest {
    /// Caller identity; without one the list is empty
    pub owner_id: Option<String>,
    /// How many of the caller's latest generations to return (default: 5)
    pub limit: Option<u64>,
}
