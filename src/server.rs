use std::sync::Arc;
use std::time::Instant;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};

use crate::catalog::Catalog;
use crate::config::{Config, FeedConfig};
use crate::feed::Feed;
use crate::gateway::http::HttpProvider;
use crate::identity::OwnerId;
use crate::orchestrator::Orchestrator;
use crate::response::{ToolMetadata, ToolResponse};
use crate::runner::TaskRunner;
use crate::store::Store;
use crate::tools::feed::{ListGenerationsRequest, RecentGenerationsRequest};
use crate::tools::generate::{
    GenerateRequest, GenerateResponse, InitGenerationRequest, InitGenerationResponse,
    RunModelRequest,
};
use crate::tools::listmodels::{ListModelsResponse, ModelInfo};
use crate::validate;

#[derive(Clone)]
pub struct VersusServer {
    orchestrator: Arc<Orchestrator<HttpProvider>>,
    feed: Feed,
    catalog: Arc<Catalog>,
    store: Arc<Store>,
    feed_config: FeedConfig,
    tool_router: ToolRouter<Self>,
}

fn invalid(msg: String) -> McpError {
    McpError::invalid_params(msg, None)
}

#[tool_router]
impl VersusServer {
    pub fn new(config: Config, store: Arc<Store>) -> Self {
        let catalog = Arc::new(config.catalog);
        let provider = Arc::new(HttpProvider::new(&config.provider));
        let runner = Arc::new(TaskRunner::new(provider, catalog.clone(), store.clone()));
        let orchestrator = Arc::new(Orchestrator::new(runner, store.clone()));

        Self {
            orchestrator,
            feed: Feed::new(store.clone()),
            catalog,
            store,
            feed_config: config.feed,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        name = "generate",
        description = "Run one prompt against several models concurrently and return every result once all have finished. Failed models are reported per model; they never fail the generation. Use `listmodels` for model ids.",
        annotations(read_only_hint = false)
    )]
    pub async fn generate(
        &self,
        Parameters(req): Parameters<GenerateRequest>,
    ) -> Result<CallToolResult, McpError> {
        validate::validate_prompt(&req.prompt).map_err(invalid)?;
        let models = validate::validate_models(&req.models).map_err(invalid)?;
        let (owner, _) = OwnerId::resolve_or_mint(req.owner_id.as_deref());

        let start = Instant::now();
        let response = match self.orchestrator.generate(&req.prompt, &models, &owner).await {
            Ok(summary) => ToolResponse::json(
                &GenerateResponse::new(&summary, owner.as_str()),
                ToolMetadata::new("generate", start.elapsed().as_secs_f64())
                    .with_generation(&summary.generation_id),
            ),
            Err(e) => {
                tracing::warn!("generate: cannot create generation: {e}");
                ToolResponse::error(
                    format!("cannot create generation: {e}"),
                    ToolMetadata::new("generate", start.elapsed().as_secs_f64()),
                )
            }
        };

        Ok(response.into_call_tool_result())
    }

    #[tool(
        name = "init_generation",
        description = "Create a generation record and return its id without running any model. Follow with one `run_model` call per model, issued concurrently.",
        annotations(read_only_hint = false)
    )]
    pub async fn init_generation(
        &self,
        Parameters(req): Parameters<InitGenerationRequest>,
    ) -> Result<CallToolResult, McpError> {
        validate::validate_prompt(&req.prompt).map_err(invalid)?;
        let models = validate::validate_models(&req.models).map_err(invalid)?;
        let (owner, _) = OwnerId::resolve_or_mint(req.owner_id.as_deref());

        let start = Instant::now();
        let response = match self.orchestrator.submit(&req.prompt, &models, &owner).await {
            Ok(generation_id) => {
                let metadata = ToolMetadata::new("init_generation", start.elapsed().as_secs_f64())
                    .with_generation(&generation_id);
                ToolResponse::json(
                    &InitGenerationResponse {
                        generation_id,
                        owner_id: owner.to_string(),
                        models,
                    },
                    metadata,
                )
            }
            Err(e) => {
                tracing::warn!("init_generation failed: {e}");
                ToolResponse::error(
                    format!("cannot create generation: {e}"),
                    ToolMetadata::new("init_generation", start.elapsed().as_secs_f64()),
                )
            }
        };

        Ok(response.into_call_tool_result())
    }

    #[tool(
        name = "run_model",
        description = "Run one model for an existing generation and return its result. Provider failures come back as a result with `error` set, never as a tool error.",
        annotations(read_only_hint = false)
    )]
    pub async fn run_model(
        &self,
        Parameters(req): Parameters<RunModelRequest>,
    ) -> Result<CallToolResult, McpError> {
        let generation_id = validate::require_field("generation_id", req.generation_id).map_err(invalid)?;
        let model = validate::require_field("model", req.model).map_err(invalid)?;
        let prompt = validate::require_field("prompt", req.prompt).map_err(invalid)?;

        let start = Instant::now();
        match self.store.get_generation(&generation_id).await {
            Ok(Some(_)) => {}
            Ok(None) => return Err(invalid(format!("unknown generation: {generation_id}"))),
            Err(e) => {
                tracing::warn!("run_model: generation lookup failed: {e}");
                return Ok(ToolResponse::error(
                    format!("store unavailable: {e}"),
                    ToolMetadata::new("run_model", start.elapsed().as_secs_f64()),
                )
                .into_call_tool_result());
            }
        }

        let result = self
            .orchestrator
            .runner()
            .run(&generation_id, &model, &prompt)
            .await;

        let response = ToolResponse::json(
            &result,
            ToolMetadata::new("run_model", start.elapsed().as_secs_f64())
                .with_generation(&generation_id),
        );
        Ok(response.into_call_tool_result())
    }

    #[tool(
        name = "list_generations",
        description = "Page through generations visible to the caller (their own plus public ones), newest first, with every model result attached.",
        annotations(read_only_hint = true)
    )]
    pub async fn list_generations(
        &self,
        Parameters(req): Parameters<ListGenerationsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let page_size = req.page_size.unwrap_or(self.feed_config.page_size);
        validate::validate_page_size(page_size).map_err(invalid)?;
        let owner = OwnerId::resolve(req.owner_id.as_deref());

        let start = Instant::now();
        let response = match self
            .feed
            .list_visible(owner.as_ref(), req.page.unwrap_or(1), page_size)
            .await
        {
            Ok(page) => ToolResponse::json(
                &page,
                ToolMetadata::new("list_generations", start.elapsed().as_secs_f64()),
            ),
            Err(e) => {
                tracing::warn!(retryable = e.is_retryable(), "list_generations failed: {e}");
                ToolResponse::error(
                    format!("failed to fetch generations: {e}"),
                    ToolMetadata::new("list_generations", start.elapsed().as_secs_f64()),
                )
            }
        };

        Ok(response.into_call_tool_result())
    }

    #[tool(
        name = "recent_generations",
        description = "The caller's own most recent generations, newest first, with every model result attached.",
        annotations(read_only_hint = true)
    )]
    pub async fn recent_generations(
        &self,
        Parameters(req): Parameters<RecentGenerationsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let limit = req.limit.unwrap_or(self.feed_config.recent_limit);
        validate::validate_recent_limit(limit).map_err(invalid)?;
        let owner = OwnerId::resolve(req.owner_id.as_deref());

        let start = Instant::now();
        let response = match self.feed.list_own_recent(owner.as_ref(), limit).await {
            Ok(items) => ToolResponse::json(
                &items,
                ToolMetadata::new("recent_generations", start.elapsed().as_secs_f64()),
            ),
            Err(e) => {
                tracing::warn!(retryable = e.is_retryable(), "recent_generations failed: {e}");
                ToolResponse::error(
                    format!("failed to fetch generations: {e}"),
                    ToolMetadata::new("recent_generations", start.elapsed().as_secs_f64()),
                )
            }
        };

        Ok(response.into_call_tool_result())
    }

    #[tool(
        name = "listmodels",
        description = "List selectable models with per-token pricing.",
        annotations(read_only_hint = true)
    )]
    pub async fn listmodels(&self) -> Result<CallToolResult, McpError> {
        let list = ListModelsResponse {
            models: self.catalog.list().into_iter().map(ModelInfo::from).collect(),
        };

        let response = ToolResponse::success(list.to_markdown(), ToolMetadata::new("listmodels", 0.0));
        Ok(response.into_call_tool_result())
    }
}

#[tool_handler]
impl ServerHandler for VersusServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "versus".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "Versus: compare AI models head-to-head on the same prompt.\n\n\
                 Workflow:\n\
                 1. Call `listmodels` for model ids and prices.\n\
                 2. Call `generate` with a prompt and models to run them all and get every result,\n\
                    or `init_generation` then one `run_model` per model (concurrently) to see\n\
                    each result as soon as it finishes.\n\
                 3. Keep the returned `owner_id` and pass it on later calls.\n\
                 4. `list_generations` pages through your and public generations;\n\
                    `recent_generations` shows your latest ones."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
