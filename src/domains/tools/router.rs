//! Tool Router - builds the rmcp ToolRouter from the definitions.
//!
//! This module builds the ToolRouter for STDIO transport by delegating to
//! the tool definitions themselves. Each tool knows how to create its own
//! route.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;

use crate::core::config::Config;

use super::definitions::{
    DataAggregateTool, DataCorrelateTool, DataDescribeTool, DataFilterTool, DataPreviewTool,
    MlClassifyTool, MlEmbeddingsTool, MlSentimentTool, MlSummarizeTool, PipelineCache,
};

/// Build the tool router with all registered tools.
pub fn build_tool_router<S>(config: Arc<Config>, pipelines: Arc<PipelineCache>) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    ToolRouter::new()
        .with_route(DataPreviewTool::create_route(config.clone()))
        .with_route(DataDescribeTool::create_route(config.clone()))
        .with_route(DataFilterTool::create_route(config.clone()))
        .with_route(DataAggregateTool::create_route(config.clone()))
        .with_route(DataCorrelateTool::create_route(config))
        .with_route(MlSentimentTool::create_route(pipelines.clone()))
        .with_route(MlSummarizeTool::create_route(pipelines.clone()))
        .with_route(MlClassifyTool::create_route(pipelines.clone()))
        .with_route(MlEmbeddingsTool::create_route(pipelines))
}
