//! Text summarization tool definition.

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, instrument};

use super::pipeline::{PipelineCache, PipelineTask};
use crate::domains::tools::envelope::envelope;
use crate::domains::tools::error::ToolError;

fn default_max_length() -> usize {
    150
}

/// Parameters for the summarization tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct MlSummarizeParams {
    /// Text to summarize.
    pub text: String,
    /// Maximum length of the summary in tokens.
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

/// Summarization tool - abstractive summary of a longer text.
pub struct MlSummarizeTool;

impl MlSummarizeTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "ml_summarize";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Summarize a text into a shorter abstractive summary. max_length caps the summary length in tokens (default 150). The first call loads the model; later calls reuse it.";

    /// Execute the tool logic.
    #[instrument(skip_all, fields(max_length = params.max_length))]
    pub fn execute(params: &MlSummarizeParams, pipelines: &PipelineCache) -> CallToolResult {
        info!("Summarizing ({} chars)", params.text.len());
        envelope(Self::run(params, pipelines))
    }

    fn run(params: &MlSummarizeParams, pipelines: &PipelineCache) -> Result<Value, ToolError> {
        if params.max_length == 0 {
            return Err(ToolError::invalid_arguments("max_length must be positive"));
        }

        let pipeline = pipelines.acquire(PipelineTask::Summarization, None)?;
        let summary = pipeline
            .as_summarizer()?
            .summarize(&params.text, params.max_length)?;

        Ok(json!({ "summary": summary }))
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<MlSummarizeParams>(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    /// Create a ToolRoute for STDIO transport.
    pub fn create_route<S>(pipelines: Arc<PipelineCache>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        ToolRoute::new_dyn(Self::to_tool(), move |ctx: ToolCallContext<'_, S>| {
            let args = ctx.arguments.clone().unwrap_or_default();
            let pipelines = pipelines.clone();
            async move {
                let params: MlSummarizeParams =
                    serde_json::from_value(serde_json::Value::Object(args))
                        .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
                let result =
                    tokio::task::spawn_blocking(move || Self::execute(&params, &pipelines))
                        .await
                        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
                Ok(result)
            }
            .boxed()
        })
    }
}
