//! Sentiment analysis tool definition.

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

/// Parameters for the sentiment analysis tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct MlSentimentParams {
    /// Text to analyze.
    pub text: String,
}

/// Sentiment analysis tool - single-label polarity with confidence.
pub struct MlSentimentTool;

impl MlSentimentTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "ml_sentiment";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Analyze the sentiment of a text. Returns the top label (e.g. POSITIVE or NEGATIVE) with its confidence score. The first call loads the model; later calls reuse it.";

    /// Execute the tool logic.
    #[instrument(skip_all)]
    pub fn execute(params: &MlSentimentParams, pipelines: &PipelineCache) -> CallToolResult {
        info!("Analyzing sentiment ({} chars)", params.text.len());
        envelope(Self::run(params, pipelines))
    }

    fn run(params: &MlSentimentParams, pipelines: &PipelineCache) -> Result<Value, ToolError> {
        let pipeline = pipelines.acquire(PipelineTask::SentimentAnalysis, None)?;
        let scored = pipeline.as_classifier()?.predict(&params.text)?;

        let (label, score) = scored
            .into_iter()
            .next()
            .ok_or_else(|| ToolError::inference("Classifier produced no scores"))?;

        Ok(json!({ "label": label, "score": score }))
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<MlSentimentParams>(),
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
                let params: MlSentimentParams =
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::envelope::envelope_body;

    #[test]
    #[ignore] // Requires model download
    fn test_sentiment_positive_text() {
        let pipelines = PipelineCache::new();
        let params = MlSentimentParams {
            text: "I absolutely loved this. Best experience of the year!".to_string(),
        };

        let result = MlSentimentTool::execute(&params, &pipelines);
        let body = envelope_body(&result);

        assert_eq!(body["success"], json!(true));
        assert_eq!(body["label"], json!("POSITIVE"));
        assert!(body["score"].as_f64().unwrap() > 0.9);
    }

    #[test]
    #[ignore] // Requires model download
    fn test_sentiment_reuses_cached_pipeline() {
        let pipelines = PipelineCache::new();
        let params = MlSentimentParams {
            text: "Terrible. Would not recommend.".to_string(),
        };

        MlSentimentTool::execute(&params, &pipelines);
        MlSentimentTool::execute(&params, &pipelines);
        assert_eq!(pipelines.len(), 1);
    }
}
