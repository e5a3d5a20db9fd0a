//! Sentence embeddings tool definition.

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

use super::embedder::{DEFAULT_EMBEDDING_MODEL, SentenceEmbedder};
use super::pipeline::PipelineCache;
use crate::domains::tools::envelope::envelope;
use crate::domains::tools::error::ToolError;

/// Parameters for the embeddings tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct MlEmbeddingsParams {
    /// Texts to embed, one vector per text.
    pub texts: Vec<String>,
}

/// Embeddings tool - dense sentence vectors for a batch of texts.
pub struct MlEmbeddingsTool;

impl MlEmbeddingsTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "ml_embeddings";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Generate dense vector embeddings for a batch of texts. Returns one vector per input text, in input order, plus the vector dimensionality.";

    /// Execute the tool logic.
    #[instrument(skip_all, fields(texts = params.texts.len()))]
    pub fn execute(params: &MlEmbeddingsParams) -> CallToolResult {
        info!("Embedding {} texts", params.texts.len());
        envelope(Self::run(params))
    }

    fn run(params: &MlEmbeddingsParams) -> Result<Value, ToolError> {
        if params.texts.is_empty() {
            return Err(ToolError::invalid_arguments(
                "At least one text is required",
            ));
        }

        let embedder = SentenceEmbedder::load(DEFAULT_EMBEDDING_MODEL)?;
        let embeddings = embedder.embed(&params.texts)?;

        Ok(json!({
            "embeddings": embeddings,
            "dimensions": embedder.dimensions(),
        }))
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<MlEmbeddingsParams>(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    /// Create a ToolRoute for STDIO transport.
    ///
    /// Takes the cache for signature uniformity with the other inference
    /// tools even though embedders are loaded per call.
    pub fn create_route<S>(_pipelines: Arc<PipelineCache>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        ToolRoute::new_dyn(Self::to_tool(), move |ctx: ToolCallContext<'_, S>| {
            let args = ctx.arguments.clone().unwrap_or_default();
            async move {
                let params: MlEmbeddingsParams =
                    serde_json::from_value(serde_json::Value::Object(args))
                        .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
                let result = tokio::task::spawn_blocking(move || Self::execute(&params))
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
    fn test_empty_texts_rejected() {
        let params = MlEmbeddingsParams { texts: vec![] };
        let result = MlEmbeddingsTool::execute(&params);
        let body = envelope_body(&result);
        assert_eq!(body["success"], json!(false));
    }

    #[test]
    #[ignore] // Requires model download
    fn test_embeddings_one_vector_per_text() {
        let params = MlEmbeddingsParams {
            texts: vec![
                "first sentence".to_string(),
                "second sentence".to_string(),
                "third sentence".to_string(),
            ],
        };

        let result = MlEmbeddingsTool::execute(&params);
        let body = envelope_body(&result);

        assert_eq!(body["success"], json!(true));
        assert_eq!(body["embeddings"].as_array().unwrap().len(), 3);
        assert_eq!(body["dimensions"], json!(384));
        assert_eq!(
            body["embeddings"][0].as_array().unwrap().len(),
            body["dimensions"].as_u64().unwrap() as usize
        );
    }
}
