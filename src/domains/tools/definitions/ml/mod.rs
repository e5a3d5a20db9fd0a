//! ML inference tools.
//!
//! Four tools backed by local transformer checkpoints, one file per tool,
//! plus the shared loading and caching layers. Pipelines load lazily on
//! first use and stay resident in the [`pipeline::PipelineCache`]; the
//! embedder is the exception and loads per call. All tool names carry the
//! `ml_` prefix used by the dispatcher.

pub mod classifier;
pub mod classify;
pub mod embedder;
pub mod embeddings;
pub mod hub;
pub mod pipeline;
pub mod sentiment;
pub mod summarize;
pub mod summarizer;

pub use classify::{MlClassifyParams, MlClassifyTool};
pub use embeddings::{MlEmbeddingsParams, MlEmbeddingsTool};
pub use pipeline::{Pipeline, PipelineCache, PipelineKey, PipelineTask};
pub use sentiment::{MlSentimentParams, MlSentimentTool};
pub use summarize::{MlSummarizeParams, MlSummarizeTool};

use rmcp::model::CallToolResult;
use serde_json::Value;

use crate::domains::tools::envelope::{failure_envelope, parse_params};
use crate::domains::tools::error::ToolError;

/// Dispatch an `ml_`-prefixed tool call by name.
///
/// A prefix match with no such operation is an unknown tool, reported
/// through the failure envelope without loading any model.
pub fn dispatch(name: &str, arguments: Value, pipelines: &PipelineCache) -> CallToolResult {
    match name {
        MlSentimentTool::NAME => match parse_params::<MlSentimentParams>(arguments) {
            Ok(params) => MlSentimentTool::execute(&params, pipelines),
            Err(e) => failure_envelope(e),
        },
        MlSummarizeTool::NAME => match parse_params::<MlSummarizeParams>(arguments) {
            Ok(params) => MlSummarizeTool::execute(&params, pipelines),
            Err(e) => failure_envelope(e),
        },
        MlClassifyTool::NAME => match parse_params::<MlClassifyParams>(arguments) {
            Ok(params) => MlClassifyTool::execute(&params, pipelines),
            Err(e) => failure_envelope(e),
        },
        MlEmbeddingsTool::NAME => match parse_params::<MlEmbeddingsParams>(arguments) {
            Ok(params) => MlEmbeddingsTool::execute(&params),
            Err(e) => failure_envelope(e),
        },
        _ => failure_envelope(ToolError::UnknownTool(name.to_string())),
    }
}
