//! Tool Registry - central registration and dispatch for all tools.
//!
//! This module provides:
//! - A registry of all available tools
//! - Name-based dispatch by domain prefix (`data_`, `ml_`)
//! - Tool metadata for listing

use std::sync::Arc;

use rmcp::model::{CallToolResult, Tool};
use serde_json::Value;
use tracing::debug;

use crate::core::config::Config;
use crate::domains::tools::envelope::failure_envelope;
use crate::domains::tools::error::ToolError;

use super::definitions::{
    DataAggregateTool, DataCorrelateTool, DataDescribeTool, DataFilterTool, DataPreviewTool,
    MlClassifyTool, MlEmbeddingsTool, MlSentimentTool, MlSummarizeTool, PipelineCache, data, ml,
};

/// Name prefix of the tabular data tools.
pub const DATA_PREFIX: &str = "data_";
/// Name prefix of the ML inference tools.
pub const ML_PREFIX: &str = "ml_";

// ============================================================================
// Tool Registry
// ============================================================================

/// Tool registry - manages all available tools.
///
/// This struct provides a central point for:
/// - Listing all available tools
/// - Dispatching tool calls by name to the owning domain
pub struct ToolRegistry {
    config: Arc<Config>,
    pipelines: Arc<PipelineCache>,
}

impl ToolRegistry {
    /// Create a new tool registry.
    pub fn new(config: Arc<Config>, pipelines: Arc<PipelineCache>) -> Self {
        Self { config, pipelines }
    }

    /// Get all tool names.
    pub fn tool_names(&self) -> Vec<&'static str> {
        vec![
            DataPreviewTool::NAME,
            DataDescribeTool::NAME,
            DataFilterTool::NAME,
            DataAggregateTool::NAME,
            DataCorrelateTool::NAME,
            MlSentimentTool::NAME,
            MlSummarizeTool::NAME,
            MlClassifyTool::NAME,
            MlEmbeddingsTool::NAME,
        ]
    }

    /// Get all tools as Tool models (metadata).
    ///
    /// This is the single source of truth for all available tools, in the
    /// order clients see them. Both HTTP and STDIO transports use this.
    pub fn get_all_tools() -> Vec<Tool> {
        vec![
            DataPreviewTool::to_tool(),
            DataDescribeTool::to_tool(),
            DataFilterTool::to_tool(),
            DataAggregateTool::to_tool(),
            DataCorrelateTool::to_tool(),
            MlSentimentTool::to_tool(),
            MlSummarizeTool::to_tool(),
            MlClassifyTool::to_tool(),
            MlEmbeddingsTool::to_tool(),
        ]
    }

    /// Dispatch a tool call to the owning domain by name prefix.
    ///
    /// Names outside both prefixes never reach a domain; they fail fast with
    /// the unknown-tool envelope.
    pub fn call_tool(&self, name: &str, arguments: Value) -> CallToolResult {
        debug!("Dispatching tool call: {}", name);
        if name.starts_with(DATA_PREFIX) {
            data::dispatch(name, arguments, &self.config)
        } else if name.starts_with(ML_PREFIX) {
            ml::dispatch(name, arguments, &self.pipelines)
        } else {
            failure_envelope(ToolError::UnknownTool(name.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::envelope::envelope_body;
    use serde_json::json;

    fn test_registry() -> ToolRegistry {
        ToolRegistry::new(Arc::new(Config::default()), Arc::new(PipelineCache::new()))
    }

    #[test]
    fn test_registry_tool_names() {
        let names = test_registry().tool_names();
        assert_eq!(names.len(), 9);
        assert!(names.contains(&"data_preview"));
        assert!(names.contains(&"data_describe"));
        assert!(names.contains(&"data_filter"));
        assert!(names.contains(&"data_aggregate"));
        assert!(names.contains(&"data_correlate"));
        assert!(names.contains(&"ml_sentiment"));
        assert!(names.contains(&"ml_summarize"));
        assert!(names.contains(&"ml_classify"));
        assert!(names.contains(&"ml_embeddings"));
    }

    #[test]
    fn test_registry_metadata_covers_all_names() {
        let registry = test_registry();
        let tools = ToolRegistry::get_all_tools();
        assert_eq!(tools.len(), registry.tool_names().len());
        for (tool, name) in tools.iter().zip(registry.tool_names()) {
            assert_eq!(tool.name.as_ref(), name);
            assert!(tool.description.is_some());
        }
    }

    #[test]
    fn test_call_unknown_tool() {
        let result = test_registry().call_tool("bogus_tool", json!({}));
        let body = envelope_body(&result);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("Unknown tool: bogus_tool"));
    }

    #[test]
    fn test_call_unknown_tool_with_known_prefix() {
        // Prefix routing still rejects names without a matching operation.
        let result = test_registry().call_tool("data_explode", json!({}));
        let body = envelope_body(&result);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("Unknown tool: data_explode"));

        let result = test_registry().call_tool("ml_translate", json!({}));
        let body = envelope_body(&result);
        assert_eq!(body["error"], json!("Unknown tool: ml_translate"));
    }

    #[test]
    fn test_call_data_tool_through_registry() {
        use crate::domains::tools::definitions::data::dataset::tests::{PEOPLE_CSV, write_csv};

        let (_dir, path) = write_csv(PEOPLE_CSV);
        let result = test_registry().call_tool(
            "data_preview",
            json!({ "path": path.to_string_lossy(), "limit": 2 }),
        );
        let body = envelope_body(&result);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["rows"], json!(2));
    }

    #[test]
    fn test_call_tool_with_bad_arguments() {
        let result = test_registry().call_tool("data_preview", json!({ "limit": 2 }));
        let body = envelope_body(&result);
        assert_eq!(body["success"], json!(false));
    }
}
