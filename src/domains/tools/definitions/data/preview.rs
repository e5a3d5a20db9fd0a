//! Dataset preview tool definition.
//!
//! Loads up to a bounded number of rows from a CSV file and reports shape,
//! inferred column types, and the first few rows.

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

use super::dataset::Dataset;
use crate::core::config::Config;
use crate::core::security::validate_dataset_path;
use crate::domains::tools::envelope::envelope;
use crate::domains::tools::error::ToolError;

/// Number of rows included in the preview payload.
const PREVIEW_ROWS: usize = 5;

fn default_limit() -> usize {
    1000
}

/// Parameters for the dataset preview tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DataPreviewParams {
    /// Path to the CSV file.
    pub path: String,

    /// Maximum number of rows to load.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// Dataset preview tool - loads a CSV file and returns basic shape info.
pub struct DataPreviewTool;

impl DataPreviewTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "data_preview";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Load a CSV file and return basic statistics: row count, column names, inferred column types, and the first rows as records.";

    /// Execute the tool logic.
    #[instrument(skip_all, fields(path = %params.path))]
    pub fn execute(params: &DataPreviewParams, config: &Config) -> CallToolResult {
        info!("Previewing dataset: {} (limit {})", params.path, params.limit);
        envelope(Self::run(params, config))
    }

    fn run(params: &DataPreviewParams, config: &Config) -> Result<Value, ToolError> {
        let path = validate_dataset_path(&params.path, config)
            .map_err(|e| ToolError::load(e.to_string()))?;

        let dataset = Dataset::load(&path, Some(params.limit))?;

        Ok(json!({
            "rows": dataset.row_count(),
            "columns": dataset.column_names(),
            "dtypes": dataset.dtypes(),
            "preview": dataset.head(PREVIEW_ROWS),
        }))
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<DataPreviewParams>(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    /// Create a ToolRoute for STDIO transport.
    pub fn create_route<S>(config: Arc<Config>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        ToolRoute::new_dyn(Self::to_tool(), move |ctx: ToolCallContext<'_, S>| {
            let args = ctx.arguments.clone().unwrap_or_default();
            let config = config.clone();
            async move {
                let params: DataPreviewParams =
                    serde_json::from_value(serde_json::Value::Object(args))
                        .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
                let result =
                    tokio::task::spawn_blocking(move || Self::execute(&params, &config))
                        .await
                        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
                Ok(result)
            }
            .boxed()
        })
    }
}
