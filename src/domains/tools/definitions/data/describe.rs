//! Dataset describe tool definition.
//!
//! Computes per-column descriptive statistics: count/mean/std/min/quartiles/max
//! for numeric columns, count/unique/top/freq for the rest.

use std::collections::HashMap;

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{info, instrument};

use super::dataset::{Column, Dataset, float_json};
use crate::core::config::Config;
use crate::core::security::validate_dataset_path;
use crate::domains::tools::envelope::envelope;
use crate::domains::tools::error::ToolError;

/// Parameters for the dataset describe tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DataDescribeParams {
    /// Path to the CSV file.
    pub path: String,
}

/// Dataset describe tool - per-column descriptive statistics.
pub struct DataDescribeTool;

impl DataDescribeTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "data_describe";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Get a statistical description of a dataset: count, mean, std, min, quartiles, and max for numeric columns; count, unique, top, and freq for other columns.";

    /// Execute the tool logic.
    #[instrument(skip_all, fields(path = %params.path))]
    pub fn execute(params: &DataDescribeParams, config: &Config) -> CallToolResult {
        info!("Describing dataset: {}", params.path);
        envelope(Self::run(params, config))
    }

    fn run(params: &DataDescribeParams, config: &Config) -> Result<Value, ToolError> {
        let path = validate_dataset_path(&params.path, config)
            .map_err(|e| ToolError::load(e.to_string()))?;

        let dataset = Dataset::load(&path, None)?;

        let statistics: Map<String, Value> = dataset
            .columns()
            .iter()
            .map(|column| {
                let stats = if column.ty.is_numeric() {
                    numeric_stats(column)
                } else {
                    text_stats(column)
                };
                (column.name.clone(), stats)
            })
            .collect();

        Ok(json!({ "statistics": statistics }))
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<DataDescribeParams>(),
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
                let params: DataDescribeParams =
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

/// Statistics for a numeric column. Undefined values (std of a single
/// observation, stats of an empty column) render as null.
fn numeric_stats(column: &Column) -> Value {
    let mut values = column.numeric_values();
    values.sort_by(|a, b| a.total_cmp(b));

    let count = values.len();
    if count == 0 {
        return json!({
            "count": 0,
            "mean": Value::Null,
            "std": Value::Null,
            "min": Value::Null,
            "25%": Value::Null,
            "50%": Value::Null,
            "75%": Value::Null,
            "max": Value::Null,
        });
    }

    let mean = values.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        var.sqrt()
    } else {
        f64::NAN
    };

    json!({
        "count": count,
        "mean": float_json(mean),
        "std": float_json(std),
        "min": float_json(values[0]),
        "25%": float_json(quantile(&values, 0.25)),
        "50%": float_json(quantile(&values, 0.5)),
        "75%": float_json(quantile(&values, 0.75)),
        "max": float_json(values[count - 1]),
    })
}

/// Statistics for a non-numeric column: count, distinct values, and the
/// most frequent value with its frequency.
fn text_stats(column: &Column) -> Value {
    let values: Vec<String> = column.cells.iter().filter_map(|c| c.display()).collect();

    let mut frequencies: HashMap<&str, usize> = HashMap::new();
    for value in &values {
        *frequencies.entry(value.as_str()).or_insert(0) += 1;
    }

    // Most frequent value; ties break on first appearance in row order.
    let mut top: Option<&str> = None;
    for value in &values {
        let count = frequencies[value.as_str()];
        match top {
            Some(current) if frequencies[current] >= count => {}
            _ => top = Some(value),
        }
    }
    let freq = top.map(|t| frequencies[t]).unwrap_or(0);
    let top = top.map(str::to_string);

    json!({
        "count": values.len(),
        "unique": frequencies.len(),
        "top": top,
        "freq": freq,
    })
}

/// Linear-interpolated quantile over sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = q * (n - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let weight = pos - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}
