//! Dataset aggregate tool definition.
//!
//! Partitions rows by the distinct values of one column and reduces another
//! column within each partition.

use std::collections::BTreeMap;

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

use super::dataset::{Cell, Column, ColumnType, Dataset, float_json};
use crate::core::config::Config;
use crate::core::security::validate_dataset_path;
use crate::domains::tools::envelope::envelope;
use crate::domains::tools::error::ToolError;

/// Parameters for the dataset aggregate tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DataAggregateParams {
    /// Path to the CSV file.
    pub path: String,

    /// Column whose distinct values define the groups.
    pub group_by: String,

    /// Column to reduce within each group.
    pub agg_column: String,

    /// Reduction function: sum, mean, count, min, or max.
    pub agg_func: String,
}

/// Recognized aggregation functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AggFunc {
    Sum,
    Mean,
    Count,
    Min,
    Max,
}

impl AggFunc {
    /// Parse a function name. Unknown names are a validation failure that
    /// must short-circuit before any dataset load.
    fn parse(name: &str) -> Result<Self, ToolError> {
        match name {
            "sum" => Ok(Self::Sum),
            "mean" => Ok(Self::Mean),
            "count" => Ok(Self::Count),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            other => Err(ToolError::UnknownFunction(other.to_string())),
        }
    }
}

/// Dataset aggregate tool - grouped reduction over one column.
pub struct DataAggregateTool;

impl DataAggregateTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "data_aggregate";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Aggregate a dataset column by group: partition rows by the distinct values of one column and reduce another with sum, mean, count, min, or max.";

    /// Execute the tool logic.
    #[instrument(skip_all, fields(path = %params.path, group_by = %params.group_by, agg_func = %params.agg_func))]
    pub fn execute(params: &DataAggregateParams, config: &Config) -> CallToolResult {
        info!(
            "Aggregating {} by {} with {}({})",
            params.path, params.group_by, params.agg_func, params.agg_column
        );
        envelope(Self::run(params, config))
    }

    fn run(params: &DataAggregateParams, config: &Config) -> Result<Value, ToolError> {
        // Function validation happens before the dataset is touched.
        let func = AggFunc::parse(&params.agg_func)?;

        let path = validate_dataset_path(&params.path, config)
            .map_err(|e| ToolError::load(e.to_string()))?;

        let dataset = Dataset::load(&path, None)?;
        let group_column = dataset.column(&params.group_by)?;
        let agg_column = dataset.column(&params.agg_column)?;

        // Rows with a missing group key are dropped from every partition.
        let mut groups: BTreeMap<String, Vec<&Cell>> = BTreeMap::new();
        for (key_cell, agg_cell) in group_column.cells.iter().zip(&agg_column.cells) {
            if let Some(key) = key_cell.display() {
                groups.entry(key).or_default().push(agg_cell);
            }
        }

        let mut result = serde_json::Map::new();
        for (key, cells) in groups {
            result.insert(key, reduce(func, agg_column, &cells)?);
        }

        Ok(json!({ "result": result }))
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<DataAggregateParams>(),
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
                let params: DataAggregateParams =
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

/// Reduce one group's cells. `count` counts non-missing cells; sum and mean
/// require a numeric column; min and max fall back to lexicographic order on
/// text columns.
fn reduce(func: AggFunc, column: &Column, cells: &[&Cell]) -> Result<Value, ToolError> {
    if func == AggFunc::Count {
        let count = cells.iter().filter(|c| c.is_present()).count();
        return Ok(json!(count));
    }

    if column.ty.is_numeric() {
        let values: Vec<f64> = cells.iter().filter_map(|c| c.as_f64()).collect();
        if values.is_empty() {
            return Ok(Value::Null);
        }
        let reduced = match func {
            AggFunc::Sum => values.iter().sum(),
            AggFunc::Mean => values.iter().sum::<f64>() / values.len() as f64,
            AggFunc::Min => values.iter().cloned().fold(f64::INFINITY, f64::min),
            AggFunc::Max => values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            AggFunc::Count => unreachable!(),
        };
        // Integer columns keep integer sums/extrema.
        if column.ty == ColumnType::Integer && func != AggFunc::Mean {
            return Ok(json!(reduced as i64));
        }
        return Ok(float_json(reduced));
    }

    match func {
        AggFunc::Min => Ok(text_extreme(cells, |a, b| a < b)),
        AggFunc::Max => Ok(text_extreme(cells, |a, b| a > b)),
        _ => Err(ToolError::type_mismatch(format!(
            "Cannot apply '{}' to non-numeric column '{}'",
            match func {
                AggFunc::Sum => "sum",
                AggFunc::Mean => "mean",
                _ => unreachable!(),
            },
            column.name
        ))),
    }
}

fn text_extreme(cells: &[&Cell], better: impl Fn(&str, &str) -> bool) -> Value {
    let mut best: Option<String> = None;
    for cell in cells {
        if let Some(text) = cell.display() {
            match &best {
                Some(current) if !better(&text, current) => {}
                _ => best = Some(text),
            }
        }
    }
    best.map(Value::String).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::definitions::data::dataset::tests::{PEOPLE_CSV, write_csv};
    use crate::domains::tools::envelope::envelope_body;

    fn aggregate(group_by: &str, agg_column: &str, agg_func: &str) -> Value {
        let (_dir, path) = write_csv(PEOPLE_CSV);
        let params = DataAggregateParams {
            path: path.to_string_lossy().to_string(),
            group_by: group_by.to_string(),
            agg_column: agg_column.to_string(),
            agg_func: agg_func.to_string(),
        };
        let result = DataAggregateTool::execute(&params, &Config::default());
        envelope_body(&result)
    }

    #[test]
    fn test_aggregate_mean_by_city() {
        let body = aggregate("city", "age", "mean");
        assert_eq!(body["success"], json!(true));
        // Berlin ages 30 and 28.
        assert_eq!(body["result"]["Berlin"], json!(29.0));
        assert_eq!(body["result"]["Paris"], json!(32.0));
        assert_eq!(body["result"]["London"], json!(41.0));
    }

    #[test]
    fn test_aggregate_sum_keeps_integers() {
        let body = aggregate("city", "age", "sum");
        assert_eq!(body["result"]["Berlin"], json!(58));
    }

    #[test]
    fn test_aggregate_count_skips_missing() {
        let body = aggregate("city", "salary", "count");
        // London's only salary is missing.
        assert_eq!(body["result"]["London"], json!(0));
        assert_eq!(body["result"]["Berlin"], json!(2));
        assert_eq!(body["result"]["Paris"], json!(2));
    }

    #[test]
    fn test_aggregate_min_max() {
        let min = aggregate("city", "age", "min");
        let max = aggregate("city", "age", "max");
        assert_eq!(min["result"]["Berlin"], json!(28));
        assert_eq!(max["result"]["Berlin"], json!(30));
    }

    #[test]
    fn test_aggregate_min_on_text_is_lexicographic() {
        let body = aggregate("city", "name", "min");
        assert_eq!(body["result"]["Berlin"], json!("Alice"));
        assert_eq!(body["result"]["Paris"], json!("Carol"));
    }

    #[test]
    fn test_aggregate_sum_on_text_fails() {
        let body = aggregate("city", "name", "sum");
        assert_eq!(body["success"], json!(false));
        assert!(body["error"].as_str().unwrap().contains("name"));
    }

    #[test]
    fn test_aggregate_unknown_function() {
        let body = aggregate("city", "age", "median");
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("Unknown function: median"));
    }

    #[test]
    fn test_aggregate_unknown_function_skips_load() {
        let params = DataAggregateParams {
            path: "/nonexistent/data.csv".to_string(),
            group_by: "city".to_string(),
            agg_column: "age".to_string(),
            agg_func: "mode".to_string(),
        };
        let result = DataAggregateTool::execute(&params, &Config::default());
        let body = envelope_body(&result);
        assert_eq!(body["error"], json!("Unknown function: mode"));
    }

    #[test]
    fn test_aggregate_unknown_column() {
        let body = aggregate("country", "age", "mean");
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("Unknown column: country"));
    }
}
