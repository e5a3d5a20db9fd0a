//! Dataset filter tool definition.
//!
//! Evaluates a per-row boolean predicate against one column. Comparisons use
//! the column's inferred type; `contains` coerces both sides to text.

use std::cmp::Ordering;

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

use super::dataset::{Cell, Column, Dataset};
use crate::core::config::Config;
use crate::core::security::validate_dataset_path;
use crate::domains::tools::envelope::envelope;
use crate::domains::tools::error::ToolError;

/// Number of matching rows included in the result preview.
const MATCH_PREVIEW_ROWS: usize = 10;

/// Parameters for the dataset filter tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DataFilterParams {
    /// Path to the CSV file.
    pub path: String,

    /// Column to filter on.
    pub column: String,

    /// Comparison operator: eq, ne, gt, lt, gte, lte, or contains.
    pub operator: String,

    /// Value to compare against.
    #[serde(default)]
    pub value: Value,
}

/// Recognized filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
    Contains,
}

impl FilterOp {
    /// Parse an operator name. Unknown names are a validation failure that
    /// must short-circuit before any dataset load.
    fn parse(name: &str) -> Result<Self, ToolError> {
        match name {
            "eq" => Ok(Self::Eq),
            "ne" => Ok(Self::Ne),
            "gt" => Ok(Self::Gt),
            "lt" => Ok(Self::Lt),
            "gte" => Ok(Self::Gte),
            "lte" => Ok(Self::Lte),
            "contains" => Ok(Self::Contains),
            other => Err(ToolError::UnknownOperator(other.to_string())),
        }
    }

    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Gt => ordering == Ordering::Greater,
            Self::Lt => ordering == Ordering::Less,
            Self::Gte => ordering != Ordering::Less,
            Self::Lte => ordering != Ordering::Greater,
            Self::Contains => unreachable!("contains is not an ordering operator"),
        }
    }
}

/// Dataset filter tool - selects rows matching a column predicate.
pub struct DataFilterTool;

impl DataFilterTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "data_filter";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Filter a dataset by a column condition. Supports eq, ne, gt, lt, gte, lte, and contains. Returns original and filtered row counts plus the first matching rows.";

    /// Execute the tool logic.
    #[instrument(skip_all, fields(path = %params.path, column = %params.column, operator = %params.operator))]
    pub fn execute(params: &DataFilterParams, config: &Config) -> CallToolResult {
        info!(
            "Filtering dataset {} on {} {} {:?}",
            params.path, params.column, params.operator, params.value
        );
        envelope(Self::run(params, config))
    }

    fn run(params: &DataFilterParams, config: &Config) -> Result<Value, ToolError> {
        // Operator validation happens before the dataset is touched.
        let op = FilterOp::parse(&params.operator)?;

        let path = validate_dataset_path(&params.path, config)
            .map_err(|e| ToolError::load(e.to_string()))?;

        let dataset = Dataset::load(&path, None)?;
        let column = dataset.column(&params.column)?;

        let predicate = build_predicate(op, column, &params.value)?;
        let matches: Vec<usize> = column
            .cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| predicate(cell))
            .map(|(row, _)| row)
            .collect();

        Ok(json!({
            "original_rows": dataset.row_count(),
            "filtered_rows": matches.len(),
            "preview": dataset.records(matches.into_iter().take(MATCH_PREVIEW_ROWS)),
        }))
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<DataFilterParams>(),
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
                let params: DataFilterParams =
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

/// Build the per-cell predicate for an operator, column, and comparison
/// value. A missing cell is unequal to every value, so it matches `ne` and
/// nothing else.
fn build_predicate<'a>(
    op: FilterOp,
    column: &Column,
    value: &'a Value,
) -> Result<Box<dyn Fn(&Cell) -> bool + 'a>, ToolError> {
    if op == FilterOp::Contains {
        let needle = value_as_text(value);
        return Ok(Box::new(move |cell| {
            cell.display().is_some_and(|text| text.contains(&needle))
        }));
    }

    if value.is_null() {
        return Err(ToolError::invalid_arguments(format!(
            "Missing 'value' for operator '{}'",
            operator_name(op)
        )));
    }

    if column.ty.is_numeric() {
        let target = value.as_f64().ok_or_else(|| {
            ToolError::type_mismatch(format!(
                "Column '{}' is numeric but value {} is not",
                column.name, value
            ))
        })?;
        Ok(Box::new(move |cell| match cell.as_f64() {
            Some(v) => op.accepts(v.total_cmp(&target)),
            None => op == FilterOp::Ne,
        }))
    } else {
        let target = value_as_text(value);
        Ok(Box::new(move |cell| match cell {
            Cell::Str(v) => op.accepts(v.as_str().cmp(target.as_str())),
            _ => op == FilterOp::Ne,
        }))
    }
}

/// Coerce a JSON value to the text used for string comparison.
fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn operator_name(op: FilterOp) -> &'static str {
    match op {
        FilterOp::Eq => "eq",
        FilterOp::Ne => "ne",
        FilterOp::Gt => "gt",
        FilterOp::Lt => "lt",
        FilterOp::Gte => "gte",
        FilterOp::Lte => "lte",
        FilterOp::Contains => "contains",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::definitions::data::dataset::tests::{PEOPLE_CSV, write_csv};
    use crate::domains::tools::envelope::envelope_body;

    fn filter(column: &str, operator: &str, value: Value) -> Value {
        let (_dir, path) = write_csv(PEOPLE_CSV);
        let params = DataFilterParams {
            path: path.to_string_lossy().to_string(),
            column: column.to_string(),
            operator: operator.to_string(),
            value,
        };
        let result = DataFilterTool::execute(&params, &Config::default());
        envelope_body(&result)
    }

    #[test]
    fn test_filter_gt_numeric() {
        let body = filter("age", "gt", json!(30));
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["original_rows"], json!(5));
        // Ages above 30: 35 and 41.
        assert_eq!(body["filtered_rows"], json!(2));
        assert_eq!(body["preview"][0]["name"], json!("Carol"));
    }

    #[test]
    fn test_filter_eq_string() {
        let body = filter("city", "eq", json!("Berlin"));
        assert_eq!(body["filtered_rows"], json!(2));
    }

    #[test]
    fn test_filter_ne_string() {
        let body = filter("city", "ne", json!("Berlin"));
        assert_eq!(body["filtered_rows"], json!(3));
    }

    #[test]
    fn test_filter_lte_numeric() {
        let body = filter("age", "lte", json!(30));
        assert_eq!(body["filtered_rows"], json!(3));
    }

    #[test]
    fn test_filter_contains() {
        let body = filter("city", "contains", json!("erl"));
        assert_eq!(body["filtered_rows"], json!(2));
    }

    #[test]
    fn test_filter_contains_is_case_sensitive() {
        let body = filter("city", "contains", json!("berlin"));
        assert_eq!(body["filtered_rows"], json!(0));
    }

    #[test]
    fn test_filter_missing_cell_skipped_by_ordering_ops() {
        // Dave's salary is missing; a wide-open gte must not count it.
        let body = filter("salary", "gte", json!(0));
        assert_eq!(body["filtered_rows"], json!(4));
    }

    #[test]
    fn test_filter_ne_counts_missing_numeric_cell() {
        // A missing salary is unequal to 52000, so Dave's row is included
        // along with Bob, Carol, and Eve.
        let body = filter("salary", "ne", json!(52000));
        assert_eq!(body["filtered_rows"], json!(4));
    }

    #[test]
    fn test_filter_ne_counts_missing_string_cell() {
        let (_dir, path) = write_csv("name,team\nAlice,red\nBob,\nCarol,blue");
        let params = DataFilterParams {
            path: path.to_string_lossy().to_string(),
            column: "team".to_string(),
            operator: "ne".to_string(),
            value: json!("red"),
        };
        let result = DataFilterTool::execute(&params, &Config::default());
        let body = envelope_body(&result);
        // Bob's missing team is unequal to "red".
        assert_eq!(body["filtered_rows"], json!(2));

        // The other operators still skip the missing cell.
        let params = DataFilterParams {
            operator: "eq".to_string(),
            value: json!("blue"),
            ..params
        };
        let result = DataFilterTool::execute(&params, &Config::default());
        let body = envelope_body(&result);
        assert_eq!(body["filtered_rows"], json!(1));
    }

    #[test]
    fn test_filter_unknown_operator() {
        let body = filter("age", "between", json!(30));
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("Unknown operator: between"));
    }

    #[test]
    fn test_filter_unknown_operator_skips_load() {
        // Unknown operator must be reported even when the path is bogus,
        // proving validation precedes the load.
        let params = DataFilterParams {
            path: "/nonexistent/data.csv".to_string(),
            column: "age".to_string(),
            operator: "approx".to_string(),
            value: json!(30),
        };
        let result = DataFilterTool::execute(&params, &Config::default());
        let body = envelope_body(&result);
        assert_eq!(body["error"], json!("Unknown operator: approx"));
    }

    #[test]
    fn test_filter_unknown_column() {
        let body = filter("height", "gt", json!(1));
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("Unknown column: height"));
    }

    #[test]
    fn test_filter_type_mismatch() {
        let body = filter("age", "gt", json!("thirty"));
        assert_eq!(body["success"], json!(false));
        assert!(body["error"].as_str().unwrap().contains("age"));
    }

    #[test]
    fn test_filter_counts_are_consistent() {
        for op in ["eq", "ne", "gt", "lt", "gte", "lte"] {
            let body = filter("age", op, json!(30));
            let original = body["original_rows"].as_u64().unwrap();
            let filtered = body["filtered_rows"].as_u64().unwrap();
            assert!(filtered <= original, "op {}: {} > {}", op, filtered, original);
        }
    }
}
