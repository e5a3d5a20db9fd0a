//! Dataset correlate tool definition.
//!
//! Computes the pairwise Pearson correlation matrix over the numeric columns
//! of a dataset.

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

use super::dataset::{Dataset, float_json};
use crate::core::config::Config;
use crate::core::security::validate_dataset_path;
use crate::domains::tools::envelope::envelope;
use crate::domains::tools::error::ToolError;

/// Parameters for the dataset correlate tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DataCorrelateParams {
    /// Path to the CSV file.
    pub path: String,
}

/// Dataset correlate tool - Pearson correlation matrix of numeric columns.
pub struct DataCorrelateTool;

impl DataCorrelateTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "data_correlate";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Calculate the pairwise Pearson correlation matrix for the numeric columns of a dataset. Undefined correlations (e.g. zero-variance columns) are reported as null.";

    /// Execute the tool logic.
    #[instrument(skip_all, fields(path = %params.path))]
    pub fn execute(params: &DataCorrelateParams, config: &Config) -> CallToolResult {
        info!("Correlating numeric columns of {}", params.path);
        envelope(Self::run(params, config))
    }

    fn run(params: &DataCorrelateParams, config: &Config) -> Result<Value, ToolError> {
        let path = validate_dataset_path(&params.path, config)
            .map_err(|e| ToolError::load(e.to_string()))?;

        let dataset = Dataset::load(&path, None)?;

        // Pairwise-complete observations: a row contributes to corr(a, b)
        // only when both cells are present.
        let numeric: Vec<(&str, Vec<Option<f64>>)> = dataset
            .columns()
            .iter()
            .filter(|c| c.ty.is_numeric())
            .map(|c| {
                let values = c.cells.iter().map(|cell| cell.as_f64()).collect();
                (c.name.as_str(), values)
            })
            .collect();

        let n = numeric.len();
        let mut matrix = vec![vec![f64::NAN; n]; n];
        for i in 0..n {
            for j in i..n {
                let r = if i == j {
                    // Exact unit diagonal for any column with nonzero variance.
                    if variance_is_nonzero(&numeric[i].1) {
                        1.0
                    } else {
                        f64::NAN
                    }
                } else {
                    pearson(&numeric[i].1, &numeric[j].1)
                };
                matrix[i][j] = r;
                matrix[j][i] = r;
            }
        }

        let correlation: Map<String, Value> = numeric
            .iter()
            .enumerate()
            .map(|(i, (name, _))| {
                let row: Map<String, Value> = numeric
                    .iter()
                    .enumerate()
                    .map(|(j, (other, _))| (other.to_string(), float_json(matrix[i][j])))
                    .collect();
                (name.to_string(), Value::Object(row))
            })
            .collect();

        Ok(json!({ "correlation": correlation }))
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<DataCorrelateParams>(),
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
                let params: DataCorrelateParams =
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

fn variance_is_nonzero(values: &[Option<f64>]) -> bool {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.len() < 2 {
        return false;
    }
    let mean = present.iter().sum::<f64>() / present.len() as f64;
    present.iter().any(|v| (v - mean).abs() > 0.0)
}

/// Pearson correlation over rows where both series have values. NaN when
/// undefined (fewer than two complete pairs, or zero variance on a side).
fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();

    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    cov / (var_x.sqrt() * var_y.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::definitions::data::dataset::tests::write_csv;
    use crate::domains::tools::envelope::envelope_body;

    fn correlate(csv: &str) -> Value {
        let (_dir, path) = write_csv(csv);
        let params = DataCorrelateParams {
            path: path.to_string_lossy().to_string(),
        };
        let result = DataCorrelateTool::execute(&params, &Config::default());
        envelope_body(&result)
    }

    const LINEAR_CSV: &str = "\
x,y,z,label
1,2,9,a
2,4,7,b
3,6,5,c
4,8,3,d";

    #[test]
    fn test_correlate_perfect_correlation() {
        let body = correlate(LINEAR_CSV);
        assert_eq!(body["success"], json!(true));

        let corr = &body["correlation"];
        // y = 2x exactly; z decreases linearly in x.
        assert!((corr["x"]["y"].as_f64().unwrap() - 1.0).abs() < 1e-9);
        assert!((corr["x"]["z"].as_f64().unwrap() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_correlate_excludes_text_columns() {
        let body = correlate(LINEAR_CSV);
        let corr = body["correlation"].as_object().unwrap();
        assert!(!corr.contains_key("label"));
        assert_eq!(corr.len(), 3);
    }

    #[test]
    fn test_correlate_diagonal_is_exactly_one() {
        let body = correlate(LINEAR_CSV);
        let corr = &body["correlation"];
        for col in ["x", "y", "z"] {
            assert_eq!(corr[col][col], json!(1.0));
        }
    }

    #[test]
    fn test_correlate_is_symmetric() {
        let body = correlate(LINEAR_CSV);
        let corr = &body["correlation"];
        for a in ["x", "y", "z"] {
            for b in ["x", "y", "z"] {
                assert_eq!(corr[a][b], corr[b][a]);
            }
        }
    }

    #[test]
    fn test_correlate_zero_variance_is_null() {
        let body = correlate("x,c\n1,5\n2,5\n3,5");
        let corr = &body["correlation"];
        // Constant column: undefined against everything, itself included.
        assert_eq!(corr["c"]["c"], Value::Null);
        assert_eq!(corr["x"]["c"], Value::Null);
        assert_eq!(corr["x"]["x"], json!(1.0));
    }

    #[test]
    fn test_correlate_missing_file_fails() {
        let params = DataCorrelateParams {
            path: "/nonexistent/data.csv".to_string(),
        };
        let result = DataCorrelateTool::execute(&params, &Config::default());
        let body = envelope_body(&result);
        assert_eq!(body["success"], json!(false));
    }
}
