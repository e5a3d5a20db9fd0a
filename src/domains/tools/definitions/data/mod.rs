//! Tabular data tools.
//!
//! Five tools over an ephemeral CSV-backed dataset, one file per tool, plus
//! the shared `dataset` model. All tool names carry the `data_` prefix used
//! by the dispatcher.

pub mod aggregate;
pub mod correlate;
pub mod dataset;
pub mod describe;
pub mod filter;
pub mod preview;

pub use aggregate::{DataAggregateParams, DataAggregateTool};
pub use correlate::{DataCorrelateParams, DataCorrelateTool};
pub use describe::{DataDescribeParams, DataDescribeTool};
pub use filter::{DataFilterParams, DataFilterTool};
pub use preview::{DataPreviewParams, DataPreviewTool};

use rmcp::model::CallToolResult;
use serde_json::Value;

use crate::core::config::Config;
use crate::domains::tools::envelope::{failure_envelope, parse_params};
use crate::domains::tools::error::ToolError;

/// Dispatch a `data_`-prefixed tool call by name.
///
/// A prefix match with no such operation is an unknown tool, reported
/// through the failure envelope without loading anything.
pub fn dispatch(name: &str, arguments: Value, config: &Config) -> CallToolResult {
    match name {
        DataPreviewTool::NAME => match parse_params::<DataPreviewParams>(arguments) {
            Ok(params) => DataPreviewTool::execute(&params, config),
            Err(e) => failure_envelope(e),
        },
        DataDescribeTool::NAME => match parse_params::<DataDescribeParams>(arguments) {
            Ok(params) => DataDescribeTool::execute(&params, config),
            Err(e) => failure_envelope(e),
        },
        DataFilterTool::NAME => match parse_params::<DataFilterParams>(arguments) {
            Ok(params) => DataFilterTool::execute(&params, config),
            Err(e) => failure_envelope(e),
        },
        DataAggregateTool::NAME => match parse_params::<DataAggregateParams>(arguments) {
            Ok(params) => DataAggregateTool::execute(&params, config),
            Err(e) => failure_envelope(e),
        },
        DataCorrelateTool::NAME => match parse_params::<DataCorrelateParams>(arguments) {
            Ok(params) => DataCorrelateTool::execute(&params, config),
            Err(e) => failure_envelope(e),
        },
        _ => failure_envelope(ToolError::UnknownTool(name.to_string())),
    }
}
