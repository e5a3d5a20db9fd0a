//! Tool-specific error types.
//!
//! Every tool operation normalizes its faults into one of these variants
//! before the result crosses the dispatcher boundary, so callers always see
//! the uniform success/error envelope instead of a raw fault.

use thiserror::Error;

/// Errors that can occur during tool operations.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool name matched no registered tool.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A filter operator outside the recognized set.
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    /// An aggregation function outside the recognized set.
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Invalid or missing arguments were provided to the tool.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The dataset could not be read or parsed.
    #[error("Failed to load dataset: {0}")]
    Load(String),

    /// A referenced column does not exist in the dataset.
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// A value could not be compared or reduced with the column's type.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// An inference pipeline could not be constructed or loaded.
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// Inference over a loaded pipeline failed at runtime.
    #[error("Inference failed: {0}")]
    Inference(String),
}

impl ToolError {
    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create a new load error.
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Create a new type mismatch error.
    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        Self::TypeMismatch(msg.into())
    }

    /// Create a new pipeline error.
    pub fn pipeline(msg: impl Into<String>) -> Self {
        Self::Pipeline(msg.into())
    }

    /// Create a new inference error.
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }
}

impl From<csv::Error> for ToolError {
    fn from(e: csv::Error) -> Self {
        Self::Load(e.to_string())
    }
}

impl From<candle_core::Error> for ToolError {
    fn from(e: candle_core::Error) -> Self {
        Self::Inference(e.to_string())
    }
}
