//! Tool definitions module.
//!
//! This module exports all available tool definitions, grouped by domain
//! prefix. Each tool is defined in its own file for better maintainability.

pub mod data;
pub mod ml;

pub use data::{
    DataAggregateParams, DataAggregateTool, DataCorrelateParams, DataCorrelateTool,
    DataDescribeParams, DataDescribeTool, DataFilterParams, DataFilterTool, DataPreviewParams,
    DataPreviewTool,
};
pub use ml::{
    MlClassifyParams, MlClassifyTool, MlEmbeddingsParams, MlEmbeddingsTool, MlSentimentParams,
    MlSentimentTool, MlSummarizeParams, MlSummarizeTool, Pipeline, PipelineCache, PipelineKey,
    PipelineTask,
};
