//! Zero-shot classification tool definition.
//!
//! Classifies a text against caller-supplied candidate labels with an NLI
//! model: each label becomes the hypothesis "This example is {label}." and
//! the entailment logits are softmaxed across the candidates.

use candle_nn::ops::softmax;
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

use super::pipeline::{PipelineCache, PipelineTask};
use crate::domains::tools::envelope::envelope;
use crate::domains::tools::error::ToolError;

/// Parameters for the zero-shot classification tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct MlClassifyParams {
    /// Text to classify.
    pub text: String,
    /// Candidate labels to score the text against.
    pub labels: Vec<String>,
}

/// Zero-shot classification tool - scores a text against arbitrary labels.
pub struct MlClassifyTool;

impl MlClassifyTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "ml_classify";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Classify a text against a caller-supplied list of candidate labels without task-specific training. Returns labels and scores sorted by descending score; scores sum to 1. The first call loads the model; later calls reuse it.";

    /// Execute the tool logic.
    #[instrument(skip_all, fields(labels = params.labels.len()))]
    pub fn execute(params: &MlClassifyParams, pipelines: &PipelineCache) -> CallToolResult {
        info!("Zero-shot classifying against {} labels", params.labels.len());
        envelope(Self::run(params, pipelines))
    }

    fn run(params: &MlClassifyParams, pipelines: &PipelineCache) -> Result<Value, ToolError> {
        if params.labels.is_empty() {
            return Err(ToolError::invalid_arguments(
                "At least one candidate label is required",
            ));
        }

        let pipeline = pipelines.acquire(PipelineTask::ZeroShotClassification, None)?;
        let classifier = pipeline.as_classifier()?;

        let mut logits = Vec::with_capacity(params.labels.len());
        for label in &params.labels {
            let hypothesis = format!("This example is {}.", label);
            logits.push(classifier.entailment_logit(&params.text, &hypothesis)?);
        }

        // One softmax across candidates, not per pair, so the scores form a
        // distribution over the labels.
        let tensor = candle_core::Tensor::new(logits.as_slice(), &candle_core::Device::Cpu)?;
        let probs = softmax(&tensor, 0)?.to_vec1::<f32>()?;

        let mut scored: Vec<(String, f32)> =
            params.labels.iter().cloned().zip(probs).collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let (labels, scores): (Vec<String>, Vec<f32>) = scored.into_iter().unzip();
        Ok(json!({ "labels": labels, "scores": scores }))
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<MlClassifyParams>(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    /// Create a ToolRoute for STDIO transport.
    pub fn create_route<S>(pipelines: Arc<PipelineCache>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        ToolRoute::new_dyn(Self::to_tool(), move |ctx: ToolCallContext<'_, S>| {
            let args = ctx.arguments.clone().unwrap_or_default();
            let pipelines = pipelines.clone();
            async move {
                let params: MlClassifyParams =
                    serde_json::from_value(serde_json::Value::Object(args))
                        .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
                let result =
                    tokio::task::spawn_blocking(move || Self::execute(&params, &pipelines))
                        .await
                        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
                Ok(result)
            }
            .boxed()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::envelope::envelope_body;

    #[test]
    fn test_empty_labels_rejected() {
        let pipelines = PipelineCache::new();
        let params = MlClassifyParams {
            text: "some text".to_string(),
            labels: vec![],
        };

        let result = MlClassifyTool::execute(&params, &pipelines);
        let body = envelope_body(&result);

        assert_eq!(body["success"], json!(false));
        assert!(pipelines.is_empty());
    }

    #[test]
    #[ignore] // Requires model download
    fn test_classify_picks_plausible_label() {
        let pipelines = PipelineCache::new();
        let params = MlClassifyParams {
            text: "The quarterback threw for 300 yards in the championship game."
                .to_string(),
            labels: vec![
                "sports".to_string(),
                "cooking".to_string(),
                "politics".to_string(),
            ],
        };

        let result = MlClassifyTool::execute(&params, &pipelines);
        let body = envelope_body(&result);

        assert_eq!(body["success"], json!(true));
        assert_eq!(body["labels"][0], json!("sports"));

        let scores: Vec<f64> = body["scores"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s.as_f64().unwrap())
            .collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        assert!((scores.iter().sum::<f64>() - 1.0).abs() < 1e-3);
    }
}
