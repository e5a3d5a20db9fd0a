//! DistilBERT sequence classification.
//!
//! Loads a finetuned DistilBERT checkpoint (encoder plus the
//! `pre_classifier`/`classifier` head) and scores single texts or
//! premise/hypothesis pairs. Serves both the sentiment pipeline (SST-2
//! head) and the zero-shot pipeline (MNLI head, queried per candidate
//! label).

use candle_core::{DType, Device, Tensor};
use candle_nn::{Linear, Module, VarBuilder, ops::softmax};
use candle_transformers::models::distilbert::{Config, DTYPE, DistilBertModel};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use super::hub::{fetch_model_files, load_tokenizer};
use crate::domains::tools::error::ToolError;

/// A DistilBERT classifier with its label set.
pub struct TextClassifier {
    model: DistilBertModel,
    pre_classifier: Linear,
    classifier: Linear,
    labels: Vec<String>,
    tokenizer: Tokenizer,
    device: Device,
}

impl TextClassifier {
    /// Load a classifier checkpoint from the hub.
    pub fn load(model_id: &str) -> Result<Self, ToolError> {
        let files = fetch_model_files(model_id)?;
        let device = Device::Cpu;

        let raw_config = std::fs::read_to_string(&files.config)
            .map_err(|e| ToolError::pipeline(format!("Failed to read config.json: {}", e)))?;
        let config: Config = serde_json::from_str(&raw_config)
            .map_err(|e| ToolError::pipeline(format!("Failed to parse config.json: {}", e)))?;
        // The head dimensions come from the raw JSON; the candle config does
        // not expose them.
        let labels = parse_labels(&raw_config)?;
        let dim = parse_hidden_dim(&raw_config)?;
        debug!("Classifier labels: {:?} (dim {})", labels, dim);

        let tokenizer = load_tokenizer(&files.tokenizer)?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[files.weights], DTYPE, &device)
                .map_err(|e| ToolError::pipeline(format!("Failed to load weights: {}", e)))?
        };

        let model = DistilBertModel::load(vb.clone(), &config)
            .map_err(|e| ToolError::pipeline(format!("Failed to build encoder: {}", e)))?;
        let pre_classifier = candle_nn::linear(dim, dim, vb.pp("pre_classifier"))
            .map_err(|e| ToolError::pipeline(format!("Failed to load head: {}", e)))?;
        let classifier = candle_nn::linear(dim, labels.len(), vb.pp("classifier"))
            .map_err(|e| ToolError::pipeline(format!("Failed to load head: {}", e)))?;

        info!("Classifier loaded ({})", model_id);

        Ok(Self {
            model,
            pre_classifier,
            classifier,
            labels,
            tokenizer,
            device,
        })
    }

    /// Class probabilities for a single text, paired with their labels and
    /// sorted by descending score.
    pub fn predict(&self, text: &str) -> Result<Vec<(String, f32)>, ToolError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| ToolError::inference(format!("Tokenization failed: {}", e)))?;
        let probs = self.class_probabilities(encoding.get_ids())?;

        let mut scored: Vec<(String, f32)> = self
            .labels
            .iter()
            .cloned()
            .zip(probs)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(scored)
    }

    /// Raw logit of the entailment class for a premise/hypothesis pair.
    ///
    /// Zero-shot classification softmaxes these logits across candidate
    /// labels, so the caller needs the logit rather than the within-pair
    /// probability.
    pub fn entailment_logit(&self, premise: &str, hypothesis: &str) -> Result<f32, ToolError> {
        let encoding = self
            .tokenizer
            .encode((premise, hypothesis), true)
            .map_err(|e| ToolError::inference(format!("Tokenization failed: {}", e)))?;
        let logits = self.logits(encoding.get_ids())?;

        let index = self
            .labels
            .iter()
            .position(|l| l.to_lowercase().contains("entail"))
            .ok_or_else(|| {
                ToolError::pipeline("Model has no entailment label; not an NLI checkpoint")
            })?;
        Ok(logits[index])
    }

    fn logits(&self, token_ids: &[u32]) -> Result<Vec<f32>, ToolError> {
        let seq_len = token_ids.len();
        let input_ids = Tensor::new(token_ids, &self.device)?.unsqueeze(0)?;
        // Bidirectional attention: nothing is masked out.
        let mask = Tensor::zeros((seq_len, seq_len), DType::U8, &self.device)?;

        let hidden = self.model.forward(&input_ids, &mask)?;
        // Classification reads the [CLS] position.
        let cls = hidden.narrow(1, 0, 1)?.squeeze(1)?;
        let pooled = self.pre_classifier.forward(&cls)?.relu()?;
        let logits = self.classifier.forward(&pooled)?.squeeze(0)?;
        Ok(logits.to_vec1::<f32>()?)
    }

    fn class_probabilities(&self, token_ids: &[u32]) -> Result<Vec<f32>, ToolError> {
        let logits = self.logits(token_ids)?;
        let tensor = Tensor::new(logits.as_slice(), &self.device)?;
        let probs = softmax(&tensor, 0)?;
        Ok(probs.to_vec1::<f32>()?)
    }
}

/// Extract the ordered label names from a checkpoint's `id2label` mapping.
fn parse_labels(raw_config: &str) -> Result<Vec<String>, ToolError> {
    let value: serde_json::Value = serde_json::from_str(raw_config)
        .map_err(|e| ToolError::pipeline(format!("Failed to parse config.json: {}", e)))?;
    let id2label = value
        .get("id2label")
        .and_then(|v| v.as_object())
        .ok_or_else(|| ToolError::pipeline("config.json has no id2label mapping"))?;

    let mut labels: Vec<(usize, String)> = id2label
        .iter()
        .filter_map(|(id, label)| {
            let index = id.parse::<usize>().ok()?;
            Some((index, label.as_str()?.to_string()))
        })
        .collect();
    labels.sort_by_key(|(index, _)| *index);
    Ok(labels.into_iter().map(|(_, label)| label).collect())
}

/// Extract the encoder hidden size from a checkpoint's config.
fn parse_hidden_dim(raw_config: &str) -> Result<usize, ToolError> {
    let value: serde_json::Value = serde_json::from_str(raw_config)
        .map_err(|e| ToolError::pipeline(format!("Failed to parse config.json: {}", e)))?;
    value
        .get("dim")
        .and_then(|v| v.as_u64())
        .map(|v| v as usize)
        .ok_or_else(|| ToolError::pipeline("config.json has no dim field"))
}
