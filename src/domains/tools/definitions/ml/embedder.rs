//! Sentence embeddings with a BERT encoder.
//!
//! Encodes batches of texts with a sentence-transformers checkpoint and
//! mean-pools token states into fixed-size vectors. Embedders are loaded per
//! call rather than cached; MiniLM loads fast once the hub cache is warm.

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, DTYPE};
use tokenizers::Tokenizer;
use tracing::info;

use super::hub::{fetch_model_files, load_tokenizer};
use crate::domains::tools::error::ToolError;

/// Model loaded when the caller names none.
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// A BERT encoder producing mean-pooled sentence vectors.
pub struct SentenceEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    dimensions: usize,
    device: Device,
}

impl SentenceEmbedder {
    /// Load an embedding checkpoint from the hub.
    pub fn load(model_id: &str) -> Result<Self, ToolError> {
        let files = fetch_model_files(model_id)?;
        let device = Device::Cpu;

        let raw_config = std::fs::read_to_string(&files.config)
            .map_err(|e| ToolError::pipeline(format!("Failed to read config.json: {}", e)))?;
        let config: Config = serde_json::from_str(&raw_config)
            .map_err(|e| ToolError::pipeline(format!("Failed to parse config.json: {}", e)))?;

        let tokenizer = load_tokenizer(&files.tokenizer)?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[files.weights], DTYPE, &device)
                .map_err(|e| ToolError::pipeline(format!("Failed to load weights: {}", e)))?
        };
        let model = BertModel::load(vb, &config)
            .map_err(|e| ToolError::pipeline(format!("Failed to build model: {}", e)))?;

        info!("Embedder loaded ({})", model_id);

        Ok(Self {
            model,
            tokenizer,
            dimensions: config.hidden_size,
            device,
        })
    }

    /// Width of the vectors this embedder produces.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embed a batch of texts, one vector per input, in input order.
    pub fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ToolError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| ToolError::inference(format!("Tokenization failed: {}", e)))?;

        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        // Pad every sequence to the batch max; the attention mask keeps the
        // padding out of the pooled mean.
        let mut input_ids = Vec::with_capacity(texts.len() * max_len);
        let mut attention_mask = Vec::with_capacity(texts.len() * max_len);
        for encoding in &encodings {
            let ids = encoding.get_ids();
            input_ids.extend_from_slice(ids);
            attention_mask.extend_from_slice(encoding.get_attention_mask());
            for _ in ids.len()..max_len {
                input_ids.push(0);
                attention_mask.push(0);
            }
        }

        let shape = (texts.len(), max_len);
        let input_ids = Tensor::from_vec(input_ids, shape, &self.device)?;
        let attention_mask = Tensor::from_vec(attention_mask, shape, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;

        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        // Mean pooling over real tokens: zero out padding states, sum over
        // the sequence axis, divide by each row's token count.
        let mask = attention_mask
            .to_dtype(DType::F32)?
            .unsqueeze(2)?;
        let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
        let counts = mask.sum(1)?.clamp(1e-9, f64::INFINITY)?;
        let pooled = summed.broadcast_div(&counts)?;

        Ok(pooled.to_vec2::<f32>()?)
    }
}
