//! T5 abstractive summarization.
//!
//! Wraps a T5 conditional-generation checkpoint behind the `summarize:`
//! task prefix and decodes greedily. The decoder keeps a KV cache between
//! steps, so generation takes the model lock for its whole run.

use std::sync::Mutex;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::t5::{self, T5ForConditionalGeneration};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use super::hub::{fetch_model_files, load_tokenizer};
use crate::domains::tools::error::ToolError;

/// Shortest summary emitted, in generated tokens.
const MIN_SUMMARY_TOKENS: usize = 30;

/// A T5 summarization pipeline.
pub struct Summarizer {
    model: Mutex<T5ForConditionalGeneration>,
    tokenizer: Tokenizer,
    config: t5::Config,
    device: Device,
}

impl Summarizer {
    /// Load a summarization checkpoint from the hub.
    pub fn load(model_id: &str) -> Result<Self, ToolError> {
        let files = fetch_model_files(model_id)?;
        let device = Device::Cpu;

        let raw_config = std::fs::read_to_string(&files.config)
            .map_err(|e| ToolError::pipeline(format!("Failed to read config.json: {}", e)))?;
        let config: t5::Config = serde_json::from_str(&raw_config)
            .map_err(|e| ToolError::pipeline(format!("Failed to parse config.json: {}", e)))?;

        let tokenizer = load_tokenizer(&files.tokenizer)?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[files.weights], DType::F32, &device)
                .map_err(|e| ToolError::pipeline(format!("Failed to load weights: {}", e)))?
        };
        let model = T5ForConditionalGeneration::load(vb, &config)
            .map_err(|e| ToolError::pipeline(format!("Failed to build model: {}", e)))?;

        info!("Summarizer loaded ({})", model_id);

        Ok(Self {
            model: Mutex::new(model),
            tokenizer,
            config,
            device,
        })
    }

    /// Summarize a text, generating at most `max_tokens` tokens.
    pub fn summarize(&self, text: &str, max_tokens: usize) -> Result<String, ToolError> {
        let prompt = format!("summarize: {}", text);
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| ToolError::inference(format!("Tokenization failed: {}", e)))?;
        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;

        let mut model = self.model.lock().expect("summarizer lock poisoned");
        model.clear_kv_cache();

        let encoder_output = model.encode(&input_ids)?;

        let start_id = self
            .config
            .decoder_start_token_id
            .unwrap_or(self.config.pad_token_id) as u32;
        let eos_id = self.config.eos_token_id as u32;
        let mut output_ids = vec![start_id];

        // Greedy decode. EOS is suppressed until the minimum length so short
        // inputs still yield a sentence rather than an empty string.
        for step in 0.. {
            let generated = output_ids.len() - 1;
            if generated >= max_tokens {
                break;
            }

            let decoder_ids = if step == 0 || !self.config.use_cache {
                Tensor::new(output_ids.as_slice(), &self.device)?.unsqueeze(0)?
            } else {
                let last = *output_ids.last().unwrap();
                Tensor::new(&[last], &self.device)?.unsqueeze(0)?
            };

            let logits = model.decode(&decoder_ids, &encoder_output)?.squeeze(0)?;
            let mut scores = logits.to_vec1::<f32>()?;
            if generated < MIN_SUMMARY_TOKENS.min(max_tokens.saturating_sub(1)) {
                scores[eos_id as usize] = f32::NEG_INFINITY;
            }

            let next = argmax(&scores);
            if next == eos_id {
                break;
            }
            output_ids.push(next);
        }

        debug!("Generated {} summary tokens", output_ids.len() - 1);

        let summary = self
            .tokenizer
            .decode(&output_ids[1..], true)
            .map_err(|e| ToolError::inference(format!("Decoding failed: {}", e)))?;
        Ok(summary.trim().to_string())
    }
}

fn argmax(scores: &[f32]) -> u32 {
    let mut best = 0;
    for (i, score) in scores.iter().enumerate() {
        if *score > scores[best] {
            best = i;
        }
    }
    best as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_picks_largest() {
        assert_eq!(argmax(&[0.1, 3.0, -2.0, 1.5]), 1);
        assert_eq!(argmax(&[f32::NEG_INFINITY, -1.0]), 1);
    }

    #[test]
    #[ignore] // Requires model download
    fn test_summarize_long_text() {
        let summarizer = Summarizer::load("t5-small").unwrap();
        let text = "The James Webb Space Telescope is the largest optical telescope in \
                    space. Its high resolution and sensitivity allow it to view objects \
                    too old, distant, or faint for the Hubble Space Telescope. This \
                    enables investigations across many fields of astronomy and cosmology, \
                    such as observation of the first stars and the formation of the first \
                    galaxies, and detailed atmospheric characterization of potentially \
                    habitable exoplanets.";

        let summary = summarizer.summarize(text, 150).unwrap();
        assert!(!summary.is_empty());
        assert!(summary.len() < text.len());
    }

    #[test]
    #[ignore] // Requires model download
    fn test_summarize_respects_token_budget() {
        let summarizer = Summarizer::load("t5-small").unwrap();
        let summary = summarizer
            .summarize("A short note about nothing in particular.", 40)
            .unwrap();
        let token_count = summarizer
            .tokenizer
            .encode(summary, false)
            .unwrap()
            .get_ids()
            .len();
        assert!(token_count <= 40);
    }
}
