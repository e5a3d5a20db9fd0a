//! HuggingFace Hub model file resolution.
//!
//! All model loaders resolve their files the same way: config, tokenizer,
//! and safetensors weights fetched through the hf-hub cache (first use of a
//! model downloads it; later uses hit the local cache).

use std::path::PathBuf;

use hf_hub::{Repo, RepoType, api::sync::Api};
use tracing::debug;

use crate::domains::tools::error::ToolError;

/// The three files every supported model needs.
pub struct ModelFiles {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

/// Fetch config.json, tokenizer.json, and model.safetensors for a model.
pub fn fetch_model_files(model_id: &str) -> Result<ModelFiles, ToolError> {
    let api = Api::new()
        .map_err(|e| ToolError::pipeline(format!("Hub client init failed: {}", e)))?;
    let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

    let get = |file: &str| {
        repo.get(file).map_err(|e| {
            ToolError::pipeline(format!("Failed to fetch {} for {}: {}", file, model_id, e))
        })
    };

    let files = ModelFiles {
        config: get("config.json")?,
        tokenizer: get("tokenizer.json")?,
        weights: get("model.safetensors")?,
    };
    debug!("Resolved model files for {}", model_id);
    Ok(files)
}

/// Load a tokenizer from a resolved file path.
pub fn load_tokenizer(path: &std::path::Path) -> Result<tokenizers::Tokenizer, ToolError> {
    tokenizers::Tokenizer::from_file(path)
        .map_err(|e| ToolError::pipeline(format!("Failed to load tokenizer: {}", e)))
}
