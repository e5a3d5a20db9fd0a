//! Inference pipeline cache.
//!
//! Pipelines are expensive to construct (first use may download weights),
//! so they are memoized process-wide, keyed by `(task, model)`. Construction
//! is single-flight per key: the map lock is held only long enough to fetch
//! or insert the key's cell, and the cell itself serializes construction, so
//! concurrent acquisitions of different keys never block each other. There
//! is no eviction; reuse, not reclamation, is the goal at this tool's call
//! volume.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use once_cell::sync::OnceCell;
use tracing::info;

use super::classifier::TextClassifier;
use super::summarizer::Summarizer;
use crate::domains::tools::error::ToolError;

/// Model key component used when the caller names no model.
pub const DEFAULT_MODEL_KEY: &str = "default";

/// Inference tasks served through the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineTask {
    SentimentAnalysis,
    Summarization,
    ZeroShotClassification,
}

impl PipelineTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SentimentAnalysis => "sentiment-analysis",
            Self::Summarization => "summarization",
            Self::ZeroShotClassification => "zero-shot-classification",
        }
    }

    /// Model loaded when the caller names none.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::SentimentAnalysis => "distilbert-base-uncased-finetuned-sst-2-english",
            Self::Summarization => "t5-small",
            Self::ZeroShotClassification => "typeform/distilbert-base-uncased-mnli",
        }
    }
}

/// Memoization key. The model component is the verbatim caller-supplied
/// name, or the `"default"` sentinel, so an explicitly named default model
/// and an omitted one are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    task: PipelineTask,
    model: String,
}

impl PipelineKey {
    pub fn new(task: PipelineTask, model: Option<&str>) -> Self {
        Self {
            task,
            model: model.unwrap_or(DEFAULT_MODEL_KEY).to_string(),
        }
    }
}

/// A loaded inference pipeline bound to a task.
pub enum Pipeline {
    Classifier(TextClassifier),
    Summarizer(Summarizer),
}

impl Pipeline {
    /// Construct the pipeline for a task, loading the named model or the
    /// task's default.
    fn load(task: PipelineTask, model: Option<&str>) -> Result<Self, ToolError> {
        let model_id = model.unwrap_or_else(|| task.default_model());
        info!("Loading {} pipeline (model {})", task.as_str(), model_id);
        match task {
            PipelineTask::SentimentAnalysis | PipelineTask::ZeroShotClassification => {
                Ok(Self::Classifier(TextClassifier::load(model_id)?))
            }
            PipelineTask::Summarization => Ok(Self::Summarizer(Summarizer::load(model_id)?)),
        }
    }

    pub fn as_classifier(&self) -> Result<&TextClassifier, ToolError> {
        match self {
            Self::Classifier(c) => Ok(c),
            _ => Err(ToolError::pipeline("Pipeline is not a classifier")),
        }
    }

    pub fn as_summarizer(&self) -> Result<&Summarizer, ToolError> {
        match self {
            Self::Summarizer(s) => Ok(s),
            _ => Err(ToolError::pipeline("Pipeline is not a summarizer")),
        }
    }
}

/// Process-wide cache of loaded pipelines.
///
/// Generic over the stored pipeline type so the keying and single-flight
/// behavior can be exercised without loading real models.
pub struct PipelineCache<P = Pipeline> {
    slots: Mutex<HashMap<PipelineKey, Arc<OnceCell<Arc<P>>>>>,
}

impl<P> PipelineCache<P> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Get or construct the pipeline for a key using the given builder.
    ///
    /// The builder runs at most once per key across all threads; concurrent
    /// acquirers of the same uncached key wait on the key's cell, not on the
    /// whole cache.
    pub fn acquire_with<F>(
        &self,
        task: PipelineTask,
        model: Option<&str>,
        build: F,
    ) -> Result<Arc<P>, ToolError>
    where
        F: FnOnce() -> Result<P, ToolError>,
    {
        let key = PipelineKey::new(task, model);
        let cell = {
            let mut slots = self.slots.lock().expect("pipeline cache lock poisoned");
            slots.entry(key).or_default().clone()
        };
        cell.get_or_try_init(|| build().map(Arc::new))
            .map(Arc::clone)
    }

    /// Number of keys with a slot (cached or mid-construction).
    pub fn len(&self) -> usize {
        self.slots.lock().expect("pipeline cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<P> Default for PipelineCache<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineCache<Pipeline> {
    /// Get or construct the real pipeline for `(task, model)`.
    pub fn acquire(
        &self,
        task: PipelineTask,
        model: Option<&str>,
    ) -> Result<Arc<Pipeline>, ToolError> {
        self.acquire_with(task, model, || Pipeline::load(task, model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_same_key_returns_same_instance() {
        let cache: PipelineCache<u32> = PipelineCache::new();
        let builds = AtomicUsize::new(0);

        let a = cache
            .acquire_with(PipelineTask::SentimentAnalysis, None, || {
                builds.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            })
            .unwrap();
        let b = cache
            .acquire_with(PipelineTask::SentimentAnalysis, None, || {
                builds.fetch_add(1, Ordering::SeqCst);
                Ok(8)
            })
            .unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_models_are_distinct_keys() {
        let cache: PipelineCache<u32> = PipelineCache::new();

        let default = cache
            .acquire_with(PipelineTask::SentimentAnalysis, None, || Ok(1))
            .unwrap();
        let named = cache
            .acquire_with(PipelineTask::SentimentAnalysis, Some("custom-model"), || {
                Ok(2)
            })
            .unwrap();

        assert!(!Arc::ptr_eq(&default, &named));
        assert_eq!(*default, 1);
        assert_eq!(*named, 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_explicit_default_sentinel_matches_omitted_model() {
        let cache: PipelineCache<u32> = PipelineCache::new();

        let omitted = cache
            .acquire_with(PipelineTask::Summarization, None, || Ok(1))
            .unwrap();
        let explicit = cache
            .acquire_with(PipelineTask::Summarization, Some(DEFAULT_MODEL_KEY), || {
                Ok(2)
            })
            .unwrap();

        // Both resolve to the same literal key.
        assert!(Arc::ptr_eq(&omitted, &explicit));
    }

    #[test]
    fn test_distinct_tasks_are_distinct_keys() {
        let cache: PipelineCache<u32> = PipelineCache::new();

        let a = cache
            .acquire_with(PipelineTask::SentimentAnalysis, None, || Ok(1))
            .unwrap();
        let b = cache
            .acquire_with(PipelineTask::ZeroShotClassification, None, || Ok(2))
            .unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_failed_build_is_not_cached() {
        let cache: PipelineCache<u32> = PipelineCache::new();

        let err = cache.acquire_with(PipelineTask::Summarization, None, || {
            Err(ToolError::pipeline("download failed"))
        });
        assert!(err.is_err());

        // A later acquisition may retry and succeed.
        let ok = cache
            .acquire_with(PipelineTask::Summarization, None, || Ok(3))
            .unwrap();
        assert_eq!(*ok, 3);
    }

    #[test]
    fn test_concurrent_same_key_builds_once() {
        let cache = Arc::new(PipelineCache::<u32>::new());
        let builds = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let builds = builds.clone();
                std::thread::spawn(move || {
                    cache
                        .acquire_with(PipelineTask::SentimentAnalysis, None, || {
                            builds.fetch_add(1, Ordering::SeqCst);
                            // Widen the race window.
                            std::thread::sleep(std::time::Duration::from_millis(20));
                            Ok(42)
                        })
                        .unwrap()
                })
            })
            .collect();

        let results: Vec<Arc<u32>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        for r in &results[1..] {
            assert!(Arc::ptr_eq(&results[0], r));
        }
    }

    #[test]
    fn test_task_defaults() {
        assert_eq!(
            PipelineTask::SentimentAnalysis.default_model(),
            "distilbert-base-uncased-finetuned-sst-2-english"
        );
        assert_eq!(PipelineTask::Summarization.default_model(), "t5-small");
    }
}
