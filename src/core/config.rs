use serde::{Deserialize, Serialize};

use crate::{
    DEFAULT_GENERATION_THRESHOLD, DEFAULT_HISTORY_CAPACITY, DEFAULT_MODEL, DEFAULT_OLLAMA_URL,
    DEFAULT_RETRIEVAL_THRESHOLD, DEFAULT_TOP_K,
};

/// Runtime configuration for the answer pipeline.
///
/// The similarity thresholds are deliberately configuration rather than
/// constants: 0.05 gates whether generation is attempted at all, 0.1 gates
/// whether a retrieval-only answer is confident enough to return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QHelperConfig {
    pub corpus_path: String,
    pub vector_cache_path: Option<String>,
    pub force_regenerate_vectors: bool,

    pub ollama_url: String,
    pub preferred_models: Vec<String>,
    pub default_model: String,
    pub timeout: u64,
    pub stream: bool,

    pub generation_threshold: f32,
    pub retrieval_threshold: f32,
    pub top_k: usize,
    pub history_capacity: usize,
}

impl QHelperConfig {
    pub fn new(corpus_path: &str) -> Self {
        Self {
            corpus_path: corpus_path.to_string(),
            vector_cache_path: Some("question_vectors.json".to_string()),
            force_regenerate_vectors: false,

            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            preferred_models: vec![
                "phi3:mini".to_string(),
                "llama3.2".to_string(),
                "mistral".to_string(),
            ],
            default_model: DEFAULT_MODEL.to_string(),
            timeout: 30,
            stream: false,

            generation_threshold: DEFAULT_GENERATION_THRESHOLD,
            retrieval_threshold: DEFAULT_RETRIEVAL_THRESHOLD,
            top_k: DEFAULT_TOP_K,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }

    /// Build a config from `QHELPER_*` environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let mut config = Self::new(
            &std::env::var("QHELPER_CORPUS_PATH").unwrap_or_else(|_| "firstaid_qa.csv".to_string()),
        );

        if let Ok(path) = std::env::var("QHELPER_VECTOR_CACHE") {
            config.vector_cache_path = if path.is_empty() { None } else { Some(path) };
        }
        if let Ok(force) = std::env::var("QHELPER_FORCE_REGENERATE") {
            config.force_regenerate_vectors = force == "1" || force.eq_ignore_ascii_case("true");
        }
        if let Ok(url) = std::env::var("QHELPER_OLLAMA_URL") {
            config.ollama_url = url;
        }
        if let Ok(models) = std::env::var("QHELPER_PREFERRED_MODELS") {
            config.preferred_models = models
                .split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
        }
        if let Ok(model) = std::env::var("QHELPER_DEFAULT_MODEL") {
            config.default_model = model;
        }
        if let Ok(timeout) = std::env::var("QHELPER_TIMEOUT") {
            if let Ok(secs) = timeout.parse() {
                config.timeout = secs;
            }
        }
        if let Ok(stream) = std::env::var("QHELPER_STREAM") {
            config.stream = stream == "1" || stream.eq_ignore_ascii_case("true");
        }
        if let Ok(threshold) = std::env::var("QHELPER_GENERATION_THRESHOLD") {
            if let Ok(value) = threshold.parse() {
                config.generation_threshold = value;
            }
        }
        if let Ok(threshold) = std::env::var("QHELPER_RETRIEVAL_THRESHOLD") {
            if let Ok(value) = threshold.parse() {
                config.retrieval_threshold = value;
            }
        }
        if let Ok(top_k) = std::env::var("QHELPER_TOP_K") {
            if let Ok(value) = top_k.parse() {
                config.top_k = value;
            }
        }
        if let Ok(capacity) = std::env::var("QHELPER_HISTORY_CAPACITY") {
            if let Ok(value) = capacity.parse() {
                config.history_capacity = value;
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = QHelperConfig::new("data.csv");
        assert_eq!(config.corpus_path, "data.csv");
        assert_eq!(config.generation_threshold, 0.05);
        assert_eq!(config.retrieval_threshold, 0.1);
        assert_eq!(config.top_k, 3);
        assert_eq!(config.history_capacity, 5);
        assert!(!config.stream);
    }

    #[test]
    fn test_preferred_models_default_order() {
        let config = QHelperConfig::new("data.csv");
        assert_eq!(config.preferred_models[0], "phi3:mini");
    }

    #[test]
    fn test_from_env_overrides_history_capacity() {
        unsafe { std::env::set_var("QHELPER_HISTORY_CAPACITY", "9") };
        let config = QHelperConfig::from_env();
        assert_eq!(config.history_capacity, 9);
        unsafe { std::env::remove_var("QHELPER_HISTORY_CAPACITY") };
    }
}
