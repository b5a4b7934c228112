use tracing::{info, warn};

use super::client::GenerationBackend;

/// Tracks which generation models are reachable and ranks them by preference.
///
/// Discovery is side-effecting but infallible from the caller's perspective:
/// when the backend is unreachable the available set stays empty and the
/// pipeline treats generation as unavailable.
pub struct ModelCatalog {
    preferred: Vec<String>,
    default_model: String,
    available: Vec<String>,
}

impl ModelCatalog {
    pub fn new(preferred: Vec<String>, default_model: impl Into<String>) -> Self {
        Self {
            preferred,
            default_model: default_model.into(),
            available: Vec::new(),
        }
    }

    /// Refresh the available set from the backend.
    pub async fn discover(&mut self, backend: &dyn GenerationBackend) {
        self.available = backend.list_models().await;
        if self.available.is_empty() {
            warn!("No generation models discovered; running retrieval-only");
        } else {
            info!("Discovered {} generation models", self.available.len());
        }
    }

    /// Pick the model to generate with: first preferred model that is
    /// available, else the first available model, else the hardcoded default.
    pub fn select(&self) -> &str {
        for model in &self.preferred {
            if self.available.contains(model) {
                return model;
            }
        }
        self.available
            .first()
            .map_or(self.default_model.as_str(), String::as_str)
    }

    /// True when discovery found nothing reachable.
    pub fn is_empty(&self) -> bool {
        self.available.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn with_available(mut self, available: Vec<String>) -> Self {
        self.available = available;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preferred() -> Vec<String> {
        vec!["phi3:mini".to_string(), "llama3.2".to_string()]
    }

    #[test]
    fn test_select_prefers_ranked_order() {
        let catalog = ModelCatalog::new(preferred(), "phi3:mini").with_available(vec![
            "mistral".to_string(),
            "llama3.2".to_string(),
            "phi3:mini".to_string(),
        ]);
        assert_eq!(catalog.select(), "phi3:mini");
    }

    #[test]
    fn test_select_falls_back_to_first_available() {
        let catalog = ModelCatalog::new(preferred(), "phi3:mini")
            .with_available(vec!["qwen2.5:7b".to_string(), "gemma2".to_string()]);
        assert_eq!(catalog.select(), "qwen2.5:7b");
    }

    #[test]
    fn test_select_defaults_when_nothing_available() {
        let catalog = ModelCatalog::new(preferred(), "phi3:mini");
        assert_eq!(catalog.select(), "phi3:mini");
        assert!(catalog.is_empty());
    }
}
