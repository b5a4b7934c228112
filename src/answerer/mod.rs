pub mod enhanced;
pub mod retrieval_only;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chat::{ConversationStore, ConversationSummary, ProfileInfo};
use crate::core::config::QHelperConfig;
use crate::corpus::{CorpusIndex, SimilarityHit};
use crate::llm::{GenerationBackend, ModelCatalog, options};
use crate::utils::{fnv1a_hash, safe_truncate_ellipsis};

pub use enhanced::EnhancedAnswerer;
pub use retrieval_only::RetrievalOnlyAnswerer;

/// Question preview length attached to answers.
const PREVIEW_CHARS: usize = 80;

/// Matched-question preview length inside the `source` string.
const SOURCE_QUESTION_CHARS: usize = 100;

/// How an answer was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnswerMethod {
    Greeting,
    OllamaOnly,
    RagPlusOllama,
    RagOnly,
    Fallback,
}

/// The caller-facing outcome of one pipeline run. Never retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    pub confidence: f32,
    pub source: String,
    pub method: AnswerMethod,
    pub similar_questions: Vec<String>,
}

/// Canned greeting variants. Selection is a stable FNV-1a hash of the trimmed
/// lowercased query, so the same input always yields the same phrasing.
pub const GREETING_VARIANTS: [&str; 4] = [
    "Hello! I'm QHelper, your first aid assistant. What can I help you with?",
    "Hi there! Ask me any first aid question and I'll do my best to help.",
    "Hello! Describe the situation and I'll walk you through the first aid steps.",
    "Hi! I'm here to help with first aid questions. What happened?",
];

/// Terminal low-confidence reply when neither generation nor retrieval yields
/// a confident answer.
pub const FALLBACK_ANSWER: &str = "I'm sorry, I don't have specific information about that. \
     Please consult a medical professional or call emergency services if this is urgent.";

/// Deterministic greeting response; the conversation store is never touched.
pub fn greeting_result(query: &str) -> AnswerResult {
    let normalized = query.trim().to_lowercase();
    let pick = (fnv1a_hash(&normalized) % GREETING_VARIANTS.len() as u64) as usize;
    AnswerResult {
        answer: GREETING_VARIANTS[pick].to_string(),
        confidence: 1.0,
        source: "greeting".to_string(),
        method: AnswerMethod::Greeting,
        similar_questions: Vec::new(),
    }
}

/// Up to three truncated question previews from the similarity hits.
pub(crate) fn question_previews(hits: &[SimilarityHit]) -> Vec<String> {
    hits.iter()
        .take(3)
        .map(|hit| safe_truncate_ellipsis(&hit.question, PREVIEW_CHARS))
        .collect()
}

/// Retrieval-only decision shared by both answerer variants: the best match's
/// stored answer when it clears the threshold, the fixed fallback otherwise.
pub(crate) fn retrieval_result(hits: &[SimilarityHit], threshold: f32) -> AnswerResult {
    match hits.first() {
        Some(best) if best.similarity >= threshold => AnswerResult {
            answer: best.answer.clone(),
            confidence: best.similarity,
            source: format!(
                "Question {}: {}",
                best.index,
                safe_truncate_ellipsis(&best.question, SOURCE_QUESTION_CHARS)
            ),
            method: AnswerMethod::RagOnly,
            similar_questions: question_previews(hits),
        },
        _ => AnswerResult {
            answer: FALLBACK_ANSWER.to_string(),
            confidence: 0.0,
            source: "fallback".to_string(),
            method: AnswerMethod::Fallback,
            similar_questions: Vec::new(),
        },
    }
}

/// The single capability exposed to callers.
#[async_trait]
pub trait Answerer: Send + Sync {
    /// Run the full answer pipeline for one query.
    async fn answer(
        &self,
        query: &str,
        profile: Option<&ProfileInfo>,
        profile_id: &str,
    ) -> AnswerResult;

    /// Drop the profile's conversation history.
    fn clear_history(&self, profile_id: &str);

    /// Snapshot of the profile's conversation state.
    fn summary(&self, profile_id: &str) -> ConversationSummary;
}

/// Select the answerer variant once at startup: enhanced when model discovery
/// found a reachable backend, retrieval-only otherwise.
pub fn build_answerer(
    config: &QHelperConfig,
    index: Arc<CorpusIndex>,
    store: Arc<ConversationStore>,
    backend: Arc<dyn GenerationBackend>,
    catalog: &ModelCatalog,
) -> Arc<dyn Answerer> {
    if catalog.is_empty() {
        info!("Generation backend unavailable, using retrieval-only answerer");
        Arc::new(RetrievalOnlyAnswerer::new(
            index,
            store,
            config.retrieval_threshold,
            config.top_k,
        ))
    } else {
        let model = catalog.select().to_string();
        info!("Using enhanced answerer (model={})", model);
        let decoding = options::for_model(&model);
        Arc::new(EnhancedAnswerer::new(
            index,
            store,
            backend,
            model,
            decoding,
            config.generation_threshold,
            config.retrieval_threshold,
            config.top_k,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_is_deterministic() {
        let a = greeting_result("Hello!");
        let b = greeting_result("  hello! ");
        assert_eq!(a.answer, b.answer);
        assert_eq!(a.method, AnswerMethod::Greeting);
        assert_eq!(a.confidence, 1.0);
        assert_eq!(a.source, "greeting");
    }

    #[test]
    fn test_greeting_variant_matches_hash() {
        let pick =
            (crate::utils::fnv1a_hash("hello") % GREETING_VARIANTS.len() as u64) as usize;
        assert_eq!(greeting_result("Hello").answer, GREETING_VARIANTS[pick]);
    }

    #[test]
    fn test_method_serializes_snake_case() {
        assert_eq!(AnswerMethod::RagPlusOllama.to_string(), "rag_plus_ollama");
        assert_eq!(
            serde_json::to_string(&AnswerMethod::OllamaOnly).unwrap(),
            "\"ollama_only\""
        );
    }

    #[test]
    fn test_retrieval_result_below_threshold_is_fallback() {
        let hits = vec![SimilarityHit {
            index: 0,
            question: "treat a burn".to_string(),
            answer: "cool with water".to_string(),
            similarity: 0.05,
        }];
        let result = retrieval_result(&hits, 0.1);
        assert_eq!(result.method, AnswerMethod::Fallback);
        assert_eq!(result.confidence, 0.0);
        assert!(result.similar_questions.is_empty());
    }

    #[test]
    fn test_retrieval_result_returns_stored_answer() {
        let hits = vec![SimilarityHit {
            index: 7,
            question: "treat a burn".to_string(),
            answer: "cool with water".to_string(),
            similarity: 0.6,
        }];
        let result = retrieval_result(&hits, 0.1);
        assert_eq!(result.method, AnswerMethod::RagOnly);
        assert_eq!(result.answer, "cool with water");
        assert_eq!(result.confidence, 0.6);
        assert!(result.source.starts_with("Question 7:"));
        assert_eq!(result.similar_questions, vec!["treat a burn".to_string()]);
    }
}
