use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{
    Answerer, AnswerMethod, AnswerResult, greeting_result, question_previews, retrieval_result,
};
use crate::chat::classifier::is_greeting;
use crate::chat::{ConversationStore, ConversationSummary, ProfileInfo, PromptBuilder, sanitize};
use crate::corpus::CorpusIndex;
use crate::llm::{DecodingOptions, GenerationBackend};

/// Confidence assigned to an ungrounded generated answer.
const OLLAMA_ONLY_CONFIDENCE: f32 = 0.5;

/// Confidence boost over raw similarity for a grounded generated answer,
/// capped at 0.9.
const RAG_CONFIDENCE_BOOST: f32 = 0.3;
const RAG_CONFIDENCE_CAP: f32 = 0.9;

/// Full pipeline: retrieval plus backend generation, degrading to
/// retrieval-only whenever the backend yields no result.
pub struct EnhancedAnswerer {
    index: Arc<CorpusIndex>,
    store: Arc<ConversationStore>,
    backend: Arc<dyn GenerationBackend>,
    model: String,
    decoding: DecodingOptions,
    generation_threshold: f32,
    retrieval_threshold: f32,
    top_k: usize,
}

impl EnhancedAnswerer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        index: Arc<CorpusIndex>,
        store: Arc<ConversationStore>,
        backend: Arc<dyn GenerationBackend>,
        model: String,
        decoding: DecodingOptions,
        generation_threshold: f32,
        retrieval_threshold: f32,
        top_k: usize,
    ) -> Self {
        info!("EnhancedAnswerer initialized (model={})", model);
        Self {
            index,
            store,
            backend,
            model,
            decoding,
            generation_threshold,
            retrieval_threshold,
            top_k,
        }
    }

    /// Attempt a generated answer; `None` means the backend was unavailable
    /// and the caller should fall back to retrieval.
    async fn try_generated(
        &self,
        contextual_query: &str,
        profile: Option<&ProfileInfo>,
        hits: &[crate::corpus::SimilarityHit],
    ) -> Option<AnswerResult> {
        let grounded = hits
            .first()
            .is_some_and(|best| best.similarity >= self.generation_threshold);

        if grounded {
            let best = &hits[0];
            let prompt = PromptBuilder::knowledge_grounded(contextual_query, &best.answer, profile);
            let text = self.backend.generate(&self.model, &prompt, &self.decoding).await?;
            Some(AnswerResult {
                answer: sanitize(text.trim(), profile),
                confidence: (best.similarity + RAG_CONFIDENCE_BOOST).min(RAG_CONFIDENCE_CAP),
                source: "AI enhanced with knowledge from similar case".to_string(),
                method: AnswerMethod::RagPlusOllama,
                similar_questions: question_previews(hits),
            })
        } else {
            let prompt = PromptBuilder::context_free(contextual_query, profile);
            let text = self.backend.generate(&self.model, &prompt, &self.decoding).await?;
            Some(AnswerResult {
                answer: sanitize(text.trim(), profile),
                confidence: OLLAMA_ONLY_CONFIDENCE,
                source: "AI reasoning (no specific match found)".to_string(),
                method: AnswerMethod::OllamaOnly,
                similar_questions: Vec::new(),
            })
        }
    }
}

#[async_trait]
impl Answerer for EnhancedAnswerer {
    async fn answer(
        &self,
        query: &str,
        profile: Option<&ProfileInfo>,
        profile_id: &str,
    ) -> AnswerResult {
        if is_greeting(query) {
            return greeting_result(query);
        }

        let contextual_query = self.store.contextualize(profile_id, query);
        let hits = self.index.search(&contextual_query, self.top_k);
        debug!(
            "Search returned {} hits (best={:.3})",
            hits.len(),
            hits.first().map_or(0.0, |h| h.similarity)
        );

        // No store lock is held here: the backend call can take seconds.
        if let Some(result) = self.try_generated(&contextual_query, profile, &hits).await {
            self.store.append(profile_id, query, &result.answer);
            return result;
        }

        debug!("Generation unavailable, falling back to retrieval");
        let result = retrieval_result(&hits, self.retrieval_threshold);
        if result.method == AnswerMethod::RagOnly {
            self.store.append(profile_id, query, &result.answer);
        }
        result
    }

    fn clear_history(&self, profile_id: &str) {
        self.store.clear(profile_id);
    }

    fn summary(&self, profile_id: &str) -> ConversationSummary {
        self.store.summary(profile_id)
    }
}
