use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{Answerer, AnswerMethod, AnswerResult, greeting_result, retrieval_result};
use crate::chat::classifier::is_greeting;
use crate::chat::{ConversationStore, ConversationSummary, ProfileInfo};
use crate::corpus::CorpusIndex;

/// Retrieval-only pipeline, used when no generation backend is reachable at
/// startup. Same surface, generation permanently absent.
pub struct RetrievalOnlyAnswerer {
    index: Arc<CorpusIndex>,
    store: Arc<ConversationStore>,
    retrieval_threshold: f32,
    top_k: usize,
}

impl RetrievalOnlyAnswerer {
    pub fn new(
        index: Arc<CorpusIndex>,
        store: Arc<ConversationStore>,
        retrieval_threshold: f32,
        top_k: usize,
    ) -> Self {
        info!("RetrievalOnlyAnswerer initialized");
        Self {
            index,
            store,
            retrieval_threshold,
            top_k,
        }
    }
}

#[async_trait]
impl Answerer for RetrievalOnlyAnswerer {
    async fn answer(
        &self,
        query: &str,
        _profile: Option<&ProfileInfo>,
        profile_id: &str,
    ) -> AnswerResult {
        if is_greeting(query) {
            return greeting_result(query);
        }

        let contextual_query = self.store.contextualize(profile_id, query);
        let hits = self.index.search(&contextual_query, self.top_k);

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
