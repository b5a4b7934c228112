use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::classifier::{is_follow_up, is_greeting};
use crate::utils::safe_truncate_ellipsis;

/// Answer prefix length embedded when contextualizing a follow-up.
const CONTEXT_ANSWER_CHARS: usize = 150;

/// Topic preview length in conversation summaries.
const TOPIC_CHARS: usize = 50;

/// Number of topics exposed in a summary.
const SUMMARY_TOPICS: usize = 3;

/// One finalized non-greeting exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
}

/// Caller-facing snapshot of a profile's conversation state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub total_exchanges: usize,
    pub recent_topics: Vec<String>,
    pub context_enabled: bool,
}

/// Bounded per-profile conversation history.
///
/// Each profile owns an independent FIFO of at most `capacity` entries behind
/// its own mutex: operations on distinct profiles never contend, and
/// same-profile operations serialize. The outer map lock is held only long
/// enough to fetch or lazily insert the per-profile handle. No lock is ever
/// held across an await point; the pipeline reads before calling the backend
/// and appends after the call resolves.
pub struct ConversationStore {
    capacity: usize,
    profiles: RwLock<HashMap<String, Arc<Mutex<VecDeque<ConversationEntry>>>>>,
}

impl ConversationStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            profiles: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch the profile's history handle, creating an empty one on first use.
    fn profile(&self, profile_id: &str) -> Arc<Mutex<VecDeque<ConversationEntry>>> {
        if let Some(handle) = self.profiles.read().get(profile_id) {
            return Arc::clone(handle);
        }
        let mut profiles = self.profiles.write();
        Arc::clone(
            profiles
                .entry(profile_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(VecDeque::new()))),
        )
    }

    pub fn get_history(&self, profile_id: &str) -> Vec<ConversationEntry> {
        self.profile(profile_id).lock().iter().cloned().collect()
    }

    /// Record a finalized exchange. Greeting questions are never stored; the
    /// oldest entry is dropped once the capacity is exceeded.
    pub fn append(&self, profile_id: &str, question: &str, answer: &str) {
        if is_greeting(question) {
            return;
        }
        let handle = self.profile(profile_id);
        let mut history = handle.lock();
        history.push_back(ConversationEntry {
            question: question.to_string(),
            answer: answer.to_string(),
            timestamp: Utc::now(),
        });
        while history.len() > self.capacity {
            history.pop_front();
        }
        debug!(
            "History appended (profile={}, len={})",
            profile_id,
            history.len()
        );
    }

    /// Prefix a follow-up query with the most recent exchange so the backend
    /// sees short-range context. Non-follow-ups and empty histories pass the
    /// query through unchanged.
    pub fn contextualize(&self, profile_id: &str, query: &str) -> String {
        if !is_follow_up(query) {
            return query.to_string();
        }
        let handle = self.profile(profile_id);
        let history = handle.lock();
        let Some(last) = history.back() else {
            return query.to_string();
        };
        format!(
            "Previous question: {}\nPrevious answer: {}\n\nCurrent question: {}",
            last.question,
            safe_truncate_ellipsis(&last.answer, CONTEXT_ANSWER_CHARS),
            query
        )
    }

    pub fn clear(&self, profile_id: &str) {
        self.profile(profile_id).lock().clear();
        debug!("History cleared (profile={})", profile_id);
    }

    /// Most recent topics first.
    pub fn summary(&self, profile_id: &str) -> ConversationSummary {
        let handle = self.profile(profile_id);
        let history = handle.lock();
        ConversationSummary {
            total_exchanges: history.len(),
            recent_topics: history
                .iter()
                .rev()
                .take(SUMMARY_TOPICS)
                .map(|entry| safe_truncate_ellipsis(&entry.question, TOPIC_CHARS))
                .collect(),
            context_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_created_lazily() {
        let store = ConversationStore::new(5);
        assert!(store.get_history("alice").is_empty());
    }

    #[test]
    fn test_append_and_fifo_eviction() {
        let store = ConversationStore::new(5);
        for i in 0..6 {
            store.append("alice", &format!("question {i}"), "answer");
        }
        let history = store.get_history("alice");
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].question, "question 1");
        assert_eq!(history[4].question, "question 5");
    }

    #[test]
    fn test_greetings_never_stored() {
        let store = ConversationStore::new(5);
        store.append("alice", "hello", "Hi! How can I help?");
        assert!(store.get_history("alice").is_empty());
    }

    #[test]
    fn test_profiles_are_independent() {
        let store = ConversationStore::new(5);
        store.append("alice", "burn question", "burn answer");
        assert!(store.get_history("bob").is_empty());
        store.clear("bob");
        assert_eq!(store.get_history("alice").len(), 1);
    }

    #[test]
    fn test_contextualize_passthrough_without_history() {
        let store = ConversationStore::new(5);
        assert_eq!(
            store.contextualize("alice", "What about chemical burns?"),
            "What about chemical burns?"
        );
    }

    #[test]
    fn test_contextualize_passthrough_for_fresh_question() {
        let store = ConversationStore::new(5);
        store.append("alice", "How do I treat a burn?", "Cool it with water.");
        assert_eq!(
            store.contextualize("alice", "How do I splint an arm?"),
            "How do I splint an arm?"
        );
    }

    #[test]
    fn test_contextualize_embeds_previous_exchange() {
        let store = ConversationStore::new(5);
        let long_answer = "a".repeat(200);
        store.append("alice", "How do I treat a burn?", &long_answer);

        let contextual = store.contextualize("alice", "What about chemical burns?");
        assert!(contextual.contains("How do I treat a burn?"));
        assert!(contextual.contains(&"a".repeat(150)));
        assert!(!contextual.contains(&"a".repeat(151)));
        assert!(contextual.contains("..."));
        assert!(contextual.ends_with("What about chemical burns?"));
    }

    #[test]
    fn test_clear_empties_history() {
        let store = ConversationStore::new(5);
        store.append("alice", "burn question", "answer");
        store.clear("alice");
        assert!(store.get_history("alice").is_empty());
    }

    #[test]
    fn test_summary_shape() {
        let store = ConversationStore::new(5);
        let long_question = format!("How do I handle {}", "x".repeat(60));
        for question in ["q one", "q two", "q three", long_question.as_str()] {
            store.append("alice", question, "answer");
        }

        let summary = store.summary("alice");
        assert_eq!(summary.total_exchanges, 4);
        assert!(summary.context_enabled);
        assert_eq!(summary.recent_topics.len(), 3);
        assert!(summary.recent_topics[0].ends_with("..."));
        assert!(summary.recent_topics[0].chars().count() <= 53);
        assert_eq!(summary.recent_topics[1], "q three");
    }
}
