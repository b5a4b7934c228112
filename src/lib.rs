//! QHelper: first-aid question answering.
//!
//! Lexical TF-IDF retrieval over a fixed question/answer corpus, combined with
//! an Ollama-compatible generation backend when one is reachable. The pipeline
//! keeps a bounded per-profile conversation history, classifies greetings and
//! follow-ups, and strips restated patient attributes from generated text
//! before returning it.

pub mod answerer;
pub mod chat;
pub mod core;
pub mod corpus;
pub mod llm;
pub mod utils;

pub use utils::{safe_truncate, safe_truncate_ellipsis};

pub use answerer::{
    Answerer, AnswerMethod, AnswerResult, EnhancedAnswerer, RetrievalOnlyAnswerer, build_answerer,
};
pub use chat::{ConversationStore, ConversationSummary, ProfileInfo};
pub use crate::core::config::QHelperConfig;
pub use crate::core::error::{QHelperError, Result};
pub use corpus::{CorpusIndex, SimilarityHit, load_corpus};
pub use llm::{GenerationBackend, ModelCatalog, OllamaClient};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

pub const DEFAULT_MODEL: &str = "phi3:mini";

/// Profile id used when the caller does not supply one.
pub const DEFAULT_PROFILE_ID: &str = "guest";

/// Minimum top similarity for grounding generation in a corpus answer.
pub const DEFAULT_GENERATION_THRESHOLD: f32 = 0.05;

/// Minimum top similarity for accepting a retrieval-only answer.
pub const DEFAULT_RETRIEVAL_THRESHOLD: f32 = 0.1;

pub const DEFAULT_TOP_K: usize = 3;

pub const DEFAULT_HISTORY_CAPACITY: usize = 5;
