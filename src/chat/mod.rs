pub mod classifier;
pub mod history;
pub mod prompt;
pub mod sanitizer;

pub use classifier::{is_follow_up, is_greeting};
pub use history::{ConversationEntry, ConversationStore, ConversationSummary};
pub use prompt::PromptBuilder;
pub use sanitizer::{ProfileInfo, sanitize};
