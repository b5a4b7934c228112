use std::collections::HashSet;

use lazy_static::lazy_static;

lazy_static! {
    static ref GREETING_PHRASES: HashSet<&'static str> = [
        "hello",
        "hi",
        "hey",
        "hiya",
        "howdy",
        "good morning",
        "good afternoon",
        "good evening",
        "greetings",
        "yo",
        "sup",
        "whats up",
        "what's up",
        "hi there",
        "hello there",
        "hey there",
    ]
    .into_iter()
    .collect();

    static ref FOLLOW_UP_MARKERS: Vec<&'static str> = vec![
        "what about",
        "what if",
        "how about",
        "also",
        "however",
        "and if",
        "then what",
        "after that",
        "instead",
        "as well",
        "too?",
    ];
}

/// True when the text is a greeting rather than a question: an exact match
/// against the phrase set (one trailing `!` or `.` tolerated), or a very short
/// purely-alphabetic token such as "yo". An empty query counts as a greeting so
/// the pipeline always has a deterministic polite reply for it.
pub fn is_greeting(text: &str) -> bool {
    let mut normalized = text.trim().to_lowercase();
    if normalized.ends_with('!') || normalized.ends_with('.') {
        normalized.pop();
        normalized = normalized.trim_end().to_string();
    }

    if GREETING_PHRASES.contains(normalized.as_str()) {
        return true;
    }
    normalized.chars().count() <= 3 && normalized.chars().all(char::is_alphabetic)
}

/// True when the text reads as a continuation of the previous exchange.
pub fn is_follow_up(text: &str) -> bool {
    let lowered = text.to_lowercase();
    FOLLOW_UP_MARKERS.iter().any(|marker| lowered.contains(marker))
}
