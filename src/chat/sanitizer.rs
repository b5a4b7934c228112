use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::utils::collapse_whitespace;

/// Caller-supplied patient attributes. Shapes the prompt and drives
/// sanitization; never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileInfo {
    pub age: Option<String>,
    pub gender: Option<String>,
    pub blood_group: Option<String>,
    pub pre_existing_conditions: Option<String>,
}

impl ProfileInfo {
    pub fn is_empty(&self) -> bool {
        self.age.is_none()
            && self.gender.is_none()
            && self.blood_group.is_none()
            && self.pre_existing_conditions.is_none()
    }
}

/// Anchor a literal phrase with word boundaries where its edges allow them.
fn boundary_pattern(phrase: &str) -> String {
    let escaped = regex::escape(phrase);
    let lead = if phrase.starts_with(|c: char| c.is_alphanumeric()) {
        r"\b"
    } else {
        ""
    };
    let trail = if phrase.ends_with(|c: char| c.is_alphanumeric()) {
        r"\b"
    } else {
        ""
    };
    format!("{lead}{escaped}{trail}")
}

/// Strip phrases that restate supplied patient attributes from generated text,
/// case-insensitively, then collapse the leftover whitespace. Identity when no
/// profile info is supplied. Stripping runs to a fixpoint so re-sanitizing the
/// output is always a no-op.
pub fn sanitize(text: &str, profile: Option<&ProfileInfo>) -> String {
    let Some(profile) = profile else {
        return text.to_string();
    };
    if profile.is_empty() {
        return text.to_string();
    }

    let mut phrases = Vec::new();
    if let Some(age) = &profile.age {
        phrases.push(format!("{age}-year-old"));
        phrases.push(format!("{age} year old"));
        phrases.push(format!("age {age}"));
        phrases.push(format!("{age} years old"));
    }
    if let Some(gender) = &profile.gender {
        phrases.push(format!("as a {gender}"));
        phrases.push(format!("being {gender}"));
    }
    if let Some(group) = &profile.blood_group {
        phrases.push(format!("blood type {group}"));
        phrases.push(format!("{group} blood"));
    }
    if phrases.is_empty() {
        return text.to_string();
    }

    let pattern = phrases
        .iter()
        .map(|phrase| boundary_pattern(phrase))
        .collect::<Vec<_>>()
        .join("|");

    let Ok(matcher) = RegexBuilder::new(&pattern).case_insensitive(true).build() else {
        return text.to_string();
    };

    // Removing a match can butt the surrounding fragments together into a
    // fresh match ("age age 34 34" loses the inner "age 34" and becomes
    // "age 34 ..."), so strip and collapse until the text stops changing.
    // Every pass only shrinks the text, so this terminates.
    let mut current = text.to_string();
    loop {
        let stripped = collapse_whitespace(&matcher.replace_all(&current, ""));
        if stripped == current {
            break;
        }
        current = stripped;
    }
    if current != text {
        debug!("Sanitizer removed restated patient attributes");
    }
    current
}
