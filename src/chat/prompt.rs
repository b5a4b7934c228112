use super::sanitizer::ProfileInfo;

/// Prompt templates for the generation backend.
pub struct PromptBuilder;

impl PromptBuilder {
    /// Patient context block with the non-restatement instruction. Empty when
    /// no profile information was supplied.
    fn profile_block(profile: Option<&ProfileInfo>) -> String {
        let Some(profile) = profile else {
            return String::new();
        };
        if profile.is_empty() {
            return String::new();
        }

        let mut attributes = Vec::new();
        if let Some(age) = &profile.age {
            attributes.push(format!("age {age}"));
        }
        if let Some(gender) = &profile.gender {
            attributes.push(format!("gender {gender}"));
        }
        if let Some(group) = &profile.blood_group {
            attributes.push(format!("blood group {group}"));
        }
        if let Some(conditions) = &profile.pre_existing_conditions {
            attributes.push(format!("pre-existing conditions {conditions}"));
        }

        format!(
            "Patient context (use only to tailor the advice, never restate these details in your answer): {}.\n\n",
            attributes.join(", ")
        )
    }

    /// Prompt when no corpus match was confident enough to ground the answer.
    pub fn context_free(query: &str, profile: Option<&ProfileInfo>) -> String {
        format!(
            "{}First aid question: {}\n\n\
             Provide a brief, safe first aid response. If serious, advise seeking medical help.\n\n\
             Answer:",
            Self::profile_block(profile),
            query
        )
    }

    /// Prompt grounded in the best-matching corpus answer.
    pub fn knowledge_grounded(
        query: &str,
        knowledge: &str,
        profile: Option<&ProfileInfo>,
    ) -> String {
        format!(
            "{}Based on this first aid knowledge: {}\n\n\
             Question: {}\n\n\
             Provide a clear, helpful response based on this information.\n\n\
             Answer:",
            Self::profile_block(profile),
            knowledge,
            query
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_free_without_profile() {
        let prompt = PromptBuilder::context_free("How do I treat a burn?", None);
        assert!(prompt.starts_with("First aid question: How do I treat a burn?"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn test_profile_block_carries_non_restatement_instruction() {
        let profile = ProfileInfo {
            age: Some("34".to_string()),
            blood_group: Some("O+".to_string()),
            ..ProfileInfo::default()
        };
        let prompt = PromptBuilder::context_free("How do I treat a burn?", Some(&profile));
        assert!(prompt.contains("never restate"));
        assert!(prompt.contains("age 34"));
        assert!(prompt.contains("blood group O+"));
    }

    #[test]
    fn test_empty_profile_adds_no_block() {
        let profile = ProfileInfo::default();
        let prompt = PromptBuilder::context_free("query", Some(&profile));
        assert!(prompt.starts_with("First aid question:"));
    }

    #[test]
    fn test_knowledge_grounded_embeds_both() {
        let prompt =
            PromptBuilder::knowledge_grounded("What about blisters?", "cool the burn", None);
        assert!(prompt.contains("Based on this first aid knowledge: cool the burn"));
        assert!(prompt.contains("Question: What about blisters?"));
    }
}
