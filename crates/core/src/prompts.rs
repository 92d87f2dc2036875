use crate::profiles::Profile;

/// Appended by callers when retrieval produced no usable fragments.
pub const NO_CONTEXT_NOTE: &str = "\n\nNote: no relevant context was found.";

pub fn build_system(profile: &Profile) -> String {
    let tone = match profile.learning_style.as_str() {
        "visual" => "use lists, outlines, and visual analogies",
        "pragmatic" => "give actionable steps, short examples, and checklists",
        "narrative" => "use short stories and scenarios as examples",
        _ => "give clear explanations with examples",
    };

    format!(
        "You are a learning assistant for internal training material.\n\
         Language: {}. Audience level: {}. Style: {} ({}).\n\
         Answer in fewer than {} words and cite as [source#chunk] only when the tag exists in the context.\n\
         If no relevant context is available, say so explicitly and do not invent citation tags.",
        profile.language,
        profile.level,
        profile.learning_style,
        tone,
        profile.constraints.max_words,
    )
}

pub fn build_user(message: &str, context: &str) -> String {
    format!(
        "Question: {message}\n\n\
         Retrieved context (cite as [source#chunk] only if it appears below):\n{context}\n\n\
         Instructions: answer ONLY with information backed by the context when possible. \
         If the context is empty or irrelevant, state that clearly and do not invent citations."
    )
}

#[cfg(test)]
mod tests {
    use super::{build_system, build_user};
    use crate::profiles::Profile;

    #[test]
    fn system_prompt_reflects_profile() {
        let mut profile = Profile::default();
        profile.learning_style = "pragmatic".to_string();
        profile.constraints.max_words = 90;

        let prompt = build_system(&profile);
        assert!(prompt.contains("pragmatic"));
        assert!(prompt.contains("90 words"));
        assert!(prompt.contains("[source#chunk]"));
    }

    #[test]
    fn unknown_style_gets_generic_tone() {
        let mut profile = Profile::default();
        profile.learning_style = "telepathic".to_string();

        let prompt = build_system(&profile);
        assert!(prompt.contains("clear explanations"));
    }

    #[test]
    fn user_prompt_embeds_question_and_context() {
        let prompt = build_user("what is a lockout?", "[a.pdf#0] Lockout is...");
        assert!(prompt.contains("what is a lockout?"));
        assert!(prompt.contains("[a.pdf#0] Lockout is..."));
    }
}
