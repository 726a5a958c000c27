//! Prompt assembly.

/// Builds the full generation prompt for a conversation turn.
///
/// The framing is load-bearing: persona system prompt, then the rendered
/// context block, then the new utterance, then the in-character
/// directive. Replies regress noticeably if the ordering or labels drift.
pub fn turn_prompt(system_prompt: &str, context: &str, user_text: &str) -> String {
    format!(
        "{system_prompt}\n\n\
         Previous conversation:\n{context}\n\n\
         User: {user_text}\n\n\
         Respond as the agent:"
    )
}

/// Builds the meta prompt used to draft a persona system prompt from a
/// role and goal description.
pub fn persona_draft_prompt(role: &str, goal: &str) -> String {
    format!(
        "You are an expert prompt engineer for conversational AI. Your task is to generate a detailed system prompt for a virtual telecaller agent.\n\n\
         Based on the provided 'Role' and 'Goal', create a comprehensive prompt that defines the agent's:\n\n\
         - Personality and communication style\n\
         - Key responsibilities and expertise\n\
         - Tone and approach\n\
         - Behavioral guidelines and constraints\n\
         - How to handle different scenarios\n\n\
         The prompt should be written in the second person (e.g., \"You are a...\") and be ready to use as a system prompt.\n\n\
         Role: \"{role}\"\n\n\
         Goal: \"{goal}\"\n\n\
         Generate a detailed system prompt (200-400 words):"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_prompt_framing_is_exact() {
        let prompt = turn_prompt(
            "You are a travel agent.",
            "User: hi\nAssistant: hello",
            "book me a flight",
        );
        assert_eq!(
            prompt,
            "You are a travel agent.\n\n\
             Previous conversation:\nUser: hi\nAssistant: hello\n\n\
             User: book me a flight\n\n\
             Respond as the agent:"
        );
    }

    #[test]
    fn first_turn_has_empty_context_block() {
        let prompt = turn_prompt("System.", "", "hello");
        assert!(prompt.contains("Previous conversation:\n\n\nUser: hello"));
    }

    #[test]
    fn draft_prompt_embeds_role_and_goal() {
        let prompt = persona_draft_prompt("debt collector", "recover overdue invoices");
        assert!(prompt.contains("Role: \"debt collector\""));
        assert!(prompt.contains("Goal: \"recover overdue invoices\""));
    }
}
