//! Prompt rendering for the generation backend
//!
//! The backend takes a single flat prompt, so the conversation is rendered as
//! `role: content` lines, optionally preceded by uploaded document text, and
//! always followed by the bullet-formatting instruction and the `assistant:`
//! cue that marks where generation should continue.

use crate::chat::ChatMessage;

const FORMAT_INSTRUCTION: &str = "\nPlease format your response as a list of bullet points, using \"-\" as the bullet character. Each bullet point should be on a new line.\n\nassistant:";

/// Render a conversation (plus optional grounding text) into one prompt.
pub fn render_prompt(messages: &[ChatMessage], grounding: Option<&str>) -> String {
    let mut prompt = messages
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n");

    if let Some(text) = grounding {
        prompt = format!(
            "The following is the content of a PDF document:\n\n{text}\n\nPlease answer questions based on this content.\n\n{prompt}"
        );
    }

    prompt.push_str(FORMAT_INSTRUCTION);
    prompt
}
