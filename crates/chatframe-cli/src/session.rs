//! Conversation state for the terminal client
//!
//! The session owns the committed turns plus at most one in-progress
//! assistant turn. Fragment updates replace that single turn rather than
//! appending new ones, so a rendering pass always sees a consistent
//! conversation no matter how many fragments have arrived.

use chatframe_ai::ChatMessage;

/// A chat session: committed turns, one optional in-progress assistant turn,
/// and the grounding text carried into every exchange.
#[derive(Debug, Default)]
pub struct ChatSession {
    turns: Vec<ChatMessage>,
    assembling: Option<String>,
    grounding: Option<String>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// The committed turns, as sent to the relay.
    pub fn history(&self) -> &[ChatMessage] {
        &self.turns
    }

    /// The committed turns plus the in-progress assistant turn, if any.
    ///
    /// Successive calls while fragments arrive return the same number of
    /// turns with the last one's content grown: the in-progress turn is
    /// replaced, never duplicated.
    pub fn view(&self) -> Vec<ChatMessage> {
        let mut turns = self.turns.clone();
        if let Some(content) = &self.assembling {
            turns.push(ChatMessage::assistant(content.clone()));
        }
        turns
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(ChatMessage::user(content));
    }

    pub fn push_system_notice(&mut self, content: impl Into<String>) {
        self.turns.push(ChatMessage::system(content));
    }

    /// Start assembling a new assistant turn.
    ///
    /// Any previous in-progress turn is discarded; the caller is expected to
    /// have cancelled its exchange first.
    pub fn begin_exchange(&mut self) {
        self.assembling = Some(String::new());
    }

    /// Append one fragment to the in-progress turn.
    pub fn apply_fragment(&mut self, fragment: &str) {
        if let Some(content) = self.assembling.as_mut() {
            content.push_str(fragment);
        }
    }

    /// Content assembled so far, while an exchange is active.
    pub fn assembled(&self) -> Option<&str> {
        self.assembling.as_deref()
    }

    /// Commit the in-progress turn as the final assistant answer.
    pub fn complete_exchange(&mut self) {
        if let Some(content) = self.assembling.take() {
            self.turns.push(ChatMessage::assistant(content));
        }
    }

    /// End a failed exchange: keep whatever was already published, then
    /// append a system notice so the failure is visible in the conversation.
    pub fn abort_exchange(&mut self, notice: impl Into<String>) {
        if let Some(content) = self.assembling.take()
            && !content.is_empty()
        {
            self.turns.push(ChatMessage::assistant(content));
        }
        self.push_system_notice(notice);
    }

    /// Replace the grounding text used for later exchanges.
    pub fn set_grounding(&mut self, text: impl Into<String>) {
        self.grounding = Some(text.into());
    }

    pub fn grounding(&self) -> Option<&str> {
        self.grounding.as_deref()
    }

    /// Render the whole conversation as `role: content` blocks.
    pub fn transcript(&self) -> String {
        self.view()
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
