use serde::{Deserialize, Serialize};

use crate::api::ChatMessage;
use crate::core::message::{Role, Turn};

/// Which turns are sent as context with a new request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContextPolicy {
    /// Every turn so far, giving the model multi-turn memory.
    #[default]
    FullHistory,
    /// Only the newest user turn.
    SingleTurn,
}

impl ContextPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ContextPolicy::FullHistory => "full-history",
            ContextPolicy::SingleTurn => "single-turn",
        }
    }
}

impl std::str::FromStr for ContextPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "full-history" | "full" => Ok(ContextPolicy::FullHistory),
            "single-turn" | "single" => Ok(ContextPolicy::SingleTurn),
            other => Err(format!(
                "unknown context policy '{other}' (expected full-history or single-turn)"
            )),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Appends `text` verbatim as a user turn. Blank input is rejected and
    /// leaves the conversation untouched.
    pub fn append_user_turn(&mut self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        self.turns.push(Turn::user(text));
        true
    }

    pub fn append_assistant_turn(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::assistant(text));
    }

    pub fn snapshot_for_request(&self, policy: ContextPolicy) -> Vec<ChatMessage> {
        match policy {
            ContextPolicy::FullHistory => self.turns.iter().map(Turn::to_api_message).collect(),
            ContextPolicy::SingleTurn => self
                .turns
                .iter()
                .rev()
                .find(|turn| turn.role.is_user())
                .map(Turn::to_api_message)
                .into_iter()
                .collect(),
        }
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Drops the current history and seeds a single user turn carrying a
    /// stored transcript.
    pub fn replace_with_seed(&mut self, transcript: &str) {
        self.turns.clear();
        if !transcript.trim().is_empty() {
            self.turns.push(Turn::user(transcript));
        }
    }

    /// Plain-text rendering used as the stored transcript blob.
    pub fn to_transcript(&self) -> String {
        let mut out = String::new();
        for turn in &self.turns {
            if !out.is_empty() {
                out.push_str("\n\n");
            }
            out.push_str(turn.role.transcript_label());
            out.push_str(": ");
            out.push_str(&turn.content);
        }
        out
    }

    pub fn count(&self, role: Role) -> usize {
        self.turns.iter().filter(|turn| turn.role == role).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_user_turns_are_rejected() {
        let mut conversation = Conversation::new();
        assert!(!conversation.append_user_turn(""));
        assert!(!conversation.append_user_turn("  \n\t "));
        assert!(conversation.is_empty());
    }

    #[test]
    fn user_text_is_kept_verbatim() {
        let mut conversation = Conversation::new();
        assert!(conversation.append_user_turn("  padded  "));
        assert_eq!(conversation.last().expect("turn").content, "  padded  ");
    }

    #[test]
    fn full_history_sends_every_turn_in_order() {
        let mut conversation = Conversation::new();
        conversation.append_user_turn("one");
        conversation.append_assistant_turn("two");
        conversation.append_user_turn("three");

        let messages = conversation.snapshot_for_request(ContextPolicy::FullHistory);
        let roles: Vec<_> = messages.iter().map(|m| m.role.as_str()).collect();
        let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(roles, ["user", "assistant", "user"]);
        assert_eq!(contents, ["one", "two", "three"]);
    }

    #[test]
    fn single_turn_sends_only_the_latest_user_turn() {
        let mut conversation = Conversation::new();
        conversation.append_user_turn("one");
        conversation.append_assistant_turn("two");
        conversation.append_user_turn("three");

        let messages = conversation.snapshot_for_request(ContextPolicy::SingleTurn);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "three");
    }

    #[test]
    fn seeding_replaces_history_with_one_turn() {
        let mut conversation = Conversation::new();
        conversation.append_user_turn("old");
        conversation.append_assistant_turn("reply");
        conversation.replace_with_seed("You: earlier\n\nAI: answer");
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.turns()[0].role, Role::User);
        assert_eq!(conversation.turns()[0].content, "You: earlier\n\nAI: answer");
    }

    #[test]
    fn transcript_labels_each_turn() {
        let mut conversation = Conversation::new();
        conversation.append_user_turn("Hi");
        conversation.append_assistant_turn("Hello!");
        assert_eq!(conversation.to_transcript(), "You: Hi\n\nAI: Hello!");
    }

    #[test]
    fn context_policy_parses_config_spellings() {
        assert_eq!("single-turn".parse::<ContextPolicy>(), Ok(ContextPolicy::SingleTurn));
        assert_eq!("full".parse::<ContextPolicy>(), Ok(ContextPolicy::FullHistory));
        assert!("everything".parse::<ContextPolicy>().is_err());
    }
}
