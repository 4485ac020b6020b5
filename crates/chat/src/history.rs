//! Dialogue history.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One dialogue turn.
///
/// `references` is only set on assistant messages; each entry is the
/// reference answer of a retrieved document, `None` when it had none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,

    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<Option<String>>>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            references: None,
        }
    }

    pub fn assistant(content: impl Into<String>, references: Vec<Option<String>>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            references: Some(references),
        }
    }
}

/// Append-only message log, emptied only as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryStore {
    messages: Vec<Message>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Messages in the order they were appended.
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut history = HistoryStore::new();
        history.append(Message::user("為什麼會便秘？"));
        history.append(Message::assistant("多喝水。", vec![Some("A".to_string())]));

        let roles: Vec<Role> = history.snapshot().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_clear_empties_everything() {
        let mut history = HistoryStore::new();
        history.append(Message::user("q"));
        history.clear();
        assert!(history.is_empty());
        assert!(history.snapshot().is_empty());
    }

    #[test]
    fn test_message_serialization() {
        let user = serde_json::to_string(&Message::user("hi")).unwrap();
        assert_eq!(user, r#"{"role":"user","content":"hi"}"#);

        let assistant =
            serde_json::to_string(&Message::assistant("ok", vec![None, Some("B".to_string())]))
                .unwrap();
        assert_eq!(
            assistant,
            r#"{"role":"assistant","content":"ok","references":[null,"B"]}"#
        );
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }
}
