//! In-memory conversation transcript.
//!
//! A [`Conversation`] is an ordered, append-only list of [`Turn`]s plus an
//! opaque session id. The only mutators are [`Conversation::append`] and
//! [`Conversation::clear`]; clearing also mints a fresh session id.
//! Nothing here is persisted or shared: the owning chat session holds it.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
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

/// One message of the transcript. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

#[derive(Debug, Clone)]
pub struct Conversation {
    turns: Vec<Turn>,
    session_id: Uuid,
}

impl Conversation {
    pub fn new() -> Self {
        Self { turns: Vec::new(), session_id: new_session_id() }
    }

    /// Append a turn. Role alternation is the caller's concern.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Drop every turn and start a new session.
    pub fn clear(&mut self) {
        self.turns.clear();
        let previous = self.session_id;
        self.session_id = new_session_id();
        // Every clear must yield a different id.
        while self.session_id == previous {
            self.session_id = Uuid::new_v4();
        }
    }

    /// All turns in chronological order.
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    pub fn session_id(&self) -> String {
        self.session_id.to_string()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

fn new_session_id() -> Uuid {
    Uuid::now_v7()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty_with_a_session_id() {
        let c = Conversation::new();
        assert!(c.is_empty());
        assert!(!c.session_id().is_empty());
    }

    #[test]
    fn append_preserves_order() {
        let mut c = Conversation::new();
        c.append(Turn::user("one"));
        c.append(Turn::assistant("two"));
        c.append(Turn::user("three"));
        let contents: Vec<&str> = c.all().iter().map(Turn::content).collect();
        assert_eq!(contents, ["one", "two", "three"]);
        assert_eq!(c.all()[1].role(), Role::Assistant);
    }

    #[test]
    fn append_does_not_enforce_alternation() {
        let mut c = Conversation::new();
        c.append(Turn::user("a"));
        c.append(Turn::user("b"));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn all_is_idempotent() {
        let mut c = Conversation::new();
        c.append(Turn::user("q"));
        c.append(Turn::assistant("a"));
        let first = c.all().to_vec();
        let second = c.all().to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn clear_empties_and_rotates_session_id() {
        let mut c = Conversation::new();
        c.append(Turn::user("q"));
        let before = c.session_id();
        c.clear();
        assert!(c.is_empty());
        assert_ne!(c.session_id(), before);
    }

    #[test]
    fn consecutive_clears_each_rotate() {
        let mut c = Conversation::new();
        let s0 = c.session_id();
        c.clear();
        let s1 = c.session_id();
        c.clear();
        let s2 = c.session_id();
        assert_ne!(s0, s1);
        assert_ne!(s1, s2);
        assert_ne!(s0, s2);
    }

    #[test]
    fn turn_serialises_lowercase_role() {
        let json = serde_json::to_value(Turn::assistant("4")).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "assistant", "content": "4" }));
    }
}
