//! Conversation history (§3, §4.7).
//!
//! `gglib` has no chat history module of its own; this one is shaped
//! around a turn list plus `pop_last_user_message` / `set_context`,
//! named the way `gglib-core`'s error types name things (`Turn`, `Role`)
//! rather than as a loose dict.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// System prompt plus a trimmed window of dialogue turns. The system
/// prompt is never trimmed — it is always first.
#[derive(Debug, Clone, Default)]
pub struct History {
    system_prompt: Option<String>,
    turns: Vec<Turn>,
    max_turns: usize,
}

impl History {
    #[must_use]
    pub fn new(max_turns: usize) -> Self {
        Self {
            system_prompt: None,
            turns: Vec::new(),
            max_turns,
        }
    }

    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = Some(prompt.into());
    }

    #[must_use]
    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn {
            role: Role::User,
            content: content.into(),
        });
        self.trim();
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(Turn {
            role: Role::Assistant,
            content: content.into(),
        });
        self.trim();
    }

    /// If a response was interrupted (barge-in) before anything was
    /// synthesized, the just-added user turn has no matching assistant
    /// reply and must be dropped rather than left dangling (§4.7).
    pub fn pop_dangling_user_turn(&mut self) {
        if matches!(self.turns.last(), Some(t) if t.role == Role::User) {
            self.turns.pop();
        }
    }

    fn trim(&mut self) {
        if self.turns.len() > self.max_turns {
            let excess = self.turns.len() - self.max_turns;
            self.turns.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_to_max_turns() {
        let mut history = History::new(2);
        history.push_user("one");
        history.push_assistant("two");
        history.push_user("three");
        history.push_assistant("four");
        assert_eq!(history.turns().len(), 2);
        assert_eq!(history.turns()[0].content, "three");
        assert_eq!(history.turns()[1].content, "four");
    }

    #[test]
    fn pops_dangling_user_turn() {
        let mut history = History::new(20);
        history.push_assistant("prior reply");
        history.push_user("interrupted question");
        history.pop_dangling_user_turn();
        assert_eq!(history.turns().len(), 1);
        assert_eq!(history.turns()[0].content, "prior reply");
    }

    #[test]
    fn does_not_pop_when_last_turn_is_assistant() {
        let mut history = History::new(20);
        history.push_user("question");
        history.push_assistant("answer");
        history.pop_dangling_user_turn();
        assert_eq!(history.turns().len(), 2);
    }

    #[test]
    fn system_prompt_is_independent_of_trimming() {
        let mut history = History::new(1);
        history.set_system_prompt("you are an assistant");
        history.push_user("a");
        history.push_assistant("b");
        history.push_user("c");
        assert_eq!(history.system_prompt(), Some("you are an assistant"));
        assert_eq!(history.turns().len(), 1);
    }
}
