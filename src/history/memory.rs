use crate::models::chat::{ ChatMessage, Role };

/// Chronological message log for one conversation. Always starts with the
/// greeting; messages are only ever appended.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    messages: Vec<ChatMessage>,
}

impl ConversationMemory {
    pub fn new(greeting: &str) -> Self {
        Self {
            messages: vec![ChatMessage::new(Role::Assistant, greeting)],
        }
    }

    pub fn add_message(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(ChatMessage::new(role, content));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The last `limit` messages, or all of them when `limit` is 0.
    pub fn window(&self, limit: usize) -> &[ChatMessage] {
        if limit == 0 || limit >= self.messages.len() {
            &self.messages
        } else {
            &self.messages[self.messages.len() - limit..]
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
