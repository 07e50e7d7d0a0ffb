//! Conversation model exchanged with the model-call service.

use serde::{Deserialize, Serialize};

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool invocation requested by the model.
///
/// `arguments` is kept as the raw JSON text the model produced; decoding and
/// validation happen at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub arguments: String,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// One turn in a conversation.
///
/// On an assistant turn `tool_call` is the model's request. On a tool turn it
/// names the request the content answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,
}

impl Message {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// Assistant turn that asks for a tool invocation.
    pub fn tool_request(call: ToolCall) -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            tool_call: Some(call),
        }
    }

    /// Tool turn answering `call`.
    pub fn tool_result(call: ToolCall, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_call: Some(call),
        }
    }

    pub fn is_tool_request(&self) -> bool {
        self.role == Role::Assistant && self.tool_call.is_some()
    }
}

/// Append-only sequence of messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Conversation opened with a system instruction and a first user turn.
    pub fn opened(system: impl Into<String>, user: impl Into<String>) -> Self {
        let mut conversation = Self::new();
        conversation.push(Message::system(system));
        conversation.push(Message::user(user));
        conversation
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Most recent message from `role`.
    pub fn last_from(&self, role: Role) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == role)
    }

    /// Number of messages from `role`.
    pub fn count(&self, role: Role) -> usize {
        self.messages.iter().filter(|m| m.role == role).count()
    }
}

impl<'a> IntoIterator for &'a Conversation {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Tool).unwrap(), "\"tool\"");
        assert_eq!(format!("{}", Role::Assistant), "assistant");
    }

    #[test]
    fn test_opened_conversation() {
        let conversation = Conversation::opened("be factual", "check this");
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.messages()[0].role, Role::System);
        assert_eq!(conversation.last().unwrap().content, "check this");
    }

    #[test]
    fn test_last_from_role() {
        let mut conversation = Conversation::opened("sys", "first");
        conversation.push(Message::assistant("reply"));
        conversation.push(Message::user("second"));
        conversation.push(Message::assistant("reply 2"));

        assert_eq!(conversation.last_from(Role::User).unwrap().content, "second");
        assert_eq!(conversation.count(Role::Assistant), 2);
        assert!(conversation.last_from(Role::Tool).is_none());
    }

    #[test]
    fn test_tool_messages() {
        let call = ToolCall::new("get_domain_for_single_gene", r#"{"gene":"TP53"}"#).with_id("call_1");
        let request = Message::tool_request(call.clone());
        assert!(request.is_tool_request());

        let result = Message::tool_result(call, "ok");
        assert_eq!(result.role, Role::Tool);
        assert!(!result.is_tool_request());
        assert_eq!(result.tool_call.unwrap().id.as_deref(), Some("call_1"));
    }

    #[test]
    fn test_plain_message_omits_tool_call() {
        let json = serde_json::to_string(&Message::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }
}
