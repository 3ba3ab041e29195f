//! Thread (conversation) state.
//!
//! A `Thread` owns the ordered message log plus the per-conversation review
//! configuration: the protected tool set and the autopilot flag.

use crate::message::{Message, Role};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

/// A conversation thread: an append-only message log plus review settings.
///
/// Thread is an immutable data structure. All modification methods return a
/// new Thread instance (functional style).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    /// Unique thread identifier.
    pub id: String,
    /// Conversation messages, in conversation order.
    pub messages: Vec<Message>,
    /// Tool names that require human approval before execution.
    #[serde(default)]
    pub protected_tools: Vec<String>,
    /// When set, tool calls bypass human review entirely.
    #[serde(default)]
    pub autopilot: bool,
    /// Metadata.
    #[serde(default)]
    pub metadata: ThreadMetadata,
}

/// Thread metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadMetadata {
    /// Creation timestamp (unix millis).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<u64>,
    /// Last update timestamp (unix millis).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<u64>,
    /// Custom metadata.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

impl Thread {
    /// Create a new thread with the given ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
            protected_tools: Vec::new(),
            autopilot: false,
            metadata: ThreadMetadata {
                created_at: Some(now_millis()),
                ..ThreadMetadata::default()
            },
        }
    }

    /// Set the protected tool names (pure function, returns new Thread).
    #[must_use]
    pub fn with_protected_tools(mut self, tools: impl IntoIterator<Item = String>) -> Self {
        self.protected_tools = tools.into_iter().collect();
        self
    }

    /// Set the autopilot flag (pure function, returns new Thread).
    #[must_use]
    pub fn with_autopilot(mut self, autopilot: bool) -> Self {
        self.autopilot = autopilot;
        self
    }

    /// Append a message (pure function, returns new Thread).
    #[must_use]
    pub fn with_message(mut self, msg: Message) -> Self {
        self.messages.push(msg);
        self.metadata.updated_at = Some(now_millis());
        self
    }

    /// Append multiple messages (pure function, returns new Thread).
    #[must_use]
    pub fn with_messages(mut self, msgs: impl IntoIterator<Item = Message>) -> Self {
        self.messages.extend(msgs);
        self.metadata.updated_at = Some(now_millis());
        self
    }

    /// Replace the most recent assistant message (pure function).
    ///
    /// Used when a human review updates the arguments of a pending tool
    /// call: the rewritten assistant turn supersedes the original in place.
    #[must_use]
    pub fn with_last_assistant_replaced(mut self, msg: Message) -> Self {
        if let Some(pos) = self
            .messages
            .iter()
            .rposition(|m| m.role == Role::Assistant)
        {
            self.messages[pos] = msg;
            self.metadata.updated_at = Some(now_millis());
        }
        self
    }

    /// The most recent message, if any.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The most recent assistant message, if any.
    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }

    /// Whether the given tool name is in the protected set.
    pub fn is_protected(&self, tool_name: &str) -> bool {
        self.protected_tools.iter().any(|t| t == tool_name)
    }

    /// Number of messages in the log.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ToolCall;
    use serde_json::json;

    #[test]
    fn test_new_thread_is_empty() {
        let thread = Thread::new("t1");
        assert_eq!(thread.id, "t1");
        assert_eq!(thread.message_count(), 0);
        assert!(thread.protected_tools.is_empty());
        assert!(!thread.autopilot);
        assert!(thread.metadata.created_at.is_some());
    }

    #[test]
    fn test_with_message_appends_in_order() {
        let thread = Thread::new("t1")
            .with_message(Message::user("first"))
            .with_message(Message::assistant("second"))
            .with_message(Message::user("third"));

        let contents: Vec<&str> = thread.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert!(thread.metadata.updated_at.is_some());
    }

    #[test]
    fn test_last_assistant_skips_tool_results() {
        let thread = Thread::new("t1")
            .with_message(Message::user("hi"))
            .with_message(Message::assistant_with_tool_calls(
                "calling",
                vec![ToolCall::new("c1", "query", json!({}))],
            ))
            .with_message(Message::tool("c1", "rows"));

        let last = thread.last_assistant().unwrap();
        assert_eq!(last.content, "calling");
        assert!(last.has_tool_calls());
    }

    #[test]
    fn test_is_protected() {
        let thread = Thread::new("t1")
            .with_protected_tools(vec!["create_campaign".to_string()]);
        assert!(thread.is_protected("create_campaign"));
        assert!(!thread.is_protected("query"));
    }

    #[test]
    fn test_replace_last_assistant() {
        let thread = Thread::new("t1")
            .with_message(Message::user("hi"))
            .with_message(Message::assistant_with_tool_calls(
                "calling",
                vec![ToolCall::new("c1", "create_campaign", json!({"name": "A"}))],
            ))
            .with_message(Message::tool("c0", "earlier result"));

        let replacement = Message::assistant_with_tool_calls(
            "calling",
            vec![ToolCall::new("c1", "create_campaign", json!({"name": "B"}))],
        );
        let thread = thread.with_last_assistant_replaced(replacement);

        let last = thread.last_assistant().unwrap();
        assert_eq!(last.calls()[0].arguments["name"], "B");
        // Replacement happens in place; later tool message is untouched.
        assert_eq!(thread.messages[2].content, "earlier result");
    }

    #[test]
    fn test_replace_last_assistant_without_assistant_is_noop() {
        let thread = Thread::new("t1").with_message(Message::user("hi"));
        let thread = thread.with_last_assistant_replaced(Message::assistant("x"));
        assert_eq!(thread.message_count(), 1);
        assert_eq!(thread.messages[0].role, Role::User);
    }

    #[test]
    fn test_thread_roundtrip() {
        let thread = Thread::new("t1")
            .with_protected_tools(vec!["send_campaign_email".to_string()])
            .with_autopilot(true)
            .with_message(Message::user("hello"));

        let json = serde_json::to_string(&thread).unwrap();
        let parsed: Thread = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, thread);
    }
}
