//! Buffering of streamed model output into complete assistant turns.

use crate::provider::{ChatFragment, FinishReason};
use gatehouse_contract::ToolCall;
use serde_json::Value;

/// Partial tool call being collected during streaming.
#[derive(Debug, Clone)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

/// Collector for streamed assistant turns.
///
/// Accumulates text and tool-call fragments; tool calls are kept in the
/// order they were started so batch execution preserves request order.
/// The router only ever sees the finished turn, never partial argument
/// text.
#[derive(Debug, Default)]
pub struct TurnCollector {
    text: String,
    calls: Vec<PartialToolCall>,
    finish: Option<FinishReason>,
}

impl TurnCollector {
    /// Create a new collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one fragment.
    pub fn process(&mut self, fragment: ChatFragment) {
        match fragment {
            ChatFragment::TextDelta(delta) => self.text.push_str(&delta),
            ChatFragment::ToolCallStart { id, name } => {
                if let Some(partial) = self.calls.iter_mut().find(|c| c.id == id) {
                    if partial.name.is_empty() {
                        partial.name = name;
                    }
                } else {
                    self.calls.push(PartialToolCall {
                        id,
                        name,
                        arguments: String::new(),
                    });
                }
            }
            ChatFragment::ToolCallDelta { id, args_delta } => {
                if let Some(partial) = self.calls.iter_mut().find(|c| c.id == id) {
                    partial.arguments.push_str(&args_delta);
                } else {
                    self.calls.push(PartialToolCall {
                        id,
                        name: String::new(),
                        arguments: args_delta,
                    });
                }
            }
            ChatFragment::End { finish } => self.finish = Some(finish),
        }
    }

    /// Current accumulated text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether any tool calls have been collected.
    pub fn has_tool_calls(&self) -> bool {
        !self.calls.is_empty()
    }

    /// Finish collecting and return the complete turn.
    pub fn finish(self) -> AssistantTurn {
        let finish = self.finish.unwrap_or({
            if self.calls.is_empty() {
                FinishReason::Stop
            } else {
                FinishReason::ToolCalls
            }
        });

        let tool_calls: Vec<ToolCall> = self
            .calls
            .into_iter()
            .map(|p| {
                let arguments = if p.arguments.trim().is_empty() {
                    Value::Object(serde_json::Map::new())
                } else {
                    serde_json::from_str(&p.arguments).unwrap_or(Value::Null)
                };
                ToolCall::new(p.id, p.name, arguments)
            })
            .collect();

        AssistantTurn {
            text: self.text,
            tool_calls,
            finish,
        }
    }
}

/// A complete, buffered assistant turn.
#[derive(Debug, Clone)]
pub struct AssistantTurn {
    /// Accumulated text content.
    pub text: String,
    /// Collected tool calls, in request order.
    pub tool_calls: Vec<ToolCall>,
    /// Why the turn ended.
    pub finish: FinishReason,
}

impl AssistantTurn {
    /// Check if tool execution is needed.
    pub fn needs_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collects_text_deltas() {
        let mut collector = TurnCollector::new();
        collector.process(ChatFragment::TextDelta("Hel".into()));
        collector.process(ChatFragment::TextDelta("lo".into()));
        collector.process(ChatFragment::End { finish: FinishReason::Stop });

        let turn = collector.finish();
        assert_eq!(turn.text, "Hello");
        assert!(!turn.needs_tools());
        assert_eq!(turn.finish, FinishReason::Stop);
    }

    #[test]
    fn test_collects_tool_call_across_fragments() {
        let mut collector = TurnCollector::new();
        collector.process(ChatFragment::ToolCallStart {
            id: "c1".into(),
            name: "create_campaign".into(),
        });
        collector.process(ChatFragment::ToolCallDelta {
            id: "c1".into(),
            args_delta: "{\"name\":".into(),
        });
        collector.process(ChatFragment::ToolCallDelta {
            id: "c1".into(),
            args_delta: "\"Spring Sale\"}".into(),
        });
        collector.process(ChatFragment::End { finish: FinishReason::ToolCalls });

        let turn = collector.finish();
        assert!(turn.needs_tools());
        assert_eq!(turn.tool_calls.len(), 1);
        assert_eq!(turn.tool_calls[0].name, "create_campaign");
        assert_eq!(turn.tool_calls[0].arguments, json!({"name": "Spring Sale"}));
    }

    #[test]
    fn test_preserves_request_order_across_interleaved_deltas() {
        let mut collector = TurnCollector::new();
        collector.process(ChatFragment::ToolCallStart { id: "a".into(), name: "first".into() });
        collector.process(ChatFragment::ToolCallStart { id: "b".into(), name: "second".into() });
        collector.process(ChatFragment::ToolCallStart { id: "c".into(), name: "third".into() });
        // Argument deltas arrive out of call order.
        collector.process(ChatFragment::ToolCallDelta { id: "c".into(), args_delta: "{}".into() });
        collector.process(ChatFragment::ToolCallDelta { id: "a".into(), args_delta: "{}".into() });
        collector.process(ChatFragment::ToolCallDelta { id: "b".into(), args_delta: "{}".into() });
        collector.process(ChatFragment::End { finish: FinishReason::ToolCalls });

        let turn = collector.finish();
        let names: Vec<&str> = turn.tool_calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_empty_arguments_become_empty_object() {
        let mut collector = TurnCollector::new();
        collector.process(ChatFragment::ToolCallStart { id: "c1".into(), name: "ping".into() });
        collector.process(ChatFragment::End { finish: FinishReason::ToolCalls });

        let turn = collector.finish();
        assert_eq!(turn.tool_calls[0].arguments, json!({}));
    }

    #[test]
    fn test_malformed_arguments_become_null() {
        let mut collector = TurnCollector::new();
        collector.process(ChatFragment::ToolCallStart { id: "c1".into(), name: "ping".into() });
        collector.process(ChatFragment::ToolCallDelta {
            id: "c1".into(),
            args_delta: "{not json".into(),
        });

        let turn = collector.finish();
        assert_eq!(turn.tool_calls[0].arguments, Value::Null);
    }

    #[test]
    fn test_missing_end_marker_infers_finish_reason() {
        let mut collector = TurnCollector::new();
        collector.process(ChatFragment::TextDelta("hi".into()));
        assert_eq!(collector.finish().finish, FinishReason::Stop);

        let mut collector = TurnCollector::new();
        collector.process(ChatFragment::ToolCallStart { id: "c1".into(), name: "t".into() });
        assert_eq!(collector.finish().finish, FinishReason::ToolCalls);
    }

    #[test]
    fn test_delta_before_start_still_tracks_call() {
        let mut collector = TurnCollector::new();
        collector.process(ChatFragment::ToolCallDelta {
            id: "c1".into(),
            args_delta: "{\"a\":1}".into(),
        });
        collector.process(ChatFragment::ToolCallStart { id: "c1".into(), name: "late".into() });

        let turn = collector.finish();
        assert_eq!(turn.tool_calls.len(), 1);
        assert_eq!(turn.tool_calls[0].name, "late");
        assert_eq!(turn.tool_calls[0].arguments, json!({"a": 1}));
    }
}
