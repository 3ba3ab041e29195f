//! Human review vocabulary: pending approvals and review decisions.

use crate::message::ToolCall;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One suspended tool call awaiting human input.
///
/// Exists only between suspension and resumption; it becomes part of the
/// durable checkpoint while the thread is suspended and is discarded once
/// the review is resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingApproval {
    /// The tool-call id the review resolves.
    pub call_id: String,
    /// Name of the tool awaiting approval.
    pub tool_name: String,
    /// Argument payload as requested by the model.
    pub arguments: Value,
}

impl PendingApproval {
    /// Build an approval from a pending tool call.
    pub fn from_call(call: &ToolCall) -> Self {
        Self {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            arguments: call.arguments.clone(),
        }
    }
}

impl std::fmt::Display for PendingApproval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let args = serde_json::to_string_pretty(&self.arguments)
            .unwrap_or_else(|_| self.arguments.to_string());
        write!(
            f,
            "Your input is required for the following tool call:\n  tool: {}\n  arguments: {}",
            self.tool_name, args
        )
    }
}

/// The human's resolution of a [`PendingApproval`].
///
/// Exactly one decision per resumption call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ReviewDecision {
    /// Execute the pending tool call unmodified.
    Continue,
    /// Execute with a replacement argument payload.
    Update { arguments: Value },
    /// Skip execution; feed the text back to the model as the tool's output.
    Feedback { text: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_approval_from_call() {
        let call = ToolCall::new("c1", "create_campaign", json!({"name": "Spring Sale"}));
        let approval = PendingApproval::from_call(&call);
        assert_eq!(approval.call_id, "c1");
        assert_eq!(approval.tool_name, "create_campaign");
        assert_eq!(approval.arguments["name"], "Spring Sale");
    }

    #[test]
    fn test_approval_display_names_tool_and_arguments() {
        let approval = PendingApproval {
            call_id: "c1".into(),
            tool_name: "send_campaign_email".into(),
            arguments: json!({"subject": "Hi"}),
        };
        let text = approval.to_string();
        assert!(text.contains("send_campaign_email"));
        assert!(text.contains("subject"));
    }

    #[test]
    fn test_decision_serde_tags() {
        let cont = serde_json::to_value(ReviewDecision::Continue).unwrap();
        assert_eq!(cont["action"], "continue");

        let update = serde_json::to_value(ReviewDecision::Update {
            arguments: json!({"name": "Summer Sale"}),
        })
        .unwrap();
        assert_eq!(update["action"], "update");
        assert_eq!(update["arguments"]["name"], "Summer Sale");

        let feedback = serde_json::to_value(ReviewDecision::Feedback {
            text: "rename it first".into(),
        })
        .unwrap();
        assert_eq!(feedback["action"], "feedback");
    }

    #[test]
    fn test_decision_roundtrip() {
        let decisions = vec![
            ReviewDecision::Continue,
            ReviewDecision::Update { arguments: json!({"a": 1}) },
            ReviewDecision::Feedback { text: "no".into() },
        ];
        for decision in decisions {
            let encoded = serde_json::to_string(&decision).unwrap();
            let parsed: ReviewDecision = serde_json::from_str(&encoded).unwrap();
            assert_eq!(parsed, decision);
        }
    }
}
