//! Engine position within the workflow state machine.

use serde::{Deserialize, Serialize};

/// A node of the workflow state machine.
///
/// `Start` is the initial node and `End` the terminal one. `Route` is a
/// pure decision point and never a suspension point; checkpoints are only
/// ever written at `HumanReview` (suspended) and `End` (completed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Start,
    Assistant,
    Route,
    HumanReview,
    Tools,
    End,
}

impl Node {
    /// Whether this node terminates the run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Node::End)
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Node::Start => "start",
            Node::Assistant => "assistant",
            Node::Route => "route",
            Node::HumanReview => "human_review",
            Node::Tools => "tools",
            Node::End => "end",
        };
        f.write_str(name)
    }
}
