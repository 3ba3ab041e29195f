//! Routing decision after each assistant turn.

use gatehouse_contract::Message;

/// Where the engine goes after an assistant turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// No tool calls: the run is complete.
    End,
    /// Execute the requested tool calls directly.
    Tools,
    /// Hold the batch for human review.
    HumanReview,
}

/// Decide the next stage from the latest assistant message.
///
/// Pure and total: consults nothing beyond the message, the protected set,
/// and the autopilot flag. If the assistant requests several calls and any
/// one of them is protected, the entire batch is held for review.
pub fn route_assistant_turn(message: &Message, protected: &[String], autopilot: bool) -> Route {
    let calls = message.calls();
    if calls.is_empty() {
        return Route::End;
    }

    if !autopilot && calls.iter().any(|c| protected.iter().any(|p| p == &c.name)) {
        return Route::HumanReview;
    }

    Route::Tools
}
