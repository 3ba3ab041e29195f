//! Model collaborator contract.
//!
//! The model is opaque to the engine: given a system prompt, the message
//! log, and the available tool descriptors, it yields a stream of
//! [`ChatFragment`]s terminated by an end-of-turn marker. The engine
//! buffers fragments into one complete assistant turn before acting on
//! any of it.

use futures::Stream;
use gatehouse_contract::{Message, ToolDescriptor};
use std::pin::Pin;
use thiserror::Error;

/// Why the model ended its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// Normal stop: the turn is plain text.
    Stop,
    /// The turn requests tool calls.
    ToolCalls,
}

/// One incremental piece of a streamed assistant turn.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatFragment {
    /// Text content delta.
    TextDelta(String),
    /// A tool call opened with its name.
    ToolCallStart { id: String, name: String },
    /// Incremental tool-call argument text.
    ToolCallDelta { id: String, args_delta: String },
    /// End of turn.
    End { finish: FinishReason },
}

/// Model call errors.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The provider rejected or failed the request.
    #[error("Model call failed: {0}")]
    Provider(String),

    /// The stream broke mid-turn.
    #[error("Model stream failed: {0}")]
    Stream(String),
}

/// A stream of chat fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<ChatFragment, ModelError>> + Send>>;

/// The opaque model collaborator.
#[async_trait::async_trait]
pub trait ModelProvider: Send + Sync {
    /// Start one assistant turn over the given message log.
    async fn stream_turn(
        &self,
        system_prompt: &str,
        messages: &[Message],
        tools: &[ToolDescriptor],
    ) -> Result<FragmentStream, ModelError>;
}
