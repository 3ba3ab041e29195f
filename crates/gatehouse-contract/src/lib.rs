//! Conversation domain model and tool contract.
//!
//! This crate defines the types the rest of the workspace operates on:
//! conversation messages and threads, the [`Tool`] trait with its descriptor
//! and result types, the [`ToolRegistry`], and the human-review vocabulary
//! ([`PendingApproval`], [`ReviewDecision`]) together with the engine
//! position type ([`Node`]).
//!
//! Everything here is plain data plus one object-safe async trait; no
//! engine or storage logic lives in this crate.

pub mod message;
pub mod registry;
pub mod review;
pub mod thread;
pub mod tool;
pub mod workflow;

pub use message::{gen_message_id, Message, Role, ToolCall};
pub use registry::ToolRegistry;
pub use review::{PendingApproval, ReviewDecision};
pub use thread::{Thread, ThreadMetadata};
pub use tool::{
    validate_arguments, Tool, ToolDescriptor, ToolError, ToolResult, ToolStatus,
};
pub use workflow::Node;
