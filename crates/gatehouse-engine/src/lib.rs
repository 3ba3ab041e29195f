//! Workflow engine for human-gated conversational tool use.
//!
//! The engine drives one conversation thread through a small state machine:
//!
//! ```text
//! START
//!   │
//!   ▼
//! ┌───────────┐
//! │ ASSISTANT │ ◄───────────────────────┐
//! └───────────┘                         │
//!   │                                   │
//!   ▼                                   │
//! ┌───────┐   no tool calls   ┌─────┐   │
//! │ ROUTE │ ────────────────► │ END │   │
//! └───────┘                   └─────┘   │
//!   │         │                         │
//!   │         │ protected & !autopilot  │
//!   │         ▼                         │
//!   │   ┌──────────────┐  feedback      │
//!   │   │ HUMAN_REVIEW │ ───────────────┤
//!   │   └──────────────┘                │
//!   │         │ continue / update       │
//!   ▼         ▼                         │
//! ┌───────────────┐                     │
//! │     TOOLS     │ ────────────────────┘
//! └───────────────┘
//! ```
//!
//! `ROUTE` is a pure decision over the latest assistant message. The two
//! suspension boundaries (entering `HUMAN_REVIEW` and reaching `END`)
//! each write a checkpoint synchronously before control returns to the
//! caller, so a crash after a returned result never loses state.

pub mod collector;
pub mod convert;
pub mod engine;
pub mod genai_provider;
pub mod provider;
pub mod router;

pub use collector::{AssistantTurn, TurnCollector};
pub use engine::{EngineConfig, EngineError, RunResult, WorkflowEngine};
pub use genai_provider::GenAiProvider;
pub use provider::{ChatFragment, FinishReason, FragmentStream, ModelError, ModelProvider};
pub use router::{route_assistant_turn, Route};
