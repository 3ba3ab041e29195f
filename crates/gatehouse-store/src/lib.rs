//! Checkpoint persistence for conversation threads.
//!
//! A [`Checkpoint`] is the full durable record of one thread: its
//! conversation state, the engine's position in the state machine, and,
//! if the thread is suspended, the pending approval awaiting human input.
//! Each save fully supersedes the previous checkpoint; no history is kept.
//!
//! The store is the single source of truth when a new run begins for an
//! existing thread: the engine always loads from it rather than from
//! caller-supplied state.

use async_trait::async_trait;
use gatehouse_contract::{Node, PendingApproval, Thread};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod memory_store;

pub use memory_store::MemoryStore;

/// Storage errors.
#[derive(Debug, Error)]
pub enum CheckpointStoreError {
    /// No checkpoint exists for the thread.
    #[error("Thread not found: {0}")]
    NotFound(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable snapshot of a thread and the engine's position within it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// The full conversation state.
    pub thread: Thread,
    /// Which node runs next when the thread is driven again.
    pub position: Node,
    /// The suspended tool call, present iff `position` is `HumanReview`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingApproval>,
}

impl Checkpoint {
    /// Checkpoint for a thread that ran to completion.
    pub fn completed(thread: Thread) -> Self {
        Self {
            thread,
            position: Node::End,
            pending: None,
        }
    }

    /// Checkpoint for a thread suspended on human review.
    pub fn suspended(thread: Thread, approval: PendingApproval) -> Self {
        Self {
            thread,
            position: Node::HumanReview,
            pending: Some(approval),
        }
    }

    /// Whether the thread is awaiting a review decision.
    pub fn is_suspended(&self) -> bool {
        self.pending.is_some()
    }
}

/// Key-value persistence for per-thread checkpoints.
///
/// Implementations must serialize `save`/`load` per key; a store-wide lock
/// is acceptable for the expected single-digit-concurrent-thread workload.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Persist a checkpoint, overwriting any prior entry for the thread.
    async fn save(
        &self,
        thread_id: &str,
        checkpoint: &Checkpoint,
    ) -> Result<(), CheckpointStoreError>;

    /// Load the checkpoint for a thread.
    ///
    /// Fails with [`CheckpointStoreError::NotFound`] if the thread has
    /// never been checkpointed.
    async fn load(&self, thread_id: &str) -> Result<Checkpoint, CheckpointStoreError>;

    /// Remove a thread's checkpoint. Removing an absent thread is not an
    /// error.
    async fn clear(&self, thread_id: &str) -> Result<(), CheckpointStoreError>;

    /// List all checkpointed thread ids, sorted.
    async fn list(&self) -> Result<Vec<String>, CheckpointStoreError>;
}
