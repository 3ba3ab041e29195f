//! The workflow engine: state machine driver, suspend/resume, checkpointing.

use crate::collector::{AssistantTurn, TurnCollector};
use crate::convert::tool_response;
use crate::provider::{ModelError, ModelProvider};
use crate::router::{route_assistant_turn, Route};
use futures::StreamExt;
use gatehouse_contract::{
    validate_arguments, Message, Node, PendingApproval, ReviewDecision, Thread, ToolCall,
    ToolRegistry, ToolResult,
};
use gatehouse_store::{Checkpoint, CheckpointStore, CheckpointStoreError};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Configuration for the workflow engine.
///
/// Built once at process start and passed into the constructor; nothing is
/// read from ambient globals mid-run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// System prompt composed into every model request.
    pub system_prompt: String,
    /// Protected tool names for new threads. `None` derives the set from
    /// registry descriptors that require confirmation.
    pub protected_tools: Option<Vec<String>>,
    /// Autopilot default for new threads: bypass human review entirely.
    pub autopilot: bool,
    /// Maximum assistant/tools cycles within one `run` or `resume` call.
    pub max_rounds: usize,
    /// Whether tool-call batches execute concurrently.
    pub parallel_tools: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            system_prompt: String::new(),
            protected_tools: None,
            autopilot: false,
            max_rounds: 10,
            parallel_tools: true,
        }
    }
}

impl EngineConfig {
    /// Create a config with the given system prompt.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            ..Default::default()
        }
    }

    /// Override the protected tool set for new threads.
    #[must_use]
    pub fn with_protected_tools(mut self, tools: Vec<String>) -> Self {
        self.protected_tools = Some(tools);
        self
    }

    /// Set the autopilot default for new threads.
    #[must_use]
    pub fn with_autopilot(mut self, autopilot: bool) -> Self {
        self.autopilot = autopilot;
        self
    }

    /// Set the round bound.
    #[must_use]
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Set concurrent batch execution.
    #[must_use]
    pub fn with_parallel_tools(mut self, parallel: bool) -> Self {
        self.parallel_tools = parallel;
        self
    }
}

/// Outcome of a `run` or `resume` call.
#[derive(Debug)]
pub enum RunResult {
    /// The run reached `END`; the thread and final assistant text.
    Completed { thread: Thread, response: String },
    /// The run suspended on human review.
    Suspended { approval: PendingApproval },
}

impl RunResult {
    /// Whether the run completed.
    pub fn is_completed(&self) -> bool {
        matches!(self, RunResult::Completed { .. })
    }

    /// Whether the run suspended for review.
    pub fn is_suspended(&self) -> bool {
        matches!(self, RunResult::Suspended { .. })
    }
}

/// Engine errors.
///
/// Structural errors are returned to the caller without mutating state.
/// Tool failures never surface here; they are absorbed into the message
/// log as tool results.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Resume or load on a thread that was never checkpointed.
    #[error("Unknown thread: {0}")]
    UnknownThread(String),

    /// The thread is locked by a concurrent run, or is suspended and must
    /// be resumed rather than re-run.
    #[error("Thread busy: {0}")]
    ThreadBusy(String),

    /// Resume called with no outstanding suspension.
    #[error("No pending approval for thread: {0}")]
    InvalidResumeState(String),

    /// An `Update` decision carried a malformed argument payload; the
    /// thread remains suspended.
    #[error("Invalid tool arguments: {0}")]
    InvalidToolArguments(String),

    /// The run exceeded its assistant/tools cycle bound.
    #[error("Max rounds ({0}) exceeded")]
    MaxRoundsExceeded(usize),

    /// The model call failed; the prior checkpoint is intact and the
    /// thread safely retryable.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Checkpoint store failure.
    #[error(transparent)]
    Store(#[from] CheckpointStoreError),
}

/// Orchestrates assistant turns, routing, human review, and tool execution
/// for per-thread conversations.
pub struct WorkflowEngine {
    provider: Arc<dyn ModelProvider>,
    tools: ToolRegistry,
    store: Arc<dyn CheckpointStore>,
    config: EngineConfig,
    active: Mutex<HashSet<String>>,
}

/// Releases a thread's occupancy slot when a run finishes.
struct ThreadGuard<'a> {
    engine: &'a WorkflowEngine,
    thread_id: String,
}

impl Drop for ThreadGuard<'_> {
    fn drop(&mut self) {
        let mut active = self
            .engine
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        active.remove(&self.thread_id);
    }
}

impl WorkflowEngine {
    /// Create a new engine.
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        tools: ToolRegistry,
        store: Arc<dyn CheckpointStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            store,
            config,
            active: Mutex::new(HashSet::new()),
        }
    }

    /// The engine's tool registry.
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Drive a thread with a new user message.
    ///
    /// Creates the thread if the id is unknown; re-enters a completed
    /// thread by appending to its existing log. Fails with
    /// [`EngineError::ThreadBusy`] if the thread is mid-run or suspended
    /// awaiting review.
    pub async fn run(&self, thread_id: &str, text: &str) -> Result<RunResult, EngineError> {
        let _guard = self.occupy(thread_id)?;

        let thread = match self.store.load(thread_id).await {
            Ok(checkpoint) => {
                if checkpoint.is_suspended() {
                    return Err(EngineError::ThreadBusy(format!(
                        "thread '{thread_id}' is suspended awaiting review"
                    )));
                }
                checkpoint.thread
            }
            Err(CheckpointStoreError::NotFound(_)) => self.new_thread(thread_id),
            Err(e) => return Err(e.into()),
        };

        let thread = thread.with_message(Message::user(text));
        self.drive(thread_id, thread, Node::Assistant).await
    }

    /// Resolve a suspended thread with a review decision.
    pub async fn resume(
        &self,
        thread_id: &str,
        decision: ReviewDecision,
    ) -> Result<RunResult, EngineError> {
        let _guard = self.occupy(thread_id)?;

        let checkpoint = self.store.load(thread_id).await.map_err(|e| match e {
            CheckpointStoreError::NotFound(id) => EngineError::UnknownThread(id),
            other => EngineError::Store(other),
        })?;

        let Some(pending) = checkpoint.pending else {
            return Err(EngineError::InvalidResumeState(thread_id.to_string()));
        };
        let thread = checkpoint.thread;

        let (thread, next) = match decision {
            ReviewDecision::Continue => (thread, Node::Tools),
            ReviewDecision::Update { arguments } => {
                self.validate_update(&pending, &arguments)?;
                let Some(original) = thread.last_assistant() else {
                    return Err(EngineError::InvalidResumeState(thread_id.to_string()));
                };
                let mut replacement = original.clone();
                replacement.tool_calls = Some(vec![ToolCall::new(
                    pending.call_id.clone(),
                    pending.tool_name.clone(),
                    arguments,
                )]);
                (thread.with_last_assistant_replaced(replacement), Node::Tools)
            }
            ReviewDecision::Feedback { text } => {
                let feedback = Message::tool(pending.call_id.clone(), text);
                (thread.with_message(feedback), Node::Assistant)
            }
        };

        self.drive(thread_id, thread, next).await
    }

    fn new_thread(&self, thread_id: &str) -> Thread {
        let protected = self
            .config
            .protected_tools
            .clone()
            .unwrap_or_else(|| self.tools.protected_names());
        Thread::new(thread_id)
            .with_protected_tools(protected)
            .with_autopilot(self.config.autopilot)
    }

    fn occupy(&self, thread_id: &str) -> Result<ThreadGuard<'_>, EngineError> {
        let mut active = self
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !active.insert(thread_id.to_string()) {
            return Err(EngineError::ThreadBusy(format!(
                "thread '{thread_id}' has a run in progress"
            )));
        }
        Ok(ThreadGuard {
            engine: self,
            thread_id: thread_id.to_string(),
        })
    }

    fn validate_update(
        &self,
        pending: &PendingApproval,
        arguments: &Value,
    ) -> Result<(), EngineError> {
        match self.tools.get(&pending.tool_name) {
            Some(tool) => validate_arguments(&tool.descriptor(), arguments)
                .map_err(|e| EngineError::InvalidToolArguments(e.to_string())),
            None if arguments.is_object() => Ok(()),
            None => Err(EngineError::InvalidToolArguments(format!(
                "arguments for '{}' must be a JSON object",
                pending.tool_name
            ))),
        }
    }

    /// Run the state machine until it reaches a suspension boundary.
    ///
    /// Checkpoints are written exactly at `HUMAN_REVIEW` and `END`, after
    /// the state mutation they capture and before control returns.
    async fn drive(
        &self,
        thread_id: &str,
        mut thread: Thread,
        mut position: Node,
    ) -> Result<RunResult, EngineError> {
        let mut rounds = 0usize;

        loop {
            tracing::debug!(thread_id, node = %position, "entering node");
            match position {
                Node::Start => position = Node::Assistant,
                Node::Assistant => {
                    let turn = self.complete_turn(&thread).await?;
                    let message = if turn.tool_calls.is_empty() {
                        Message::assistant(&turn.text)
                    } else {
                        Message::assistant_with_tool_calls(&turn.text, turn.tool_calls)
                    };
                    thread = thread.with_message(message);
                    position = Node::Route;
                }
                Node::Route => {
                    let Some(last) = thread.last_assistant() else {
                        position = Node::End;
                        continue;
                    };
                    position = match route_assistant_turn(
                        last,
                        &thread.protected_tools,
                        thread.autopilot,
                    ) {
                        Route::End => Node::End,
                        Route::Tools => Node::Tools,
                        Route::HumanReview => Node::HumanReview,
                    };
                }
                Node::HumanReview => {
                    let Some(approval) = thread
                        .last_assistant()
                        .and_then(|m| m.calls().last())
                        .map(PendingApproval::from_call)
                    else {
                        position = Node::End;
                        continue;
                    };
                    self.store
                        .save(thread_id, &Checkpoint::suspended(thread, approval.clone()))
                        .await?;
                    tracing::debug!(thread_id, tool = %approval.tool_name, "suspended for review");
                    return Ok(RunResult::Suspended { approval });
                }
                Node::Tools => {
                    if rounds >= self.config.max_rounds {
                        return Err(EngineError::MaxRoundsExceeded(self.config.max_rounds));
                    }
                    rounds += 1;
                    let calls: Vec<ToolCall> = thread
                        .last_assistant()
                        .map(|m| m.calls().to_vec())
                        .unwrap_or_default();
                    let results = self.execute_batch(&calls).await;
                    thread = thread.with_messages(results);
                    position = Node::Assistant;
                }
                Node::End => {
                    let response = thread
                        .last_assistant()
                        .map(|m| m.content.clone())
                        .unwrap_or_default();
                    self.store
                        .save(thread_id, &Checkpoint::completed(thread.clone()))
                        .await?;
                    tracing::debug!(thread_id, "run completed");
                    return Ok(RunResult::Completed { thread, response });
                }
            }
        }
    }

    /// Buffer one full assistant turn from the model.
    ///
    /// A model failure propagates without writing a checkpoint, leaving
    /// the prior one intact.
    async fn complete_turn(&self, thread: &Thread) -> Result<AssistantTurn, EngineError> {
        let descriptors = self.tools.descriptors();
        let mut stream = self
            .provider
            .stream_turn(&self.config.system_prompt, &thread.messages, &descriptors)
            .await?;

        let mut collector = TurnCollector::new();
        while let Some(fragment) = stream.next().await {
            collector.process(fragment?);
        }
        Ok(collector.finish())
    }

    /// Execute a tool-call batch, returning result messages in request
    /// order.
    ///
    /// An unknown tool name aborts the batch: its error result is
    /// appended and later calls are not executed.
    async fn execute_batch(&self, calls: &[ToolCall]) -> Vec<Message> {
        let boundary = calls.iter().position(|c| !self.tools.contains(&c.name));
        let (runnable, aborted) = match boundary {
            Some(i) => (&calls[..i], Some(&calls[i])),
            None => (calls, None),
        };

        let mut messages = if self.config.parallel_tools {
            futures::future::join_all(runnable.iter().map(|c| self.invoke_call(c))).await
        } else {
            let mut out = Vec::with_capacity(runnable.len());
            for call in runnable {
                out.push(self.invoke_call(call).await);
            }
            out
        };

        if let Some(call) = aborted {
            tracing::warn!(tool = %call.name, "unknown tool aborts batch");
            let result = ToolResult::error(&call.name, format!("Tool '{}' not found", call.name));
            messages.push(tool_response(&call.id, &result));
        }

        messages
    }

    async fn invoke_call(&self, call: &ToolCall) -> Message {
        let result = match self.tools.get(&call.name) {
            None => ToolResult::error(&call.name, format!("Tool '{}' not found", call.name)),
            Some(tool) => match validate_arguments(&tool.descriptor(), &call.arguments) {
                Err(e) => ToolResult::error(&call.name, e.to_string()),
                Ok(()) => match tool.invoke(call.arguments.clone()).await {
                    Ok(result) => result,
                    Err(e) => ToolResult::error(&call.name, e.to_string()),
                },
            },
        };
        tracing::debug!(tool = %call.name, call_id = %call.id, ok = result.is_success(), "tool call finished");
        tool_response(&call.id, &result)
    }
}
