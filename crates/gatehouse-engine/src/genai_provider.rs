//! Production model provider over the genai client.

use crate::convert::build_request;
use crate::provider::{ChatFragment, FinishReason, FragmentStream, ModelError, ModelProvider};
use async_stream::stream;
use futures::StreamExt;
use gatehouse_contract::{Message, ToolDescriptor};
use genai::chat::{ChatOptions, ChatStreamEvent};
use genai::Client;
use std::collections::HashSet;

/// Model provider backed by a genai [`Client`].
pub struct GenAiProvider {
    client: Client,
    model: String,
    chat_options: Option<ChatOptions>,
}

impl GenAiProvider {
    /// Create a provider for the given model identifier.
    pub fn new(client: Client, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            chat_options: None,
        }
    }

    /// Set chat options.
    #[must_use]
    pub fn with_chat_options(mut self, options: ChatOptions) -> Self {
        self.chat_options = Some(options);
        self
    }

    /// The configured model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl ModelProvider for GenAiProvider {
    async fn stream_turn(
        &self,
        system_prompt: &str,
        messages: &[Message],
        tools: &[ToolDescriptor],
    ) -> Result<FragmentStream, ModelError> {
        let request = build_request(system_prompt, messages, tools);

        let response = self
            .client
            .exec_chat_stream(&self.model, request, self.chat_options.as_ref())
            .await
            .map_err(|e| ModelError::Provider(e.to_string()))?;

        let mut chat_stream = response.stream;

        let fragments = stream! {
            let mut started: HashSet<String> = HashSet::new();
            let mut saw_tool_call = false;

            while let Some(event) = chat_stream.next().await {
                let event = match event {
                    Ok(event) => event,
                    Err(e) => {
                        yield Err(ModelError::Stream(e.to_string()));
                        return;
                    }
                };

                match event {
                    ChatStreamEvent::Chunk(chunk) => {
                        if !chunk.content.is_empty() {
                            yield Ok(ChatFragment::TextDelta(chunk.content));
                        }
                    }
                    ChatStreamEvent::ToolCallChunk(tool_chunk) => {
                        saw_tool_call = true;
                        let call_id = tool_chunk.tool_call.call_id.clone();

                        if !tool_chunk.tool_call.fn_name.is_empty()
                            && started.insert(call_id.clone())
                        {
                            yield Ok(ChatFragment::ToolCallStart {
                                id: call_id.clone(),
                                name: tool_chunk.tool_call.fn_name.clone(),
                            });
                        }

                        let args = tool_chunk.tool_call.fn_arguments.to_string();
                        if args != "null" && !args.is_empty() {
                            yield Ok(ChatFragment::ToolCallDelta {
                                id: call_id,
                                args_delta: args,
                            });
                        }
                    }
                    ChatStreamEvent::End(end) => {
                        // Some providers only report tool calls on the end
                        // event; replay them as start/delta pairs so the
                        // collector sees one uniform fragment shape.
                        if let Some(tool_calls) = end.captured_tool_calls() {
                            for tc in tool_calls {
                                saw_tool_call = true;
                                if started.insert(tc.call_id.clone()) {
                                    yield Ok(ChatFragment::ToolCallStart {
                                        id: tc.call_id.clone(),
                                        name: tc.fn_name.clone(),
                                    });
                                    yield Ok(ChatFragment::ToolCallDelta {
                                        id: tc.call_id.clone(),
                                        args_delta: tc.fn_arguments.to_string(),
                                    });
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }

            let finish = if saw_tool_call {
                FinishReason::ToolCalls
            } else {
                FinishReason::Stop
            };
            yield Ok(ChatFragment::End { finish });
        };

        Ok(Box::pin(fragments))
    }
}
