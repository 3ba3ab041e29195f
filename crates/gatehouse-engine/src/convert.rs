//! Pure functions for converting between gatehouse and genai types.

use gatehouse_contract::{Message, Role, ToolDescriptor, ToolResult};
use genai::chat::{ChatMessage, ChatRequest, MessageContent, ToolResponse};

/// Convert a ToolDescriptor to a genai Tool.
pub fn to_genai_tool(desc: &ToolDescriptor) -> genai::chat::Tool {
    genai::chat::Tool::new(&desc.id)
        .with_description(&desc.description)
        .with_schema(desc.parameters.clone())
}

/// Convert a Message to a genai ChatMessage.
pub fn to_chat_message(msg: &Message) -> ChatMessage {
    match msg.role {
        Role::System => ChatMessage::system(&msg.content),
        Role::User => ChatMessage::user(&msg.content),
        Role::Assistant => {
            if let Some(ref calls) = msg.tool_calls {
                let genai_calls: Vec<genai::chat::ToolCall> = calls
                    .iter()
                    .map(|c| genai::chat::ToolCall {
                        call_id: c.id.clone(),
                        fn_name: c.name.clone(),
                        fn_arguments: c.arguments.clone(),
                    })
                    .collect();

                let mut content = MessageContent::from(msg.content.as_str());
                for call in genai_calls {
                    content.push(genai::chat::ContentPart::ToolCall(call));
                }
                ChatMessage::assistant(content)
            } else {
                ChatMessage::assistant(&msg.content)
            }
        }
        Role::Tool => {
            let call_id = msg.tool_call_id.as_deref().unwrap_or("");
            let response = ToolResponse {
                call_id: call_id.to_string(),
                content: msg.content.clone(),
            };
            ChatMessage::from(response)
        }
    }
}

/// Build a genai ChatRequest from a system prompt, messages, and tools.
///
/// The system prompt is composed at request-build time; it is never stored
/// in the thread's message log.
pub fn build_request(
    system_prompt: &str,
    messages: &[Message],
    tools: &[ToolDescriptor],
) -> ChatRequest {
    let mut chat_messages: Vec<ChatMessage> = Vec::with_capacity(messages.len() + 1);
    if !system_prompt.is_empty() {
        chat_messages.push(ChatMessage::system(system_prompt));
    }
    chat_messages.extend(messages.iter().map(to_chat_message));

    let genai_tools: Vec<genai::chat::Tool> = tools.iter().map(to_genai_tool).collect();

    let mut request = ChatRequest::new(chat_messages);
    if !genai_tools.is_empty() {
        request = request.with_tools(genai_tools);
    }
    request
}

/// Create a tool response message from a ToolResult.
pub fn tool_response(call_id: impl Into<String>, result: &ToolResult) -> Message {
    let content = serde_json::to_string(result)
        .unwrap_or_else(|_| result.message.clone().unwrap_or_default());
    Message::tool(call_id, content)
}
