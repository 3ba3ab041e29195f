//! Tool trait and supporting types.
//!
//! Tools are opaque capabilities looked up by name at runtime. Arguments
//! are validated against the declared schema before invocation rather than
//! trusting the model's payload.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Tool execution errors.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Tool execution status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    /// Execution succeeded.
    Success,
    /// Execution failed.
    Error,
}

/// Result of tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool name.
    pub tool_name: String,
    /// Execution status.
    pub status: ToolStatus,
    /// Result data.
    pub data: Value,
    /// Optional message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ToolResult {
    /// Create a success result.
    pub fn success(tool_name: impl Into<String>, data: impl Into<Value>) -> Self {
        Self {
            tool_name: tool_name.into(),
            status: ToolStatus::Success,
            data: data.into(),
            message: None,
        }
    }

    /// Create a success result with message.
    pub fn success_with_message(
        tool_name: impl Into<String>,
        data: impl Into<Value>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            status: ToolStatus::Success,
            data: data.into(),
            message: Some(message.into()),
        }
    }

    /// Create an error result.
    pub fn error(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            status: ToolStatus::Error,
            data: Value::Null,
            message: Some(message.into()),
        }
    }

    /// Check if execution succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self.status, ToolStatus::Success)
    }

    /// Check if execution failed.
    pub fn is_error(&self) -> bool {
        matches!(self.status, ToolStatus::Error)
    }
}

/// Tool descriptor containing metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique tool ID.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON schema for parameters.
    pub parameters: Value,
    /// Whether the tool requires human confirmation before execution.
    pub requires_confirmation: bool,
}

impl ToolDescriptor {
    /// Create a new tool descriptor.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            parameters: serde_json::json!({"type": "object", "properties": {}}),
            requires_confirmation: false,
        }
    }

    /// Set parameters schema.
    #[must_use]
    pub fn with_parameters(mut self, schema: Value) -> Self {
        self.parameters = schema;
        self
    }

    /// Set requires confirmation.
    #[must_use]
    pub fn with_confirmation(mut self, requires: bool) -> Self {
        self.requires_confirmation = requires;
        self
    }
}

/// Validate an argument payload against a tool's declared schema.
///
/// The payload must be a JSON object carrying every property the schema
/// lists as `required`. Anything deeper (types, enums) is left to the tool
/// itself.
pub fn validate_arguments(descriptor: &ToolDescriptor, args: &Value) -> Result<(), ToolError> {
    let Some(obj) = args.as_object() else {
        return Err(ToolError::InvalidArguments(format!(
            "arguments for '{}' must be a JSON object, got: {}",
            descriptor.id, args
        )));
    };

    let required = descriptor.parameters["required"]
        .as_array()
        .map(|r| r.as_slice())
        .unwrap_or_default();

    for field in required {
        let Some(name) = field.as_str() else { continue };
        if !obj.contains_key(name) {
            return Err(ToolError::InvalidArguments(format!(
                "missing required field '{}' for '{}'",
                name, descriptor.id
            )));
        }
    }

    Ok(())
}

/// Tool trait for implementing agent tools.
///
/// # Example
///
/// ```ignore
/// use gatehouse_contract::{Tool, ToolDescriptor, ToolError, ToolResult};
/// use async_trait::async_trait;
/// use serde_json::{json, Value};
///
/// struct PingTool;
///
/// #[async_trait]
/// impl Tool for PingTool {
///     fn descriptor(&self) -> ToolDescriptor {
///         ToolDescriptor::new("ping", "Ping", "Reply with pong")
///     }
///
///     async fn invoke(&self, _args: Value) -> Result<ToolResult, ToolError> {
///         Ok(ToolResult::success("ping", json!({"pong": true})))
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool descriptor.
    fn descriptor(&self) -> ToolDescriptor;

    /// Execute the tool with the given JSON arguments.
    async fn invoke(&self, args: Value) -> Result<ToolResult, ToolError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_result_success() {
        let result = ToolResult::success("query", json!({"rows": 3}));
        assert!(result.is_success());
        assert!(!result.is_error());
        assert_eq!(result.data["rows"], 3);
    }

    #[test]
    fn test_tool_result_error() {
        let result = ToolResult::error("query", "no such table");
        assert!(result.is_error());
        assert_eq!(result.message.as_deref(), Some("no such table"));
        assert_eq!(result.data, Value::Null);
    }

    #[test]
    fn test_descriptor_builder() {
        let desc = ToolDescriptor::new("create_campaign", "Create Campaign", "Creates a campaign")
            .with_parameters(json!({
                "type": "object",
                "properties": { "name": { "type": "string" } },
                "required": ["name"]
            }))
            .with_confirmation(true);

        assert_eq!(desc.id, "create_campaign");
        assert!(desc.requires_confirmation);
        assert_eq!(desc.parameters["required"][0], "name");
    }

    #[test]
    fn test_validate_arguments_accepts_complete_object() {
        let desc = ToolDescriptor::new("t", "T", "t").with_parameters(json!({
            "type": "object",
            "properties": { "a": {}, "b": {} },
            "required": ["a", "b"]
        }));

        assert!(validate_arguments(&desc, &json!({"a": 1, "b": 2})).is_ok());
        // Extra fields are the tool's problem, not the contract's.
        assert!(validate_arguments(&desc, &json!({"a": 1, "b": 2, "c": 3})).is_ok());
    }

    #[test]
    fn test_validate_arguments_rejects_missing_required() {
        let desc = ToolDescriptor::new("t", "T", "t").with_parameters(json!({
            "type": "object",
            "properties": { "a": {} },
            "required": ["a"]
        }));

        let err = validate_arguments(&desc, &json!({})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert!(err.to_string().contains("'a'"));
    }

    #[test]
    fn test_validate_arguments_rejects_non_object() {
        let desc = ToolDescriptor::new("t", "T", "t");
        assert!(validate_arguments(&desc, &json!("not an object")).is_err());
        assert!(validate_arguments(&desc, &json!(null)).is_err());
        assert!(validate_arguments(&desc, &json!([1, 2])).is_err());
    }

    #[test]
    fn test_validate_arguments_without_required_list() {
        let desc = ToolDescriptor::new("t", "T", "t");
        assert!(validate_arguments(&desc, &json!({})).is_ok());
    }

    #[test]
    fn test_tool_result_roundtrip() {
        let result = ToolResult::success_with_message("send", json!({"id": "e1"}), "sent");
        let encoded = serde_json::to_string(&result).unwrap();
        let parsed: ToolResult = serde_json::from_str(&encoded).unwrap();
        assert_eq!(parsed, result);
    }
}
