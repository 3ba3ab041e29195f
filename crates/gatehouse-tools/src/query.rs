//! Read-only SQL query tool over the CRM tables.

use crate::db::CrmDb;
use async_trait::async_trait;
use gatehouse_contract::{Tool, ToolDescriptor, ToolError, ToolResult};
use rusqlite::types::ValueRef;
use serde_json::{json, Value};
use std::sync::Arc;

/// Upper bound on rows returned to the model.
const MAX_ROWS: usize = 200;

/// Run read-only SQL against the CRM database.
pub struct QueryTool {
    db: Arc<CrmDb>,
}

impl QueryTool {
    pub fn new(db: Arc<CrmDb>) -> Self {
        Self { db }
    }
}

fn ensure_read_only(sql: &str) -> Result<(), ToolError> {
    let trimmed = sql.trim().trim_end_matches(';');
    if trimmed.contains(';') {
        return Err(ToolError::InvalidArguments(
            "only a single statement is allowed".into(),
        ));
    }
    let lowered = trimmed.to_ascii_lowercase();
    if !(lowered.starts_with("select") || lowered.starts_with("with")) {
        return Err(ToolError::InvalidArguments(
            "only read-only SELECT queries are allowed".into(),
        ));
    }
    Ok(())
}

fn column_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::from(n),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(format!("<blob {} bytes>", b.len())),
    }
}

#[async_trait]
impl Tool for QueryTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "query",
            "Query",
            "Run a read-only SQL query against the CRM database \
             (customers, transactions, items, rfm, marketing_campaigns, campaign_emails).",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "sql": {
                    "type": "string",
                    "description": "A single SELECT statement"
                }
            },
            "required": ["sql"]
        }))
    }

    async fn invoke(&self, args: Value) -> Result<ToolResult, ToolError> {
        let sql = args["sql"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("missing 'sql' for 'query'".into()))?;
        ensure_read_only(sql)?;

        let conn = self.db.conn();
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let mut rows = stmt
            .query([])
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        let mut out: Vec<Value> = Vec::new();
        let mut truncated = false;
        while let Some(row) = rows
            .next()
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?
        {
            if out.len() >= MAX_ROWS {
                truncated = true;
                break;
            }
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                let value = row
                    .get_ref(i)
                    .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
                values.push(column_value(value));
            }
            out.push(Value::Array(values));
        }

        Ok(ToolResult::success(
            "query",
            json!({
                "columns": columns,
                "rows": out,
                "row_count": out.len(),
                "truncated": truncated,
            }),
        ))
    }
}
