//! Marketing tool collaborators.
//!
//! These are the opaque capabilities the workflow engine dispatches to:
//! campaign creation, campaign-email send, and read-only CRM queries. They
//! are backed by an embedded SQLite database whose tables mirror the CRM
//! schema (customers, transactions, items, rfm) plus the campaign tables
//! the tools write. Filling the CRM tables is a batch concern outside this
//! crate.

mod db;
mod query;

pub use db::CrmDb;
pub use query::QueryTool;

use async_trait::async_trait;
use gatehouse_contract::{Tool, ToolDescriptor, ToolError, ToolRegistry, ToolResult};
use rusqlite::params;
use serde_json::{json, Value};
use std::sync::Arc;

/// The campaign types the marketing team runs.
pub const CAMPAIGN_TYPES: [&str; 3] = ["loyalty", "referral", "re-engagement"];

fn required_str<'a>(args: &'a Value, field: &str, tool: &str) -> Result<&'a str, ToolError> {
    args[field]
        .as_str()
        .ok_or_else(|| ToolError::InvalidArguments(format!("missing '{field}' for '{tool}'")))
}

/// Create a marketing campaign, returning its generated identifier.
pub struct CreateCampaignTool {
    db: Arc<CrmDb>,
}

impl CreateCampaignTool {
    pub fn new(db: Arc<CrmDb>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for CreateCampaignTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "create_campaign",
            "Create Campaign",
            "Create a marketing campaign. Returns the ID of the created campaign.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "The name of the campaign"
                },
                "type": {
                    "type": "string",
                    "enum": CAMPAIGN_TYPES,
                    "description": "The type of the campaign"
                },
                "description": {
                    "type": "string",
                    "description": "The description of the campaign"
                }
            },
            "required": ["name", "type", "description"]
        }))
        .with_confirmation(true)
    }

    async fn invoke(&self, args: Value) -> Result<ToolResult, ToolError> {
        let name = required_str(&args, "name", "create_campaign")?;
        let campaign_type = required_str(&args, "type", "create_campaign")?;
        let description = required_str(&args, "description", "create_campaign")?;

        if !CAMPAIGN_TYPES.contains(&campaign_type) {
            return Err(ToolError::InvalidArguments(format!(
                "campaign type must be one of {CAMPAIGN_TYPES:?}, got '{campaign_type}'"
            )));
        }

        let id = uuid::Uuid::now_v7().to_string();
        self.db
            .conn()
            .execute(
                "INSERT INTO marketing_campaigns (id, name, type, description)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, name, campaign_type, description],
            )
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        tracing::info!(campaign_id = %id, name, campaign_type, "campaign created");
        Ok(ToolResult::success(
            "create_campaign",
            json!({ "campaign_id": id }),
        ))
    }
}

/// Send a campaign email to one customer, recording the email row.
pub struct SendCampaignEmailTool {
    db: Arc<CrmDb>,
}

impl SendCampaignEmailTool {
    pub fn new(db: Arc<CrmDb>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Tool for SendCampaignEmailTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "send_campaign_email",
            "Send Campaign Email",
            "Send a campaign email to a customer. Returns a confirmation that the email was sent.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "campaign_id": {
                    "type": "string",
                    "description": "The ID of the campaign"
                },
                "customer_id": {
                    "type": "integer",
                    "description": "The ID of the customer"
                },
                "subject": {
                    "type": "string",
                    "description": "The subject of the email"
                },
                "body": {
                    "type": "string",
                    "description": "The body of the email, in HTML"
                }
            },
            "required": ["campaign_id", "customer_id", "subject", "body"]
        }))
        .with_confirmation(true)
    }

    async fn invoke(&self, args: Value) -> Result<ToolResult, ToolError> {
        let campaign_id = required_str(&args, "campaign_id", "send_campaign_email")?;
        let customer_id = args["customer_id"].as_i64().ok_or_else(|| {
            ToolError::InvalidArguments("missing 'customer_id' for 'send_campaign_email'".into())
        })?;
        let subject = required_str(&args, "subject", "send_campaign_email")?;
        let body = required_str(&args, "body", "send_campaign_email")?;

        let conn = self.db.conn();
        let campaign_exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM marketing_campaigns WHERE id = ?1)",
                params![campaign_id],
                |row| row.get(0),
            )
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        if !campaign_exists {
            return Err(ToolError::ExecutionFailed(format!(
                "no such campaign: {campaign_id}"
            )));
        }

        let email_id = uuid::Uuid::now_v7().to_string();
        conn.execute(
            "INSERT INTO campaign_emails (id, campaign_id, customer_id, subject, body)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![email_id, campaign_id, customer_id, subject, body],
        )
        .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        tracing::info!(email_id = %email_id, campaign_id, customer_id, "campaign email recorded");
        Ok(ToolResult::success_with_message(
            "send_campaign_email",
            json!({ "email_id": email_id }),
            format!("Successfully sent <{subject}> to customer <{customer_id}>!"),
        ))
    }
}

/// Build the registry of marketing tools over one shared database.
pub fn marketing_registry(db: Arc<CrmDb>) -> ToolRegistry {
    ToolRegistry::new()
        .with_tool(CreateCampaignTool::new(db.clone()))
        .with_tool(SendCampaignEmailTool::new(db.clone()))
        .with_tool(QueryTool::new(db))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Arc<CrmDb> {
        Arc::new(CrmDb::open_in_memory().unwrap())
    }

    fn campaign_args() -> Value {
        json!({
            "name": "Spring Sale",
            "type": "loyalty",
            "description": "thank loyal customers"
        })
    }

    #[tokio::test]
    async fn create_campaign_inserts_row_and_returns_id() {
        let db = test_db();
        let tool = CreateCampaignTool::new(db.clone());

        let result = tool.invoke(campaign_args()).await.unwrap();
        assert!(result.is_success());
        let id = result.data["campaign_id"].as_str().unwrap().to_string();
        assert_eq!(uuid::Uuid::parse_str(&id).unwrap().get_version_num(), 7);

        let name: String = db
            .conn()
            .query_row(
                "SELECT name FROM marketing_campaigns WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(name, "Spring Sale");
    }

    #[tokio::test]
    async fn create_campaign_rejects_unknown_type() {
        let tool = CreateCampaignTool::new(test_db());
        let err = tool
            .invoke(json!({
                "name": "Oops",
                "type": "flash-mob",
                "description": "nope"
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn create_campaign_rejects_missing_fields() {
        let tool = CreateCampaignTool::new(test_db());
        let err = tool.invoke(json!({"name": "Only Name"})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn send_email_records_row_with_confirmation() {
        let db = test_db();
        let create = CreateCampaignTool::new(db.clone());
        let created = create.invoke(campaign_args()).await.unwrap();
        let campaign_id = created.data["campaign_id"].as_str().unwrap();

        let send = SendCampaignEmailTool::new(db.clone());
        let result = send
            .invoke(json!({
                "campaign_id": campaign_id,
                "customer_id": 17850,
                "subject": "We miss you!",
                "body": "<p>Hello</p>"
            }))
            .await
            .unwrap();

        assert!(result.is_success());
        let message = result.message.unwrap();
        assert!(message.contains("We miss you!"));
        assert!(message.contains("17850"));

        let count: i64 = db
            .conn()
            .query_row(
                "SELECT count(*) FROM campaign_emails WHERE campaign_id = ?1",
                params![campaign_id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn send_email_fails_for_unknown_campaign() {
        let send = SendCampaignEmailTool::new(test_db());
        let err = send
            .invoke(json!({
                "campaign_id": "not-a-campaign",
                "customer_id": 1,
                "subject": "s",
                "body": "b"
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed(_)));
        assert!(err.to_string().contains("no such campaign"));
    }

    #[test]
    fn registry_protects_the_write_tools_only() {
        let registry = marketing_registry(test_db());
        assert_eq!(registry.len(), 3);
        assert_eq!(
            registry.protected_names(),
            vec![
                "create_campaign".to_string(),
                "send_campaign_email".to_string()
            ]
        );
    }
}
