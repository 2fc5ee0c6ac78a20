use super::rows::MessageRow;
use super::Database;
use crate::error::{Error, Result};
use crate::models::{Message, MessageDirection};
use chrono::Utc;
use uuid::Uuid;
use wagate_providers::MessageStatus;

impl Database {
    /// Insert a message. Returns `false` when the tenant already stored the
    /// provider message id in the same direction (the insert is skipped).
    ///
    /// Provider ids are only unique per tenant and direction: one tenant's
    /// outbound id can arrive as another tenant's inbound id.
    pub async fn insert_message(&self, message: &Message) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO messages (
                id, tenant_id, session_id, message_id, direction,
                from_number, to_number, message_type, content, status,
                error, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (tenant_id, direction, message_id) DO NOTHING
            "#,
        )
        .bind(message.id.to_string())
        .bind(message.tenant_id.to_string())
        .bind(message.session_id.to_string())
        .bind(&message.message_id)
        .bind(message.direction.as_str())
        .bind(&message.from_number)
        .bind(&message.to_number)
        .bind(message.message_type.as_str())
        .bind(serde_json::to_string(&message.content)?)
        .bind(message.status.as_str())
        .bind(&message.error)
        .bind(message.created_at)
        .bind(message.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get a message by provider message id within a tenant
    pub async fn get_message(&self, tenant_id: Uuid, message_id: &str) -> Result<Message> {
        let row: MessageRow = sqlx::query_as(
            r#"
            SELECT * FROM messages WHERE tenant_id = ? AND message_id = ?
            ORDER BY created_at DESC LIMIT 1
            "#,
        )
        .bind(tenant_id.to_string())
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("message {}", message_id)))?;

        row.try_into()
    }

    /// Page through a tenant's messages, newest first
    pub async fn list_messages(
        &self,
        tenant_id: Uuid,
        session_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>> {
        let session_id = session_id.map(|id| id.to_string());

        let rows: Vec<MessageRow> = sqlx::query_as(
            r#"
            SELECT * FROM messages
            WHERE tenant_id = ? AND (? IS NULL OR session_id = ?)
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(tenant_id.to_string())
        .bind(&session_id)
        .bind(&session_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// Update the delivery status of an outbound message within a tenant
    pub async fn update_message_status(
        &self,
        tenant_id: Uuid,
        message_id: &str,
        status: MessageStatus,
        error: Option<&str>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE messages SET status = ?, error = COALESCE(?, error), updated_at = ?
            WHERE tenant_id = ? AND direction = ? AND message_id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(error)
        .bind(Utc::now())
        .bind(tenant_id.to_string())
        .bind(MessageDirection::Outbound.as_str())
        .bind(message_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("message {}", message_id)));
        }

        Ok(())
    }

    /// Find which tenant sent a provider message id
    pub async fn find_message_tenant(&self, message_id: &str) -> Result<Option<Uuid>> {
        let tenant_id: Option<String> = sqlx::query_scalar(
            "SELECT tenant_id FROM messages WHERE direction = ? AND message_id = ? LIMIT 1",
        )
        .bind(MessageDirection::Outbound.as_str())
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?;

        tenant_id
            .map(|id| super::parse_uuid(&id, "tenant"))
            .transpose()
    }
}
