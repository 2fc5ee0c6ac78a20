use super::rows::{AgentRow, ConversationRow};
use super::Database;
use crate::error::{Error, Result};
use crate::models::{AiAgent, AiConversation};
use chrono::Utc;
use uuid::Uuid;

impl Database {
    /// Create an agent
    pub async fn insert_agent(&self, agent: &AiAgent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ai_agents (
                id, tenant_id, name, system_prompt, is_active, configuration,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(agent.id.to_string())
        .bind(agent.tenant_id.to_string())
        .bind(&agent.name)
        .bind(&agent.system_prompt)
        .bind(agent.is_active)
        .bind(serde_json::to_string(&agent.configuration)?)
        .bind(agent.created_at)
        .bind(agent.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get an agent within a tenant
    pub async fn get_agent(&self, tenant_id: Uuid, id: Uuid) -> Result<AiAgent> {
        let row: AgentRow = sqlx::query_as("SELECT * FROM ai_agents WHERE id = ? AND tenant_id = ?")
            .bind(id.to_string())
            .bind(tenant_id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("agent {}", id)))?;

        row.try_into()
    }

    /// All agents of a tenant
    pub async fn list_agents(&self, tenant_id: Uuid) -> Result<Vec<AiAgent>> {
        let rows: Vec<AgentRow> = sqlx::query_as(
            "SELECT * FROM ai_agents WHERE tenant_id = ? ORDER BY created_at ASC",
        )
        .bind(tenant_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// The agent that answers for a tenant: most recently updated active one
    pub async fn active_agent(&self, tenant_id: Uuid) -> Result<Option<AiAgent>> {
        let row: Option<AgentRow> = sqlx::query_as(
            r#"
            SELECT * FROM ai_agents
            WHERE tenant_id = ? AND is_active = TRUE
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(tenant_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Update an agent's editable fields
    pub async fn update_agent(&self, agent: &AiAgent) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE ai_agents
            SET name = ?, system_prompt = ?, is_active = ?, configuration = ?, updated_at = ?
            WHERE id = ? AND tenant_id = ?
            "#,
        )
        .bind(&agent.name)
        .bind(&agent.system_prompt)
        .bind(agent.is_active)
        .bind(serde_json::to_string(&agent.configuration)?)
        .bind(Utc::now())
        .bind(agent.id.to_string())
        .bind(agent.tenant_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("agent {}", agent.id)));
        }

        Ok(())
    }

    /// Delete an agent (and its conversations)
    pub async fn delete_agent(&self, tenant_id: Uuid, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM ai_agents WHERE id = ? AND tenant_id = ?")
            .bind(id.to_string())
            .bind(tenant_id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("agent {}", id)));
        }

        Ok(())
    }

    /// Conversation between an agent and a phone number
    pub async fn get_conversation(
        &self,
        agent_id: Uuid,
        phone_number: &str,
    ) -> Result<Option<AiConversation>> {
        let row: Option<ConversationRow> = sqlx::query_as(
            "SELECT * FROM ai_conversations WHERE agent_id = ? AND phone_number = ?",
        )
        .bind(agent_id.to_string())
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Insert or replace the context of a conversation
    pub async fn save_conversation(&self, conversation: &AiConversation) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ai_conversations (
                id, tenant_id, agent_id, phone_number, context, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (agent_id, phone_number)
            DO UPDATE SET context = excluded.context, updated_at = excluded.updated_at
            "#,
        )
        .bind(conversation.id.to_string())
        .bind(conversation.tenant_id.to_string())
        .bind(conversation.agent_id.to_string())
        .bind(&conversation.phone_number)
        .bind(serde_json::to_string(&conversation.context)?)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
